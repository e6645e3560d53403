use std::collections::BTreeMap;

use log::trace;

use super::cfg::{ControlFlow, InstId};
use decaf_common::tac::{Instruction, LocationId};

pub type LiveSet = im::OrdSet<LocationId>;

/// The order instructions are visited in during each pass. Both reach the
/// same fixed point; reverse just gets there in fewer passes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    Forward,
    Reverse,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Liveness {
    pub live_in: BTreeMap<InstId, LiveSet>,
    pub live_out: BTreeMap<InstId, LiveSet>,

    /// Passes over the function until nothing changed, the last one included.
    pub passes: usize,
}

impl Liveness {
    pub fn live_in(&self, id: &InstId) -> LiveSet {
        self.live_in.get(id).cloned().unwrap_or_default()
    }

    pub fn live_out(&self, id: &InstId) -> LiveSet {
        self.live_out.get(id).cloned().unwrap_or_default()
    }
}

pub fn liveness(code: &[Instruction], flow: &ControlFlow, order: Order) -> Liveness {
    let mut analyzer = Analyzer::new(code, flow);
    analyzer.analyze(order);
    analyzer.facts
}

#[derive(Debug)]
struct Analyzer<'a> {
    facts: Liveness,
    code: &'a [Instruction],
    flow: &'a ControlFlow,
}

impl<'a> Analyzer<'a> {
    pub fn new(code: &'a [Instruction], flow: &'a ControlFlow) -> Self {
        Self {
            facts: Liveness::default(),
            code,
            flow,
        }
    }

    pub fn analyze(&mut self, order: Order) {
        let mut visit = self.flow.order.clone();
        if order == Order::Reverse {
            visit.reverse();
        }

        loop {
            self.facts.passes += 1;

            let mut changed = false;
            for id in visit.iter() {
                changed |= self.analyze_instruction(*id);
            }

            if !changed {
                break;
            }
        }

        trace!(
            "liveness of {} instructions settled after {} passes",
            visit.len(),
            self.facts.passes
        );
    }

    /// Returns `true` if the facts about `id` changed.
    fn analyze_instruction(&mut self, id: InstId) -> bool {
        let live_out = self.compute_out(&id);
        let live_in = self.compute_in(&id, &live_out);

        let old_in = self.facts.live_in.insert(id, live_in.clone());
        let old_out = self.facts.live_out.insert(id, live_out.clone());

        old_in.unwrap_or_default() != live_in || old_out.unwrap_or_default() != live_out
    }

    /// `out[n] = union { in[s] | s in succ[n] }`
    fn compute_out(&self, id: &InstId) -> LiveSet {
        self.flow
            .succs(id)
            .fold(LiveSet::new(), |live, succ| live.union(self.facts.live_in(&succ)))
    }

    /// `in[n] = use[n] + (out[n] - def[n])`
    fn compute_in(&self, id: &InstId, live_out: &LiveSet) -> LiveSet {
        let instruction = &self.code[*id];
        let mut live = live_out.clone();

        for killed in instruction.defines() {
            live.remove(killed);
        }

        live.extend(instruction.uses().iter().copied());
        live
    }
}
