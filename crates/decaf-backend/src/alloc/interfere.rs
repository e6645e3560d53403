use std::collections::{BTreeMap, BTreeSet};

use super::cfg::ControlFlow;
use super::liveness::Liveness;
use decaf_common::tac::{Instruction, LocationId};

#[derive(Debug, Default)]
pub struct Interference {
    pub graph: BTreeMap<LocationId, BTreeSet<LocationId>>,
}

impl Interference {
    pub fn add_node(&mut self, node: LocationId) {
        self.graph.entry(node).or_default();
    }

    /// Make `a` and `b` interfere. Nothing interferes with itself.
    pub fn add_edge(&mut self, a: LocationId, b: LocationId) {
        if a == b {
            return;
        }

        self.graph.entry(a).or_default().insert(b);
        self.graph.entry(b).or_default().insert(a);
    }

    pub fn neighbours(&self, node: &LocationId) -> impl Iterator<Item = LocationId> + '_ {
        self.graph.get(node).into_iter().flatten().copied()
    }

    pub fn interferes(&self, a: &LocationId, b: &LocationId) -> bool {
        self.graph
            .get(a)
            .map(|neighbours| neighbours.contains(b))
            .unwrap_or(false)
    }

    pub fn nodes(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.graph.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (LocationId, LocationId)> + '_ {
        self.graph.iter().flat_map(|(a, neighbours)| {
            neighbours
                .iter()
                .filter(move |b| a < *b)
                .map(move |b| (*a, *b))
        })
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

/// Locations that are live at the same time interfere, and so does whatever
/// an instruction defines with everything live after it.
pub fn interference(code: &[Instruction], flow: &ControlFlow, liveness: &Liveness) -> Interference {
    let mut graph = Interference::default();

    for id in flow.order.iter() {
        let live_in = liveness.live_in(id);
        let live_out = liveness.live_out(id);

        for a in live_in.iter().copied() {
            graph.add_node(a);
            for b in live_in.iter().copied() {
                graph.add_edge(a, b);
            }
        }

        for defined in code[*id].defines().iter().copied() {
            graph.add_node(defined);
            for live in live_out.iter().copied() {
                graph.add_edge(defined, live);
            }
        }
    }

    graph
}
