use std::collections::{BTreeMap, HashMap};

use decaf_common::tac::{Inst, Instruction};
use decaf_common::Failure;

/// An index into the code of the program being allocated.
pub type InstId = usize;

/// Control flow between the surviving instructions of one function.
#[derive(Debug)]
pub struct ControlFlow {
    /// The instructions in program order.
    pub order: Vec<InstId>,
    pub succs: BTreeMap<InstId, Vec<InstId>>,
    pub preds: BTreeMap<InstId, Vec<InstId>>,
}

impl ControlFlow {
    pub fn succs(&self, id: &InstId) -> impl Iterator<Item = InstId> + '_ {
        self.succs.get(id).into_iter().flatten().copied()
    }

    pub fn preds(&self, id: &InstId) -> impl Iterator<Item = InstId> + '_ {
        self.preds.get(id).into_iter().flatten().copied()
    }
}

/// Build the control flow graph of `body`, the instructions of a function
/// that are still alive. A label jumps to whatever follows it.
pub fn control_flow(code: &[Instruction], body: &[InstId]) -> Result<ControlFlow, Failure> {
    let mut targets = HashMap::new();
    for (pos, id) in body.iter().enumerate() {
        if let Inst::Label(label) = code[*id].inst() {
            if let Some(next) = body.get(pos + 1) {
                targets.insert(label.as_str(), *next);
            }
        }
    }

    let target = |label: &str, at: InstId| {
        targets
            .get(label)
            .copied()
            .ok_or_else(|| Failure::UndefinedLabel {
                label: label.into(),
                at,
            })
    };

    let mut succs: BTreeMap<InstId, Vec<InstId>> = BTreeMap::new();
    let mut preds: BTreeMap<InstId, Vec<InstId>> = BTreeMap::new();

    for (pos, id) in body.iter().copied().enumerate() {
        let next = body.get(pos + 1).copied();

        let to = match code[id].inst() {
            Inst::Goto(label) => vec![target(label, id)?],

            Inst::IfZ { label, .. } => {
                let taken = target(label, id)?;
                match next {
                    Some(next) if next != taken => vec![taken, next],
                    _ => vec![taken],
                }
            }

            Inst::Return(_) | Inst::EndFunc => vec![],

            _ => next.into_iter().collect(),
        };

        for succ in to.iter() {
            preds.entry(*succ).or_default().push(id);
        }

        succs.insert(id, to);
    }

    Ok(ControlFlow {
        order: body.to_vec(),
        succs,
        preds,
    })
}
