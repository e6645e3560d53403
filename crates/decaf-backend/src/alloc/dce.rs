use log::trace;

use super::cfg::{control_flow, ControlFlow, InstId};
use super::liveness::{liveness, LiveSet, Liveness, Order};
use super::segment::Region;
use decaf_common::tac::Instruction;
use decaf_common::Failure;

/// Everything known about one function once dead code is gone.
#[derive(Debug)]
pub struct Analysis {
    /// The surviving instructions, in program order.
    pub body: Vec<InstId>,
    pub removed: Vec<InstId>,
    pub flow: ControlFlow,
    pub liveness: Liveness,
}

/// An instruction is dead if all it does is define one location nobody reads
/// afterwards.
pub fn is_dead(instruction: &Instruction, live_out: &LiveSet) -> bool {
    if instruction.inst().has_effect() {
        return false;
    }

    let mut defines = instruction.defines().iter();
    match (defines.next(), defines.next()) {
        (Some(defined), None) => !live_out.contains(defined),
        _ => false,
    }
}

/// Compute liveness for a function and remove dead instructions from it,
/// recomputing after every round, until a round removes nothing.
pub fn eliminate(code: &[Instruction], region: &Region) -> Result<Analysis, Failure> {
    let mut body: Vec<InstId> = region.indices().collect();
    let mut removed = Vec::new();
    let mut round = 0;

    loop {
        round += 1;

        let flow = control_flow(code, &body)?;
        let liveness = liveness(code, &flow, Order::Reverse);

        let (dead, alive): (Vec<InstId>, Vec<InstId>) = body
            .iter()
            .copied()
            .partition(|id| is_dead(&code[*id], &liveness.live_out(id)));

        if dead.is_empty() {
            trace!("`{}` is free of dead code after {round} round(s)", region.name);
            removed.sort_unstable();

            return Ok(Analysis {
                body,
                removed,
                flow,
                liveness,
            });
        }

        trace!("round {round} removes {} instruction(s)", dead.len());
        removed.extend(dead);
        body = alive;
    }
}
