pub use cfg::{control_flow, ControlFlow, InstId};
pub use color::{color, Coloring};
pub use constraint::{Constraints, RegisterInfo};
pub use dce::{eliminate, is_dead, Analysis};
pub use interfere::{interference, Interference};
pub use liveness::{liveness, LiveSet, Liveness, Order};
pub use segment::{segment, Region};

mod cfg;
mod color;
mod constraint;
mod dce;
mod interfere;
mod liveness;
mod segment;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use log::{debug, info};

use decaf_common::tac::{Inst, LocationId, Locations, Program};
use decaf_common::Failure;

/// Receives what happened to each function as it is allocated.
pub trait Driver {
    fn report(&mut self, report: &FunctionReport) {
        let _ = report;
    }

    /// Look at the interference graph of a function before it is thrown
    /// away.
    fn inspect(
        &mut self,
        name: &str,
        locations: &Locations,
        graph: &Interference,
        coloring: &Coloring,
    ) {
        let _ = (name, locations, graph, coloring);
    }
}

impl Driver for () {}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FunctionReport {
    pub name: String,
    pub removed: usize,
    pub nodes: usize,
    pub forced: Vec<String>,
    pub spilled: Vec<String>,
}

/// Remove dead code from every function in the program and give each location
/// a register or leave it in memory. Locations that take no part in any
/// function's liveness stay in memory.
pub fn regalloc(
    constraints: &Constraints,
    program: &mut Program,
    driver: &mut impl Driver,
) -> Result<Vec<FunctionReport>, Failure> {
    let regions = segment(program)?;
    let pool = constraints.pool();

    info!(
        "allocating {} function(s) with {} register(s)",
        regions.len(),
        pool.len()
    );

    let mut dead = BTreeSet::new();
    let mut reports = Vec::with_capacity(regions.len());

    for region in regions.iter() {
        let analysis = eliminate(&program.code, region)?;
        let graph = interference(&program.code, &analysis.flow, &analysis.liveness);

        let pinned = match program.code[region.begin].inst() {
            Inst::BeginFunc(frame) => frame.receiver.map(|this| (this, constraints.receiver())),
            _ => unreachable!(),
        };

        let coloring = color(&graph, &pool, pinned);

        debug!(
            "`{}`: {} removed, {} node(s), {} forced, {} in memory",
            region.name,
            analysis.removed.len(),
            graph.len(),
            coloring.forced.len(),
            coloring.spilled.len()
        );

        for (location, assignment) in coloring.assignments.iter() {
            program.locations.assign(*location, *assignment);
        }

        let names = |ids: &[LocationId]| -> Vec<String> {
            ids.iter()
                .map(|id| program.locations.name(id).to_string())
                .collect()
        };

        let report = FunctionReport {
            name: region.name.clone(),
            removed: analysis.removed.len(),
            nodes: graph.len(),
            forced: names(&coloring.forced),
            spilled: names(&coloring.spilled),
        };

        driver.inspect(&region.name, &program.locations, &graph, &coloring);
        driver.report(&report);

        dead.extend(analysis.removed);
        reports.push(report);
    }

    program.retain(|at| !dead.contains(&at));
    let settled = program.locations.settle();
    debug!("{settled} location(s) never needed a register");

    Ok(reports)
}
