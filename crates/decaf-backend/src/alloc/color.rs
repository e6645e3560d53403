use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use super::interfere::Interference;
use decaf_common::tac::{Assignment, LocationId, Register};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Coloring {
    pub assignments: BTreeMap<LocationId, Assignment>,

    /// Nodes that had to be removed while every node had too many neighbours.
    pub forced: Vec<LocationId>,

    /// Nodes that found no free register and were left in memory.
    pub spilled: Vec<LocationId>,
}

impl Coloring {
    pub fn register(&self, node: &LocationId) -> Option<Register> {
        match self.assignments.get(node) {
            Some(Assignment::Register(reg)) => Some(*reg),
            _ => None,
        }
    }
}

/// Color `graph` with the registers in `pool`. A `pinned` node always gets its
/// register, which must not be in `pool`.
pub fn color(
    graph: &Interference,
    pool: &[Register],
    pinned: Option<(LocationId, Register)>,
) -> Coloring {
    let mut colorer = Colorer::new(graph, pool);

    if let Some((node, reg)) = pinned {
        assert!(!pool.contains(&reg));
        colorer.pin(node, reg);
    }

    colorer.simplify();
    colorer.select();
    colorer.coloring
}

struct Colorer<'a> {
    graph: &'a Interference,
    pool: &'a [Register],

    remaining: BTreeSet<LocationId>,
    stack: Vec<(LocationId, BTreeSet<LocationId>)>,
    coloring: Coloring,
}

impl<'a> Colorer<'a> {
    pub fn new(graph: &'a Interference, pool: &'a [Register]) -> Self {
        Self {
            graph,
            pool,
            remaining: graph.nodes().collect(),
            stack: Vec::with_capacity(graph.len()),
            coloring: Coloring::default(),
        }
    }

    pub fn pin(&mut self, node: LocationId, reg: Register) {
        self.remaining.remove(&node);
        self.coloring
            .assignments
            .insert(node, Assignment::Register(reg));
    }

    /// Remove nodes one by one, preferring any node with fewer neighbours
    /// than there are registers.
    pub fn simplify(&mut self) {
        let k = self.pool.len();

        while !self.remaining.is_empty() {
            let easy = self
                .remaining
                .iter()
                .copied()
                .find(|node| self.degree(node) < k);

            let node = match easy {
                Some(node) => node,
                None => {
                    let node = self.most_constrained();
                    trace!("no node has fewer than {k} neighbours, forcing {node:?}");
                    self.coloring.forced.push(node);
                    node
                }
            };

            let edges = self.remaining_neighbours(&node);
            self.remaining.remove(&node);
            self.stack.push((node, edges));
        }
    }

    /// Hand out registers in the reverse order nodes were removed in.
    pub fn select(&mut self) {
        while let Some((node, edges)) = self.stack.pop() {
            let taken: BTreeSet<Register> = edges
                .iter()
                .filter_map(|neighbour| self.coloring.register(neighbour))
                .collect();

            let free = self.pool.iter().copied().find(|reg| !taken.contains(reg));

            let assignment = match free {
                Some(reg) => Assignment::Register(reg),
                None => {
                    self.coloring.spilled.push(node);
                    Assignment::Memory
                }
            };

            assert!(self
                .coloring
                .assignments
                .insert(node, assignment)
                .is_none());
        }
    }

    fn remaining_neighbours(&self, node: &LocationId) -> BTreeSet<LocationId> {
        self.graph
            .neighbours(node)
            .filter(|other| self.remaining.contains(other))
            .collect()
    }

    fn degree(&self, node: &LocationId) -> usize {
        self.graph
            .neighbours(node)
            .filter(|other| self.remaining.contains(other))
            .count()
    }

    /// The remaining node with the most remaining neighbours. Ties go to the
    /// lowest id.
    fn most_constrained(&self) -> LocationId {
        let mut best: Option<(LocationId, usize)> = None;
        for node in self.remaining.iter().copied() {
            let degree = self.degree(&node);
            if best.map(|(_, most)| degree > most).unwrap_or(true) {
                best = Some((node, degree));
            }
        }

        best.map(|(node, _)| node).unwrap()
    }
}
