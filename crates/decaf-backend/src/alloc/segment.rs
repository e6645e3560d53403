use std::ops::RangeInclusive;

use decaf_common::tac::{Inst, Program};
use decaf_common::Failure;

/// The instructions of one function, from its `BeginFunc` to its `EndFunc`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub name: String,
    pub begin: usize,
    pub end: usize,
}

impl Region {
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.begin..=self.end
    }
}

/// Split a program into its functions. Code outside of any function (labels,
/// vtables) belongs to no region.
pub fn segment(program: &Program) -> Result<Vec<Region>, Failure> {
    let mut regions = Vec::new();
    let mut open = None;

    for (at, instruction) in program.code.iter().enumerate() {
        match instruction.inst() {
            Inst::BeginFunc(_) => {
                if let Some(begin) = open {
                    return Err(Failure::UnclosedFunction { at: begin });
                }

                open = Some(at);
            }

            Inst::EndFunc => {
                let begin = open.take().ok_or(Failure::UnmatchedEnd { at })?;
                let name = program
                    .label_before(begin)
                    .map(String::from)
                    .unwrap_or_else(|| format!("<function at {begin}>"));

                regions.push(Region {
                    name,
                    begin,
                    end: at,
                });
            }

            _ => {}
        }
    }

    match open {
        Some(at) => Err(Failure::UnclosedFunction { at }),
        None => Ok(regions),
    }
}
