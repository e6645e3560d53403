//! The three-address code every later stage works on: a flat list of
//! instructions over an arena of locations.

pub use builder::{Builtin, TacBuilder};
pub use instruction::{BinaryOp, Frame, Inst, Instruction};
pub use location::{
    Assignment, Location, LocationId, Locations, Register, Segment, OFFSET_TO_FIRST_GLOBAL,
    OFFSET_TO_FIRST_LOCAL, OFFSET_TO_FIRST_PARAM, RECEIVER_NAME, VAR_SIZE,
};
pub use pretty::Prettier;

mod builder;
mod instruction;
mod location;
mod pretty;


#[derive(Debug, Default)]
pub struct Program {
    pub code: Vec<Instruction>,
    pub locations: Locations,
    pub globals: Vec<LocationId>,
}

impl Program {
    /// Drop every instruction whose index `keep` rejects. Order is preserved.
    pub fn retain(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut index = 0;
        self.code.retain(|_| {
            let kept = keep(index);
            index += 1;
            kept
        });
    }

    /// The label written directly before the instruction at `at`, which for a
    /// `BeginFunc` is the function's name.
    pub fn label_before(&self, at: usize) -> Option<&str> {
        let before = at.checked_sub(1)?;
        match self.code[before].inst() {
            Inst::Label(label) => Some(label),
            _ => None,
        }
    }
}
