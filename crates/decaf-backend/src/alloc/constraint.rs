use std::collections::HashMap;

use decaf_common::tac::Register;

#[derive(Debug)]
pub struct Constraints {
    /// Registers the allocator may hand out, in order of preference.
    pub registers: &'static [RegisterInfo],

    /// Reserved for the receiver of instance methods.
    pub receiver: RegisterInfo,

    /// Use at most this many of `registers`.
    pub budget: Option<usize>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegisterInfo {
    pub id: usize,
    pub name: &'static str,
}

impl Constraints {
    pub fn with_budget(self, budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..self
        }
    }

    /// The registers available to ordinary locations.
    pub fn pool(&self) -> Vec<Register> {
        let count = self
            .budget
            .unwrap_or(self.registers.len())
            .min(self.registers.len());

        self.registers[..count]
            .iter()
            .map(|info| Register(info.id))
            .collect()
    }

    pub fn receiver(&self) -> Register {
        Register(self.receiver.id)
    }

    pub fn register_names(&self) -> HashMap<Register, &'static str> {
        self.registers
            .iter()
            .chain(Some(&self.receiver))
            .map(|info| (Register(info.id), info.name))
            .collect()
    }
}
