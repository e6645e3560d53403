pub mod alloc;
pub mod mips;

pub use alloc::{regalloc, Constraints, Driver, FunctionReport, RegisterInfo};
