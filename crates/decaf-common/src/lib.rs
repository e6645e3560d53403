pub mod failure;
pub mod names;
pub mod tac;

pub use failure::Failure;
