pub mod lex;
pub mod parse;

pub use parse::{parse, ParseError};
