use thiserror::Error;

/// Internal-consistency failures. None of these are the user's fault; each one
/// means an earlier stage produced malformed three-address code.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Failure {
    #[error("jump to undefined label `{label}` (instruction {at})")]
    UndefinedLabel { label: String, at: usize },

    #[error(
        "builtin `{name}` takes {expected} argument(s), but {given} were supplied \
         (instruction {at})"
    )]
    Arity {
        name: &'static str,
        expected: usize,
        given: usize,
        at: usize,
    },

    #[error("`EndFunc` without a matching `BeginFunc` (instruction {at})")]
    UnmatchedEnd { at: usize },

    #[error("`BeginFunc` is never closed by an `EndFunc` (instruction {at})")]
    UnclosedFunction { at: usize },

    #[error("cannot pop {bytes} bytes of parameters (instruction {at})")]
    MisalignedPop { bytes: i32, at: usize },
}

impl Failure {
    /// The index of the instruction the failure was detected at. For calls and
    /// pops that were refused, this is where they would have been emitted.
    pub fn at(&self) -> usize {
        match self {
            Self::UndefinedLabel { at, .. }
            | Self::Arity { at, .. }
            | Self::UnmatchedEnd { at }
            | Self::UnclosedFunction { at }
            | Self::MisalignedPop { at, .. } => *at,
        }
    }
}
