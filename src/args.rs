use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Dead code elimination and register allocation for Decaf three-address code.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Arguments {
    /// What to print once allocation is done.
    #[arg(long, value_enum, default_value_t = Emit::Alloc)]
    pub emit: Emit,

    /// Hand out at most this many general purpose registers.
    #[arg(short, long)]
    pub registers: Option<usize>,

    /// Write the interference graph of every function to this directory.
    #[arg(long)]
    pub graphs: Option<PathBuf>,

    /// Log more. May be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(required = true)]
    pub path: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, ValueEnum)]
pub enum Emit {
    /// The surviving three-address code.
    Tac,

    /// The surviving three-address code, with the register or memory slot
    /// of every operand.
    Alloc,
}
