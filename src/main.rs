mod args;
mod cli;
mod input;

use clap::Parser;

use args::Arguments;

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    cli::run(&args)
}
