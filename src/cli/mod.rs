mod diagnostic;
mod dot;


use std::fs::{self, DirBuilder};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use codespan_reporting::term::termcolor::{
    Color, ColorChoice, ColorSpec, StandardStream, WriteColor,
};
use log::{debug, info, LevelFilter};

use decaf_backend::alloc::{Coloring, Interference};
use decaf_backend::mips::CONSTRAINTS;
use decaf_backend::{regalloc, Constraints, Driver, FunctionReport};
use decaf_common::names::NameGenerator;
use decaf_common::tac::{Locations, Prettier, Program};
use decaf_common::Failure;
use decaf_frontend::{parse, ParseError};

use self::diagnostic::print_parse_error;
use self::dot::GraphViz;
use crate::args::{Arguments, Emit};
use crate::input::read_file;

pub fn run(args: &Arguments) -> anyhow::Result<()> {
    init_logger(args.verbose);

    let src = read_file(&args.path)?;
    let constraints = match args.registers {
        Some(budget) => CONSTRAINTS.with_budget(budget),
        None => CONSTRAINTS,
    };

    let mut driver = ConsoleDriver::new(args.graphs.clone());

    match compile(&src, args.emit, &constraints, &mut driver) {
        Ok(output) => {
            print!("{output}");
            driver.finish()
        }

        Err(err) => {
            if let Some(parse_error) = err.downcast_ref::<ParseError>() {
                let name = args.path.display().to_string();
                print_parse_error(name, src, parse_error)?;
            }

            Err(err)
        }
    }
}

/// Read three-address code, allocate it, and print what survives.
pub fn compile(
    src: &str,
    emit: Emit,
    constraints: &Constraints,
    driver: &mut impl Driver,
) -> anyhow::Result<String> {
    let mut names = NameGenerator::new();
    let mut program = parse(&mut names, src)?;

    info!("read {} instructions", program.code.len());

    regalloc(constraints, &mut program, driver).map_err(|failure| explain(&program, failure))?;

    let registers = constraints.register_names();
    let prettier = match emit {
        Emit::Tac => Prettier::new(&program.locations),
        Emit::Alloc => Prettier::new(&program.locations).with_registers(&registers),
    };

    Ok(prettier.pretty_program(&program))
}

fn explain(program: &Program, failure: Failure) -> anyhow::Error {
    let prettier = Prettier::new(&program.locations);
    let inst = program
        .code
        .get(failure.at())
        .map(|inst| prettier.pretty_instruction(inst));

    match inst {
        Some(inst) => anyhow!("{failure}\n  at: {}", inst.trim()),
        None => anyhow!("{failure}"),
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Reports on each function as it is allocated, and writes its interference
/// graph out if asked to.
struct ConsoleDriver {
    graphs: Option<PathBuf>,
    writer: StandardStream,
    error: Option<anyhow::Error>,
}

impl ConsoleDriver {
    pub fn new(graphs: Option<PathBuf>) -> Self {
        Self {
            graphs,
            writer: StandardStream::stderr(ColorChoice::Auto),
            error: None,
        }
    }

    /// Returns the first error that happened while writing graphs.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_graph(
        &self,
        dir: &Path,
        name: &str,
        locations: &Locations,
        graph: &Interference,
        coloring: &Coloring,
    ) -> anyhow::Result<()> {
        DirBuilder::new().recursive(true).create(dir)?;

        let path = dir.join(format!("{}.dot", file_name(name)));
        let mut file = io::BufWriter::new(fs::File::create(&path)?);

        GraphViz::new(locations, graph, coloring).render(&mut file)?;
        file.flush()?;

        debug!("wrote the interference graph of `{name}` to {}", path.display());
        Ok(())
    }
}

impl Driver for ConsoleDriver {
    fn report(&mut self, report: &FunctionReport) {
        if report.spilled.is_empty() {
            return;
        }

        write_note(&mut self.writer, report).unwrap();
    }

    fn inspect(
        &mut self,
        name: &str,
        locations: &Locations,
        graph: &Interference,
        coloring: &Coloring,
    ) {
        let dir = match &self.graphs {
            Some(dir) => dir.clone(),
            None => return,
        };

        if self.error.is_some() {
            return;
        }

        if let Err(err) = self.write_graph(&dir, name, locations, graph, coloring) {
            self.error = Some(err);
        }
    }
}

fn write_note(stream: &mut StandardStream, report: &FunctionReport) -> io::Result<()> {
    stream.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(stream, "note")?;

    stream.reset()?;
    writeln!(
        stream,
        ": `{}` ran out of registers; {} stay in memory",
        report.name,
        report.spilled.join(", ")
    )
}

/// Make a function name safe to use as a file name.
fn file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .collect()
}
