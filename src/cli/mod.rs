//! The sx-doctest command-line interface.
//!
//! Maps flags onto [`Options`], runs every requested file through the engine
//! and reports. Errors are rendered with miette; the exit status is non-zero
//! when any doctest fails or any file cannot be processed.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::Report;
use termcolor::{ColorChoice, StandardStream};
use tracing::debug;

use crate::atoms::AtomRegistry;
use crate::cli::args::DoctestArgs;
use crate::cli::output::{write_json, write_summary, FileReport, StdoutSink};
use crate::engine::{DoctestEngine, NullSink, Outcome, OutputSink};
use crate::errors::DoctestError;
use crate::options::Options;
use crate::testing::SourceDiscoverer;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = DoctestArgs::parse();
    match execute(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            ExitCode::FAILURE
        }
    }
}

/// Builds the run options from the command-line flags.
pub fn options_from_args(args: &DoctestArgs) -> Result<Options, DoctestError> {
    let mut options = Options::default()
        .with_prefix(args.prefix.clone())
        .with_print(args.print)
        .with_silent(args.silent || args.json);
    if let Some(module) = &args.module {
        options = options.with_module(module)?;
    }
    if let Some(dialect) = &args.dialect {
        options = options.with_dialect(dialect)?;
    }
    Ok(options)
}

/// Runs every file; returns whether everything passed.
fn execute(args: &DoctestArgs) -> Result<bool, DoctestError> {
    let options = options_from_args(args)?;
    let files = SourceDiscoverer::expand(&args.paths)?;
    debug!(files = files.len(), "running doctests");

    let engine = DoctestEngine::new(AtomRegistry::standard());
    let color = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(color);
    let mut ok = true;
    let mut outcomes: Vec<(PathBuf, Outcome)> = Vec::new();

    for file in files {
        let mut progress: Box<dyn OutputSink> = if options.silent {
            Box::new(NullSink)
        } else {
            Box::new(StdoutSink)
        };
        let outcome = match engine.doctest(&file, &options, progress.as_mut()) {
            Ok(outcome) => outcome,
            Err(err) if err.is_config() => return Err(err),
            Err(err) => {
                eprintln!("{:?}", Report::new(err));
                ok = false;
                continue;
            }
        };

        ok &= outcome.all_passed();
        if !options.silent {
            report(&mut stdout, &outcome).map_err(|source| DoctestError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        }
        outcomes.push((file, outcome));
    }

    if args.json {
        let reports: Vec<FileReport<'_>> = outcomes
            .iter()
            .map(|(path, outcome)| FileReport {
                path: path.clone(),
                outcome,
            })
            .collect();
        write_json(&mut io::stdout().lock(), &reports).map_err(|source| DoctestError::Io {
            path: PathBuf::from("<stdout>"),
            source,
        })?;
    }
    Ok(ok)
}

fn report(stdout: &mut StandardStream, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Source(program) => writeln!(stdout, "{program}"),
        Outcome::Results(results) => write_summary(stdout, results),
    }
}
