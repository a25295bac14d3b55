//! Handles all user-facing output for the CLI.
//!
//! Progress messages go through an [`OutputSink`]; results are written as a
//! coloured dot string with one line per failure, or as JSON.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::engine::{Outcome, OutputSink};
use crate::testing::runner::{failure_line, TestResult};

// ============================================================================
// OUTPUT SINK
// ============================================================================

/// Writes output to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{text}");
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Writes the dot string and the failure lines.
pub fn write_summary<W: WriteColor>(out: &mut W, results: &[TestResult]) -> io::Result<()> {
    for result in results {
        let (mark, color) = if result.pass {
            ('.', Color::Green)
        } else {
            ('x', Color::Red)
        };
        out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(out, "{mark}")?;
    }
    out.reset()?;
    writeln!(out)?;

    for result in results.iter().filter(|result| !result.pass) {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "FAIL")?;
        out.reset()?;
        let line = failure_line(result);
        writeln!(out, "{}", line.strip_prefix("FAIL").unwrap_or(&line))?;
    }
    Ok(())
}

/// One file's entry in the JSON report.
#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: &'a Outcome,
}

pub fn write_json<W: Write>(out: &mut W, reports: &[FileReport<'_>]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, reports)?;
    writeln!(out)
}
