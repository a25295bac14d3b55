//! Command-line arguments, declared with `clap`'s derive API.

use clap::Parser;
use std::path::PathBuf;

/// Run the doctests embedded in sx source comments.
#[derive(Debug, Parser)]
#[command(name = "sx-doctest", version, about = "Run the doctests embedded in sx source comments.")]
pub struct DoctestArgs {
    /// Source files, or directories to search for .sx and .sxl files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Module envelope for the rewritten program: amd or commonjs.
    #[arg(short, long)]
    pub module: Option<String>,

    /// Source dialect (sx or sxl); inferred from the extension when omitted.
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub dialect: Option<String>,

    /// Only comment lines starting with this text take part in doctests.
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Print the rewritten program instead of running it.
    #[arg(short, long)]
    pub print: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub silent: bool,

    /// Report results as JSON.
    #[arg(long, conflicts_with = "print")]
    pub json: bool,
}
