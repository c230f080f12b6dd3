//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use modelcmp_core::DifferenceKind;

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
///
/// Parsing `"-"` yields [`PathOrStdin::Stdin`]; anything else yields
/// [`PathOrStdin::Path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl PathOrStdin {
    /// A label for messages: `"-"` for stdin, otherwise the path.
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "-".to_owned(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// Output format for CLI commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    Human,
    /// A single JSON document.
    Json,
}

/// Difference kind accepted by `--kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Present only in the right model.
    Add,
    /// Present only in the left model.
    Delete,
    /// Value or order changed.
    Change,
    /// Node moved to another container.
    Move,
}

impl From<KindArg> for DifferenceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Add => DifferenceKind::Add,
            KindArg::Delete => DifferenceKind::Delete,
            KindArg::Change => DifferenceKind::Change,
            KindArg::Move => DifferenceKind::Move,
        }
    }
}

/// Arguments of `modelcmp diff`.
#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Left (base) model, or `-` for stdin. Defaults to `<models-dir>/source.json`.
    #[arg(value_name = "LEFT")]
    pub left: Option<PathOrStdin>,

    /// Right (changed) model, or `-` for stdin. Defaults to `<models-dir>/target.json`.
    #[arg(value_name = "RIGHT")]
    pub right: Option<PathOrStdin>,

    /// Directory holding the default models, relative to the working directory.
    #[arg(long, env = "MODELCMP_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Attribute identifying a node across models (repeatable, tried in order).
    #[arg(long, value_name = "KEY")]
    pub identity_key: Vec<String>,

    /// Minimum structural similarity, between 0 and 1, for a fallback match.
    #[arg(long, value_name = "F")]
    pub threshold: Option<f64>,

    /// Wall-clock budget for structural matching, in milliseconds.
    #[arg(long, value_name = "N")]
    pub budget_ms: Option<u64>,

    /// Score sibling groups on a single thread.
    #[arg(long)]
    pub sequential: bool,

    /// Report only differences of this kind (repeatable).
    #[arg(long, value_enum, value_name = "K")]
    pub kind: Vec<KindArg>,

    /// Report only differences touching this feature (repeatable).
    #[arg(long, value_name = "NAME")]
    pub feature: Vec<String>,

    /// Report only differences inside the subtree of this left-model node.
    #[arg(long, value_name = "NODE_ID")]
    pub subtree: Option<String>,

    /// Only print the summary line, no per-difference details.
    #[arg(long)]
    pub summary_only: bool,
}

/// All top-level subcommands exposed by the `modelcmp` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare two models and report their differences.
    Diff(DiffArgs),

    /// Print summary statistics for a model.
    Inspect {
        /// Path to a model file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },
}

/// Root CLI struct for the `modelcmp` binary.
///
/// All global flags are marked `global = true` so that clap propagates them
/// to every subcommand.
#[derive(Parser, Debug)]
#[command(
    name = "modelcmp",
    version,
    about = "Structural comparison of attributed object graphs",
    long_about = "Compares two models of nodes with attributes and references,\n\
                  matching nodes by identity and structure, and reports\n\
                  added, deleted, changed and moved elements."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress all stderr output except errors (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug logging and a report header with roots and match counts
    /// (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `MODELCMP_MAX_FILE_SIZE` environment variable.
    /// Default: 268435456 (256 MB).
    #[arg(
        long,
        global = true,
        env = "MODELCMP_MAX_FILE_SIZE",
        default_value = "268435456"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in human output.
    ///
    /// A set `NO_COLOR` environment variable (any value, per
    /// <https://no-color.org>) has the same effect.
    #[arg(long, global = true)]
    pub no_color: bool,
}
