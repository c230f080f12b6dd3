mod cli;
mod cmd;
mod error;
mod format;
mod io;
mod logging;
mod paths;

use clap::Parser as _;

pub use cli::{Cli, Command, OutputFormat, PathOrStdin};

use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    let colors = format::colors_enabled(cli.no_color);
    logging::init(cli.quiet, cli.verbose, format::log_colors_enabled(cli.no_color));

    if let Err(e) = run(&cli, colors) {
        match e {
            CliError::DiffHasDifferences => {}
            CliError::FileNotFound { .. }
            | CliError::PermissionDenied { .. }
            | CliError::FileTooLarge { .. }
            | CliError::InvalidUtf8 { .. }
            | CliError::StdinReadError { .. }
            | CliError::IoError { .. }
            | CliError::ParseFailed { .. }
            | CliError::InvalidArgument { .. }
            | CliError::CompareFailed { .. } => eprintln!("{}", e.message()),
        }
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli, colors: bool) -> Result<(), CliError> {
    match &cli.command {
        Command::Diff(args) => cmd::diff::run(
            args,
            cmd::diff::Output {
                format: cli.format,
                verbose: cli.verbose,
                colors,
                max_file_size: cli.max_file_size,
            },
        ),
        Command::Inspect { file } => cmd::inspect::run(file, cli.format, cli.max_file_size),
    }
}
