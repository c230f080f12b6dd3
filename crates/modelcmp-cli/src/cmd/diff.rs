//! Implementation of `modelcmp diff [LEFT] [RIGHT]`.
//!
//! Loads both models, matches and compares them, and writes the report to
//! stdout. Matching behavior is tuned with `--identity-key`, `--threshold`,
//! `--budget-ms` and `--sequential`; `--kind`, `--feature` and `--subtree`
//! select which differences are reported.
//!
//! Exit codes:
//! - 0 = no selected differences
//! - 1 = selected differences found
//! - 2 = a model could not be read or parsed, or an argument is invalid
//! - 3 = matching or extraction failed
use std::io::Write as _;
use std::time::Duration;

use modelcmp_core::{
    DiffFilter, Graph, MatchConfig, NodeId, ReportFormat, ReportOptions, Side,
    compare_with_config, render,
};

use crate::cli::DiffArgs;
use crate::error::CliError;
use crate::format::colorize_report;
use crate::io::load_pair;
use crate::paths::resolve_pair;
use crate::{OutputFormat, PathOrStdin};

/// Global settings that shape the report.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// Report format.
    pub format: OutputFormat,
    /// Include the header with roots and match counts.
    pub verbose: bool,
    /// Paint kind tokens in human output.
    pub colors: bool,
    /// Input size limit in bytes.
    pub max_file_size: u64,
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Runs the `diff` command.
///
/// # Errors
///
/// - [`CliError::DiffHasDifferences`] when the report selects any difference.
/// - [`CliError::CompareFailed`] when matching or extraction fails.
/// - Input errors from loading either model, and
///   [`CliError::InvalidArgument`] for an out-of-range `--threshold`, an
///   unusable `--subtree` or two stdin inputs.
pub fn run(args: &DiffArgs, output: Output) -> Result<(), CliError> {
    let config = match_config(args)?;
    let (left_source, right_source) =
        resolve_pair(args.left.as_ref(), args.right.as_ref(), &args.models_dir)?;
    tracing::info!(
        left = %left_source.label(),
        right = %right_source.label(),
        "comparing models"
    );
    let (left, right) = load_pair(&left_source, &right_source, output.max_file_size)?;

    let filter = diff_filter(args, &left)?;

    let result = compare_with_config(&left, &right, &config).map_err(|e| {
        CliError::CompareFailed {
            detail: e.to_string(),
        }
    })?;

    let options = ReportOptions {
        format: match output.format {
            OutputFormat::Human => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        },
        verbose: output.verbose,
        summary_only: args.summary_only,
        filter,
    };
    let mut report = render(&result, &options);
    if output.verbose && output.format == OutputFormat::Human {
        report.insert_str(0, &sources_header(&left_source, &right_source));
    }
    if output.colors && output.format == OutputFormat::Human {
        report = colorize_report(&report);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(report.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| CliError::IoError {
            source: "stdout".to_owned(),
            detail: e.to_string(),
        })?;

    if result.filtered(&options.filter).is_empty() {
        Ok(())
    } else {
        Err(CliError::DiffHasDifferences)
    }
}

/// Names the resolved inputs ahead of a verbose text report.
pub fn sources_header(left: &PathOrStdin, right: &PathOrStdin) -> String {
    format!("Left model: {}\nRight model: {}\n", left.label(), right.label())
}

/// Builds the matcher configuration from the command-line flags.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] when `--threshold` is not a number
/// in `0.0..=1.0`.
pub fn match_config(args: &DiffArgs) -> Result<MatchConfig, CliError> {
    if let Some(t) = args.threshold.filter(|t| !(0.0..=1.0).contains(t)) {
        return Err(CliError::InvalidArgument {
            detail: format!("--threshold: {t} is outside 0.0..=1.0"),
        });
    }
    let defaults = MatchConfig::default();
    Ok(MatchConfig {
        identity_keys: if args.identity_key.is_empty() {
            defaults.identity_keys
        } else {
            args.identity_key.clone()
        },
        similarity_threshold: args
            .threshold
            .unwrap_or(defaults.similarity_threshold),
        fallback_budget: args.budget_ms.map(Duration::from_millis),
        parallel: !args.sequential,
        ..defaults
    })
}

/// Builds the difference filter, checking that `--subtree` names a left node.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] when the subtree anchor is empty or
/// not in the left model.
pub fn diff_filter(args: &DiffArgs, left: &Graph) -> Result<DiffFilter, CliError> {
    let subtree = match &args.subtree {
        None => None,
        Some(raw) => {
            let id = NodeId::try_from(raw.as_str()).map_err(|e| CliError::InvalidArgument {
                detail: format!("--subtree: {e}"),
            })?;
            if !left.contains(&id) {
                return Err(CliError::InvalidArgument {
                    detail: format!("--subtree: node {raw:?} is not in the left model"),
                });
            }
            Some((Side::Left, id))
        }
    };
    Ok(DiffFilter {
        kinds: args.kind.iter().map(|k| (*k).into()).collect(),
        features: args.feature.iter().cloned().collect(),
        subtree,
        ..DiffFilter::default()
    })
}
