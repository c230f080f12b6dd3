//! Resolution of the two model arguments of `modelcmp diff`.
use std::path::Path;

use crate::PathOrStdin;
use crate::error::CliError;

/// File name of the default left model inside the models directory.
pub const DEFAULT_LEFT: &str = "source.json";

/// File name of the default right model inside the models directory.
pub const DEFAULT_RIGHT: &str = "target.json";

/// Fills omitted model arguments from `models_dir`.
///
/// A relative `models_dir` stays relative, so it resolves against the
/// working directory when the files are opened.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgument`] if both sides read stdin.
pub fn resolve_pair(
    left: Option<&PathOrStdin>,
    right: Option<&PathOrStdin>,
    models_dir: &Path,
) -> Result<(PathOrStdin, PathOrStdin), CliError> {
    let left = left
        .cloned()
        .unwrap_or_else(|| PathOrStdin::Path(models_dir.join(DEFAULT_LEFT)));
    let right = right
        .cloned()
        .unwrap_or_else(|| PathOrStdin::Path(models_dir.join(DEFAULT_RIGHT)));

    if left == PathOrStdin::Stdin && right == PathOrStdin::Stdin {
        return Err(CliError::InvalidArgument {
            detail: "only one model can be read from stdin".to_owned(),
        });
    }
    Ok((left, right))
}
