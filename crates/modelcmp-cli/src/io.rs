/// Model loading: file and stdin reading with size enforcement, UTF-8
/// validation and parsing.
///
/// This module is the single entry point for input I/O in the `modelcmp`
/// binary. `modelcmp-core` never touches the filesystem.
///
/// - Disk files: size checked via `std::fs::metadata` before any read.
/// - Stdin: buffered with a `Read::take` cap so allocation is bounded.
/// - Both models of a comparison are loaded concurrently with `rayon::join`.
use std::io::Read as _;
use std::path::Path;

use modelcmp_core::{Graph, parse_model};

use crate::PathOrStdin;
use crate::error::CliError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads the entire contents of `source` into a `String`.
///
/// # Errors
///
/// Returns [`CliError`] (exit code 2) for a missing or unreadable file, an
/// input over `max_size` bytes, or invalid UTF-8.
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    match source {
        PathOrStdin::Path(path) => read_file(path, max_size),
        PathOrStdin::Stdin => read_stdin(max_size),
    }
}

/// Reads and parses one model.
///
/// # Errors
///
/// Everything [`read_input`] reports, plus [`CliError::ParseFailed`] when
/// the text is not a valid model document.
pub fn load_model(source: &PathOrStdin, max_size: u64) -> Result<Graph, CliError> {
    let text = read_input(source, max_size)?;
    let graph = parse_model(&text).map_err(|e| CliError::ParseFailed {
        source: source.label(),
        detail: e.to_string(),
    })?;
    tracing::debug!(
        source = %source.label(),
        nodes = graph.node_count(),
        "loaded model"
    );
    Ok(graph)
}

/// Loads the left and right models concurrently.
///
/// # Errors
///
/// Returns the left model's error if both fail.
pub fn load_pair(
    left: &PathOrStdin,
    right: &PathOrStdin,
    max_size: u64,
) -> Result<(Graph, Graph), CliError> {
    let (left, right) = rayon::join(
        || load_model(left, max_size),
        || load_model(right, max_size),
    );
    Ok((left?, right?))
}

// ---------------------------------------------------------------------------
// Disk file reading
// ---------------------------------------------------------------------------

/// Reads a disk file, enforcing the size limit and UTF-8 requirement.
fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(&bytes, &path.display().to_string())
}

/// Maps a `std::io::Error` arising from a disk-file operation to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == std::io::ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == std::io::ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stdin reading
// ---------------------------------------------------------------------------

/// Reads the entire stdin stream, capped at `max_size` bytes.
///
/// If the stream produces exactly `max_size` bytes one more byte is probed
/// to distinguish "at the limit" from "over the limit".
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let stdin = std::io::stdin();
    let mut handle = stdin.lock();
    let mut buf: Vec<u8> = Vec::new();

    (&mut handle)
        .take(max_size)
        .read_to_end(&mut buf)
        .map_err(|e| CliError::StdinReadError {
            detail: e.to_string(),
        })?;

    if buf.len() as u64 == max_size {
        let mut probe = [0u8; 1];
        let extra = handle
            .read(&mut probe)
            .map_err(|e| CliError::StdinReadError {
                detail: e.to_string(),
            })?;
        if extra > 0 {
            return Err(CliError::FileTooLarge {
                source: "-".to_owned(),
                limit: max_size,
                actual: None,
            });
        }
    }

    bytes_to_string(&buf, "-")
}

// ---------------------------------------------------------------------------
// UTF-8 conversion
// ---------------------------------------------------------------------------

/// Converts a byte buffer to a `String`, reporting the offset of the first
/// invalid sequence on failure.
fn bytes_to_string(bytes: &[u8], source_label: &str) -> Result<String, CliError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| CliError::InvalidUtf8 {
            source: source_label.to_owned(),
            byte_offset: e.valid_up_to(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use std::io::Write as _;
    use std::path::PathBuf;

    use super::*;

    const MODEL: &str = r#"{ "nodes": [ { "id": "x", "type": "Book" } ] }"#;

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(content).expect("write");
        f
    }

    fn path_of(f: &tempfile::NamedTempFile) -> PathOrStdin {
        PathOrStdin::Path(f.path().to_path_buf())
    }

    #[test]
    fn reads_file_within_limit() {
        let f = temp_file(MODEL.as_bytes());
        let text = read_input(&path_of(&f), 1024).expect("read");
        assert_eq!(text, MODEL);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let source = PathOrStdin::Path(PathBuf::from("/nonexistent/model.json"));
        let err = read_input(&source, 1024).expect_err("missing");
        assert!(matches!(err, CliError::FileNotFound { .. }), "{err:?}");
    }

    #[test]
    fn oversized_file_reports_sizes() {
        let f = temp_file(&[b' '; 64]);
        let err = read_input(&path_of(&f), 16).expect_err("too large");
        let CliError::FileTooLarge { limit, actual, .. } = err else {
            panic!("expected FileTooLarge, got {err:?}");
        };
        assert_eq!(limit, 16);
        assert_eq!(actual, Some(64));
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let f = temp_file(b"{ \"a\": \xff }");
        let err = read_input(&path_of(&f), 1024).expect_err("invalid utf-8");
        let CliError::InvalidUtf8 { byte_offset, .. } = err else {
            panic!("expected InvalidUtf8, got {err:?}");
        };
        assert_eq!(byte_offset, 7);
    }

    #[test]
    fn load_model_parses() {
        let f = temp_file(MODEL.as_bytes());
        let graph = load_model(&path_of(&f), 1024).expect("load");
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn load_model_reports_parse_failure_with_source() {
        let f = temp_file(br#"{ "nodes": [] }"#);
        let source = path_of(&f);
        let err = load_model(&source, 1024).expect_err("empty model");
        let CliError::ParseFailed { source: label, .. } = &err else {
            panic!("expected ParseFailed, got {err:?}");
        };
        assert_eq!(*label, source.label());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_pair_loads_both_sides() {
        let left = temp_file(MODEL.as_bytes());
        let right = temp_file(MODEL.as_bytes());
        let (l, r) = load_pair(&path_of(&left), &path_of(&right), 1024).expect("load");
        assert_eq!(l.node_count(), r.node_count());
    }

    #[test]
    fn load_pair_prefers_left_error() {
        let source = PathOrStdin::Path(PathBuf::from("/nonexistent/left.json"));
        let other = PathOrStdin::Path(PathBuf::from("/nonexistent/right.json"));
        let err = load_pair(&source, &other, 1024).expect_err("missing");
        let CliError::FileNotFound { path } = err else {
            panic!("expected FileNotFound");
        };
        assert_eq!(path, PathBuf::from("/nonexistent/left.json"));
    }
}
