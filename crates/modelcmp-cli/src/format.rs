/// Terminal coloring of human-readable reports.
///
/// Colors are disabled when `--no-color` is set, the `NO_COLOR` environment
/// variable is present (per <https://no-color.org>), or the stream is not a
/// TTY.
/// Only the kind token of each numbered difference line is painted; every
/// other byte of the report passes through unchanged.
use std::io::IsTerminal as _;

use modelcmp_core::DifferenceKind;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

fn color_allowed(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none()
}

/// Returns `true` if ANSI color codes should be emitted to stdout.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    color_allowed(no_color_flag) && std::io::stdout().is_terminal()
}

/// Returns `true` if log records written to stderr may carry ANSI codes.
pub fn log_colors_enabled(no_color_flag: bool) -> bool {
    color_allowed(no_color_flag) && std::io::stderr().is_terminal()
}

// ---------------------------------------------------------------------------
// ANSI escape sequences
// ---------------------------------------------------------------------------

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RESET: &str = "\x1b[0m";

fn color_of(kind: DifferenceKind) -> &'static str {
    match kind {
        DifferenceKind::Add => ANSI_GREEN,
        DifferenceKind::Delete => ANSI_RED,
        DifferenceKind::Change => ANSI_YELLOW,
        DifferenceKind::Move => ANSI_CYAN,
    }
}

// ---------------------------------------------------------------------------
// Report painting
// ---------------------------------------------------------------------------

/// Paints the kind token of every `N. KIND ...` line in a text report.
pub fn colorize_report(report: &str) -> String {
    let mut out = String::with_capacity(report.len());
    for line in report.split_inclusive('\n') {
        out.push_str(&colorize_line(line));
    }
    out
}

fn colorize_line(line: &str) -> String {
    let Some((number, rest)) = line.split_once(". ") else {
        return line.to_owned();
    };
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return line.to_owned();
    }
    let token = rest.split(' ').next().unwrap_or_default();
    let Some(kind) = DifferenceKind::ALL
        .iter()
        .copied()
        .find(|k| k.as_str() == token)
    else {
        return line.to_owned();
    };
    let tail = &rest[token.len()..];
    format!(
        "{number}. {}{token}{ANSI_RESET}{tail}",
        color_of(kind)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
