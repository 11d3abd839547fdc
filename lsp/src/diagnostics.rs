//! Diagnostics aggregation: the syntax check and the linter feed one
//! combined list, syntax first, lint second, in producer order.
//!
//! No deduplication and no sorting — the publish order is the producer
//! order. Reordering by position is deliberately left alone until
//! client-side expectations are confirmed.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Settings;
use crate::engine::SyntaxEngine;
use crate::lint::LintRunner;
use crate::protocol;
use crate::types::{Diagnostic, Severity};

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)line\s+(\d+)").expect("valid line regex"));
static COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)column\s+(\d+)").expect("valid column regex"));

/// Best-effort locator over a free-text engine error.
///
/// Looks for `Line <n>` and `Column <n>` (case-insensitive, first match
/// wins) and converts to zero-based coordinates. Absent markers default
/// to `(0, 0)` — a diagnostic with a rough position beats none at all.
/// Fragile against upstream message-format changes by nature.
pub(crate) fn locate_error(message: &str) -> (i64, i64) {
    let line = LINE_RE
        .captures(message)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .map_or(0, |n| n - 1);
    let column = COLUMN_RE
        .captures(message)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .map_or(0, |n| n - 1);
    (line, column)
}

/// Run the syntax check. Success is an empty list; failure is exactly
/// one Error-severity diagnostic sourced "slim".
pub(crate) fn syntax_diagnostics(engine: &mut dyn SyntaxEngine, text: &str) -> Vec<Diagnostic> {
    match engine.check(text) {
        Ok(()) => Vec::new(),
        Err(e) => {
            let (line, column) = locate_error(&e.message);
            vec![Diagnostic::point(
                Severity::Error,
                "slim",
                e.message,
                line,
                column,
            )]
        }
    }
}

/// Produce the full diagnostics list for one document.
///
/// The lint pass is skipped when linting is disabled or when the URI
/// does not resolve to a filesystem path (untitled buffers).
pub(crate) async fn collect(
    engine: &mut dyn SyntaxEngine,
    linter: &mut LintRunner,
    settings: &Settings,
    uri: &str,
    text: &str,
) -> Vec<Diagnostic> {
    let mut diagnostics = syntax_diagnostics(engine, text);

    let lint_settings = settings.linting();
    if lint_settings.enabled {
        let path = protocol::uri_to_path(uri);
        if !path.is_empty() {
            diagnostics.extend(linter.run(&lint_settings, &path, text).await);
        }
    }

    diagnostics
}
