//! Wire-level diagnostic types shared across the protocol engine.
//!
//! Everything here serializes directly into LSP JSON. Coordinates are
//! zero-based and clamped to non-negative; ranges are always point-like
//! (end is one character past start) because neither the Slim engine nor
//! slim-lint reports reliable end positions.

use serde::{Serialize, Serializer};

/// Severity level for a diagnostic, serialized as the LSP numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    /// Map a textual severity from a lint reporter.
    ///
    /// Unknown labels fall back to `Warning`, matching slim-lint's own
    /// default for unclassified offenses.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "error" | "fatal" => Self::Error,
            "info" | "information" => Self::Information,
            "hint" => Self::Hint,
            _ => Self::Warning,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Point-like range at `(line, character)`.
    ///
    /// Negative inputs (possible after 1-based to 0-based conversion of
    /// tool output that reported line/column 0) clamp to zero. The end
    /// position is always start plus one character on the same line.
    #[must_use]
    pub fn point(line: i64, character: i64) -> Self {
        let line = u32::try_from(line.max(0)).unwrap_or(u32::MAX);
        let character = u32::try_from(character.max(0)).unwrap_or(u32::MAX - 1);
        Self {
            start: Position { line, character },
            end: Position {
                line,
                character: character + 1,
            },
        }
    }
}

/// A positioned, severity-tagged message surfaced to the editor.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

impl Diagnostic {
    /// Construct a point diagnostic from possibly-negative coordinates.
    #[must_use]
    pub fn point(
        severity: Severity,
        source: impl Into<String>,
        message: impl Into<String>,
        line: i64,
        character: i64,
    ) -> Self {
        Self {
            range: Range::point(line, character),
            severity,
            source: source.into(),
            message: message.into(),
        }
    }
}
