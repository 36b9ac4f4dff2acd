//! Diagnostic types for lint results.
//!
//! Positions are 0-indexed. Columns count UTF-16 code units, which is what
//! ESLint reports and what editors built on JavaScript strings expect.

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

impl Severity {
    /// Maps an ESLint numeric severity (2 = error, 1 = warning).
    pub fn from_eslint(level: u8) -> Self {
        match level {
            2 => Severity::Error,
            1 => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// A position in source text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number (0-indexed).
    pub line: u32,
    /// Column number (0-indexed, UTF-16 code units).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A range in source text. `start <= end` always holds for ranges built here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Range {
    /// Creates a new range, swapping the ends if they are out of order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Shorthand for a range given as `((line, col), (line, col))`.
    pub fn from_tuples(start: (u32, u32), end: (u32, u32)) -> Self {
        Self::new(
            Position::new(start.0, start.1),
            Position::new(end.0, end.1),
        )
    }
}

/// An auto-fix for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fix {
    /// The range to replace.
    pub range: Range,

    /// The replacement text.
    pub text: String,
}

impl Fix {
    /// Creates a new fix.
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// One finding reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    #[serde(default)]
    pub severity: Severity,

    /// The diagnostic message.
    pub message: String,

    /// The rule that generated this diagnostic. `None` for parse errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// Location of the finding.
    pub range: Range,

    /// Optional fix for this diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn new(rule_id: Option<String>, message: impl Into<String>, range: Range) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            rule_id,
            range,
            fix: None,
        }
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets an auto-fix.
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

/// Line table over a text, for mapping ESLint locations onto ranges.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Line contents without terminators.
    lines: Vec<Vec<u16>>,
    /// UTF-16 offset of the first unit of each line.
    starts: Vec<usize>,
}

impl LineIndex {
    /// Builds the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut starts = Vec::new();
        let mut offset = 0usize;

        for raw in text.split_inclusive('\n') {
            starts.push(offset);
            offset += raw.encode_utf16().count();
            let content = raw
                .strip_suffix('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l))
                .unwrap_or(raw);
            lines.push(content.encode_utf16().collect());
        }

        // A trailing newline (or an empty text) opens one more, empty line.
        if text.is_empty() || text.ends_with('\n') {
            starts.push(offset);
            lines.push(Vec::new());
        }

        Self { lines, starts }
    }

    /// Number of lines.
    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Length of a line in UTF-16 units, `None` past the last line.
    pub fn line_len(&self, line: u32) -> Option<u32> {
        self.lines.get(line as usize).map(|l| l.len() as u32)
    }

    /// Maps a UTF-16 offset into the text onto a position, clamped to the text.
    pub fn position_at(&self, offset: usize) -> Position {
        let line = self
            .starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = (offset - self.starts[line]).min(self.lines[line].len());
        Position::new(line as u32, column as u32)
    }

    /// Clamps a position to the bounds of the text.
    pub fn clamp(&self, position: Position) -> Position {
        let last = self.line_count().saturating_sub(1);
        if position.line > last {
            return Position::new(last, self.line_len(last).unwrap_or(0));
        }
        let len = self.line_len(position.line).unwrap_or(0);
        Position::new(position.line, position.column.min(len))
    }

    /// Whether `range` lies fully inside the text.
    pub fn contains(&self, range: &Range) -> bool {
        range.start <= range.end
            && self.clamp(range.start) == range.start
            && self.clamp(range.end) == range.end
    }

    /// Range of the identifier-like token starting at `position`, or of a
    /// single unit when there is none. Used when ESLint gives no end location.
    pub fn token_range(&self, position: Position) -> Range {
        let start = self.clamp(position);
        let line = &self.lines[start.line as usize];
        let mut end = start.column as usize;
        while end < line.len() && is_word_unit(line[end]) {
            end += 1;
        }
        if end == start.column as usize {
            end = (end + 1).min(line.len());
        }
        Range::new(start, Position::new(start.line, end as u32))
    }

    /// Range covering a whole line.
    pub fn line_range(&self, line: u32) -> Range {
        let start = self.clamp(Position::new(line, 0));
        let len = self.line_len(start.line).unwrap_or(0);
        Range::new(start, Position::new(start.line, len))
    }
}

fn is_word_unit(unit: u16) -> bool {
    char::from_u32(unit as u32).is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
