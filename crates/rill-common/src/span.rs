use serde::{Deserialize, Serialize};

/// Source position within a file (1-based line/column, 0-based byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// 0-based byte offset from start of file.
    pub offset: u32,
}

/// A range in source code, from `start` to `end` in a given file.
///
/// The parser stamps one of these on every AST node; spans survive the
/// JSON round trip so the analyzer can point errors back at source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Source file path.
    pub file: String,
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// Create a dummy span for synthetic nodes (builtins, tests).
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Whether this span carries no real location.
    pub fn is_dummy(&self) -> bool {
        self.file.is_empty() && self.start.offset == 0 && self.end.offset == 0
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file, self.start.line, self.start.column
        )
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
