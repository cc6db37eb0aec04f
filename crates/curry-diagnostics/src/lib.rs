//! Source positions, reference tags and diagnostics for the Curry frontend.
//!
//! This crate provides:
//! - Source location tracking (`Position`, `Span`, `SrcRef`)
//! - The in-band message channel (`Message`) used by every pipeline entry point
//! - Typed error enums for the preprocessor, lexer and parser

use miette::{Diagnostic, SourceSpan};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// SrcRef
// ============================================================================

/// An opaque reference into the original source structure.
///
/// References are attached to AST nodes and identifiers after parsing so that
/// later passes can map results back to source locations. They are invisible
/// to comparison: two references always compare equal, order as equal and
/// print as the empty string.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SrcRef(Vec<i64>);

impl SrcRef {
    /// The empty reference, used before reference injection has run.
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Create a reference from its tag list.
    #[must_use]
    pub fn new(tags: Vec<i64>) -> Self {
        Self(tags)
    }

    /// The raw tag list.
    #[must_use]
    pub fn tags(&self) -> &[i64] {
        &self.0
    }
}

impl PartialEq for SrcRef {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for SrcRef {}

impl PartialOrd for SrcRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SrcRef {
    fn cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

impl std::hash::Hash for SrcRef {
    fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {}
}

impl fmt::Display for SrcRef {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

// ============================================================================
// Position
// ============================================================================

/// A position in source code.
///
/// A concrete position carries the file name and 1-based line and column; a
/// position may also exist only as an AST back-reference, or not at all.
/// The attached `SrcRef` is invisible to equality and ordering.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    /// A concrete source position.
    Source {
        #[cfg_attr(feature = "serde", serde(with = "arc_str_serde"))]
        file: Arc<str>,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        src_ref: SrcRef,
    },
    /// A position known only through an AST reference.
    Ast(SrcRef),
    /// No position information.
    NoPos,
}

#[cfg(feature = "serde")]
mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_ref().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<str>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s))
    }
}

impl Position {
    /// The first position of a file: line 1, column 1.
    #[must_use]
    pub fn first(file: impl Into<Arc<str>>) -> Self {
        Self::Source {
            file: file.into(),
            line: 1,
            column: 1,
            src_ref: SrcRef::none(),
        }
    }

    /// Create a concrete position.
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self::Source {
            file: file.into(),
            line,
            column,
            src_ref: SrcRef::none(),
        }
    }

    /// Advance the column by `n`; the identity on non-concrete positions.
    #[must_use]
    pub fn incr(self, n: u32) -> Self {
        match self {
            Self::Source { file, line, column, src_ref } => Self::Source {
                file,
                line,
                column: column + n,
                src_ref,
            },
            other => other,
        }
    }

    /// Advance the column to the next tab stop (every 8th column).
    #[must_use]
    pub fn tab(self) -> Self {
        match self {
            Self::Source { file, line, column, src_ref } => Self::Source {
                file,
                line,
                column: (column + 7) / 8 * 8 + 1,
                src_ref,
            },
            other => other,
        }
    }

    /// Start the next line: column 1, line incremented.
    #[must_use]
    pub fn nl(self) -> Self {
        match self {
            Self::Source { file, line, column: _, src_ref } => Self::Source {
                file,
                line: line + 1,
                column: 1,
                src_ref,
            },
            other => other,
        }
    }

    /// The file of a concrete position.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Source { file, .. } => Some(file),
            _ => None,
        }
    }

    /// The line of a concrete position.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Source { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The column of a concrete position.
    #[must_use]
    pub fn column(&self) -> Option<u32> {
        match self {
            Self::Source { column, .. } => Some(*column),
            _ => None,
        }
    }

    /// Replace the attached source reference.
    #[must_use]
    pub fn with_src_ref(self, src_ref: SrcRef) -> Self {
        match self {
            Self::Source { file, line, column, .. } => Self::Source { file, line, column, src_ref },
            Self::Ast(_) => Self::Ast(src_ref),
            Self::NoPos => Self::NoPos,
        }
    }

    /// Check if this is a concrete position.
    #[must_use]
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }

    /// Choose the best position between two (prefer concrete positions).
    #[must_use]
    pub fn best(self, other: Self) -> Self {
        if self.is_source() {
            self
        } else {
            other
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::NoPos
    }
}

// The SrcRef is invisible to comparison, so Position needs hand-written
// equality, ordering and hashing over the (file, line, column) triple.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Source { file: f1, line: l1, column: c1, .. },
                Self::Source { file: f2, line: l2, column: c2, .. },
            ) => f1 == f2 && l1 == l2 && c1 == c2,
            (Self::Ast(_), Self::Ast(_)) => true,
            (Self::NoPos, Self::NoPos) => true,
            _ => false,
        }
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(p: &Position) -> u8 {
            match p {
                Position::Source { .. } => 0,
                Position::Ast(_) => 1,
                Position::NoPos => 2,
            }
        }
        match (self, other) {
            (
                Self::Source { file: f1, line: l1, column: c1, .. },
                Self::Source { file: f2, line: l2, column: c2, .. },
            ) => f1
                .cmp(f2)
                .then_with(|| l1.cmp(l2))
                .then_with(|| c1.cmp(c2)),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Position {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Source { file, line, column, .. } => {
                0u8.hash(state);
                file.hash(state);
                line.hash(state);
                column.hash(state);
            }
            Self::Ast(_) => 1u8.hash(state),
            Self::NoPos => 2u8.hash(state),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Source { file, line, column, .. } => {
                if file.is_empty() {
                    write!(f, "line {}.{}", line, column)
                } else {
                    write!(f, "{}:{}.{}", file, line, column)
                }
            }
            Position::Ast(_) => write!(f, "<ast position>"),
            Position::NoPos => write!(f, "<unknown position>"),
        }
    }
}

// ============================================================================
// HasPosition
// ============================================================================

/// Trait for types that have an associated source position.
pub trait HasPosition {
    /// Get the position of this value.
    fn get_position(&self) -> Position;
}

impl HasPosition for Position {
    fn get_position(&self) -> Position {
        self.clone()
    }
}

impl<T: HasPosition> HasPosition for Option<T> {
    fn get_position(&self) -> Position {
        match self {
            Some(x) => x.get_position(),
            None => Position::NoPos,
        }
    }
}

impl<T: HasPosition> HasPosition for Vec<T> {
    fn get_position(&self) -> Position {
        self.iter()
            .fold(Position::NoPos, |acc, x| acc.best(x.get_position()))
    }
}

impl<T: HasPosition> HasPosition for Box<T> {
    fn get_position(&self) -> Position {
        (**self).get_position()
    }
}

impl<A: HasPosition, B: HasPosition> HasPosition for (A, B) {
    fn get_position(&self) -> Position {
        self.0.get_position().best(self.1.get_position())
    }
}

// ============================================================================
// Span
// ============================================================================

/// A span in source code (start and end byte offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The empty/unknown span.
    pub const DUMMY: Self = Self { start: 0, end: 0 };

    /// Check if this span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get the length of this span in bytes.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Combine two spans into one that covers both.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start { self.start } else { other.start };
        let end = if self.end > other.end { self.end } else { other.end };
        Self { start, end }
    }

    /// Convert to miette's `SourceSpan`.
    #[must_use]
    pub fn to_source_span(self) -> SourceSpan {
        SourceSpan::new(
            miette::SourceOffset::from(self.start as usize),
            self.len() as usize,
        )
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        span.to_source_span()
    }
}

// ============================================================================
// Message channel
// ============================================================================

/// A diagnostic delivered through the in-band message channel.
///
/// Every pipeline entry point returns its result paired with a list of
/// warning messages; a fatal error is a single message carrying an optional
/// position. Rendered as `<file>:<line>.<column>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub position: Option<Position>,
    pub text: String,
}

impl Message {
    /// A message without a position.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { position: None, text: text.into() }
    }

    /// A message attached to a position.
    #[must_use]
    pub fn at(position: Position, text: impl Into<String>) -> Self {
        Self { position: Some(position), text: text.into() }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(p) if p.is_source() => write!(f, "{}: {}", p, self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}

/// Result of a pipeline entry point: a value and its accumulated warnings,
/// or the first fatal message.
pub type MessageResult<T> = Result<(T, Vec<Message>), Message>;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the literate-script preprocessor.
#[derive(Debug, Error, Diagnostic)]
pub enum LiterateError {
    #[error("No code in literate script")]
    NoCode { position: Position },

    #[error("Program line is preceded by comment line")]
    PrecededByComment { position: Position },

    #[error("Program line is followed by comment line")]
    FollowedByComment { position: Position },
}

impl LiterateError {
    /// The position the error is reported at.
    #[must_use]
    pub fn position(&self) -> &Position {
        match self {
            Self::NoCode { position }
            | Self::PrecededByComment { position }
            | Self::FollowedByComment { position } => position,
        }
    }

    /// Convert into an in-band message.
    #[must_use]
    pub fn message(&self) -> Message {
        Message::at(self.position().clone(), self.to_string())
    }
}

/// Errors raised by the lexer.
#[derive(Debug, Error, Diagnostic)]
pub enum LexError {
    #[error("unexpected character '{char}'")]
    UnexpectedChar {
        char: char,
        position: Position,
        #[label("unexpected character here")]
        span: SourceSpan,
    },

    #[error("unterminated string literal")]
    UnterminatedString {
        position: Position,
        #[label("string starts here")]
        span: SourceSpan,
    },

    #[error("unterminated character literal")]
    UnterminatedChar {
        position: Position,
        #[label("character literal starts here")]
        span: SourceSpan,
    },

    #[error("unterminated nested comment")]
    UnterminatedComment {
        position: Position,
        #[label("comment starts here")]
        span: SourceSpan,
    },

    #[error("invalid escape sequence '\\{sequence}'")]
    InvalidEscape {
        sequence: String,
        position: Position,
        #[label("invalid escape here")]
        span: SourceSpan,
    },

    #[error("invalid numeric literal '{literal}': {reason}")]
    InvalidNumber {
        literal: String,
        reason: String,
        position: Position,
        #[label("invalid literal here")]
        span: SourceSpan,
    },

    #[error("unterminated pragma")]
    UnterminatedPragma {
        position: Position,
        #[label("pragma starts here")]
        span: SourceSpan,
    },
}

impl LexError {
    /// The position the error is reported at.
    #[must_use]
    pub fn position(&self) -> &Position {
        match self {
            Self::UnexpectedChar { position, .. }
            | Self::UnterminatedString { position, .. }
            | Self::UnterminatedChar { position, .. }
            | Self::UnterminatedComment { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::InvalidNumber { position, .. }
            | Self::UnterminatedPragma { position, .. } => position,
        }
    }

    /// Convert into an in-band message.
    #[must_use]
    pub fn message(&self) -> Message {
        Message::at(self.position().clone(), self.to_string())
    }
}

/// Errors raised by the parser.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("unexpected {found}")]
    UnexpectedToken {
        found: String,
        /// Token names that would have been accepted, sorted.
        expected: Vec<String>,
        position: Position,
        #[label("unexpected token here")]
        span: SourceSpan,
    },

    #[error("{label} expected")]
    Expected {
        label: String,
        position: Position,
        #[label("{label} expected here")]
        span: SourceSpan,
    },

    #[error("ambiguous parse")]
    Ambiguous {
        position: Position,
        #[label("both alternatives succeed here")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// The position the error is reported at.
    #[must_use]
    pub fn position(&self) -> &Position {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::Expected { position, .. }
            | Self::Ambiguous { position, .. } => position,
        }
    }

    /// Convert into an in-band message.
    #[must_use]
    pub fn message(&self) -> Message {
        Message::at(self.position().clone(), self.to_string())
    }
}

/// Any failure of the lexing/parsing pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum SyntaxError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    /// The position the error is reported at.
    #[must_use]
    pub fn position(&self) -> &Position {
        match self {
            Self::Lex(e) => e.position(),
            Self::Parse(e) => e.position(),
        }
    }

    /// Convert into an in-band message.
    #[must_use]
    pub fn message(&self) -> Message {
        match self {
            Self::Lex(e) => e.message(),
            Self::Parse(e) => e.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_arithmetic() {
        let p = Position::first("M.curry");
        assert_eq!(p.line(), Some(1));
        assert_eq!(p.column(), Some(1));

        let p = p.incr(4);
        assert_eq!(p.column(), Some(5));

        let p = p.clone().nl();
        assert_eq!(p.line(), Some(2));
        assert_eq!(p.column(), Some(1));
    }

    #[test]
    fn test_tab_stops() {
        for c in 1..=24u32 {
            let p = Position::new("", 1, c).tab();
            let col = p.column().unwrap();
            assert_eq!(col % 8, 1, "tab from column {c} landed on {col}");
            assert!(col > c);
        }
        assert_eq!(Position::new("", 1, 1).tab().column(), Some(9));
        assert_eq!(Position::new("", 1, 8).tab().column(), Some(9));
        assert_eq!(Position::new("", 1, 9).tab().column(), Some(17));
    }

    #[test]
    fn test_src_ref_invisible() {
        let a = Position::new("F", 3, 7).with_src_ref(SrcRef::new(vec![1, 2]));
        let b = Position::new("F", 3, 7).with_src_ref(SrcRef::new(vec![9]));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(SrcRef::new(vec![1]).to_string(), "");
    }

    #[test]
    fn test_message_format() {
        let m = Message::at(Position::new("Foo.curry", 2, 5), "then expected");
        assert_eq!(m.to_string(), "Foo.curry:2.5: then expected");

        let m = Message::new("no input");
        assert_eq!(m.to_string(), "no input");
    }
}
