//! Literate-script preprocessing.
//!
//! Curry sources come in a plain (`.curry`) and a literate (`.lcurry`)
//! flavour. In a literate script only lines starting with `>` in the first
//! column are program text; everything else is commentary. This crate strips
//! the literate markers and enforces the spacing rules between program and
//! comment lines. For plain sources the preprocessor is the identity.

use curry_diagnostics::{LiterateError, Position};
use std::path::Path;

/// The kind of a source file, classified by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A plain `.curry` module.
    Curry,
    /// A literate `.lcurry` module.
    LiterateCurry,
    /// A compiled `.icurry` interface.
    Interface,
}

impl SourceKind {
    /// Classify a file path by its extension, if it is one of ours.
    #[must_use]
    pub fn of_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "curry" => Some(Self::Curry),
            "lcurry" => Some(Self::LiterateCurry),
            "icurry" => Some(Self::Interface),
            _ => None,
        }
    }
}

/// Check whether a file name has the literate extension.
#[must_use]
pub fn is_literate(file: &str) -> bool {
    SourceKind::of_path(Path::new(file)) == Some(SourceKind::LiterateCurry)
}

/// Normalize LF, CR and CRLF line endings to LF.
#[must_use]
pub fn normalize_newlines(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// Classification of one literate source line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    /// A `>` line; the payload is the text after the marker.
    Program(u32, &'a str),
    Blank,
    Comment,
}

fn classify(number: u32, line: &str) -> Line<'_> {
    if let Some(rest) = line.strip_prefix('>') {
        Line::Program(number, rest)
    } else if line.chars().all(char::is_whitespace) {
        Line::Blank
    } else {
        Line::Comment
    }
}

/// Strip the literate markers from a literate source.
///
/// Returns the program payloads joined by newlines. Fails if the script
/// contains no program line at all, or if a program line is directly
/// adjacent to a comment line.
pub fn unlit(file: &str, source: &str) -> Result<String, LiterateError> {
    let lines: Vec<Line<'_>> = source
        .lines()
        .enumerate()
        .map(|(i, l)| classify(i as u32 + 1, l))
        .collect();

    if !lines.iter().any(|l| matches!(l, Line::Program(..))) {
        return Err(LiterateError::NoCode {
            position: Position::new(file, 1, 1),
        });
    }

    for (i, line) in lines.iter().enumerate() {
        if let Line::Program(number, _) = line {
            let position = Position::new(file, *number, 1);
            if i > 0 && lines[i - 1] == Line::Comment {
                return Err(LiterateError::PrecededByComment { position });
            }
            if i + 1 < lines.len() && lines[i + 1] == Line::Comment {
                return Err(LiterateError::FollowedByComment { position });
            }
        }
    }

    let code: Vec<&str> = lines
        .iter()
        .filter_map(|l| match l {
            Line::Program(_, code) => Some(*code),
            _ => None,
        })
        .collect();
    Ok(code.join("\n"))
}

/// Run the preprocessor for a source file: normalize newlines and, for
/// literate files, strip the literate markers.
pub fn preprocess(file: &str, source: &str) -> Result<String, LiterateError> {
    let source = normalize_newlines(source);
    if is_literate(file) {
        unlit(file, &source)
    } else {
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_is_identity() {
        let src = "f = 1\n";
        assert_eq!(preprocess("M.curry", src).unwrap(), src);
    }

    #[test]
    fn test_newline_normalization() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_unlit_strips_markers() {
        let src = "Some prose.\n\n> f = 1\n> g = 2\n\nMore prose.\n";
        assert_eq!(unlit("M.lcurry", src).unwrap(), " f = 1\n g = 2");
    }

    #[test]
    fn test_unlit_no_code() {
        let err = unlit("M.lcurry", "only prose\n").unwrap_err();
        assert!(matches!(err, LiterateError::NoCode { .. }));
        assert_eq!(err.message().to_string(), "M.lcurry:1.1: No code in literate script");
    }

    #[test]
    fn test_unlit_adjacent_comment() {
        let src = "> f = 1\na comment with no blank line above\n> g = 2\n";
        let err = unlit("M.lcurry", src).unwrap_err();
        match &err {
            LiterateError::FollowedByComment { position } => {
                assert_eq!(position.line(), Some(1));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let src = "prose\n> f = 1\n";
        let err = unlit("M.lcurry", src).unwrap_err();
        match &err {
            LiterateError::PrecededByComment { position } => {
                assert_eq!(position.line(), Some(2));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_source_kind() {
        assert!(is_literate("dir/M.lcurry"));
        assert!(!is_literate("dir/M.curry"));
        assert_eq!(SourceKind::of_path(Path::new("I.icurry")), Some(SourceKind::Interface));
        assert_eq!(SourceKind::of_path(Path::new("x.hs")), None);
    }
}
