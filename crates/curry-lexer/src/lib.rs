//! Hand-written lexer for Curry source files.
//!
//! # Architecture
//!
//! The lexer is a streaming, character-by-character scanner that the parser
//! pulls tokens from one at a time. It owns the layout context stack: the
//! parser's layout combinators push and pop entries, and the lexer consults
//! the stack whenever it is about to deliver the first token of a new
//! logical line, inserting virtual semicolons and virtual closing braces
//! according to the layout rule. Key features:
//!
//! - Column tracking with tab stops at every 8th column
//! - Nested block comments and end-of-line comments
//! - Qualified identifiers and operators (`M.x`, `M.N.x`, `M.+`)
//! - Arbitrary precision integers (using `BigInt`), float literals with
//!   exponents, character and string literals with escape sequences
//! - `LANGUAGE` and `OPTIONS` pragmas; unknown pragmas are skipped
//!
//! The source is kept as a reference-counted string with a byte index so a
//! lexer snapshot is a cheap clone, which the parser's longest-match
//! alternative relies on.

mod token;

pub use token::{Category, Token, TokenKind};

use curry_diagnostics::{LexError, Position, Span};
use curry_syntax::OrderedFloat;
use num_bigint::BigInt;
use num_traits::Num;
use smol_str::SmolStr;
use std::rc::Rc;
use std::sync::Arc;

pub type LexResult<T> = Result<T, LexError>;

const TAB_STOP: u32 = 8;

/// The sentinel pushed for an explicit-brace context; it disables the
/// layout rule until popped.
pub const NO_LAYOUT: i32 = -1;

#[derive(Debug, Clone)]
pub struct Lexer {
    source: Rc<str>,
    file: Arc<str>,
    pos: usize,
    line: u32,
    column: u32,
    /// Beginning of a logical line: a newline was crossed since the last
    /// delivered token.
    bol: bool,
    layout: Vec<i32>,
}

impl Lexer {
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, source: &str) -> Self {
        Self {
            source: Rc::from(source),
            file: file.into(),
            pos: 0,
            line: 1,
            column: 1,
            bol: false,
            layout: Vec::new(),
        }
    }

    /// The position of the next character to be consumed.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column)
    }

    /// The current byte offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    // ========================================================================
    // Layout context stack
    // ========================================================================

    /// Open a layout context at the given column (or `NO_LAYOUT`).
    pub fn push_context(&mut self, column: i32) {
        self.layout.push(column);
    }

    /// Close the innermost context.
    pub fn pop_context(&mut self) -> Option<i32> {
        self.layout.pop()
    }

    /// The innermost context, if any.
    #[must_use]
    pub fn top_context(&self) -> Option<i32> {
        self.layout.last().copied()
    }

    /// The number of open contexts.
    #[must_use]
    pub fn context_depth(&self) -> usize {
        self.layout.len()
    }

    // ========================================================================
    // Character primitives
    // ========================================================================

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(ch) = c {
            self.pos += ch.len_utf8();
            match ch {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                    self.bol = true;
                }
                '\t' => {
                    self.column = (self.column + TAB_STOP - 1) / TAB_STOP * TAB_STOP + 1;
                }
                _ => {
                    self.column += 1;
                }
            }
        }
        c
    }

    // ========================================================================
    // Whitespace and comments
    // ========================================================================

    fn is_line_comment_start(&self) -> bool {
        if self.peek() != Some('-') || self.peek_at(1) != Some('-') {
            return false;
        }
        // Two or more dashes start a comment unless the run continues with
        // another symbol character, which makes the whole run an operator.
        let mut n = 2;
        while self.peek_at(n) == Some('-') {
            n += 1;
        }
        match self.peek_at(n) {
            Some(c) => !is_symbol_char(c),
            None => true,
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> LexResult<()> {
        let start_pos = self.position();
        let start = self.pos as u32;
        self.advance();
        self.advance();

        let mut depth = 1;
        while depth > 0 {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedComment {
                        position: start_pos,
                        span: Span::new(start, self.pos as u32).into(),
                    });
                }
                Some('{') if self.peek_at(1) == Some('-') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some('-') if self.peek_at(1) == Some('}') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    fn skip_whitespace_and_comments(&mut self) -> LexResult<()> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('-') if self.is_line_comment_start() => {
                    self.skip_line_comment();
                }
                Some('{') if self.peek_at(1) == Some('-') && self.peek_at(2) != Some('#') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    // ========================================================================
    // Token delivery with the layout rule
    // ========================================================================

    fn virtual_token(&self, kind: TokenKind) -> Token {
        let offset = self.pos as u32;
        Token::new(kind, Span::new(offset, offset), self.position())
    }

    /// Deliver the next token, applying the layout rule.
    pub fn next_token(&mut self) -> LexResult<Token> {
        loop {
            self.skip_whitespace_and_comments()?;

            if self.peek().is_none() {
                // Drain the stack: one virtual closing brace per layout
                // context, then end of file.
                while let Some(top) = self.layout.pop() {
                    if top >= 0 {
                        return Ok(self.virtual_token(TokenKind::VRBrace));
                    }
                }
                return Ok(self.virtual_token(TokenKind::Eof));
            }

            if self.bol {
                if let Some(top) = self.top_context() {
                    if top >= 0 {
                        let column = self.column as i32;
                        if column < top {
                            self.layout.pop();
                            return Ok(self.virtual_token(TokenKind::VRBrace));
                        }
                        if column == top {
                            self.bol = false;
                            return Ok(self.virtual_token(TokenKind::VSemi));
                        }
                    }
                }
                self.bol = false;
            }

            if self.peek() == Some('{') && self.peek_at(1) == Some('-') && self.peek_at(2) == Some('#') {
                match self.lex_pragma()? {
                    Some(token) => return Ok(token),
                    None => continue,
                }
            }

            return self.lex_token();
        }
    }

    /// Lex the whole input, without any layout contexts.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    // ========================================================================
    // Individual token lexers
    // ========================================================================

    fn make_token(&self, kind: TokenKind, start: u32, position: Position) -> Token {
        Token::new(kind, Span::new(start, self.pos as u32), position)
    }

    fn lex_token(&mut self) -> LexResult<Token> {
        let start = self.pos as u32;
        let position = self.position();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(self.virtual_token(TokenKind::Eof)),
        };

        let kind = match c {
            '#' if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('}') => {
                self.advance();
                self.advance();
                self.advance();
                TokenKind::PragmaEnd
            }
            '(' => { self.advance(); TokenKind::LParen }
            ')' => { self.advance(); TokenKind::RParen }
            '[' => { self.advance(); TokenKind::LBracket }
            ']' => { self.advance(); TokenKind::RBracket }
            '{' => { self.advance(); TokenKind::LBrace }
            '}' => { self.advance(); TokenKind::RBrace }
            ',' => { self.advance(); TokenKind::Comma }
            ';' => { self.advance(); TokenKind::Semi }
            '`' => { self.advance(); TokenKind::Backtick }
            '_' if !self.peek_at(1).is_some_and(is_ident_char) => {
                self.advance();
                TokenKind::Underscore
            }
            '\'' => self.lex_char()?,
            '"' => self.lex_string()?,
            c if c.is_ascii_digit() => self.lex_number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
            c if is_symbol_char(c) => {
                let text = self.lex_symbol_run();
                classify_symbol(&text)
            }
            c => {
                self.advance();
                return Err(LexError::UnexpectedChar {
                    char: c,
                    position,
                    span: Span::new(start, self.pos as u32).into(),
                });
            }
        };

        Ok(self.make_token(kind, start, position))
    }

    fn lex_word(&mut self) -> SmolStr {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.advance();
        }
        SmolStr::new(&self.source[start..self.pos])
    }

    fn lex_symbol_run(&mut self) -> SmolStr {
        let start = self.pos;
        while self.peek().is_some_and(is_symbol_char) {
            self.advance();
        }
        SmolStr::new(&self.source[start..self.pos])
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let word = self.lex_word();

        if !word.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return keyword_or_var(word);
        }

        // An uppercase identifier may start a dotted qualified name. The dot
        // counts as a qualifier separator only when it is directly adjacent
        // to what follows.
        let mut path: Vec<SmolStr> = Vec::new();
        let mut last = word;
        loop {
            if self.peek() != Some('.') {
                break;
            }
            match self.peek_at(1) {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    self.advance();
                    path.push(last);
                    last = self.lex_word();
                    if !last.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                        return TokenKind::QVarId(join_path(&path), last);
                    }
                }
                Some(c) if is_symbol_char(c) => {
                    self.advance();
                    path.push(last);
                    let sym = self.lex_symbol_run();
                    return if sym.starts_with(':') {
                        TokenKind::QConSym(join_path(&path), sym)
                    } else {
                        TokenKind::QVarSym(join_path(&path), sym)
                    };
                }
                _ => break,
            }
        }

        if path.is_empty() {
            TokenKind::ConId(last)
        } else {
            TokenKind::QConId(join_path(&path), last)
        }
    }

    fn lex_number(&mut self) -> LexResult<TokenKind> {
        let start = self.pos;
        let position = self.position();

        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let digit_start = self.pos;
                while self.peek().is_some_and(|c| c.is_digit(radix)) {
                    self.advance();
                }
                let digits = &self.source[digit_start..self.pos];
                if digits.is_empty() {
                    return Err(LexError::InvalidNumber {
                        literal: self.source[start..self.pos].to_string(),
                        reason: format!("expected base-{radix} digits"),
                        position,
                        span: Span::new(start as u32, self.pos as u32).into(),
                    });
                }
                let value = BigInt::from_str_radix(digits, radix).map_err(|_| {
                    LexError::InvalidNumber {
                        literal: self.source[start..self.pos].to_string(),
                        reason: format!("invalid base-{radix} integer literal"),
                        position: position.clone(),
                        span: Span::new(start as u32, self.pos as u32).into(),
                    }
                })?;
                return Ok(TokenKind::Int(value));
            }
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let has_exponent = match self.peek_at(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start..self.pos];
        if is_float {
            let value: f64 = text.parse().map_err(|_| LexError::InvalidNumber {
                literal: text.to_string(),
                reason: "invalid float literal".to_string(),
                position: position.clone(),
                span: Span::new(start as u32, self.pos as u32).into(),
            })?;
            Ok(TokenKind::Float(OrderedFloat::new(value)))
        } else {
            let value = BigInt::from_str_radix(text, 10).map_err(|_| LexError::InvalidNumber {
                literal: text.to_string(),
                reason: "invalid integer literal".to_string(),
                position: position.clone(),
                span: Span::new(start as u32, self.pos as u32).into(),
            })?;
            Ok(TokenKind::Int(value))
        }
    }

    fn lex_char(&mut self) -> LexResult<TokenKind> {
        let start_pos = self.position();
        let start = self.pos as u32;
        self.advance();

        let c = match self.peek() {
            None | Some('\n') | Some('\'') => {
                return Err(LexError::UnterminatedChar {
                    position: start_pos,
                    span: Span::new(start, self.pos as u32).into(),
                });
            }
            Some('\\') => {
                self.advance();
                self.lex_escape(start_pos.clone(), start)?
            }
            Some(c) => {
                self.advance();
                c
            }
        };

        if self.peek() != Some('\'') {
            return Err(LexError::UnterminatedChar {
                position: start_pos,
                span: Span::new(start, self.pos as u32).into(),
            });
        }
        self.advance();
        Ok(TokenKind::Char(c))
    }

    fn lex_string(&mut self) -> LexResult<TokenKind> {
        let start_pos = self.position();
        let start = self.pos as u32;
        self.advance();

        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString {
                        position: start_pos,
                        span: Span::new(start, self.pos as u32).into(),
                    });
                }
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        // \& is the empty escape
                        Some('&') => {
                            self.advance();
                        }
                        // A gap: backslash, whitespace, backslash
                        Some(c) if c.is_whitespace() => {
                            while self.peek().is_some_and(char::is_whitespace) {
                                self.advance();
                            }
                            if self.peek() != Some('\\') {
                                return Err(LexError::InvalidEscape {
                                    sequence: " ".to_string(),
                                    position: start_pos,
                                    span: Span::new(start, self.pos as u32).into(),
                                });
                            }
                            self.advance();
                        }
                        _ => value.push(self.lex_escape(start_pos.clone(), start)?),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Lex an escape sequence; the leading backslash is already consumed.
    fn lex_escape(&mut self, start_pos: Position, start: u32) -> LexResult<char> {
        let invalid = |lexer: &Self, seq: String| LexError::InvalidEscape {
            sequence: seq,
            position: start_pos.clone(),
            span: Span::new(start, lexer.pos as u32).into(),
        };

        match self.peek() {
            Some('n') => { self.advance(); Ok('\n') }
            Some('t') => { self.advance(); Ok('\t') }
            Some('r') => { self.advance(); Ok('\r') }
            Some('v') => { self.advance(); Ok('\x0B') }
            Some('f') => { self.advance(); Ok('\x0C') }
            Some('b') => { self.advance(); Ok('\x08') }
            Some('a') => { self.advance(); Ok('\x07') }
            Some('\\') => { self.advance(); Ok('\\') }
            Some('"') => { self.advance(); Ok('"') }
            Some('\'') => { self.advance(); Ok('\'') }
            Some('x') => {
                self.advance();
                self.lex_numeric_escape(16, "x", start_pos, start)
            }
            Some('o') => {
                self.advance();
                self.lex_numeric_escape(8, "o", start_pos, start)
            }
            Some(c) if c.is_ascii_digit() => self.lex_numeric_escape(10, "", start_pos, start),
            Some(c) => {
                self.advance();
                Err(invalid(self, c.to_string()))
            }
            None => Err(invalid(self, String::new())),
        }
    }

    fn lex_numeric_escape(
        &mut self,
        radix: u32,
        prefix: &str,
        start_pos: Position,
        start: u32,
    ) -> LexResult<char> {
        let digit_start = self.pos;
        while self.peek().is_some_and(|c| c.is_digit(radix)) {
            self.advance();
        }
        let digits = &self.source[digit_start..self.pos];
        let sequence = format!("{prefix}{digits}");
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| LexError::InvalidEscape {
                sequence,
                position: start_pos,
                span: Span::new(start, self.pos as u32).into(),
            })
    }

    /// Lex a pragma opening. Returns `None` for unknown pragmas, which are
    /// skipped like comments.
    fn lex_pragma(&mut self) -> LexResult<Option<Token>> {
        let start = self.pos as u32;
        let position = self.position();
        self.advance();
        self.advance();
        self.advance();

        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }

        let word = self.lex_word();
        if word == "LANGUAGE" {
            return Ok(Some(self.make_token(TokenKind::PragmaLanguage, start, position)));
        }
        if word == "OPTIONS" || word.starts_with("OPTIONS_") {
            let tool = word
                .strip_prefix("OPTIONS_")
                .filter(|t| !t.is_empty())
                .map(SmolStr::new);
            let args = self.pragma_text(position.clone(), start)?;
            let kind = TokenKind::PragmaOptions { tool, args };
            // The span covers the arguments but not the closing marker,
            // which is delivered as its own token.
            return Ok(Some(self.make_token(kind, start, position)));
        }

        // Unknown pragma: treat as a comment.
        self.skip_pragma_body(position, start)?;
        Ok(None)
    }

    /// Collect the raw text up to (but not including) the closing `#-}`.
    fn pragma_text(&mut self, position: Position, start: u32) -> LexResult<String> {
        let text_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedPragma {
                        position,
                        span: Span::new(start, self.pos as u32).into(),
                    });
                }
                Some('#') if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('}') => {
                    return Ok(self.source[text_start..self.pos].trim().to_string());
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_pragma_body(&mut self, position: Position, start: u32) -> LexResult<()> {
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedPragma {
                        position,
                        span: Span::new(start, self.pos as u32).into(),
                    });
                }
                Some('#') if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('}') => {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn join_path(path: &[SmolStr]) -> SmolStr {
    SmolStr::new(path.join("."))
}

fn keyword_or_var(word: SmolStr) -> TokenKind {
    match word.as_str() {
        "case" => TokenKind::KwCase,
        "data" => TokenKind::KwData,
        "do" => TokenKind::KwDo,
        "else" => TokenKind::KwElse,
        "external" => TokenKind::KwExternal,
        "fcase" => TokenKind::KwFcase,
        "foreign" => TokenKind::KwForeign,
        "free" => TokenKind::KwFree,
        "if" => TokenKind::KwIf,
        "import" => TokenKind::KwImport,
        "in" => TokenKind::KwIn,
        "infix" => TokenKind::KwInfix,
        "infixl" => TokenKind::KwInfixl,
        "infixr" => TokenKind::KwInfixr,
        "let" => TokenKind::KwLet,
        "module" => TokenKind::KwModule,
        "newtype" => TokenKind::KwNewtype,
        "of" => TokenKind::KwOf,
        "then" => TokenKind::KwThen,
        "type" => TokenKind::KwType,
        "where" => TokenKind::KwWhere,
        "as" => TokenKind::IdAs,
        "ccall" => TokenKind::IdCcall,
        "forall" => TokenKind::IdForall,
        "hiding" => TokenKind::IdHiding,
        "interface" => TokenKind::IdInterface,
        "primitive" => TokenKind::IdPrimitive,
        "qualified" => TokenKind::IdQualified,
        _ => TokenKind::VarId(word),
    }
}

fn classify_symbol(text: &str) -> TokenKind {
    match text {
        ".." => TokenKind::DotDot,
        "::" => TokenKind::ColonColon,
        "=" => TokenKind::Equals,
        "\\" => TokenKind::Backslash,
        "|" => TokenKind::Bar,
        "<-" => TokenKind::LArrow,
        "->" => TokenKind::RArrow,
        "=>" => TokenKind::DoubleArrow,
        "@" => TokenKind::At,
        "~" => TokenKind::Tilde,
        ":" => TokenKind::Colon,
        "-" => TokenKind::Minus,
        "-." => TokenKind::MinusDot,
        _ => {
            if text.starts_with(':') {
                TokenKind::ConSym(SmolStr::new(text))
            } else {
                TokenKind::VarSym(SmolStr::new(text))
            }
        }
    }
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

#[inline]
fn is_symbol_char(c: char) -> bool {
    matches!(
        c,
        '!' | '#' | '$' | '%' | '&' | '*' | '+' | '.' | '/' | '<' | '=' | '>' | '?' | '@'
            | '\\' | '^' | '|' | '-' | '~' | ':'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new("Test.curry", source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("case x of"),
            vec![
                TokenKind::KwCase,
                TokenKind::VarId("x".into()),
                TokenKind::KwOf,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("fcase f'"),
            vec![TokenKind::KwFcase, TokenKind::VarId("f'".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_qualified_identifiers() {
        assert_eq!(
            kinds("Prelude.map"),
            vec![TokenKind::QVarId("Prelude".into(), "map".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds("Data.Map.empty"),
            vec![TokenKind::QVarId("Data.Map".into(), "empty".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds("Data.Map"),
            vec![TokenKind::QConId("Data".into(), "Map".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds("Prelude.+"),
            vec![TokenKind::QVarSym("Prelude".into(), "+".into()), TokenKind::Eof]
        );
        // A dot followed by a space is the composition operator
        assert_eq!(
            kinds("f . g"),
            vec![
                TokenKind::VarId("f".into()),
                TokenKind::VarSym(".".into()),
                TokenKind::VarId("g".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("M . g"),
            vec![
                TokenKind::ConId("M".into()),
                TokenKind::VarSym(".".into()),
                TokenKind::VarId("g".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            kinds("x -> y"),
            vec![
                TokenKind::VarId("x".into()),
                TokenKind::RArrow,
                TokenKind::VarId("y".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds(":+: ++ : - -."),
            vec![
                TokenKind::ConSym(":+:".into()),
                TokenKind::VarSym("++".into()),
                TokenKind::Colon,
                TokenKind::Minus,
                TokenKind::MinusDot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(kinds("-- a comment\nx"), vec![TokenKind::VarId("x".into()), TokenKind::Eof]);
        // A run of dashes followed by a symbol character is an operator
        assert_eq!(
            kinds("x --> y"),
            vec![
                TokenKind::VarId("x".into()),
                TokenKind::VarSym("-->".into()),
                TokenKind::VarId("y".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("{- outer {- inner -} still -} x"),
            vec![TokenKind::VarId("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::new("T.curry", "{- never closed").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 0x2A 0o52 0b101010"),
            vec![
                TokenKind::Int(BigInt::from(42)),
                TokenKind::Int(BigInt::from(42)),
                TokenKind::Int(BigInt::from(42)),
                TokenKind::Int(BigInt::from(42)),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("3.14 1e3 2.5e-1"),
            vec![
                TokenKind::Float(OrderedFloat::new(3.14)),
                TokenKind::Float(OrderedFloat::new(1000.0)),
                TokenKind::Float(OrderedFloat::new(0.25)),
                TokenKind::Eof,
            ]
        );
        // An enumeration is not a float
        assert_eq!(
            kinds("[1..2]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Int(BigInt::from(1)),
                TokenKind::DotDot,
                TokenKind::Int(BigInt::from(2)),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_char_and_string() {
        assert_eq!(
            kinds(r#"'a' '\n' '\65' "hi\tthere""#),
            vec![
                TokenKind::Char('a'),
                TokenKind::Char('\n'),
                TokenKind::Char('A'),
                TokenKind::String("hi\tthere".to_string()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds(r#""a\&b""#),
            vec![TokenKind::String("ab".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_bad_escape() {
        let err = Lexer::new("T.curry", r#""\q""#).tokenize().unwrap_err();
        assert!(matches!(err, LexError::InvalidEscape { .. }));
    }

    #[test]
    fn test_positions_and_tabs() {
        let tokens = Lexer::new("T.curry", "a\n\tb").tokenize().unwrap();
        assert_eq!(tokens[0].position, Position::new("T.curry", 1, 1));
        // Tab advances to the next tab stop: column 9
        assert_eq!(tokens[1].position, Position::new("T.curry", 2, 9));
    }

    #[test]
    fn test_pragmas() {
        let ks = kinds("{-# LANGUAGE CPP #-} module");
        assert_eq!(
            ks,
            vec![
                TokenKind::PragmaLanguage,
                TokenKind::ConId("CPP".into()),
                TokenKind::PragmaEnd,
                TokenKind::KwModule,
                TokenKind::Eof,
            ]
        );

        let ks = kinds("{-# OPTIONS_PAKCS -O2 #-} x");
        assert_eq!(
            ks,
            vec![
                TokenKind::PragmaOptions { tool: Some("PAKCS".into()), args: "-O2".to_string() },
                TokenKind::PragmaEnd,
                TokenKind::VarId("x".into()),
                TokenKind::Eof,
            ]
        );

        // Unknown pragmas are skipped like comments
        assert_eq!(kinds("{-# WHATEVER stuff #-} x"), vec![TokenKind::VarId("x".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_layout_rule() {
        // Simulate the parser: open a context at the column of the first
        // token, then observe virtual semicolons and the closing brace.
        let mut lexer = Lexer::new("T.curry", "  a\n  b\nc");
        let t = lexer.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::VarId("a".into()));
        lexer.push_context(t.position.column().unwrap() as i32);

        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VSemi);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VarId("b".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VRBrace);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VarId("c".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.context_depth(), 0);
    }

    #[test]
    fn test_layout_drain_at_eof() {
        let mut lexer = Lexer::new("T.curry", "a");
        let t = lexer.next_token().unwrap();
        lexer.push_context(t.position.column().unwrap() as i32);
        lexer.push_context(5);

        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VRBrace);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VRBrace);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_no_layout_inside_explicit_context() {
        let mut lexer = Lexer::new("T.curry", "a\nb");
        let t = lexer.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::VarId("a".into()));
        lexer.push_context(NO_LAYOUT);
        // No virtual semicolon: the sentinel disables the layout rule.
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::VarId("b".into()));
    }
}
