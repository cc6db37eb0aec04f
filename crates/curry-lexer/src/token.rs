//! Token types for the Curry lexer.
//!
//! A token is a kind (with its attributes) plus a byte span and a source
//! position. The fieldless `Category` enum mirrors the kinds and is what the
//! parser's lookahead tables are keyed on.

use curry_diagnostics::{Position, Span};
use curry_syntax::OrderedFloat;
use num_bigint::BigInt;
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub position: Position,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, position: Position) -> Self {
        Self { kind, span, position }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Identifiers. Qualified variants carry the dotted module path prefix.
    VarId(SmolStr),
    QVarId(SmolStr, SmolStr),
    ConId(SmolStr),
    QConId(SmolStr, SmolStr),
    VarSym(SmolStr),
    ConSym(SmolStr),
    QVarSym(SmolStr, SmolStr),
    QConSym(SmolStr, SmolStr),

    // Special identifiers. These are not reserved words, but the grammar
    // recognizes them contextually, so they get their own lookahead
    // category. Plain-identifier parsers accept them like any identifier.
    IdAs,
    IdCcall,
    IdForall,
    IdHiding,
    IdInterface,
    IdPrimitive,
    IdQualified,

    // Literals
    Int(BigInt),
    Float(OrderedFloat),
    Char(char),
    String(String),

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Underscore,
    Backtick,

    // Reserved operators
    DotDot,
    ColonColon,
    Equals,
    Backslash,
    Bar,
    LArrow,
    RArrow,
    DoubleArrow,
    At,
    Tilde,

    // Special symbols with their own lookahead category
    Colon,
    Minus,
    MinusDot,

    // Keywords
    KwCase,
    KwData,
    KwDo,
    KwElse,
    KwExternal,
    KwFcase,
    KwForeign,
    KwFree,
    KwIf,
    KwImport,
    KwIn,
    KwInfix,
    KwInfixl,
    KwInfixr,
    KwLet,
    KwModule,
    KwNewtype,
    KwOf,
    KwThen,
    KwType,
    KwWhere,

    // Virtual layout tokens. The open brace is never produced by the lexer
    // (opening a block is a parser-side stack push) but completes the token
    // model for tools that re-serialize token streams.
    VLBrace,
    VRBrace,
    VSemi,

    // Pragmas
    PragmaLanguage,
    PragmaOptions { tool: Option<SmolStr>, args: String },
    PragmaEnd,

    Eof,
}

/// The lookahead category of a token, with all attributes erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    VarId,
    QVarId,
    ConId,
    QConId,
    VarSym,
    ConSym,
    QVarSym,
    QConSym,
    IdAs,
    IdCcall,
    IdForall,
    IdHiding,
    IdInterface,
    IdPrimitive,
    IdQualified,
    Int,
    Float,
    Char,
    String,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Underscore,
    Backtick,
    DotDot,
    ColonColon,
    Equals,
    Backslash,
    Bar,
    LArrow,
    RArrow,
    DoubleArrow,
    At,
    Tilde,
    Colon,
    Minus,
    MinusDot,
    KwCase,
    KwData,
    KwDo,
    KwElse,
    KwExternal,
    KwFcase,
    KwForeign,
    KwFree,
    KwIf,
    KwImport,
    KwIn,
    KwInfix,
    KwInfixl,
    KwInfixr,
    KwLet,
    KwModule,
    KwNewtype,
    KwOf,
    KwThen,
    KwType,
    KwWhere,
    VLBrace,
    VRBrace,
    VSemi,
    PragmaLanguage,
    PragmaOptions,
    PragmaEnd,
    Eof,
}

impl TokenKind {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            TokenKind::VarId(_) => Category::VarId,
            TokenKind::QVarId(..) => Category::QVarId,
            TokenKind::ConId(_) => Category::ConId,
            TokenKind::QConId(..) => Category::QConId,
            TokenKind::VarSym(_) => Category::VarSym,
            TokenKind::ConSym(_) => Category::ConSym,
            TokenKind::QVarSym(..) => Category::QVarSym,
            TokenKind::QConSym(..) => Category::QConSym,
            TokenKind::IdAs => Category::IdAs,
            TokenKind::IdCcall => Category::IdCcall,
            TokenKind::IdForall => Category::IdForall,
            TokenKind::IdHiding => Category::IdHiding,
            TokenKind::IdInterface => Category::IdInterface,
            TokenKind::IdPrimitive => Category::IdPrimitive,
            TokenKind::IdQualified => Category::IdQualified,
            TokenKind::Int(_) => Category::Int,
            TokenKind::Float(_) => Category::Float,
            TokenKind::Char(_) => Category::Char,
            TokenKind::String(_) => Category::String,
            TokenKind::LParen => Category::LParen,
            TokenKind::RParen => Category::RParen,
            TokenKind::LBracket => Category::LBracket,
            TokenKind::RBracket => Category::RBracket,
            TokenKind::LBrace => Category::LBrace,
            TokenKind::RBrace => Category::RBrace,
            TokenKind::Comma => Category::Comma,
            TokenKind::Semi => Category::Semi,
            TokenKind::Underscore => Category::Underscore,
            TokenKind::Backtick => Category::Backtick,
            TokenKind::DotDot => Category::DotDot,
            TokenKind::ColonColon => Category::ColonColon,
            TokenKind::Equals => Category::Equals,
            TokenKind::Backslash => Category::Backslash,
            TokenKind::Bar => Category::Bar,
            TokenKind::LArrow => Category::LArrow,
            TokenKind::RArrow => Category::RArrow,
            TokenKind::DoubleArrow => Category::DoubleArrow,
            TokenKind::At => Category::At,
            TokenKind::Tilde => Category::Tilde,
            TokenKind::Colon => Category::Colon,
            TokenKind::Minus => Category::Minus,
            TokenKind::MinusDot => Category::MinusDot,
            TokenKind::KwCase => Category::KwCase,
            TokenKind::KwData => Category::KwData,
            TokenKind::KwDo => Category::KwDo,
            TokenKind::KwElse => Category::KwElse,
            TokenKind::KwExternal => Category::KwExternal,
            TokenKind::KwFcase => Category::KwFcase,
            TokenKind::KwForeign => Category::KwForeign,
            TokenKind::KwFree => Category::KwFree,
            TokenKind::KwIf => Category::KwIf,
            TokenKind::KwImport => Category::KwImport,
            TokenKind::KwIn => Category::KwIn,
            TokenKind::KwInfix => Category::KwInfix,
            TokenKind::KwInfixl => Category::KwInfixl,
            TokenKind::KwInfixr => Category::KwInfixr,
            TokenKind::KwLet => Category::KwLet,
            TokenKind::KwModule => Category::KwModule,
            TokenKind::KwNewtype => Category::KwNewtype,
            TokenKind::KwOf => Category::KwOf,
            TokenKind::KwThen => Category::KwThen,
            TokenKind::KwType => Category::KwType,
            TokenKind::KwWhere => Category::KwWhere,
            TokenKind::VLBrace => Category::VLBrace,
            TokenKind::VRBrace => Category::VRBrace,
            TokenKind::VSemi => Category::VSemi,
            TokenKind::PragmaLanguage => Category::PragmaLanguage,
            TokenKind::PragmaOptions { .. } => Category::PragmaOptions,
            TokenKind::PragmaEnd => Category::PragmaEnd,
            TokenKind::Eof => Category::Eof,
        }
    }

    #[must_use]
    pub fn is_keyword(&self) -> bool {
        matches!(
            self.category(),
            Category::KwCase
                | Category::KwData
                | Category::KwDo
                | Category::KwElse
                | Category::KwExternal
                | Category::KwFcase
                | Category::KwForeign
                | Category::KwFree
                | Category::KwIf
                | Category::KwImport
                | Category::KwIn
                | Category::KwInfix
                | Category::KwInfixl
                | Category::KwInfixr
                | Category::KwLet
                | Category::KwModule
                | Category::KwNewtype
                | Category::KwOf
                | Category::KwThen
                | Category::KwType
                | Category::KwWhere
        )
    }

    #[must_use]
    pub fn is_layout(&self) -> bool {
        matches!(self, TokenKind::VLBrace | TokenKind::VRBrace | TokenKind::VSemi)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.category().name()
    }
}

impl Category {
    /// The display name used in "... expected" diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Category::VarId => "identifier",
            Category::QVarId => "qualified identifier",
            Category::ConId => "constructor",
            Category::QConId => "qualified constructor",
            Category::VarSym => "operator",
            Category::ConSym => "constructor operator",
            Category::QVarSym => "qualified operator",
            Category::QConSym => "qualified constructor operator",
            Category::IdAs => "as",
            Category::IdCcall => "ccall",
            Category::IdForall => "forall",
            Category::IdHiding => "hiding",
            Category::IdInterface => "interface",
            Category::IdPrimitive => "primitive",
            Category::IdQualified => "qualified",
            Category::Int => "integer literal",
            Category::Float => "float literal",
            Category::Char => "character literal",
            Category::String => "string literal",
            Category::LParen => "(",
            Category::RParen => ")",
            Category::LBracket => "[",
            Category::RBracket => "]",
            Category::LBrace => "{",
            Category::RBrace => "}",
            Category::Comma => ",",
            Category::Semi => ";",
            Category::Underscore => "_",
            Category::Backtick => "`",
            Category::DotDot => "..",
            Category::ColonColon => "::",
            Category::Equals => "=",
            Category::Backslash => "\\",
            Category::Bar => "|",
            Category::LArrow => "<-",
            Category::RArrow => "->",
            Category::DoubleArrow => "=>",
            Category::At => "@",
            Category::Tilde => "~",
            Category::Colon => ":",
            Category::Minus => "-",
            Category::MinusDot => "-.",
            Category::KwCase => "case",
            Category::KwData => "data",
            Category::KwDo => "do",
            Category::KwElse => "else",
            Category::KwExternal => "external",
            Category::KwFcase => "fcase",
            Category::KwForeign => "foreign",
            Category::KwFree => "free",
            Category::KwIf => "if",
            Category::KwImport => "import",
            Category::KwIn => "in",
            Category::KwInfix => "infix",
            Category::KwInfixl => "infixl",
            Category::KwInfixr => "infixr",
            Category::KwLet => "let",
            Category::KwModule => "module",
            Category::KwNewtype => "newtype",
            Category::KwOf => "of",
            Category::KwThen => "then",
            Category::KwType => "type",
            Category::KwWhere => "where",
            Category::VLBrace => "{ (layout)",
            Category::VRBrace => "} (layout)",
            Category::VSemi => "; (layout)",
            Category::PragmaLanguage => "{-# LANGUAGE",
            Category::PragmaOptions => "{-# OPTIONS",
            Category::PragmaEnd => "#-}",
            Category::Eof => "end of file",
        }
    }
}
