//! The surface abstract syntax tree.
//!
//! This is the output of parsing, before any semantic analysis. The shape
//! follows the concrete syntax closely: operator applications are kept as
//! flat infix nodes (fixity resolution happens in a later pass), sections
//! and enumerations are explicit variants, and `let`/`where` groups carry
//! unanalysed declaration lists.

use crate::ident::{Ident, ModuleIdent, QualIdent};
use crate::literal::Literal;
use curry_diagnostics::{HasPosition, Position, SrcRef};
use smol_str::SmolStr;

// ============================================================================
// Modules
// ============================================================================

/// A source module: pragmas, header, imports and declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub position: Position,
    pub pragmas: Vec<ModulePragma>,
    pub name: ModuleIdent,
    pub exports: Option<ExportSpec>,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
}

/// A file-level pragma.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModulePragma {
    /// `{-# LANGUAGE ext, ... #-}`
    Language(Position, Vec<Extension>),
    /// `{-# OPTIONS[_TOOL] args #-}` - the argument string is kept verbatim.
    Options(Position, Option<Tool>, String),
}

/// A language extension named in a `LANGUAGE` pragma.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extension {
    Known(Position, KnownExtension),
    Unknown(Position, SmolStr),
}

/// Extensions the frontend knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnownExtension {
    AnonFreeVars,
    Cpp,
    FunctionalPatterns,
    NegativeLiterals,
    NoImplicitPrelude,
}

impl KnownExtension {
    /// Parse an extension name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AnonFreeVars" => Some(Self::AnonFreeVars),
            "CPP" => Some(Self::Cpp),
            "FunctionalPatterns" => Some(Self::FunctionalPatterns),
            "NegativeLiterals" => Some(Self::NegativeLiterals),
            "NoImplicitPrelude" => Some(Self::NoImplicitPrelude),
            _ => None,
        }
    }
}

/// The tool tag of an `OPTIONS` pragma.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tool {
    Pakcs,
    Kics2,
    Cymake,
    Frontend,
    Unknown(SmolStr),
}

impl Tool {
    /// Parse the suffix of `OPTIONS_<TOOL>`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "PAKCS" => Self::Pakcs,
            "KICS2" => Self::Kics2,
            "CYMAKE" => Self::Cymake,
            "FRONTEND" => Self::Frontend,
            other => Self::Unknown(SmolStr::new(other)),
        }
    }
}

/// The export list of a module header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportSpec {
    pub position: Position,
    pub exports: Vec<Export>,
}

/// One item of an export list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Export {
    /// `f` or `(+)`
    Var(QualIdent),
    /// `T (C1, ..., Cn)`
    TypeWith(QualIdent, Vec<Ident>),
    /// `T (..)`
    TypeAll(QualIdent),
    /// `module M`
    Module(ModuleIdent),
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportDecl {
    pub position: Position,
    pub module: ModuleIdent,
    pub qualified: bool,
    pub alias: Option<ModuleIdent>,
    pub spec: Option<ImportSpec>,
}

/// The item list of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportSpec {
    /// `import M (x, T (..))`
    Importing(Position, Vec<Import>),
    /// `import M hiding (x)`
    Hiding(Position, Vec<Import>),
}

/// One item of an import list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Import {
    Var(Ident),
    TypeWith(Ident, Vec<Ident>),
    TypeAll(Ident),
}

// ============================================================================
// Declarations
// ============================================================================

/// A top-level or local declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decl {
    /// Fixity declaration; the precedence is optional in source syntax.
    Infix(Position, Fixity, Option<u32>, Vec<Ident>),
    /// `data T a b = C1 ... | C2 ...`
    Data(Position, Ident, Vec<Ident>, Vec<ConstrDecl>),
    /// `newtype T a = C t`
    Newtype(Position, Ident, Vec<Ident>, NewConstrDecl),
    /// `type T a = t`
    TypeSyn(Position, Ident, Vec<Ident>, TypeExpr),
    /// `f, g :: t`
    TypeSig(Position, Vec<Ident>, TypeExpr),
    /// A function defined by one or more equations.
    Function(Position, Ident, Vec<Equation>),
    /// `foreign import ccall "name" f :: t`
    Foreign(Position, CallConv, Option<String>, Ident, TypeExpr),
    /// `f, g external`
    External(Position, Vec<Ident>),
    /// A pattern bound to an expression.
    Pattern(Position, Pattern, Rhs),
    /// `x, y free`
    Free(Position, Vec<Ident>),
}

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fixity {
    InfixL,
    InfixR,
    Infix,
}

/// Calling convention of a foreign import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallConv {
    Primitive,
    CCall,
}

/// A data constructor declaration.
///
/// The first identifier list holds existentially quantified type variables;
/// the grammar always produces an empty list, but the data model keeps the
/// field for interface consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstrDecl {
    /// `C t1 ... tn`
    Constr(Position, Vec<Ident>, Ident, Vec<TypeExpr>),
    /// `t1 :+: t2`
    Op(Position, Vec<Ident>, TypeExpr, Ident, TypeExpr),
    /// `C { l1, l2 :: t, ... }`
    Record(Position, Vec<Ident>, Ident, Vec<FieldDecl>),
}

/// A field group in a record constructor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    pub position: Position,
    pub labels: Vec<Ident>,
    pub ty: TypeExpr,
}

/// The constructor of a newtype declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NewConstrDecl {
    /// `C t`
    NewConstr(Position, Ident, TypeExpr),
    /// `C { l :: t }`
    NewRecord(Position, Ident, Ident, TypeExpr),
}

// ============================================================================
// Types
// ============================================================================

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeExpr {
    /// `C t1 ... tn`
    Constructor(QualIdent, Vec<TypeExpr>),
    /// A type variable.
    Variable(Ident),
    /// `(t1, ..., tn)`
    Tuple(Vec<TypeExpr>),
    /// `[t]`
    List(Box<TypeExpr>),
    /// `t1 -> t2`
    Arrow(Box<TypeExpr>, Box<TypeExpr>),
    /// `(t)`
    Paren(Box<TypeExpr>),
}

// ============================================================================
// Equations
// ============================================================================

/// One defining equation of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equation {
    pub position: Position,
    pub lhs: Lhs,
    pub rhs: Rhs,
}

/// The left-hand side of an equation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lhs {
    /// `f p1 ... pn`
    Fun(Ident, Vec<Pattern>),
    /// `p1 `op` p2`
    Op(Pattern, Ident, Pattern),
    /// `(lhs) p1 ... pn`
    Ap(Box<Lhs>, Vec<Pattern>),
}

impl Lhs {
    /// The identifier being defined.
    #[must_use]
    pub fn function(&self) -> &Ident {
        match self {
            Lhs::Fun(f, _) => f,
            Lhs::Op(_, op, _) => op,
            Lhs::Ap(lhs, _) => lhs.function(),
        }
    }
}

/// The right-hand side of an equation or case alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rhs {
    /// `= e where decls`
    Simple(Position, Expression, Vec<Decl>),
    /// `| g1 = e1 ... where decls`
    Guarded(Position, Vec<CondExpr>, Vec<Decl>),
}

/// One guarded expression `| guard = expr`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CondExpr {
    pub position: Position,
    pub guard: Expression,
    pub expr: Expression,
}

// ============================================================================
// Patterns
// ============================================================================

/// A pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    Literal(Literal),
    /// A negated numeric literal; the identifier is the minus that was used.
    Negative(Ident, Literal),
    Variable(Ident),
    /// `C p1 ... pn`
    Constructor(QualIdent, Vec<Pattern>),
    /// `p1 `op` p2` with a constructor operator.
    Infix(Box<Pattern>, QualIdent, Box<Pattern>),
    Paren(Box<Pattern>),
    /// `C { l = p, ... }`
    Record(QualIdent, Vec<Field<Pattern>>),
    Tuple(SrcRef, Vec<Pattern>),
    List(SrcRef, Vec<Pattern>),
    /// `v@p`
    As(Ident, Box<Pattern>),
    /// `~p`
    Lazy(SrcRef, Box<Pattern>),
    /// `(f p1 ... pn)` with a defined function as head.
    FunctionPattern(QualIdent, Vec<Pattern>),
    /// `p1 `op` p2` with a defined operator.
    InfixFuncPattern(Box<Pattern>, QualIdent, Box<Pattern>),
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expression {
    Literal(Literal),
    Variable(QualIdent),
    Constructor(QualIdent),
    Paren(Box<Expression>),
    /// `e :: t`
    Typed(Box<Expression>, TypeExpr),
    /// `C { l = e, ... }`
    Record(QualIdent, Vec<Field<Expression>>),
    /// `e { l = e', ... }`
    RecordUpdate(Box<Expression>, Vec<Field<Expression>>),
    Tuple(SrcRef, Vec<Expression>),
    List(SrcRef, Vec<Expression>),
    /// `[e | q1, ..., qn]`
    ListCompr(SrcRef, Box<Expression>, Vec<Statement>),
    /// `[e ..]`
    EnumFrom(Box<Expression>),
    /// `[e1, e2 ..]`
    EnumFromThen(Box<Expression>, Box<Expression>),
    /// `[e1 .. e2]`
    EnumFromTo(Box<Expression>, Box<Expression>),
    /// `[e1, e2 .. e3]`
    EnumFromThenTo(Box<Expression>, Box<Expression>, Box<Expression>),
    /// `- e` or `-. e`; the identifier is the minus that was used.
    UnaryMinus(Ident, Box<Expression>),
    Apply(Box<Expression>, Box<Expression>),
    /// Flat operator application; fixities are resolved in a later pass.
    InfixApply(Box<Expression>, InfixOp, Box<Expression>),
    /// `(e op)`
    LeftSection(Box<Expression>, InfixOp),
    /// `(op e)`
    RightSection(InfixOp, Box<Expression>),
    /// `\p1 ... pn -> e`
    Lambda(SrcRef, Vec<Pattern>, Box<Expression>),
    Let(Vec<Decl>, Box<Expression>),
    Do(Vec<Statement>, Box<Expression>),
    IfThenElse(SrcRef, Box<Expression>, Box<Expression>, Box<Expression>),
    Case(SrcRef, CaseType, Box<Expression>, Vec<Alt>),
}

/// An operator in an infix application or section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfixOp {
    Op(QualIdent),
    Constr(QualIdent),
}

impl InfixOp {
    /// The name of the operator.
    #[must_use]
    pub fn ident(&self) -> &QualIdent {
        match self {
            InfixOp::Op(q) | InfixOp::Constr(q) => q,
        }
    }
}

/// A statement in a do block or list comprehension.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    Expr(Expression),
    Decl(Vec<Decl>),
    /// `p <- e`
    Bind(SrcRef, Pattern, Expression),
}

/// Whether a case expression suspends (`case`) or narrows (`fcase`) on a
/// free-variable scrutinee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseType {
    Rigid,
    Flex,
}

/// One alternative of a case expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alt {
    pub position: Position,
    pub pattern: Pattern,
    pub rhs: Rhs,
}

/// A record field `label = value` in expressions and patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field<T> {
    pub position: Position,
    pub label: QualIdent,
    pub value: T,
}

// ============================================================================
// Positions
// ============================================================================

impl HasPosition for Module {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

impl HasPosition for ImportDecl {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

impl HasPosition for Equation {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

impl HasPosition for Alt {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

impl HasPosition for Decl {
    fn get_position(&self) -> Position {
        match self {
            Decl::Infix(p, ..)
            | Decl::Data(p, ..)
            | Decl::Newtype(p, ..)
            | Decl::TypeSyn(p, ..)
            | Decl::TypeSig(p, ..)
            | Decl::Function(p, ..)
            | Decl::Foreign(p, ..)
            | Decl::External(p, ..)
            | Decl::Pattern(p, ..)
            | Decl::Free(p, ..) => p.clone(),
        }
    }
}

impl HasPosition for Pattern {
    fn get_position(&self) -> Position {
        match self {
            Pattern::Literal(_) => Position::NoPos,
            Pattern::Negative(i, _) => i.get_position(),
            Pattern::Variable(i) => i.get_position(),
            Pattern::Constructor(c, _) => c.get_position(),
            Pattern::Infix(p, ..) => p.get_position(),
            Pattern::Paren(p) => p.get_position(),
            Pattern::Record(c, _) => c.get_position(),
            Pattern::Tuple(..) | Pattern::List(..) | Pattern::Lazy(..) => Position::NoPos,
            Pattern::As(i, _) => i.get_position(),
            Pattern::FunctionPattern(f, _) => f.get_position(),
            Pattern::InfixFuncPattern(p, ..) => p.get_position(),
        }
    }
}
