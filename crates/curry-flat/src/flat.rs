//! Data types of the flat intermediate representation.
//!
//! Programs are flat: every function is top-level with an explicit arity,
//! pattern matching is compiled to case expressions over shallow
//! constructor patterns, and strings have been elaborated into character
//! lists (there is no flat string literal).

use curry_diagnostics::SrcRef;
use curry_syntax::ident::Ident;
use curry_syntax::literal::OrderedFloat;
use num_bigint::BigInt;
use smol_str::SmolStr;
use std::fmt;

/// A variable is identified by its index; indices are unique within a
/// function after renaming.
pub type VarIndex = usize;

/// A qualified name: the defining module and the local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QName {
    pub module: SmolStr,
    pub name: SmolStr,
}

impl QName {
    #[must_use]
    pub fn new(module: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self { module: module.into(), name: name.into() }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Visibility of a top-level entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A complete flat program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prog {
    pub module: SmolStr,
    pub imports: Vec<SmolStr>,
    pub type_decls: Vec<TypeDecl>,
    pub func_decls: Vec<FuncDecl>,
    pub op_decls: Vec<OpDecl>,
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeDecl {
    /// An algebraic data type with its constructors.
    Algebraic {
        name: QName,
        visibility: Visibility,
        params: Vec<VarIndex>,
        constructors: Vec<ConsDecl>,
    },
    /// A type synonym.
    Synonym {
        name: QName,
        visibility: Visibility,
        params: Vec<VarIndex>,
        body: TypeExpr,
    },
}

/// A constructor declaration inside an algebraic type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsDecl {
    pub name: QName,
    pub arity: usize,
    pub visibility: Visibility,
    pub arg_types: Vec<TypeExpr>,
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeExpr {
    /// A type variable, identified by index.
    Variable(VarIndex),
    /// A type constructor applied to arguments.
    Constructor(QName, Vec<TypeExpr>),
    /// A function type.
    Function(Box<TypeExpr>, Box<TypeExpr>),
}

/// Operator fixity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fixity {
    InfixL,
    InfixR,
    Infix,
}

/// An operator declaration. Precedence is mandatory here, unlike in surface
/// syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpDecl {
    pub name: QName,
    pub fixity: Fixity,
    pub precedence: u32,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuncDecl {
    pub name: QName,
    pub arity: usize,
    pub visibility: Visibility,
    pub ty: TypeExpr,
    pub rule: Rule,
}

/// The rule of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rule {
    /// A defined function; the parameter list length matches the arity.
    Defined { params: Vec<VarIndex>, body: Expr },
    /// An externally implemented function, referenced by name.
    External { name: String },
    /// A function hidden by an interface; its arity is unspecified.
    Hidden,
}

/// How a combination applies its head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombType {
    /// A fully applied function call.
    FuncCall,
    /// A partial function call missing the given number of arguments
    /// (always positive).
    FuncPartCall(usize),
    /// A fully applied constructor.
    ConsCall,
    /// A partially applied constructor.
    ConsPartCall(usize),
}

/// A flat expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Variable(VarIndex),
    Literal(Literal),
    /// An application of a function or constructor to arguments.
    Comb(CombType, QName, Vec<Expr>),
    /// A set of recursive bindings in scope of each other and of the body.
    Let(Vec<(VarIndex, Expr)>, Box<Expr>),
    /// Introduction of free (logic) variables.
    Free(Vec<VarIndex>, Box<Expr>),
    /// Non-deterministic choice.
    Or(Box<Expr>, Box<Expr>),
    Case(SrcRef, CaseType, Box<Expr>, Vec<Branch>),
    Typed(Box<Expr>, TypeExpr),
}

/// Whether a case suspends or narrows on a free-variable scrutinee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseType {
    Rigid,
    Flex,
}

/// One branch of a case expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Branch {
    pub pattern: Pattern,
    pub expr: Expr,
}

/// A shallow case pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// A constructor applied to fresh variables.
    Constructor(QName, Vec<VarIndex>),
    Literal(Literal),
}

/// A flat literal. Integer literals keep the identifier used for overload
/// resolution; strings do not appear here (they become character lists).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Int(Ident, BigInt),
    Float(SrcRef, OrderedFloat),
    Char(SrcRef, char),
}
