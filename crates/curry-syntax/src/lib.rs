//! Surface syntax of the Curry frontend.
//!
//! This crate holds the data model produced by the parser:
//!
//! - `ident` - identifiers, qualified identifiers and module identifiers
//! - `literal` - literal values, including the polymorphic integer tag
//! - `ast` - the surface abstract syntax tree

pub mod ast;
pub mod ident;
pub mod literal;

pub use ast::*;
pub use ident::{Ident, ModuleIdent, QualIdent};
pub use literal::{Literal, OrderedFloat};
