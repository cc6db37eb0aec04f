//! The flat intermediate representation.
//!
//! After elaboration the surface syntax is desugared into this
//! representation: flat programs with first-order rules, case expressions
//! and explicit free-variable introductions. Compiler passes operate on it
//! through the traversal framework in [`goodies`].

pub mod flat;
pub mod goodies;

pub use flat::*;
pub use goodies::ExprFolder;
