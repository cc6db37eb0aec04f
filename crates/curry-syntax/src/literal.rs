//! Literal values in Curry source code.

use crate::ident::Ident;
use curry_diagnostics::SrcRef;
use num_bigint::BigInt;
use std::fmt;

/// A literal value in source code.
///
/// Integer literals carry an identifier used later for overload resolution;
/// the other kinds carry a source reference for back-mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Int(Ident, BigInt),
    Float(SrcRef, OrderedFloat),
    Char(SrcRef, char),
    String(SrcRef, String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(_, v) => write!(f, "{v}"),
            Literal::Float(_, v) => write!(f, "{v}"),
            Literal::Char(_, c) => write!(f, "{c:?}"),
            Literal::String(_, s) => write!(f, "{s:?}"),
        }
    }
}

/// A float literal value with total equality.
///
/// Literals must be comparable and hashable (the AST derives `Eq`), so the
/// raw `f64` is compared by its bit pattern. Two NaN literals with the same
/// bits are equal; `0.0` and `-0.0` are not.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// The underlying float.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for OrderedFloat {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<OrderedFloat> for f64 {
    fn from(value: OrderedFloat) -> Self {
        value.0
    }
}

impl fmt::Display for OrderedFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_float_nan() {
        let a = OrderedFloat::new(f64::NAN);
        let b = OrderedFloat::new(f64::NAN);
        assert_eq!(a, b);
        assert_ne!(OrderedFloat::new(0.0), OrderedFloat::new(-0.0));
    }
}
