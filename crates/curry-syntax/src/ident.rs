//! Identifier types for the Curry frontend.
//!
//! Three layers of naming:
//!
//! - `Ident` - a plain identifier with a position and a renaming index
//! - `QualIdent` - an identifier with an optional module qualifier
//! - `ModuleIdent` - a dotted module path
//!
//! # Equality
//!
//! Identifiers are compared by name and renaming index; the position is
//! ignored. Qualification is purely syntactic: an absent qualifier means the
//! reference was written unqualified in source, and later semantic passes
//! fill it in.

use curry_diagnostics::{HasPosition, Position};
use smol_str::SmolStr;
use std::fmt;

/// Index assigned to identifiers in the global (unrenamed) scope.
pub const GLOBAL_SCOPE: u32 = 0;

// ============================================================================
// Ident
// ============================================================================

/// An identifier: position, name and a unique renaming index.
///
/// The index is 0 until a renaming pass assigns unique indices within a
/// module. Names are immutable; positions may be updated (e.g. by the
/// source-reference injector).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ident {
    position: Position,
    name: SmolStr,
    index: u32,
}

impl Ident {
    /// Create an identifier in the global scope.
    #[must_use]
    pub fn new(name: impl Into<SmolStr>, position: Position) -> Self {
        Self { position, name: name.into(), index: GLOBAL_SCOPE }
    }

    /// Create an identifier with no position information.
    #[must_use]
    pub fn unpositioned(name: impl Into<SmolStr>) -> Self {
        Self::new(name, Position::NoPos)
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// Get the renaming index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position.clone()
    }

    /// Set the position (mutating).
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Return this identifier with a new renaming index.
    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Check whether this identifier has been renamed.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        self.index != GLOBAL_SCOPE
    }

    /// The anonymous identifier `_`.
    #[must_use]
    pub fn anonymous(position: Position) -> Self {
        Self::new("_", position)
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name == "_"
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.index == other.index
    }
}

impl Eq for Ident {}

impl std::hash::Hash for Ident {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.index.hash(state);
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == GLOBAL_SCOPE {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.name, self.index)
        }
    }
}

impl HasPosition for Ident {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

// ============================================================================
// ModuleIdent
// ============================================================================

/// A module identifier: a non-empty sequence of name components.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleIdent {
    position: Position,
    components: Vec<SmolStr>,
}

impl ModuleIdent {
    /// Create a module identifier from its components.
    #[must_use]
    pub fn new(components: Vec<SmolStr>, position: Position) -> Self {
        Self { position, components }
    }

    /// Parse a dotted module name.
    #[must_use]
    pub fn from_dotted(name: &str, position: Position) -> Self {
        Self {
            position,
            components: name.split('.').map(SmolStr::new).collect(),
        }
    }

    /// The components of the module path.
    #[must_use]
    pub fn components(&self) -> &[SmolStr] {
        &self.components
    }

    /// Get the position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position.clone()
    }

    /// Set the position (mutating).
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// The dotted name.
    #[must_use]
    pub fn name(&self) -> String {
        self.components.join(".")
    }

    /// The default module identifier used when a source file has no header.
    #[must_use]
    pub fn main() -> Self {
        Self::from_dotted("main", Position::NoPos)
    }

    #[must_use]
    pub fn is_main(&self) -> bool {
        self.components.len() == 1 && self.components[0] == "main"
    }
}

impl PartialEq for ModuleIdent {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for ModuleIdent {}

impl std::hash::Hash for ModuleIdent {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl PartialOrd for ModuleIdent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleIdent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for ModuleIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl HasPosition for ModuleIdent {
    fn get_position(&self) -> Position {
        self.position.clone()
    }
}

// ============================================================================
// QualIdent
// ============================================================================

/// An identifier with an optional module qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualIdent {
    qualifier: Option<ModuleIdent>,
    ident: Ident,
}

impl QualIdent {
    /// An unqualified reference.
    #[must_use]
    pub fn plain(ident: Ident) -> Self {
        Self { qualifier: None, ident }
    }

    /// A qualified reference.
    #[must_use]
    pub fn qualified(module: ModuleIdent, ident: Ident) -> Self {
        Self { qualifier: Some(module), ident }
    }

    /// The qualifier, if written in source.
    #[must_use]
    pub fn qualifier(&self) -> Option<&ModuleIdent> {
        self.qualifier.as_ref()
    }

    /// The unqualified identifier.
    #[must_use]
    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    /// The unqualified name.
    #[must_use]
    pub fn name(&self) -> &SmolStr {
        self.ident.name()
    }

    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Drop the qualifier.
    #[must_use]
    pub fn unqualify(self) -> Ident {
        self.ident
    }

    /// The list constructor `:`.
    #[must_use]
    pub fn is_cons(&self) -> bool {
        self.qualifier.is_none() && self.ident.name() == ":"
    }

    /// A tuple constructor `(,)`, `(,,)`, ...
    #[must_use]
    pub fn is_tuple(&self) -> bool {
        let n = self.ident.name();
        n.len() >= 3
            && n.starts_with('(')
            && n.ends_with(')')
            && n[1..n.len() - 1].chars().all(|c| c == ',')
    }

    /// Check if this reference can only denote a data constructor.
    ///
    /// At declaration level, an application whose head fails this test is
    /// reinterpreted as a function left-hand side.
    #[must_use]
    pub fn is_constructor_ident(&self) -> bool {
        self.is_cons() || self.is_qualified() || self.is_tuple()
    }
}

impl fmt::Display for QualIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(m) => write!(f, "{}.{}", m, self.ident),
            None => write!(f, "{}", self.ident),
        }
    }
}

impl HasPosition for QualIdent {
    fn get_position(&self) -> Position {
        self.ident.get_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_equality_ignores_position() {
        let a = Ident::new("foo", Position::new("A.curry", 1, 1));
        let b = Ident::new("foo", Position::new("B.curry", 9, 9));
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_index(1));
    }

    #[test]
    fn test_module_ident() {
        let m = ModuleIdent::from_dotted("Data.Map", Position::NoPos);
        assert_eq!(m.components().len(), 2);
        assert_eq!(m.name(), "Data.Map");
        assert!(ModuleIdent::main().is_main());
    }

    #[test]
    fn test_constructor_ident() {
        let pos = Position::NoPos;
        assert!(QualIdent::plain(Ident::new(":", pos.clone())).is_cons());
        assert!(QualIdent::plain(Ident::new("(,)", pos.clone())).is_tuple());
        assert!(QualIdent::plain(Ident::new("(,,)", pos.clone())).is_tuple());
        assert!(!QualIdent::plain(Ident::new("()", pos.clone())).is_tuple());

        let qualified = QualIdent::qualified(
            ModuleIdent::from_dotted("M", pos.clone()),
            Ident::new("C", pos.clone()),
        );
        assert!(qualified.is_constructor_ident());
        assert!(!QualIdent::plain(Ident::new("f", pos)).is_constructor_ident());
    }
}
