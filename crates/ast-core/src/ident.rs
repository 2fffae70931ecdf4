//! Identifiers: simple or `::`-scoped dotted paths (§3.3).

use std::fmt;

use crate::intern::InternPool;

/// An identifier: either a single component (`foo`) or a `::`-separated
/// path (`foo::bar::baz`).
///
/// Stored as its component list rather than the joined string, so the leaf
/// name, scope prefix, and component iteration are all free of re-parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    components: Vec<String>,
}

impl Identifier {
    /// Parses a `::`-separated path. Panics on an empty string; an
    /// identifier always has at least one component.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        assert!(!path.is_empty(), "identifier must have at least one component");
        Identifier {
            components: path.split("::").map(String::from).collect(),
        }
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Identifier {
            components: vec![name.into()],
        }
    }

    pub fn from_components(components: Vec<String>) -> Self {
        assert!(!components.is_empty(), "identifier must have at least one component");
        Identifier { components }
    }

    /// As [`Self::new`], interning each component through `pool` first
    /// (§2a) so repeated path segments across many identifiers share one
    /// entry in the run's intern table, rather than each parse allocating
    /// its own copy.
    pub fn interned(pool: &InternPool, path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        assert!(!path.is_empty(), "identifier must have at least one component");
        let components = path
            .split("::")
            .map(|part| {
                let symbol = pool.intern(part);
                pool.resolve(symbol).expect("just-interned symbol resolves")
            })
            .collect();
        Identifier { components }
    }

    pub fn is_scoped(&self) -> bool {
        self.components.len() > 1
    }

    /// The final component (`baz` in `foo::bar::baz`).
    pub fn local(&self) -> &str {
        self.components.last().expect("non-empty components")
    }

    /// Every component but the last, rejoined with `::`, or `None` for a
    /// simple (unscoped) identifier.
    pub fn scope_prefix(&self) -> Option<String> {
        if self.components.len() <= 1 {
            return None;
        }
        Some(self.components[..self.components.len() - 1].join("::"))
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The full dotted path (`foo::bar::baz`).
    pub fn path(&self) -> String {
        self.components.join("::")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_identifier_has_no_scope_prefix() {
        let id = Identifier::simple("foo");
        assert!(!id.is_scoped());
        assert_eq!(id.local(), "foo");
        assert_eq!(id.scope_prefix(), None);
        assert_eq!(id.path(), "foo");
    }

    #[test]
    fn scoped_identifier_splits_leaf_and_prefix() {
        let id = Identifier::new("a::b::c");
        assert!(id.is_scoped());
        assert_eq!(id.local(), "c");
        assert_eq!(id.scope_prefix().as_deref(), Some("a::b"));
        assert_eq!(id.components(), &["a", "b", "c"]);
    }

    #[test]
    fn display_rejoins_with_double_colon() {
        let id = Identifier::from_components(vec!["x".into(), "y".into()]);
        assert_eq!(id.to_string(), "x::y");
    }

    #[test]
    #[should_panic]
    fn empty_path_panics() {
        Identifier::new("");
    }

    #[test]
    fn interned_identifier_matches_the_plain_parse() {
        let pool = InternPool::new();
        let id = Identifier::interned(&pool, "a::b::c");
        assert_eq!(id, Identifier::new("a::b::c"));
    }

    #[test]
    fn interned_repeated_components_share_the_pool_entry() {
        let pool = InternPool::new();
        let _ = Identifier::interned(&pool, "a::b");
        let _ = Identifier::interned(&pool, "a::c");
        // "a" is shared between both identifiers; "b" and "c" are new.
        assert_eq!(pool.len(), 3);
    }
}
