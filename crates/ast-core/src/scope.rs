//! Hierarchical scopes with scoped (`::`-separated) identifier lookup
//! (§3.3, §4.2).
//!
//! A scope maps simple names to values (usually a node reference standing
//! in for a definition). Scopes form a tree via an optional parent link and
//! may have named child scopes (keyed by module/namespace name), used to
//! resolve the non-leaf components of a dotted query.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::ident::Identifier;
use crate::node::NodeId;

struct ScopeInner {
    parent: RefCell<Option<Weak<ScopeInner>>>,
    bindings: RefCell<HashMap<String, NodeId>>,
    named_children: RefCell<HashMap<String, Scope>>,
}

/// A scope: a symbol table node in the scope tree.
///
/// Cloning a `Scope` is cheap and shares the same underlying table (it's an
/// `Rc` handle), matching how scopes are threaded through blocks and
/// modules without deep copying.
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

impl Scope {
    pub fn new() -> Self {
        Scope(Rc::new(ScopeInner {
            parent: RefCell::new(None),
            bindings: RefCell::new(HashMap::new()),
            named_children: RefCell::new(HashMap::new()),
        }))
    }

    pub fn set_parent(&self, parent: &Scope) {
        *self.0.parent.borrow_mut() = Some(Rc::downgrade(&parent.0));
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Scope)
    }

    /// Registers `scope` as a named child keyed by `name`, used to resolve
    /// the non-leaf components of a dotted lookup (§3.3 step 5).
    pub fn add_child(&self, name: impl Into<String>, scope: Scope) {
        self.0.named_children.borrow_mut().insert(name.into(), scope);
    }

    fn named_child(&self, name: &str) -> Option<Scope> {
        self.0.named_children.borrow().get(name).cloned()
    }

    /// Binds `id` (must be unscoped, §3.3) to `value`. Replaces any prior
    /// binding under the same name.
    pub fn insert(&self, id: &Identifier, value: NodeId) {
        assert!(
            !id.is_scoped(),
            "scope insertion requires an unscoped identifier, got {}",
            id
        );
        self.0
            .bindings
            .borrow_mut()
            .insert(id.local().to_string(), value);
    }

    pub fn remove(&self, id: &Identifier) -> Option<NodeId> {
        self.0.bindings.borrow_mut().remove(id.local())
    }

    /// The full local bindings map (§4.2 `map()`), a snapshot copy.
    pub fn map(&self) -> HashMap<String, NodeId> {
        self.0.bindings.borrow().clone()
    }

    pub fn has(&self, id: &Identifier, traverse: bool) -> bool {
        self.lookup(id, traverse).is_some()
    }

    /// Resolves `id` against this scope following §3.3's algorithm:
    /// split into components, resolve the head in local bindings (only
    /// valid if it's the whole query), else descend into a matching named
    /// child scope with the remaining components, else (if `traverse`)
    /// defer to the parent scope with the full original query.
    pub fn lookup(&self, id: &Identifier, traverse: bool) -> Option<NodeId> {
        self.lookup_components(id.components(), id, traverse)
    }

    fn lookup_components(
        &self,
        components: &[String],
        original: &Identifier,
        traverse: bool,
    ) -> Option<NodeId> {
        let (head, rest) = components.split_first()?;

        if let Some(value) = self.0.bindings.borrow().get(head) {
            if rest.is_empty() {
                return Some(*value);
            }
            // A leaf match can't be further qualified (§3.3 step 4): treat
            // as not-found and stop, without falling through to a parent
            // traversal of the original query.
            return None;
        } else if let Some(child) = self.named_child(head) {
            if let Some(found) = child.lookup_components(rest, original, false) {
                return Some(found);
            }
        }

        if traverse {
            if let Some(parent) = self.parent() {
                return parent.lookup_components(original.components(), original, true);
            }
        }

        None
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
