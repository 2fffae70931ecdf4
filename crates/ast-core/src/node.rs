//! The generic AST node graph: identity, parent/child edges, and metadata
//! (§3.1, §4.1).
//!
//! Every concrete node kind (declarations, expressions, types, ...) embeds a
//! [`NodeBase`] and is allocated through [`crate::arena::Arena`], which hands
//! back a stable [`NodeId`]. Graph operations (`add_child`, `replace`,
//! `children`, ...) live here and operate purely in terms of `NodeId`, so
//! they're shared by every node kind rather than duplicated per-kind.
//!
//! Node references are a shared indirection cell (§3.2): copying a
//! [`Slot`] shares the same underlying storage, so assigning through one
//! copy is visible through all of them. This is how `replace` propagates to
//! every outstanding reference without walking the whole tree.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::location::Location;
use crate::meta::MetaMap;

/// A small `Copy` handle identifying a node within its owning arena.
///
/// `NodeId`s are only meaningful relative to the [`crate::arena::Arena`]
/// (via [`crate::context::CompileCtxt`]) that minted them; comparing IDs
/// from different contexts is a caller bug, not something this type
/// prevents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A shared indirection cell over a [`NodeId`] (§3.2).
///
/// Cloning a `Slot` shares the same cell: `a.get() == b.get()` after
/// `let b = a.clone()`, and `a.set(x)` is observed by `b.get()` too.
/// Converting to a plain `NodeId` (via [`Slot::get`]) loses that link —
/// a copy taken that way won't see later replacements.
#[derive(Debug, Clone)]
pub struct Slot(Rc<Cell<NodeId>>);

impl Slot {
    pub fn new(target: NodeId) -> Self {
        Slot(Rc::new(Cell::new(target)))
    }

    pub fn get(&self) -> NodeId {
        self.0.get()
    }

    pub fn set(&self, target: NodeId) {
        self.0.set(target);
    }

    /// True if `self` and `other` share the same underlying cell (as
    /// opposed to merely pointing at the same node right now).
    pub fn same_cell(&self, other: &Slot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}
impl Eq for Slot {}

/// The fields every concrete node kind carries (§3.1).
///
/// Concrete node structs embed a `NodeBase` rather than inheriting from it;
/// dispatch on "what kind of node is this" happens via the per-base-kind
/// tagged enums (`DeclKind`, `ExprKind`, ...) defined alongside each base,
/// not via a virtual method on `NodeBase` itself.
#[derive(Debug)]
pub struct NodeBase {
    id: NodeId,
    location: Location,
    children: RefCell<Vec<NodeId>>,
    parents: RefCell<Vec<NodeId>>,
    comments: RefCell<Vec<String>>,
    meta: RefCell<MetaMap>,
}

impl NodeBase {
    pub fn new(id: NodeId, location: Location) -> Self {
        NodeBase {
            id,
            location,
            children: RefCell::new(Vec::new()),
            parents: RefCell::new(Vec::new()),
            comments: RefCell::new(Vec::new()),
            meta: RefCell::new(MetaMap::new()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn comments(&self) -> Vec<String> {
        self.comments.borrow().clone()
    }

    pub fn add_comment(&self, comment: impl Into<String>) {
        self.comments.borrow_mut().push(comment.into());
    }

    pub fn meta(&self) -> std::cell::RefMut<'_, MetaMap> {
        self.meta.borrow_mut()
    }

    pub(crate) fn children_raw(&self) -> std::cell::Ref<'_, Vec<NodeId>> {
        self.children.borrow()
    }

    pub(crate) fn parents_raw(&self) -> std::cell::Ref<'_, Vec<NodeId>> {
        self.parents.borrow()
    }
}

/// A table of [`NodeBase`]s keyed by [`NodeId`], implementing the generic
/// graph operations of §4.1.
///
/// Owned by [`crate::context::CompileCtxt`]; concrete node kinds keep their
/// own per-kind storage (the arena proper) and register a `NodeBase` here
/// so graph operations work uniformly across kinds.
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: RefCell<Vec<NodeBase>>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new node and returns its id. `location` is immutable for
    /// the node's lifetime (§3.1).
    pub fn create(&self, location: Location) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::from_index(nodes.len());
        nodes.push(NodeBase::new(id, location));
        id
    }

    fn base(&self, id: NodeId) -> std::cell::Ref<'_, NodeBase> {
        std::cell::Ref::map(self.nodes.borrow(), |nodes| &nodes[id.index()])
    }

    pub fn location(&self, id: NodeId) -> Location {
        self.base(id).location().clone()
    }

    pub fn add_comment(&self, id: NodeId, comment: impl Into<String>) {
        self.base(id).add_comment(comment);
    }

    pub fn comments(&self, id: NodeId) -> Vec<String> {
        self.base(id).comments()
    }

    /// Runs `f` against `id`'s metadata multimap (§3.1, §4.1 `metaInfo`).
    pub fn with_meta_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut MetaMap) -> R) -> R {
        let base = self.base(id);
        let mut meta = base.meta();
        f(&mut meta)
    }

    /// Direct children, in insertion order (duplicates allowed, §3.1).
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.base(id).children_raw().clone()
    }

    /// All descendants reachable from `id`, each appearing once, in a
    /// DAG-safe traversal order (§4.1 "children(recursive)").
    pub fn children_recursive(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            let mut kids = self.children(next);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.base(id).parents_raw().clone()
    }

    /// True if `candidate` is `id` itself or a transitive parent of `id`.
    fn is_ancestor(&self, candidate: NodeId, id: NodeId) -> bool {
        if candidate == id {
            return true;
        }
        let mut seen = HashSet::new();
        let mut stack = self.parents(id);
        while let Some(p) = stack.pop() {
            if p == candidate {
                return true;
            }
            if seen.insert(p) {
                stack.extend(self.parents(p));
            }
        }
        false
    }

    /// Appends `child` to `parent`'s children and registers the symmetric
    /// back-reference (§4.1 invariant 1). Aborts as a fatal internal error
    /// (a panic, per the visitor's non-exception cancellation model — the
    /// caller is expected to have checked `would_cycle` first in contexts
    /// where a graceful failure is wanted) if `child` is an ancestor of
    /// `parent`, since that would create a cycle.
    pub fn add_child(&self, parent: NodeId, child: NodeId) {
        if self.is_ancestor(child, parent) {
            panic!(
                "internal error: addChild({:?}, {:?}) would create a cycle",
                parent, child
            );
        }
        self.base(parent).children.borrow_mut().push(child);
        self.base(child).parents.borrow_mut().push(parent);
    }

    /// Non-panicking precheck for callers (e.g. builders) that want to
    /// avoid triggering the fatal path in `add_child`.
    pub fn would_cycle(&self, parent: NodeId, child: NodeId) -> bool {
        self.is_ancestor(child, parent)
    }

    /// Removes one occurrence of `child` from `parent`'s children and the
    /// matching back-reference. Returns `true` if `child` was actually a
    /// child of `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let removed = {
            let mut children = self.base(parent).children.borrow_mut();
            match children.iter().position(|&c| c == child) {
                Some(pos) => {
                    children.remove(pos);
                    true
                }
                None => false,
            }
        };
        if removed {
            let mut parents = self.base(child).parents.borrow_mut();
            if let Some(pos) = parents.iter().position(|&p| p == parent) {
                parents.remove(pos);
            }
        }
        removed
    }

    /// Removes `id` from every parent's child list and clears `id`'s own
    /// parent list.
    pub fn remove_from_parents(&self, id: NodeId) {
        let parents = self.parents(id);
        for parent in parents {
            self.remove_child(parent, id);
        }
    }

    /// Rewrites every parent (optionally filtered by `parent_filter`) that
    /// currently has a slot referring to `old` so it refers to `new`
    /// instead (§4.1 `replace`). Returns the number of parents rewritten.
    pub fn replace(
        &self,
        old: NodeId,
        new: NodeId,
        parent_filter: Option<&dyn Fn(NodeId) -> bool>,
    ) -> usize {
        let parents = self.parents(old);
        let mut rewritten = 0;
        for parent in parents {
            if let Some(filter) = parent_filter {
                if !filter(parent) {
                    continue;
                }
            }
            let mut children = self.base(parent).children.borrow_mut();
            let mut matched = false;
            for slot in children.iter_mut() {
                if *slot == old {
                    *slot = new;
                    matched = true;
                }
            }
            drop(children);
            if matched {
                let mut old_parents = self.base(old).parents.borrow_mut();
                old_parents.retain(|&p| p != parent);
                drop(old_parents);
                self.base(new).parents.borrow_mut().push(parent);
                rewritten += 1;
            }
        }
        rewritten
    }

    /// DFS upward through `id`'s parents, collecting every ancestor node
    /// for which `matches` holds, breadth-first by first encounter (§4.1
    /// `parents-of-type<T>`). Order-sensitive; kept for parity with
    /// existing passes but new code should prefer a targeted walk.
    pub fn parents_of_type(&self, id: NodeId, matches: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue: std::collections::VecDeque<NodeId> = self.parents(id).into();
        while let Some(p) = queue.pop_front() {
            if !seen.insert(p) {
                continue;
            }
            if matches(p) {
                out.push(p);
            }
            queue.extend(self.parents(p));
        }
        out
    }

    /// The child immediately following `child` in `id`'s own child list, or
    /// `None` if `child` isn't a direct child or is the last one (§2b, §4.1
    /// `siblingOfChild`).
    pub fn sibling_of_child(&self, id: NodeId, child: NodeId) -> Option<NodeId> {
        let children = self.children(id);
        let pos = children.iter().position(|&c| c == child)?;
        children.get(pos + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::NONE
    }

    #[test]
    fn add_child_sets_symmetric_edge() {
        let g = NodeGraph::new();
        let p = g.create(loc());
        let c = g.create(loc());
        g.add_child(p, c);
        assert_eq!(g.children(p), vec![c]);
        assert_eq!(g.parents(c), vec![p]);
    }

    #[test]
    fn remove_child_clears_symmetric_edge() {
        let g = NodeGraph::new();
        let p = g.create(loc());
        let c = g.create(loc());
        g.add_child(p, c);
        assert!(g.remove_child(p, c));
        assert!(g.children(p).is_empty());
        assert!(g.parents(c).is_empty());
    }

    #[test]
    fn remove_child_false_when_not_a_child() {
        let g = NodeGraph::new();
        let p = g.create(loc());
        let c = g.create(loc());
        assert!(!g.remove_child(p, c));
    }

    #[test]
    #[should_panic(expected = "would create a cycle")]
    fn add_child_detects_cycle() {
        let g = NodeGraph::new();
        let a = g.create(loc());
        let b = g.create(loc());
        g.add_child(a, b);
        g.add_child(b, a);
    }

    #[test]
    fn would_cycle_is_a_safe_precheck() {
        let g = NodeGraph::new();
        let a = g.create(loc());
        let b = g.create(loc());
        g.add_child(a, b);
        assert!(g.would_cycle(b, a));
        assert!(!g.would_cycle(a, b));
    }

    #[test]
    fn replace_rewrites_every_parent_slot() {
        let g = NodeGraph::new();
        let p1 = g.create(loc());
        let p2 = g.create(loc());
        let old = g.create(loc());
        let new = g.create(loc());
        g.add_child(p1, old);
        g.add_child(p2, old);

        let rewritten = g.replace(old, new, None);

        assert_eq!(rewritten, 2);
        assert_eq!(g.children(p1), vec![new]);
        assert_eq!(g.children(p2), vec![new]);
        assert!(g.parents(old).is_empty());
        let mut new_parents = g.parents(new);
        new_parents.sort();
        let mut expected = vec![p1, p2];
        expected.sort();
        assert_eq!(new_parents, expected);
    }

    #[test]
    fn replace_honors_parent_filter() {
        let g = NodeGraph::new();
        let p1 = g.create(loc());
        let p2 = g.create(loc());
        let old = g.create(loc());
        let new = g.create(loc());
        g.add_child(p1, old);
        g.add_child(p2, old);

        let rewritten = g.replace(old, new, Some(&|p| p == p1));

        assert_eq!(rewritten, 1);
        assert_eq!(g.children(p1), vec![new]);
        assert_eq!(g.children(p2), vec![old]);
    }

    #[test]
    fn children_recursive_deduplicates_dag_sharing() {
        let g = NodeGraph::new();
        let root = g.create(loc());
        let shared = g.create(loc());
        let a = g.create(loc());
        let b = g.create(loc());
        g.add_child(root, a);
        g.add_child(root, b);
        g.add_child(a, shared);
        g.add_child(b, shared);

        let all = g.children_recursive(root);
        assert_eq!(all.iter().filter(|&&n| n == shared).count(), 1);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn sibling_of_child_returns_next_or_none() {
        let g = NodeGraph::new();
        let p = g.create(loc());
        let a = g.create(loc());
        let b = g.create(loc());
        g.add_child(p, a);
        g.add_child(p, b);
        assert_eq!(g.sibling_of_child(p, a), Some(b));
        assert_eq!(g.sibling_of_child(p, b), None);
        let stranger = g.create(loc());
        assert_eq!(g.sibling_of_child(p, stranger), None);
    }

    #[test]
    fn remove_from_parents_detaches_from_all() {
        let g = NodeGraph::new();
        let p1 = g.create(loc());
        let p2 = g.create(loc());
        let c = g.create(loc());
        g.add_child(p1, c);
        g.add_child(p2, c);
        g.remove_from_parents(c);
        assert!(g.children(p1).is_empty());
        assert!(g.children(p2).is_empty());
        assert!(g.parents(c).is_empty());
    }

    #[test]
    fn slot_clones_share_the_same_cell() {
        let a = Slot::new(NodeId::from_index(0));
        let b = a.clone();
        a.set(NodeId::from_index(7));
        assert_eq!(b.get(), NodeId::from_index(7));
        assert!(a.same_cell(&b));
    }

    #[test]
    fn slot_plain_copy_of_id_does_not_track_updates() {
        let a = Slot::new(NodeId::from_index(0));
        let snapshot = a.get();
        a.set(NodeId::from_index(9));
        assert_ne!(snapshot, a.get());
    }
}
