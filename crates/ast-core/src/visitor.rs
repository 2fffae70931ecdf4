//! The visitor framework (§4.5): pre-order, post-order, and call-driven
//! traversal over the node graph, with ancestor queries, argument/result
//! passing, cancellation, and debug tracing.
//!
//! The original's double-dispatch "accept" hook is realized here as plain
//! recursive calls driven by the pass itself (see `passes/`), rather than
//! virtual dispatch — there's no inheritance hierarchy of node classes to
//! dispatch through in the tagged-variant model this crate uses (§9). What
//! the framework actually needs to provide — DAG-safe pre/post traversal,
//! an ancestor stack, recursive arg/result saving, and cancellation — lives
//! here in [`VisitorRuntime`] and the free `process_pre_order` /
//! `process_post_order` drivers; call-driven passes (the printer) drive
//! their own recursion directly through [`VisitorRuntime::enter`] and
//! [`VisitorRuntime::with_frame`].

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use smallvec::SmallVec;

use crate::location::Location;
use crate::logger::Logger;
use crate::node::{NodeGraph, NodeId};

/// Ancestor stacks rarely run deeper than a handful of nested blocks;
/// inline storage avoids a heap allocation for the common case.
type AncestorStack = SmallVec<[NodeId; 16]>;

/// Mirrors the source's `processAll` state machine (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorState {
    Idle,
    Running,
    CompleteOk,
    CompleteError,
}

struct Frame<A1, A2, R> {
    arg1: Option<A1>,
    arg2: Option<A2>,
    result: Option<R>,
}

/// Shared state a traversal run threads through every visit: the ancestor
/// stack, a DAG-safety visited set, cancellation (via the embedded
/// logger), debug tracing, and a stack of arg/result frames for recursive
/// re-entry.
pub struct VisitorRuntime<'g, A1, A2, R> {
    graph: &'g NodeGraph,
    logger: Logger,
    name: String,
    state: Cell<VisitorState>,
    ancestors: RefCell<AncestorStack>,
    visited: RefCell<HashSet<NodeId>>,
    debug: Cell<bool>,
    frames: RefCell<Vec<Frame<A1, A2, R>>>,
}

impl<'g, A1: Clone, A2: Clone, R: Clone> VisitorRuntime<'g, A1, A2, R> {
    pub fn new(graph: &'g NodeGraph, name: impl Into<String>, logger: Logger) -> Self {
        VisitorRuntime {
            graph,
            logger,
            name: name.into(),
            state: Cell::new(VisitorState::Idle),
            ancestors: RefCell::new(SmallVec::new()),
            visited: RefCell::new(HashSet::new()),
            debug: Cell::new(false),
            frames: RefCell::new(vec![Frame {
                arg1: None,
                arg2: None,
                result: None,
            }]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &'g NodeGraph {
        self.graph
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn state(&self) -> VisitorState {
        self.state.get()
    }

    pub fn reset(&self) {
        self.state.set(VisitorState::Idle);
        self.ancestors.borrow_mut().clear();
        self.visited.borrow_mut().clear();
        self.frames.borrow_mut().clear();
        self.frames.borrow_mut().push(Frame {
            arg1: None,
            arg2: None,
            result: None,
        });
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.set(enabled);
    }

    pub fn is_cancelled(&self) -> bool {
        self.logger.is_cancelled()
    }

    /// Marks `id` visited for DAG-safety; returns `false` if it was already
    /// visited in this run (caller should skip it).
    fn mark_visited(&self, id: NodeId) -> bool {
        self.visited.borrow_mut().insert(id)
    }

    /// Pushes `id` on the ancestor stack, runs `body`, pops it afterward.
    /// Drives `current`/`parent`/`current_location`.
    pub fn enter<T>(&self, id: NodeId, body: impl FnOnce() -> T) -> T {
        self.ancestors.borrow_mut().push(id);
        if self.debug.get() {
            let depth = self.ancestors.borrow().len();
            tracing::debug!(visitor = %self.name, node = ?id, depth, "visit");
        }
        let result = body();
        self.ancestors.borrow_mut().pop();
        result
    }

    /// Saves the current arg/result frame, installs a fresh one for a
    /// recursive re-entry, runs `body`, then restores the saved frame
    /// (§4.5 "recursive arg saving").
    pub fn with_frame<T>(&self, arg1: Option<A1>, arg2: Option<A2>, body: impl FnOnce() -> T) -> T {
        self.frames.borrow_mut().push(Frame {
            arg1,
            arg2,
            result: None,
        });
        let result = body();
        self.frames.borrow_mut().pop();
        result
    }

    pub fn arg1(&self) -> Option<A1> {
        self.frames.borrow().last().and_then(|f| f.arg1.clone())
    }

    pub fn arg2(&self) -> Option<A2> {
        self.frames.borrow().last().and_then(|f| f.arg2.clone())
    }

    /// Sets the current frame's result.
    pub fn set_result(&self, result: R) {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.result = Some(result);
        }
    }

    pub fn result(&self) -> Option<R> {
        self.frames.borrow().last().and_then(|f| f.result.clone())
    }

    /// Enforces "either a result is set or a default was declared" (§4.5):
    /// returns the set result, falling back to `default`, and reports an
    /// internal error if neither is available.
    pub fn result_or(&self, default: Option<R>) -> R {
        match self.result().or(default) {
            Some(r) => r,
            None => self
                .logger
                .internal_error("visitor produced no result and no default was declared"),
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        self.ancestors.borrow().last().copied()
    }

    pub fn parent(&self) -> Option<NodeId> {
        let ancestors = self.ancestors.borrow();
        if ancestors.len() < 2 {
            None
        } else {
            Some(ancestors[ancestors.len() - 2])
        }
    }

    /// Nearest ancestor (including the current node) satisfying `pred`;
    /// the source's `current<T>()` generalized to a predicate since kinds
    /// here are distinguished at the call site, not via RTTI.
    pub fn current_matching(&self, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.ancestors.borrow().iter().rev().find(|&&id| pred(id)).copied()
    }

    /// As `current_matching`, excluding the node itself (`parent<T>()`).
    pub fn parent_matching(&self, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let ancestors = self.ancestors.borrow();
        ancestors
            .iter()
            .rev()
            .skip(1)
            .find(|&&id| pred(id))
            .copied()
    }

    /// First non-sentinel location walking up from the current node.
    pub fn current_location(&self) -> Location {
        for &id in self.ancestors.borrow().iter().rev() {
            let loc = self.graph.location(id);
            if !loc.is_none() {
                return loc;
            }
        }
        Location::NONE
    }
}

fn finish<A1: Clone, A2: Clone, R: Clone>(rt: &VisitorRuntime<'_, A1, A2, R>) -> bool {
    let ok = rt.logger.errors() == 0 && !rt.is_cancelled();
    rt.state
        .set(if ok { VisitorState::CompleteOk } else { VisitorState::CompleteError });
    ok
}

/// Pre-order traversal (§4.5 mode 1): visit a node, then its children in
/// order (or reverse, if `reverse_children`). Already-visited nodes are
/// skipped for DAG safety. Returns whether the run completed with zero
/// errors.
pub fn process_pre_order<A1: Clone, A2: Clone, R: Clone>(
    rt: &VisitorRuntime<'_, A1, A2, R>,
    root: NodeId,
    reverse_children: bool,
    mut visit: impl FnMut(&VisitorRuntime<'_, A1, A2, R>, NodeId),
) -> bool {
    rt.reset();
    rt.state.set(VisitorState::Running);

    fn walk<A1: Clone, A2: Clone, R: Clone>(
        rt: &VisitorRuntime<'_, A1, A2, R>,
        id: NodeId,
        reverse: bool,
        visit: &mut impl FnMut(&VisitorRuntime<'_, A1, A2, R>, NodeId),
    ) {
        if rt.is_cancelled() || !rt.mark_visited(id) {
            return;
        }
        rt.enter(id, || visit(rt, id));
        if rt.is_cancelled() {
            return;
        }
        let mut children = rt.graph.children(id);
        if reverse {
            children.reverse();
        }
        for child in children {
            walk(rt, child, reverse, visit);
        }
    }

    walk(rt, root, reverse_children, &mut visit);
    finish(rt)
}

/// Post-order traversal (§4.5 mode 2): visit each child, then the node.
pub fn process_post_order<A1: Clone, A2: Clone, R: Clone>(
    rt: &VisitorRuntime<'_, A1, A2, R>,
    root: NodeId,
    mut visit: impl FnMut(&VisitorRuntime<'_, A1, A2, R>, NodeId),
) -> bool {
    rt.reset();
    rt.state.set(VisitorState::Running);

    fn walk<A1: Clone, A2: Clone, R: Clone>(
        rt: &VisitorRuntime<'_, A1, A2, R>,
        id: NodeId,
        visit: &mut impl FnMut(&VisitorRuntime<'_, A1, A2, R>, NodeId),
    ) {
        if rt.is_cancelled() || !rt.mark_visited(id) {
            return;
        }
        for child in rt.graph.children(id) {
            walk(rt, child, visit);
            if rt.is_cancelled() {
                return;
            }
        }
        rt.enter(id, || visit(rt, id));
    }

    walk(rt, root, &mut visit);
    finish(rt)
}

/// Call-driven traversal (§4.5 mode 3): no automatic descent. `visit` is
/// invoked once on `root`; it is responsible for re-entering via
/// [`VisitorRuntime::enter`]/[`VisitorRuntime::with_frame`] on whichever
/// children it chooses.
pub fn process_call_driven<A1: Clone, A2: Clone, R: Clone>(
    rt: &VisitorRuntime<'_, A1, A2, R>,
    root: NodeId,
    visit: impl FnOnce(&VisitorRuntime<'_, A1, A2, R>, NodeId),
) -> bool {
    rt.reset();
    rt.state.set(VisitorState::Running);
    rt.enter(root, || visit(rt, root));
    finish(rt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use std::cell::RefCell as StdRefCell;

    fn logger() -> Logger {
        Logger::new("visitor-test")
    }

    #[test]
    fn pre_order_visits_parent_before_children() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let a = graph.create(Location::NONE);
        let b = graph.create(Location::NONE);
        graph.add_child(root, a);
        graph.add_child(root, b);

        let rt: VisitorRuntime<'_, (), (), ()> = VisitorRuntime::new(&graph, "pre", logger());
        let order = StdRefCell::new(Vec::new());
        let ok = process_pre_order(&rt, root, false, |_, id| order.borrow_mut().push(id));
        assert!(ok);
        assert_eq!(order.into_inner(), vec![root, a, b]);
    }

    #[test]
    fn post_order_visits_children_before_parent() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let a = graph.create(Location::NONE);
        graph.add_child(root, a);

        let rt: VisitorRuntime<'_, (), (), ()> = VisitorRuntime::new(&graph, "post", logger());
        let order = StdRefCell::new(Vec::new());
        process_post_order(&rt, root, |_, id| order.borrow_mut().push(id));
        assert_eq!(order.into_inner(), vec![a, root]);
    }

    #[test]
    fn pre_order_skips_dag_shared_node_twice() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let a = graph.create(Location::NONE);
        let b = graph.create(Location::NONE);
        let shared = graph.create(Location::NONE);
        graph.add_child(root, a);
        graph.add_child(root, b);
        graph.add_child(a, shared);
        graph.add_child(b, shared);

        let rt: VisitorRuntime<'_, (), (), ()> = VisitorRuntime::new(&graph, "dag", logger());
        let count = StdRefCell::new(0u32);
        process_pre_order(&rt, root, false, |_, id| {
            if id == shared {
                *count.borrow_mut() += 1;
            }
        });
        assert_eq!(count.into_inner(), 1);
    }

    #[test]
    fn current_and_parent_reflect_ancestor_stack() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let child = graph.create(Location::NONE);
        graph.add_child(root, child);

        let rt: VisitorRuntime<'_, (), (), ()> = VisitorRuntime::new(&graph, "anc", logger());
        process_pre_order(&rt, root, false, |rt, id| {
            assert_eq!(rt.current(), Some(id));
            if id == child {
                assert_eq!(rt.parent(), Some(root));
            } else {
                assert_eq!(rt.parent(), None);
            }
        });
    }

    #[test]
    fn fatal_through_logger_cancels_remaining_traversal() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let a = graph.create(Location::NONE);
        let b = graph.create(Location::NONE);
        graph.add_child(root, a);
        graph.add_child(root, b);

        let logger = logger();
        let rt: VisitorRuntime<'_, (), (), ()> = VisitorRuntime::new(&graph, "fatal", logger.clone());
        let visited = StdRefCell::new(Vec::new());
        let ok = process_pre_order(&rt, root, false, |rt, id| {
            visited.borrow_mut().push(id);
            if id == root {
                rt.logger().fatal("stop here");
            }
        });
        assert!(!ok);
        assert_eq!(visited.into_inner(), vec![root]);
    }

    #[test]
    fn with_frame_saves_and_restores_recursive_state() {
        let graph = NodeGraph::new();
        let root = graph.create(Location::NONE);
        let rt: VisitorRuntime<'_, i32, (), i32> = VisitorRuntime::new(&graph, "frame", logger());

        rt.enter(root, || {
            rt.set_result(1);
            rt.with_frame(Some(99), None, || {
                assert_eq!(rt.arg1(), Some(99));
                rt.set_result(2);
                assert_eq!(rt.result(), Some(2));
            });
            assert_eq!(rt.result(), Some(1));
        });
    }

    #[test]
    fn result_or_falls_back_to_declared_default() {
        let graph = NodeGraph::new();
        let rt: VisitorRuntime<'_, (), (), i32> = VisitorRuntime::new(&graph, "default", logger());
        assert_eq!(rt.result_or(Some(42)), 42);
    }
}
