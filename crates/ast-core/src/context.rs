//! The compilation context (§4.9): the object a pass or driver holds to get
//! at everything else — the arena, the logger, the instruction catalogue,
//! modules by name, and a place to stash per-node analysis results.
//!
//! This is a deliberately narrow single-threaded adaptation of the
//! arena-owner-plus-registry split the workspace's larger graph-building
//! crate uses for its own `CompileCtxt`/`CompileUnit`: no parallel parsing,
//! no `RwLock`, no file-system awareness. §5 mandates synchronous
//! single-threaded execution, and parsing is out of scope (§1), so the
//! context here only needs to own state, not coordinate access to it.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::arena::Arena;
use crate::ident::Identifier;
use crate::instruction::InstructionRegistry;
use crate::intern::InternPool;
use crate::logger::Logger;
use crate::node::NodeId;

/// Per-node analysis results, keyed by node identity rather than kind.
///
/// A pass that computes something about a node (e.g. a resolved type, a
/// liveness set) stashes it here instead of threading an extra field
/// through every node kind that might want one. Results are boxed `dyn Any`
/// because different analyses cache different result types in the same
/// map; callers know what they put in and downcast accordingly.
#[derive(Default)]
struct AnalysisCache {
    results: RefCell<HashMap<NodeId, Box<dyn Any>>>,
}

impl AnalysisCache {
    fn insert<T: 'static>(&self, id: NodeId, value: T) {
        self.results.borrow_mut().insert(id, Box::new(value));
    }

    fn get<T: Clone + 'static>(&self, id: NodeId) -> Option<T> {
        self.results
            .borrow()
            .get(&id)
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    fn contains(&self, id: NodeId) -> bool {
        self.results.borrow().contains_key(&id)
    }

    fn invalidate(&self, id: NodeId) -> bool {
        self.results.borrow_mut().remove(&id).is_some()
    }

    fn clear(&self) {
        self.results.borrow_mut().clear();
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("len", &self.results.borrow().len())
            .finish()
    }
}

/// Owns the arena, the diagnostic channel, the instruction catalogue, a
/// by-name module registry, and the analysis cache for one compile run.
///
/// A run typically allocates one `CompileCtxt`, parses (or otherwise
/// builds) an initial AST into it via the out-of-scope front end, then runs
/// a sequence of passes over it, each taking `&CompileCtxt` rather than the
/// arena and logger separately.
pub struct CompileCtxt {
    arena: Arena,
    logger: Logger,
    instructions: RefCell<InstructionRegistry>,
    modules: RefCell<HashMap<Identifier, NodeId>>,
    cache: AnalysisCache,
    interner: InternPool,
}

impl CompileCtxt {
    pub fn new(logger_name: impl Into<String>) -> Self {
        CompileCtxt {
            arena: Arena::new(),
            logger: Logger::new(logger_name),
            instructions: RefCell::new(InstructionRegistry::new()),
            modules: RefCell::new(HashMap::new()),
            cache: AnalysisCache::default(),
            interner: InternPool::new(),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The run's shared identifier-component interner (§2a).
    pub fn interner(&self) -> &InternPool {
        &self.interner
    }

    pub fn instructions(&self) -> std::cell::Ref<'_, InstructionRegistry> {
        self.instructions.borrow()
    }

    pub fn instructions_mut(&self) -> std::cell::RefMut<'_, InstructionRegistry> {
        self.instructions.borrow_mut()
    }

    /// Registers a module under its own name, replacing any previous
    /// registration for that name. Modules are looked up by the plain
    /// [`Identifier`] the parser assigned them, not by file path.
    pub fn register_module(&self, id: NodeId) {
        let name = self.arena.module(id).name().clone();
        self.modules.borrow_mut().insert(name, id);
    }

    pub fn module_by_name(&self, name: &Identifier) -> Option<NodeId> {
        self.modules.borrow().get(name).copied()
    }

    pub fn module_names(&self) -> Vec<Identifier> {
        self.modules.borrow().keys().cloned().collect()
    }

    /// Records an analysis result for `id`, overwriting any prior result
    /// for the same node under the same type.
    pub fn cache_insert<T: 'static>(&self, id: NodeId, value: T) {
        self.cache.insert(id, value);
    }

    pub fn cache_get<T: Clone + 'static>(&self, id: NodeId) -> Option<T> {
        self.cache.get(id)
    }

    pub fn cache_contains(&self, id: NodeId) -> bool {
        self.cache.contains(id)
    }

    /// Drops the cached result for `id`, e.g. after a rewrite pass
    /// invalidates whatever an earlier analysis pass concluded about it.
    pub fn cache_invalidate(&self, id: NodeId) -> bool {
        self.cache.invalidate(id)
    }

    /// Drops every cached result. Rewriting passes that touch the whole
    /// graph (the instruction normaliser, the ID-replacer) call this
    /// rather than invalidating node-by-node.
    pub fn cache_clear(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for CompileCtxt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileCtxt")
            .field("modules", &self.modules.borrow().len())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::module::Module;

    #[test]
    fn modules_are_retrievable_by_name_after_registration() {
        let cc = CompileCtxt::new("test");
        let id = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("m")));
        cc.register_module(id);
        assert_eq!(cc.module_by_name(&Identifier::simple("m")), Some(id));
        assert_eq!(cc.module_by_name(&Identifier::simple("other")), None);
    }

    #[test]
    fn registering_a_module_under_the_same_name_replaces_the_old_entry() {
        let cc = CompileCtxt::new("test");
        let first = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("m")));
        let second = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("m")));
        cc.register_module(first);
        cc.register_module(second);
        assert_eq!(cc.module_by_name(&Identifier::simple("m")), Some(second));
    }

    #[test]
    fn analysis_cache_round_trips_by_node_identity() {
        let cc = CompileCtxt::new("test");
        let id = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("m")));
        assert!(!cc.cache_contains(id));
        cc.cache_insert(id, 42i32);
        assert_eq!(cc.cache_get::<i32>(id), Some(42));
        assert!(cc.cache_contains(id));
    }

    #[test]
    fn invalidating_a_node_drops_only_that_nodes_result() {
        let cc = CompileCtxt::new("test");
        let a = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("a")));
        let b = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("b")));
        cc.cache_insert(a, "a-result".to_string());
        cc.cache_insert(b, "b-result".to_string());
        assert!(cc.cache_invalidate(a));
        assert!(!cc.cache_contains(a));
        assert!(cc.cache_contains(b));
    }

    #[test]
    fn interner_is_shared_across_identifiers_built_from_it() {
        let cc = CompileCtxt::new("test");
        let a = Identifier::interned(cc.interner(), "pkg::widget");
        let b = Identifier::interned(cc.interner(), "pkg::gadget");
        assert_eq!(a.scope_prefix().as_deref(), Some("pkg"));
        assert_eq!(b.scope_prefix().as_deref(), Some("pkg"));
        assert_eq!(cc.interner().len(), 3);
    }

    #[test]
    fn clearing_the_cache_drops_every_result() {
        let cc = CompileCtxt::new("test");
        let a = cc
            .arena()
            .alloc_module(Location::NONE, Module::new(Identifier::simple("a")));
        cc.cache_insert(a, 1i32);
        cc.cache_clear();
        assert!(!cc.cache_contains(a));
    }
}
