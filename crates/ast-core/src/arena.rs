//! Per-kind node storage (§4.1, §4.9): declarations, variables, functions,
//! modules, and statements each get their own index-addressed table keyed
//! by [`NodeId`], alongside a [`NodeGraph`] entry that carries location,
//! parent/child edges, and metadata for that same id.
//!
//! Expressions, constants, and types are plain value types embedded
//! inline by whatever declaration or statement owns them (§3.5, §3.6);
//! nothing else needs to address them independently by id, so they don't
//! get their own table here. Storage is index-addressed (`HashMap<NodeId,
//! T>`) rather than pointer-based, since `NodeId` is already a stable
//! `Copy` handle — there's no need for an arena that hands out long-lived
//! references into backing storage.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::decl::Declaration;
use crate::function::Function;
use crate::location::Location;
use crate::module::Module;
use crate::node::{NodeGraph, NodeId};
use crate::stmt::Statement;
use crate::variable::Variable;

#[derive(Debug, Default)]
struct NodeTable<T> {
    values: RefCell<HashMap<NodeId, T>>,
}

impl<T: Clone> NodeTable<T> {
    fn insert(&self, id: NodeId, value: T) {
        self.values.borrow_mut().insert(id, value);
    }

    fn get(&self, id: NodeId) -> T {
        self.values
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| panic!("arena: no entry registered for {:?}", id))
    }

    fn try_get(&self, id: NodeId) -> Option<T> {
        self.values.borrow().get(&id).cloned()
    }

    fn with_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut T) -> R) -> R {
        let mut values = self.values.borrow_mut();
        let value = values
            .get_mut(&id)
            .unwrap_or_else(|| panic!("arena: no entry registered for {:?}", id));
        f(value)
    }

    fn contains(&self, id: NodeId) -> bool {
        self.values.borrow().contains_key(&id)
    }
}

/// The owner of both the generic node graph and every kind-specific table.
/// A [`crate::context::CompileCtxt`] holds exactly one of these for the
/// lifetime of a compile run.
#[derive(Debug, Default)]
pub struct Arena {
    graph: NodeGraph,
    declarations: NodeTable<Declaration>,
    variables: NodeTable<Variable>,
    functions: NodeTable<Function>,
    modules: NodeTable<Module>,
    statements: NodeTable<Statement>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn alloc_declaration(&self, location: Location, value: Declaration) -> NodeId {
        let id = self.graph.create(location);
        self.declarations.insert(id, value);
        id
    }

    pub fn declaration(&self, id: NodeId) -> Declaration {
        self.declarations.get(id)
    }

    pub fn try_declaration(&self, id: NodeId) -> Option<Declaration> {
        self.declarations.try_get(id)
    }

    pub fn with_declaration_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Declaration) -> R) -> R {
        self.declarations.with_mut(id, f)
    }

    pub fn alloc_variable(&self, location: Location, value: Variable) -> NodeId {
        let id = self.graph.create(location);
        self.variables.insert(id, value);
        id
    }

    pub fn variable(&self, id: NodeId) -> Variable {
        self.variables.get(id)
    }

    pub fn with_variable_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Variable) -> R) -> R {
        self.variables.with_mut(id, f)
    }

    pub fn alloc_function(&self, location: Location, value: Function) -> NodeId {
        let id = self.graph.create(location);
        self.functions.insert(id, value);
        id
    }

    pub fn function(&self, id: NodeId) -> Function {
        self.functions.get(id)
    }

    pub fn with_function_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Function) -> R) -> R {
        self.functions.with_mut(id, f)
    }

    pub fn alloc_module(&self, location: Location, value: Module) -> NodeId {
        let id = self.graph.create(location);
        self.modules.insert(id, value);
        id
    }

    pub fn module(&self, id: NodeId) -> Module {
        self.modules.get(id)
    }

    pub fn with_module_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Module) -> R) -> R {
        self.modules.with_mut(id, f)
    }

    pub fn is_module(&self, id: NodeId) -> bool {
        self.modules.contains(id)
    }

    pub fn alloc_statement(&self, location: Location, value: Statement) -> NodeId {
        let id = self.graph.create(location);
        self.statements.insert(id, value);
        id
    }

    pub fn statement(&self, id: NodeId) -> Statement {
        self.statements.get(id)
    }

    pub fn with_statement_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Statement) -> R) -> R {
        self.statements.with_mut(id, f)
    }

    pub fn is_statement(&self, id: NodeId) -> bool {
        self.statements.contains(id)
    }

    /// Appends `decl` to the declaration list of `module_id`'s body block
    /// (§6.1 "an `add` operation on modules for declarations"). Panics if
    /// the module has no body yet or its body isn't a block — callers are
    /// expected to have called [`crate::module::Module::set_body`] first.
    pub fn add_module_declaration(&self, module_id: NodeId, decl: Declaration) {
        let body_id = self
            .module(module_id)
            .body()
            .expect("module has no body to add a declaration to");
        self.with_statement_mut(body_id, |stmt| match stmt.as_block_mut() {
            Some(block) => block.add_decl(decl),
            None => panic!("module body statement is not a block"),
        });
    }
}
