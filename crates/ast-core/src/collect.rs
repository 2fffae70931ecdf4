//! The global-variable collector (§4.7.4): a read-only, pre-order pass that
//! walks a block tree and records every global variable declaration it
//! finds, ordering the result by identifier so callers get a deterministic
//! listing regardless of source order.
//!
//! Unlike [`crate::id_replace::IdReplacer`] and
//! [`crate::normalize::InstructionNormalizer`], this pass never rewrites
//! anything it visits — it only reads `decls()`/`stmts()` and appends to an
//! accumulator, so there's no need to rebuild blocks on the way back up.

use crate::arena::Arena;
use crate::decl::{DeclKind, Declaration};
use crate::module::Module;
use crate::node::NodeId;
use crate::stmt::{Block, Statement, StmtKind};

/// Collects every declaration that binds a global variable, reachable from
/// a block (or a module's body) by walking into nested blocks, try/catch
/// bodies and handlers, and for-each bodies.
pub struct GlobalCollector;

impl GlobalCollector {
    pub fn new() -> Self {
        GlobalCollector
    }

    /// Walks `block` and every block nested within it, collecting
    /// declarations whose [`DeclKind::Variable`] resolves (via `arena`) to a
    /// global variable. The result is sorted by the declaration's identifier
    /// path (§4.7.4 "sort-by-identifier").
    pub fn collect(&self, arena: &Arena, block: &Block) -> Vec<Declaration> {
        let mut out = Vec::new();
        self.walk_block(arena, block, &mut out);
        out.sort_by(|a, b| a.id().path().cmp(&b.id().path()));
        out
    }

    /// As [`Self::collect`], but starting from a module's body statement.
    /// Returns an empty list if the module has no body yet or its body
    /// doesn't resolve to a block (both transient states during AST
    /// construction, not errors this pass is responsible for flagging).
    pub fn collect_module(&self, arena: &Arena, module: &Module) -> Vec<Declaration> {
        match module.body() {
            Some(id) => self.collect_statement(arena, id),
            None => Vec::new(),
        }
    }

    /// As [`Self::collect_module`], given the module's [`NodeId`] directly.
    pub fn collect_module_id(&self, arena: &Arena, module_id: NodeId) -> Vec<Declaration> {
        self.collect_module(arena, &arena.module(module_id))
    }

    fn collect_statement(&self, arena: &Arena, id: NodeId) -> Vec<Declaration> {
        let stmt = arena.statement(id);
        match stmt.as_block() {
            Some(block) => self.collect(arena, block),
            None => Vec::new(),
        }
    }

    fn walk_block(&self, arena: &Arena, block: &Block, out: &mut Vec<Declaration>) {
        for decl in block.decls() {
            if let DeclKind::Variable(var_id) = decl.kind() {
                if arena.variable(*var_id).is_global() {
                    out.push(decl.clone());
                }
            }
        }
        for stmt in block.stmts() {
            self.walk_stmt(arena, stmt, out);
        }
    }

    fn walk_stmt(&self, arena: &Arena, stmt: &Statement, out: &mut Vec<Declaration>) {
        match stmt.kind() {
            StmtKind::Block(b) => self.walk_block(arena, b, out),
            StmtKind::TryCatch(tc) => {
                self.walk_block(arena, &tc.body, out);
                for catch in &tc.catches {
                    self.walk_block(arena, &catch.body, out);
                }
            }
            StmtKind::ForEach(fe) => self.walk_block(arena, &fe.body, out),
            StmtKind::NoOp | StmtKind::Instruction(_) => {}
        }
    }
}

impl Default for GlobalCollector {
    fn default() -> Self {
        Self::new()
    }
}
