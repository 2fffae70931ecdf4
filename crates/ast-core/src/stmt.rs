//! Statements and blocks (§3.10): no-op, block, try/catch, for-each, and
//! instruction statements.

use crate::decl::Declaration;
use crate::expr::Expression;
use crate::ident::Identifier;
use crate::instruction::ResolvedStatement;
use crate::scope::Scope;
use crate::types::Type;

/// A block: an optional name, a scope, an ordered declaration list, and an
/// ordered statement list.
#[derive(Debug, Clone)]
pub struct Block {
    name: Option<String>,
    scope: Scope,
    decls: Vec<Declaration>,
    stmts: Vec<Statement>,
}

impl Block {
    pub fn new(scope: Scope) -> Self {
        Block {
            name: None,
            scope,
            decls: Vec::new(),
            stmts: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn decls(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn add_decl(&mut self, decl: Declaration) {
        self.decls.push(decl);
    }

    pub fn stmts(&self) -> &[Statement] {
        &self.stmts
    }

    /// Appends a statement to the end of the block (§6.1 `addStatement`).
    pub fn push(&mut self, stmt: Statement) {
        self.stmts.push(stmt);
    }

    /// Inserts a statement before every existing statement (§6.1
    /// `addStatementAtFront`).
    pub fn add_statement_at_front(&mut self, stmt: Statement) {
        self.stmts.insert(0, stmt);
    }

    /// Appends every statement in `stmts`, in order (§6.1 `addStatements`).
    pub fn add_statements(&mut self, stmts: impl IntoIterator<Item = Statement>) {
        self.stmts.extend(stmts);
    }

    /// Appends every declaration in `decls`, in order (§6.1
    /// `addDeclarations`).
    pub fn add_declarations(&mut self, decls: impl IntoIterator<Item = Declaration>) {
        self.decls.extend(decls);
    }

    /// A block is terminated iff its last statement is either a terminated
    /// block or a terminator instruction (§3.10).
    pub fn is_terminated(&self) -> bool {
        match self.stmts.last() {
            Some(stmt) => stmt.is_terminated(),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    /// `None` for a catch-all clause.
    pub param: Option<(Identifier, Type)>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct TryCatch {
    pub body: Block,
    pub catches: Vec<CatchClause>,
}

#[derive(Debug, Clone)]
pub struct ForEach {
    pub var: Identifier,
    pub iterable: Expression,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    NoOp,
    Block(Block),
    TryCatch(TryCatch),
    ForEach(ForEach),
    Instruction(ResolvedStatement),
}

#[derive(Debug, Clone)]
pub struct Statement {
    kind: StmtKind,
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Statement { kind }
    }

    pub fn kind(&self) -> &StmtKind {
        &self.kind
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            StmtKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match &mut self.kind {
            StmtKind::Block(b) => Some(b),
            _ => None,
        }
    }

    /// §3.10: a no-op, for-each, or try/catch is never itself terminated
    /// (only a nested block or instruction can be); a block statement
    /// defers to [`Block::is_terminated`]; an instruction statement is
    /// terminated iff it's flagged as a terminator.
    pub fn is_terminated(&self) -> bool {
        match &self.kind {
            StmtKind::Block(b) => b.is_terminated(),
            StmtKind::Instruction(instr) => instr.is_terminator(),
            StmtKind::NoOp | StmtKind::TryCatch(_) | StmtKind::ForEach(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ResolvedStatement;

    fn empty_block() -> Block {
        Block::new(Scope::new())
    }

    #[test]
    fn empty_block_is_not_terminated() {
        assert!(!empty_block().is_terminated());
    }

    #[test]
    fn block_terminated_iff_last_statement_is_a_terminator_instruction() {
        let mut block = empty_block();
        block.push(Statement::new(StmtKind::NoOp));
        assert!(!block.is_terminated());

        block.push(Statement::new(StmtKind::Instruction(
            ResolvedStatement::terminator_for_test("return"),
        )));
        assert!(block.is_terminated());
    }

    #[test]
    fn nested_terminated_block_propagates_termination() {
        let mut inner = empty_block();
        inner.push(Statement::new(StmtKind::Instruction(
            ResolvedStatement::terminator_for_test("return"),
        )));
        let mut outer = empty_block();
        outer.push(Statement::new(StmtKind::Block(inner)));
        assert!(outer.is_terminated());
    }

    #[test]
    fn add_statement_at_front_inserts_before_existing_statements() {
        let mut block = empty_block();
        block.push(Statement::new(StmtKind::NoOp));
        block.add_statement_at_front(Statement::new(StmtKind::Instruction(
            ResolvedStatement::terminator_for_test("return"),
        )));
        assert!(matches!(block.stmts()[0].kind(), StmtKind::Instruction(_)));
        assert!(matches!(block.stmts()[1].kind(), StmtKind::NoOp));
    }

    #[test]
    fn add_statements_appends_each_in_order() {
        let mut block = empty_block();
        block.add_statements(vec![
            Statement::new(StmtKind::NoOp),
            Statement::new(StmtKind::NoOp),
        ]);
        assert_eq!(block.stmts().len(), 2);
    }

    #[test]
    fn add_declarations_appends_each_in_order() {
        use crate::decl::{DeclKind, Linkage};
        use crate::node::NodeId;

        let mut block = empty_block();
        block.add_declarations(vec![
            Declaration::new(
                Identifier::simple("a"),
                DeclKind::Variable(NodeId::from_index(0)),
                Linkage::Local,
            ),
            Declaration::new(
                Identifier::simple("b"),
                DeclKind::Variable(NodeId::from_index(1)),
                Linkage::Local,
            ),
        ]);
        assert_eq!(block.decls().len(), 2);
    }

    #[test]
    fn try_catch_and_for_each_statements_are_never_themselves_terminators() {
        let for_each = Statement::new(StmtKind::ForEach(ForEach {
            var: Identifier::simple("x"),
            iterable: Expression::new(crate::expr::ExprKind::List(vec![])),
            body: empty_block(),
        }));
        assert!(!for_each.is_terminated());
    }
}
