//! The ID-replacer (§4.7.2): a pre-order rewriting pass that swaps every
//! occurrence of one identifier for another, in both unresolved identifier
//! references and label constants.
//!
//! Used standalone (e.g. renaming a declaration after a conflict is
//! detected) and as a building block of the instruction normaliser, which
//! uses it to retarget a for-each body's `break`/`next` references at the
//! generated loop-exit and loop-continuation labels before inlining the
//! body into its lowered block (§2b, §4.7.3).

use crate::constant::{Constant, ConstantKind};
use crate::ctor::{Ctor, CtorKind};
use crate::decl::{DeclKind, Declaration};
use crate::expr::{ExprKind, Expression};
use crate::ident::Identifier;
use crate::stmt::{Block, CatchClause, ForEach, Statement, StmtKind, TryCatch};

/// Rewrites every reference to `old` into a reference to `new`.
///
/// A no-op when `old == new` (§8 property 10): `rewrite_block` returns its
/// input unchanged without descending into it, since there is nothing any
/// recursive rewrite could possibly change.
pub struct IdReplacer {
    old: Identifier,
    new: Identifier,
}

impl IdReplacer {
    pub fn new(old: Identifier, new: Identifier) -> Self {
        IdReplacer { old, new }
    }

    pub fn rewrite_block(&self, block: &Block) -> Block {
        if self.old == self.new {
            return block.clone();
        }

        let mut out = Block::new(block.scope().clone());
        if let Some(name) = block.name() {
            out = out.with_name(name.to_string());
        }
        for decl in block.decls() {
            out.add_decl(self.rewrite_decl(decl));
        }
        for stmt in block.stmts() {
            out.push(self.rewrite_stmt(stmt));
        }
        out
    }

    fn rewrite_decl(&self, decl: &Declaration) -> Declaration {
        let kind = match decl.kind() {
            DeclKind::Constant(expr) => DeclKind::Constant(self.rewrite_expr(expr)),
            other => other.clone(),
        };
        Declaration::new(decl.id().clone(), kind, decl.linkage())
    }

    fn rewrite_stmt(&self, stmt: &Statement) -> Statement {
        let kind = match stmt.kind() {
            StmtKind::NoOp => StmtKind::NoOp,
            StmtKind::Block(b) => StmtKind::Block(self.rewrite_block(b)),
            StmtKind::TryCatch(tc) => StmtKind::TryCatch(TryCatch {
                body: self.rewrite_block(&tc.body),
                catches: tc
                    .catches
                    .iter()
                    .map(|c| CatchClause {
                        param: c.param.clone(),
                        body: self.rewrite_block(&c.body),
                    })
                    .collect(),
            }),
            StmtKind::ForEach(fe) => StmtKind::ForEach(ForEach {
                var: fe.var.clone(),
                iterable: self.rewrite_expr(&fe.iterable),
                body: self.rewrite_block(&fe.body),
            }),
            StmtKind::Instruction(resolved) => {
                StmtKind::Instruction(resolved.with_rewritten(|e| self.rewrite_expr(e)))
            }
        };
        Statement::new(kind)
    }

    fn rewrite_expr(&self, expr: &Expression) -> Expression {
        let kind = match expr.kind() {
            ExprKind::List(items) => {
                ExprKind::List(items.iter().map(|e| self.rewrite_expr(e)).collect())
            }
            ExprKind::Constant(c) => ExprKind::Constant(self.rewrite_constant(c)),
            ExprKind::Ctor(c) => ExprKind::Ctor(self.rewrite_ctor(c)),
            ExprKind::IdentifierRef(id) => {
                ExprKind::IdentifierRef(if id == &self.old { self.new.clone() } else { id.clone() })
            }
            ExprKind::Coerced(inner, ty) => {
                ExprKind::Coerced(Box::new(self.rewrite_expr(inner)), ty.clone())
            }
            other @ (ExprKind::VariableRef(_)
            | ExprKind::TypeRef(_)
            | ExprKind::BlockRef(_)
            | ExprKind::ModuleRef(_)
            | ExprKind::FunctionRef(_)
            | ExprKind::ParameterRef(_)
            | ExprKind::CodeGen(_, _)) => other.clone(),
        };
        Expression::new(kind)
    }

    fn rewrite_constant(&self, c: &Constant) -> Constant {
        match c.kind() {
            ConstantKind::EnumLabel { enum_name, label } if label == self.old.local() => {
                Constant::new(ConstantKind::EnumLabel {
                    enum_name: enum_name.clone(),
                    label: self.new.local().to_string(),
                })
            }
            ConstantKind::Tuple(elems) => Constant::new(ConstantKind::Tuple(
                elems.iter().map(|e| self.rewrite_constant(e)).collect(),
            )),
            _ => c.clone(),
        }
    }

    fn rewrite_ctor(&self, ctor: &Ctor) -> Ctor {
        let kind = match ctor.kind() {
            CtorKind::Bytes(b) => CtorKind::Bytes(b.clone()),
            CtorKind::List(items) => {
                CtorKind::List(items.iter().map(|e| self.rewrite_expr(e)).collect())
            }
            CtorKind::Vector(items) => {
                CtorKind::Vector(items.iter().map(|e| self.rewrite_expr(e)).collect())
            }
            CtorKind::Set(items) => {
                CtorKind::Set(items.iter().map(|e| self.rewrite_expr(e)).collect())
            }
            CtorKind::Map(pairs) => CtorKind::Map(
                pairs
                    .iter()
                    .map(|(k, v)| (self.rewrite_expr(k), self.rewrite_expr(v)))
                    .collect(),
            ),
            CtorKind::RegexpList(patterns) => CtorKind::RegexpList(patterns.clone()),
        };
        Ctor::new(kind)
    }
}
