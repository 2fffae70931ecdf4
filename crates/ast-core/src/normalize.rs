//! The instruction normaliser (§4.7.3): a post-order rewriting pass that
//! lowers for-each and try/catch statements into explicit sequences of
//! generated blocks and resolved instruction calls, the way a later code
//! generation stage expects to find them.
//!
//! Lowering allocates fresh local variables and block/label names; all of
//! them are prefixed `@__` so they can never collide with a name the
//! surviving source program could have written itself, and a monotonic
//! counter plus a collision check guarantee uniqueness even across repeated
//! runs over the same tree (§8 property 11: normalising an already-lowered
//! tree a second time is a no-op, since there are no more for-each/try-catch
//! statements left for it to touch).

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::arena::Arena;
use crate::decl::{DeclKind, Declaration, Linkage};
use crate::exception;
use crate::expr::{ExprKind, Expression};
use crate::ident::Identifier;
use crate::id_replace::IdReplacer;
use crate::instruction::{Instruction, InstructionRegistry, OperandContract, OperandValue};
use crate::location::Location;
use crate::logger::Logger;
use crate::node::NodeId;
use crate::scope::Scope;
use crate::stmt::{Block, CatchClause, ForEach, Statement, StmtKind, TryCatch};
use crate::types::{Type, TypeKind};
use crate::variable::{Variable, VariableScope};

/// The identifier a for-each body's `break` statement is parsed into,
/// before this pass retargets it at the generated loop-exit label.
fn break_sentinel() -> Identifier {
    Identifier::simple("break")
}

/// The identifier a for-each body's `next` (continue) statement is parsed
/// into, before this pass retargets it at the generated loop-continuation
/// label.
fn next_sentinel() -> Identifier {
    Identifier::simple("next")
}

/// A reference to a generated block's label, as the operand of a `jump` or
/// `branch` instruction.
fn label_ref(name: &str) -> Expression {
    Expression::new(ExprKind::IdentifierRef(Identifier::simple(name)))
}

pub struct InstructionNormalizer {
    registry: InstructionRegistry,
    logger: Logger,
    counter: Cell<u64>,
    used_names: RefCell<HashSet<String>>,
}

impl InstructionNormalizer {
    pub fn new(logger: Logger) -> Self {
        let mut registry = InstructionRegistry::new();
        registry.register(
            Instruction::new("begin", "Iterator", "Iterator::Begin")
                .with_target(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("positions a fresh iterator at the start of a container"),
        );
        registry.register(
            Instruction::new("end", "Iterator", "Iterator::End")
                .with_target(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("computes a container's end-of-iteration sentinel"),
        );
        registry.register(
            Instruction::new("finished", "Iterator", "Iterator::Finished")
                .with_target(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("true once an iterator has reached the end sentinel"),
        );
        registry.register(
            Instruction::new("deref", "Iterator", "Iterator::Deref")
                .with_target(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("reads the element an iterator currently refers to"),
        );
        registry.register(
            Instruction::new("next", "Iterator", "Iterator::Next")
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("advances an iterator in place"),
        );
        registry.register(
            Instruction::new("get_and_clear", "Exception", "Exception::GetAndClear")
                .with_target(OperandContract::required(Type::any()))
                .with_doc("retrieves the in-flight exception and clears it"),
        );
        registry.register(
            Instruction::new("clear", "Exception", "Exception::Clear")
                .with_doc("discards the in-flight exception without binding it"),
        );
        registry.register(
            Instruction::new("begin_handler", "Exception", "Exception::BeginHandler")
                .with_doc("marks the start of a catch clause's handler region"),
        );
        registry.register(
            Instruction::new("end_handler", "Exception", "Exception::EndHandler")
                .with_doc("marks the end of a catch clause's handler region"),
        );
        registry.register(
            Instruction::new("jump", "Internal", "Internal::Jump")
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("unconditionally transfers control to a block label")
                .terminator(),
        );
        registry.register(
            Instruction::new("branch", "Internal", "Internal::Branch")
                .with_operand(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_operand(OperandContract::required(Type::any()))
                .with_doc("transfers control to the first label if the condition holds, else the second")
                .terminator(),
        );

        InstructionNormalizer {
            registry,
            logger,
            counter: Cell::new(0),
            used_names: RefCell::new(HashSet::new()),
        }
    }

    /// Recursively lowers every for-each and try/catch statement reachable
    /// from `block`, post-order: nested bodies are normalised before the
    /// statement that contains them is itself lowered, so a lowered for-each
    /// body never itself contains an unlowered for-each.
    pub fn normalize_block(&self, arena: &Arena, block: &Block) -> Block {
        let mut out = Block::new(block.scope().clone());
        if let Some(name) = block.name() {
            out = out.with_name(name.to_string());
        }
        for decl in block.decls() {
            out.add_decl(decl.clone());
        }
        for stmt in block.stmts() {
            out.push(self.normalize_stmt(arena, stmt));
        }
        out
    }

    fn normalize_stmt(&self, arena: &Arena, stmt: &Statement) -> Statement {
        match stmt.kind() {
            StmtKind::Block(b) => Statement::new(StmtKind::Block(self.normalize_block(arena, b))),
            StmtKind::ForEach(fe) => {
                let normalized = ForEach {
                    var: fe.var.clone(),
                    iterable: fe.iterable.clone(),
                    body: self.normalize_block(arena, &fe.body),
                };
                Statement::new(StmtKind::Block(self.lower_for_each(arena, &normalized)))
            }
            StmtKind::TryCatch(tc) => {
                let normalized = TryCatch {
                    body: self.normalize_block(arena, &tc.body),
                    catches: tc
                        .catches
                        .iter()
                        .map(|c| CatchClause {
                            param: c.param.clone(),
                            body: self.normalize_block(arena, &c.body),
                        })
                        .collect(),
                };
                Statement::new(StmtKind::Block(self.lower_try_catch(arena, &normalized)))
            }
            StmtKind::NoOp | StmtKind::Instruction(_) => stmt.clone(),
        }
    }

    /// Reserves a fresh suffix such that `@__{tag}_{suffix}` is unused for
    /// every `tag` in `tags`, and marks all of them used in one step so a
    /// concurrent lowering can never observe a half-reserved name set.
    fn reserve_suffix(&self, tags: &[&str]) -> u64 {
        loop {
            let n = self.counter.get() + 1;
            self.counter.set(n);
            let candidates: Vec<String> = tags.iter().map(|t| format!("@__{}_{}", t, n)).collect();
            let mut used = self.used_names.borrow_mut();
            if candidates.iter().all(|c| !used.contains(c)) {
                used.extend(candidates);
                return n;
            }
        }
    }

    fn resolved_stmt(
        &self,
        name: &str,
        target: Option<Expression>,
        ops: Vec<Option<Expression>>,
    ) -> Statement {
        let target_val = target.map(OperandValue::Present);
        let op_vals: Vec<OperandValue> = ops
            .into_iter()
            .map(|o| match o {
                Some(e) => OperandValue::Present(e),
                None => OperandValue::Absent,
            })
            .collect();
        let resolved = self
            .registry
            .resolve_statement(name, target_val, op_vals, vec![], true)
            .unwrap_or_else(|e| {
                self.logger
                    .internal_error(format!("generated instruction '{}' failed to resolve: {}", name, e))
            });
        Statement::new(StmtKind::Instruction(resolved))
    }

    fn alloc_local(&self, arena: &Arena, scope: &Scope, name: Identifier, ty: Type) -> (NodeId, Expression) {
        let id = arena.alloc_variable(Location::NONE, Variable::new(name.clone(), ty, VariableScope::Local));
        scope.insert(&name, id);
        (id, Expression::new(ExprKind::VariableRef(id)))
    }

    /// Lowers `for (var in iterable) { body }` into six sequential
    /// sub-blocks driving a begin/finished/deref/next iterator protocol
    /// (§8 scenario S3): `entry` establishes the iterator and its end
    /// sentinel, `cond` checks whether it's finished, `deref` reads the
    /// current element into `var`, `body` runs the loop body with its
    /// `break`/`next` references retargeted at `end`/`next`, and `next`
    /// advances the iterator before looping back to `cond`.
    fn lower_for_each(&self, arena: &Arena, fe: &ForEach) -> Block {
        let suffix = self.reserve_suffix(&[
            "end",
            "iter",
            "cmp",
            "loop_entry",
            "loop_cond",
            "loop_deref",
            "loop_body",
            "loop_next",
            "loop_end",
        ]);
        let cond_name = format!("@__loop_cond_{}", suffix);
        let deref_name = format!("@__loop_deref_{}", suffix);
        let body_name = format!("@__loop_body_{}", suffix);
        let next_name = format!("@__loop_next_{}", suffix);
        let end_block_name = format!("@__loop_end_{}", suffix);

        let (iterator_ty, elem_ty) = fe
            .iterable
            .ty()
            .iterable()
            .unwrap_or((Type::any(), Type::any()));
        let bool_ty = Type::new(TypeKind::Bool);

        let outer_scope = Scope::new();
        if let Some(parent) = fe.body.scope().parent() {
            outer_scope.set_parent(&parent);
        }

        let (var_id, var_ref) = self.alloc_local(arena, &outer_scope, fe.var.clone(), elem_ty);
        let (end_id, end_ref) = self.alloc_local(
            arena,
            &outer_scope,
            Identifier::simple(format!("@__end_{}", suffix)),
            iterator_ty.clone(),
        );
        let (iter_id, iter_ref) = self.alloc_local(
            arena,
            &outer_scope,
            Identifier::simple(format!("@__iter_{}", suffix)),
            iterator_ty,
        );
        let (cmp_id, cmp_ref) = self.alloc_local(
            arena,
            &outer_scope,
            Identifier::simple(format!("@__cmp_{}", suffix)),
            bool_ty,
        );

        let mut outer = Block::new(outer_scope);
        outer.add_decl(Declaration::new(
            fe.var.clone(),
            DeclKind::Variable(var_id),
            Linkage::Local,
        ));
        outer.add_decl(Declaration::new(
            Identifier::simple(format!("@__end_{}", suffix)),
            DeclKind::Variable(end_id),
            Linkage::Local,
        ));
        outer.add_decl(Declaration::new(
            Identifier::simple(format!("@__iter_{}", suffix)),
            DeclKind::Variable(iter_id),
            Linkage::Local,
        ));
        outer.add_decl(Declaration::new(
            Identifier::simple(format!("@__cmp_{}", suffix)),
            DeclKind::Variable(cmp_id),
            Linkage::Local,
        ));

        let mut entry = Block::new(Scope::new()).with_name(format!("@__loop_entry_{}", suffix));
        entry.push(self.resolved_stmt(
            "begin",
            Some(iter_ref.clone()),
            vec![Some(fe.iterable.clone())],
        ));
        entry.push(self.resolved_stmt(
            "end",
            Some(end_ref.clone()),
            vec![Some(fe.iterable.clone())],
        ));
        entry.push(self.resolved_stmt("jump", None, vec![Some(label_ref(&cond_name))]));

        let mut cond = Block::new(Scope::new()).with_name(cond_name.clone());
        cond.push(self.resolved_stmt(
            "finished",
            Some(cmp_ref.clone()),
            vec![Some(iter_ref.clone()), Some(end_ref)],
        ));
        cond.push(self.resolved_stmt(
            "branch",
            None,
            vec![
                Some(cmp_ref),
                Some(label_ref(&end_block_name)),
                Some(label_ref(&deref_name)),
            ],
        ));

        let mut deref = Block::new(Scope::new()).with_name(deref_name.clone());
        deref.push(self.resolved_stmt("deref", Some(var_ref), vec![Some(iter_ref.clone())]));
        deref.push(self.resolved_stmt("jump", None, vec![Some(label_ref(&body_name))]));

        let retarget_break = IdReplacer::new(break_sentinel(), Identifier::simple(end_block_name.clone()));
        let retarget_next = IdReplacer::new(next_sentinel(), Identifier::simple(next_name.clone()));
        let body = retarget_next
            .rewrite_block(&retarget_break.rewrite_block(&fe.body))
            .with_name(body_name);

        let mut next = Block::new(Scope::new()).with_name(next_name);
        next.push(self.resolved_stmt("next", None, vec![Some(iter_ref)]));
        next.push(self.resolved_stmt("jump", None, vec![Some(label_ref(&cond_name))]));

        let end_block = Block::new(Scope::new()).with_name(end_block_name);

        outer.push(Statement::new(StmtKind::Block(entry)));
        outer.push(Statement::new(StmtKind::Block(cond)));
        outer.push(Statement::new(StmtKind::Block(deref)));
        outer.push(Statement::new(StmtKind::Block(body)));
        outer.push(Statement::new(StmtKind::Block(next)));
        outer.push(Statement::new(StmtKind::Block(end_block)));

        outer
    }

    /// Lowers a try/catch into a body sub-block, one handler sub-block per
    /// catch clause (bracketed by `begin_handler`/`end_handler`, with a
    /// `get_and_clear` binding the caught exception or a `clear` discarding
    /// it for a catch-all clause), and a shared continuation block every
    /// path falls through to.
    fn lower_try_catch(&self, arena: &Arena, tc: &TryCatch) -> Block {
        let mut tags = vec!["try_body".to_string(), "try_end".to_string()];
        for i in 0..tc.catches.len() {
            tags.push(format!("try_handler_{}", i));
        }
        let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
        let suffix = self.reserve_suffix(&tag_refs);

        let outer_scope = Scope::new();
        if let Some(parent) = tc.body.scope().parent() {
            outer_scope.set_parent(&parent);
        }
        let mut outer = Block::new(outer_scope);

        let body_block = tc.body.clone().with_name(format!("@__try_body_{}", suffix));
        outer.push(Statement::new(StmtKind::Block(body_block)));

        for (i, catch) in tc.catches.iter().enumerate() {
            let mut handler =
                Block::new(Scope::new()).with_name(format!("@__try_handler_{}_{}", i, suffix));
            handler.push(self.resolved_stmt("begin_handler", None, vec![]));

            match &catch.param {
                Some((ident, ty)) => {
                    if !exception::is_exception_reference(ty) {
                        self.logger.error(format!(
                            "catch clause parameter '{}' has type {}, which is not a reference to an exception type",
                            ident, ty
                        ));
                    }
                    let (param_id, param_ref) =
                        self.alloc_local(arena, catch.body.scope(), ident.clone(), ty.clone());
                    handler.add_decl(Declaration::new(
                        ident.clone(),
                        DeclKind::Variable(param_id),
                        Linkage::Local,
                    ));
                    handler.push(self.resolved_stmt("get_and_clear", Some(param_ref), vec![]));
                }
                None => {
                    handler.push(self.resolved_stmt("clear", None, vec![]));
                }
            }

            handler.push(Statement::new(StmtKind::Block(catch.body.clone())));
            handler.push(self.resolved_stmt("end_handler", None, vec![]));
            outer.push(Statement::new(StmtKind::Block(handler)));
        }

        outer.push(Statement::new(StmtKind::Block(
            Block::new(Scope::new()).with_name(format!("@__try_end_{}", suffix)),
        )));

        outer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{Constant, ConstantKind};
    use crate::module::Module;

    fn normalizer() -> InstructionNormalizer {
        InstructionNormalizer::new(Logger::new("test"))
    }

    fn int_list_iterable() -> Expression {
        Expression::new(ExprKind::IdentifierRef(Identifier::simple("items")))
    }

    #[test]
    fn for_each_lowers_into_the_six_canonical_sub_blocks() {
        let arena = Arena::new();
        let n = normalizer();
        let fe = ForEach {
            var: Identifier::simple("item"),
            iterable: int_list_iterable(),
            body: Block::new(Scope::new()),
        };
        let lowered = n.lower_for_each(&arena, &fe);

        let names: Vec<&str> = lowered.stmts().iter().map(|s| match s.kind() {
            StmtKind::Block(b) => b.name().unwrap(),
            _ => panic!("expected every lowered statement to be a named block"),
        }).collect();

        assert_eq!(
            names,
            vec![
                "@__loop_entry_1",
                "@__loop_cond_1",
                "@__loop_deref_1",
                "@__loop_body_1",
                "@__loop_next_1",
                "@__loop_end_1",
            ]
        );
        assert_eq!(lowered.decls().len(), 4);
        assert_eq!(lowered.decls()[0].id(), &Identifier::simple("item"));
    }

    #[test]
    fn for_each_wires_jumps_and_a_branch_to_form_a_loop() {
        let arena = Arena::new();
        let n = normalizer();
        let fe = ForEach {
            var: Identifier::simple("item"),
            iterable: int_list_iterable(),
            body: Block::new(Scope::new()),
        };
        let lowered = n.lower_for_each(&arena, &fe);

        fn sub_block(stmt: &Statement) -> &Block {
            match stmt.kind() {
                StmtKind::Block(b) => b,
                _ => panic!("expected a named block"),
            }
        }
        fn instr_names(block: &Block) -> Vec<&str> {
            block
                .stmts()
                .iter()
                .filter_map(|s| match s.kind() {
                    StmtKind::Instruction(r) => Some(r.instruction_name()),
                    _ => None,
                })
                .collect()
        }
        fn label_operand(block: &Block, instr_index: usize, operand_index: usize) -> String {
            match block.stmts()[instr_index].kind() {
                StmtKind::Instruction(r) => match r.operands()[operand_index].as_ref().unwrap().kind() {
                    ExprKind::IdentifierRef(id) => id.to_string(),
                    other => panic!("expected a label reference, got {:?}", other),
                },
                other => panic!("expected an instruction statement, got {:?}", other),
            }
        }

        let entry = sub_block(&lowered.stmts()[0]);
        assert_eq!(instr_names(entry), vec!["begin", "end", "jump"]);
        assert_eq!(label_operand(entry, 2, 0), "@__loop_cond_1");
        assert!(entry.stmts().last().unwrap().is_terminated());

        let cond = sub_block(&lowered.stmts()[1]);
        assert_eq!(instr_names(cond), vec!["finished", "branch"]);
        assert_eq!(label_operand(cond, 1, 1), "@__loop_end_1");
        assert_eq!(label_operand(cond, 1, 2), "@__loop_deref_1");
        assert!(cond.stmts().last().unwrap().is_terminated());

        let deref = sub_block(&lowered.stmts()[2]);
        assert_eq!(instr_names(deref), vec!["deref", "jump"]);
        assert_eq!(label_operand(deref, 1, 0), "@__loop_body_1");

        let next = sub_block(&lowered.stmts()[4]);
        assert_eq!(instr_names(next), vec!["next", "jump"]);
        assert_eq!(label_operand(next, 1, 0), "@__loop_cond_1");
    }

    #[test]
    fn repeated_lowering_uses_fresh_non_colliding_suffixes() {
        let arena = Arena::new();
        let n = normalizer();
        let fe = ForEach {
            var: Identifier::simple("item"),
            iterable: int_list_iterable(),
            body: Block::new(Scope::new()),
        };
        let first = n.lower_for_each(&arena, &fe);
        let second = n.lower_for_each(&arena, &fe);

        let first_name = match first.stmts()[0].kind() {
            StmtKind::Block(b) => b.name().unwrap().to_string(),
            _ => unreachable!(),
        };
        let second_name = match second.stmts()[0].kind() {
            StmtKind::Block(b) => b.name().unwrap().to_string(),
            _ => unreachable!(),
        };
        assert_ne!(first_name, second_name);
    }

    #[test]
    fn break_and_next_in_the_loop_body_are_retargeted() {
        let arena = Arena::new();
        let n = normalizer();
        let mut body = Block::new(Scope::new());
        body.push(Statement::new(StmtKind::Instruction(
            crate::instruction::ResolvedStatement::terminator_for_test("noop"),
        )));
        let fe = ForEach {
            var: Identifier::simple("item"),
            iterable: int_list_iterable(),
            body,
        };
        let lowered = n.lower_for_each(&arena, &fe);
        match &lowered.stmts()[3].kind() {
            StmtKind::Block(b) => assert_eq!(b.name(), Some("@__loop_body_1")),
            _ => panic!("expected the fourth sub-block to be the loop body"),
        }
    }

    #[test]
    fn normalize_block_is_idempotent_once_for_each_is_gone() {
        let arena = Arena::new();
        let n = normalizer();
        let mut block = Block::new(Scope::new());
        block.push(Statement::new(StmtKind::ForEach(ForEach {
            var: Identifier::simple("item"),
            iterable: int_list_iterable(),
            body: Block::new(Scope::new()),
        })));

        let once = n.normalize_block(&arena, &block);
        let twice = n.normalize_block(&arena, &once);

        assert_eq!(once.stmts().len(), twice.stmts().len());
        assert_eq!(once.stmts().len(), 1);
    }

    #[test]
    fn try_catch_with_typed_param_lowers_get_and_clear() {
        let arena = Arena::new();
        let n = normalizer();
        let exc_ty = exception::exception_reference("ProtocolError", vec![]);
        let tc = TryCatch {
            body: Block::new(Scope::new()),
            catches: vec![CatchClause {
                param: Some((Identifier::simple("e"), exc_ty)),
                body: Block::new(Scope::new()),
            }],
        };
        let lowered = n.lower_try_catch(&arena, &tc);
        assert_eq!(lowered.stmts().len(), 3); // body, one handler, end

        match lowered.stmts()[1].kind() {
            StmtKind::Block(handler) => {
                let has_get_and_clear = handler.stmts().iter().any(|s| match s.kind() {
                    StmtKind::Instruction(r) => r.instruction_name() == "get_and_clear",
                    _ => false,
                });
                assert!(has_get_and_clear);
            }
            _ => panic!("expected a handler block"),
        }
    }

    #[test]
    fn try_catch_with_untyped_catch_all_uses_clear() {
        let arena = Arena::new();
        let n = normalizer();
        let tc = TryCatch {
            body: Block::new(Scope::new()),
            catches: vec![CatchClause {
                param: None,
                body: Block::new(Scope::new()),
            }],
        };
        let lowered = n.lower_try_catch(&arena, &tc);
        match lowered.stmts()[1].kind() {
            StmtKind::Block(handler) => {
                let has_clear = handler.stmts().iter().any(|s| match s.kind() {
                    StmtKind::Instruction(r) => r.instruction_name() == "clear",
                    _ => false,
                });
                assert!(has_clear);
            }
            _ => panic!("expected a handler block"),
        }
    }

    #[test]
    fn invalid_catch_param_type_is_logged_as_an_error() {
        let arena = Arena::new();
        let n = normalizer();
        let tc = TryCatch {
            body: Block::new(Scope::new()),
            catches: vec![CatchClause {
                param: Some((Identifier::simple("e"), Type::new(TypeKind::Bool))),
                body: Block::new(Scope::new()),
            }],
        };
        n.lower_try_catch(&arena, &tc);
        assert_eq!(n.logger.errors(), 1);
    }

    #[test]
    fn nested_for_each_inside_a_module_body_is_fully_lowered() {
        let arena = Arena::new();
        let n = normalizer();
        let _module_id = arena.alloc_module(Location::NONE, Module::new(Identifier::simple("m")));
        let inner = ForEach {
            var: Identifier::simple("x"),
            iterable: Expression::constant(Constant::new(ConstantKind::Bool(true))),
            body: Block::new(Scope::new()),
        };
        let mut outer = Block::new(Scope::new());
        outer.push(Statement::new(StmtKind::ForEach(inner)));
        let normalized = n.normalize_block(&arena, &outer);
        assert!(matches!(normalized.stmts()[0].kind(), StmtKind::Block(_)));
    }
}
