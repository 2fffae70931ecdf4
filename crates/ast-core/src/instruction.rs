//! The instruction registry and operand matching / overload resolution
//! (§4.6).
//!
//! An [`Instruction`] is a declarative record of an operand contract; the
//! [`InstructionRegistry`] resolves an unresolved call (a name plus raw
//! operand expressions) against every registered instruction in two
//! passes — first without coercion, then with — taking first-pass matches
//! over second-pass ones.

use crate::expr::Expression;
use crate::location::Location;
use crate::logger::Logger;
use crate::types::Type;

/// The state of a single call-site operand.
///
/// `WrappedAbsent` is the §2b supplement: a syntactically-supplied operand
/// that is itself wrapped to signal "treat this position as absent",
/// matching the original's operand-optionality wrapper appearing in the
/// provided-argument direction, not just the contract direction.
#[derive(Debug, Clone)]
pub enum OperandValue {
    Present(Expression),
    Absent,
    WrappedAbsent,
}

impl OperandValue {
    fn is_absent(&self) -> bool {
        matches!(self, OperandValue::Absent | OperandValue::WrappedAbsent)
    }
}

/// The contract for one operand position (§4.6).
#[derive(Debug, Clone)]
pub struct OperandContract {
    pub ty: Type,
    /// The "optional-argument" wrapper: this position may be absent
    /// regardless of whether a default is also present.
    pub optional: bool,
    pub constant_allowed: bool,
    /// Only meaningful for op1..op3 (never the target).
    pub default: Option<Expression>,
}

impl OperandContract {
    pub fn required(ty: Type) -> Self {
        OperandContract {
            ty,
            optional: false,
            constant_allowed: true,
            default: None,
        }
    }

    pub fn optional(ty: Type) -> Self {
        OperandContract {
            ty,
            optional: true,
            constant_allowed: true,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Expression) -> Self {
        self.default = Some(default);
        self
    }

    pub fn disallow_constants(mut self) -> Self {
        self.constant_allowed = false;
        self
    }

    fn matches(&self, operand: &OperandValue, allow_coercion: bool) -> bool {
        if operand.is_absent() {
            return self.optional || self.default.is_some();
        }
        let OperandValue::Present(expr) = operand else {
            unreachable!("is_absent already handled the other variants")
        };
        if expr.is_constant() && !self.constant_allowed {
            return false;
        }
        if expr.ty() == self.ty {
            return true;
        }
        allow_coercion && expr.can_coerce_to(&self.ty)
    }
}

/// A declarative instruction record.
pub struct Instruction {
    pub name: String,
    pub namespace: String,
    pub class: String,
    pub target: Option<OperandContract>,
    pub operands: Vec<OperandContract>,
    pub is_terminator: bool,
    pub doc: Option<&'static str>,
}

impl Instruction {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, class: impl Into<String>) -> Self {
        Instruction {
            name: name.into(),
            namespace: namespace.into(),
            class: class.into(),
            target: None,
            operands: Vec::new(),
            is_terminator: false,
            doc: None,
        }
    }

    pub fn with_target(mut self, contract: OperandContract) -> Self {
        self.target = Some(contract);
        self
    }

    pub fn with_operand(mut self, contract: OperandContract) -> Self {
        assert!(self.operands.len() < 3, "instructions take at most 3 operands");
        self.operands.push(contract);
        self
    }

    pub fn terminator(mut self) -> Self {
        self.is_terminator = true;
        self
    }

    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    fn matches(&self, target: &Option<OperandValue>, ops: &[OperandValue], allow_coercion: bool) -> bool {
        match (&self.target, target) {
            (Some(contract), Some(value)) => {
                if !contract.matches(value, allow_coercion) {
                    return false;
                }
            }
            (Some(contract), None) => {
                if !(contract.optional || contract.default.is_some()) {
                    return false;
                }
            }
            (None, Some(_)) => return false,
            (None, None) => {}
        }

        let max_len = self.operands.len().max(ops.len());
        for i in 0..max_len {
            let op = ops.get(i).cloned().unwrap_or(OperandValue::Absent);
            match self.operands.get(i) {
                Some(contract) => {
                    if !contract.matches(&op, allow_coercion) {
                        return false;
                    }
                }
                None => {
                    if !op.is_absent() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// A human-readable signature used in resolution-ambiguity diagnostics
    /// (§4.6 resolution step 4).
    pub fn signature(&self) -> String {
        format!("{}::{}({} operands)", self.namespace, self.name, self.operands.len())
    }

    /// The stable documentation record for this instruction (§6.3): its
    /// mnemonic, namespace, class, doc text, terminator flag, and the
    /// operand contracts (types, defaults, and constness) for the target
    /// and every operand position.
    pub fn info(&self) -> InstructionInfo<'_> {
        InstructionInfo {
            mnemonic: &self.name,
            namespace: &self.namespace,
            class: &self.class,
            doc: self.doc,
            is_terminator: self.is_terminator,
            target: self.target.as_ref(),
            operands: &self.operands,
        }
    }
}

/// A borrowed, read-only view of an [`Instruction`]'s documentation surface
/// (§6.3), bundling the fields a reference-documentation renderer or a
/// diagnostic needs without exposing the registry's internal storage.
#[derive(Debug, Clone, Copy)]
pub struct InstructionInfo<'a> {
    pub mnemonic: &'a str,
    pub namespace: &'a str,
    pub class: &'a str,
    pub doc: Option<&'static str>,
    pub is_terminator: bool,
    pub target: Option<&'a OperandContract>,
    pub operands: &'a [OperandContract],
}

/// A fully resolved instruction statement, produced by
/// [`InstructionRegistry::resolve_statement`].
#[derive(Debug, Clone)]
pub struct ResolvedStatement {
    instruction_name: String,
    target: Option<Expression>,
    operands: Vec<Option<Expression>>,
    is_terminator: bool,
    comments: Vec<String>,
    /// Inherited from the unresolved source statement (§4.6 point 5).
    internal: bool,
}

impl ResolvedStatement {
    pub fn instruction_name(&self) -> &str {
        &self.instruction_name
    }

    pub fn target(&self) -> Option<&Expression> {
        self.target.as_ref()
    }

    pub fn operands(&self) -> &[Option<Expression>] {
        &self.operands
    }

    pub fn is_terminator(&self) -> bool {
        self.is_terminator
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Rewrites target and operand expressions through `rewrite`, keeping
    /// the instruction name, terminator flag, comments, and internal flag
    /// unchanged. Used by passes (the ID-replacer) that need to touch the
    /// expressions embedded in an already-resolved statement — e.g. a
    /// label reference in a break/continue operand — without re-running
    /// overload resolution.
    pub(crate) fn with_rewritten(&self, rewrite: impl Fn(&Expression) -> Expression) -> Self {
        ResolvedStatement {
            instruction_name: self.instruction_name.clone(),
            target: self.target.as_ref().map(&rewrite),
            operands: self
                .operands
                .iter()
                .map(|o| o.as_ref().map(&rewrite))
                .collect(),
            is_terminator: self.is_terminator,
            comments: self.comments.clone(),
            internal: self.internal,
        }
    }

    /// Test-only constructor for exercising statement termination without
    /// going through full instruction resolution.
    #[cfg(test)]
    pub fn terminator_for_test(name: &str) -> Self {
        ResolvedStatement {
            instruction_name: name.to_string(),
            target: None,
            operands: Vec::new(),
            is_terminator: true,
            comments: Vec::new(),
            internal: false,
        }
    }
}

#[derive(Default)]
pub struct InstructionRegistry {
    instructions: Vec<Instruction>,
}

impl InstructionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn by_name(&self, name: &str) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(move |i| i.name == name)
    }

    /// Whether any instruction is registered under `name` (§6.3).
    pub fn has(&self, name: &str) -> bool {
        self.by_name(name).next().is_some()
    }

    /// Every registered instruction, in registration order (§6.3) — the
    /// listing a reference-documentation renderer walks.
    pub fn get_all(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Two-pass matching (§4.6): first-pass (no coercion) matches take
    /// precedence; second-pass (with coercion) matches are only considered
    /// if the first pass found nothing.
    pub fn get_matching(
        &self,
        name: &str,
        target: &Option<OperandValue>,
        ops: &[OperandValue],
    ) -> Vec<&Instruction> {
        let no_coercion: Vec<&Instruction> = self
            .by_name(name)
            .filter(|i| i.matches(target, ops, false))
            .collect();
        if !no_coercion.is_empty() {
            return no_coercion;
        }
        self.by_name(name)
            .filter(|i| i.matches(target, ops, true))
            .collect()
    }

    /// Resolves an unresolved instruction call into a [`ResolvedStatement`]
    /// (§4.6 resolution pipeline, steps 3-5).
    pub fn resolve_statement(
        &self,
        name: &str,
        target: Option<OperandValue>,
        ops: Vec<OperandValue>,
        source_comments: Vec<String>,
        source_internal: bool,
    ) -> ast_error::Result<ResolvedStatement> {
        let matches = self.get_matching(name, &target, &ops);
        let instr = match matches.len() {
            1 => matches[0],
            0 => return Err(ast_error::Error::resolution_failed(name)),
            _ => {
                let signatures: Vec<String> = matches.iter().map(|i| i.signature()).collect();
                return Err(ast_error::Error::resolution_ambiguous_with_candidates(
                    name,
                    &signatures,
                ));
            }
        };

        let resolved_target = match (&instr.target, target) {
            (Some(contract), Some(OperandValue::Present(expr))) => {
                Some(expr.coerce_to(&contract.ty).unwrap_or(expr))
            }
            (Some(contract), _) => contract.default.clone(),
            (None, _) => None,
        };

        let mut resolved_operands = Vec::with_capacity(instr.operands.len());
        for (i, contract) in instr.operands.iter().enumerate() {
            let op = ops.get(i).cloned().unwrap_or(OperandValue::Absent);
            let resolved = match op {
                OperandValue::Present(expr) => Some(expr.coerce_to(&contract.ty).unwrap_or(expr)),
                OperandValue::Absent | OperandValue::WrappedAbsent => contract.default.clone(),
            };
            resolved_operands.push(resolved);
        }

        Ok(ResolvedStatement {
            instruction_name: instr.name.clone(),
            target: resolved_target,
            operands: resolved_operands,
            is_terminator: instr.is_terminator,
            comments: source_comments,
            internal: source_internal,
        })
    }
}

/// The `__validate` helper combinators (§2b supplement): small assertions a
/// concrete instruction's validator calls, reporting through the embedded
/// logger on failure and returning whether the check passed.
pub struct ValidationContext<'a> {
    logger: &'a Logger,
}

impl<'a> ValidationContext<'a> {
    pub fn new(logger: &'a Logger) -> Self {
        ValidationContext { logger }
    }

    pub fn equal_types(&self, a: &Type, b: &Type, location: &Location) -> bool {
        let ok = a == b;
        if !ok {
            self.logger
                .error_at(format!("type mismatch: {} vs {}", a, b), location);
        }
        ok
    }

    pub fn can_coerce_to(&self, expr: &Expression, target: &Type, location: &Location) -> bool {
        let ok = expr.can_coerce_to(target);
        if !ok {
            self.logger.error_at(
                format!("cannot coerce {} to {}", expr.ty(), target),
                location,
            );
        }
        ok
    }

    pub fn is_constant(&self, expr: &Expression, location: &Location) -> bool {
        let ok = expr.is_constant();
        if !ok {
            self.logger.error_at("expected a constant expression", location);
        }
        ok
    }
}
