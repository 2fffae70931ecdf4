//! Expressions (§3.5): every expression variant advertises a type, whether
//! it is constant-valued, and a coercion contract.

use crate::coerce::{ConstantCoercer, TypeCoercer};
use crate::constant::Constant;
use crate::ctor::Ctor;
use crate::ident::Identifier;
use crate::node::NodeId;
use crate::types::{Type, TypeKind};

/// The concrete shape of an expression.
///
/// The `*Ref` variants name another node by [`NodeId`] rather than holding
/// it inline; resolving their type requires the owning declaration table
/// (see `CompileCtxt`), so [`Expression::ty`] reports `Unknown` for them —
/// callers that need the resolved type look the referenced declaration up
/// first and compare against *that* type, the same way the source
/// language's semantic analysis pass does.
#[derive(Debug, Clone)]
pub enum ExprKind {
    List(Vec<Expression>),
    Constant(Constant),
    Ctor(Ctor),
    VariableRef(NodeId),
    /// Unresolved identifier reference, prior to scope lookup.
    IdentifierRef(Identifier),
    TypeRef(Type),
    BlockRef(NodeId),
    ModuleRef(NodeId),
    FunctionRef(NodeId),
    ParameterRef(NodeId),
    /// Wraps an inner expression together with the target type it has been
    /// coerced to.
    Coerced(Box<Expression>, Type),
    /// Opaque code-generator sentinel: a cookie plus a type, used by
    /// late-stage passes to splice in already-generated values.
    CodeGen(u64, Type),
}

#[derive(Debug, Clone)]
pub struct Expression {
    kind: ExprKind,
}

impl Expression {
    pub fn new(kind: ExprKind) -> Self {
        Expression { kind }
    }

    pub fn constant(c: Constant) -> Self {
        Expression::new(ExprKind::Constant(c))
    }

    pub fn ctor(c: Ctor) -> Self {
        Expression::new(ExprKind::Ctor(c))
    }

    pub fn coerced(inner: Expression, target: Type) -> Self {
        Expression::new(ExprKind::Coerced(Box::new(inner), target))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn ty(&self) -> Type {
        match &self.kind {
            ExprKind::List(exprs) => {
                Type::new(TypeKind::Tuple(exprs.iter().map(Expression::ty).collect()))
            }
            ExprKind::Constant(c) => c.ty(),
            ExprKind::Ctor(c) => c.ty(),
            ExprKind::VariableRef(_)
            | ExprKind::IdentifierRef(_)
            | ExprKind::BlockRef(_)
            | ExprKind::ModuleRef(_)
            | ExprKind::FunctionRef(_)
            | ExprKind::ParameterRef(_) => Type::new(TypeKind::Unknown),
            ExprKind::TypeRef(t) => t.clone(),
            ExprKind::Coerced(_, target) => target.clone(),
            ExprKind::CodeGen(_, t) => t.clone(),
        }
    }

    /// Whether this expression is constant-valued (§3.5).
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Constant(_) => true,
            ExprKind::Ctor(c) => c.is_constant(),
            ExprKind::Coerced(inner, _) => inner.is_constant(),
            ExprKind::List(exprs) => exprs.iter().all(Expression::is_constant),
            _ => false,
        }
    }

    /// Whether this expression's value can convert to `target` (§3.5).
    pub fn can_coerce_to(&self, target: &Type) -> bool {
        self.coerce_to(target).is_some()
    }

    /// Produces a coerced replacement, or `None` if not coercible.
    ///
    /// Constant-valued expressions try the constant coercer first (it can
    /// fail on a value that doesn't fit even when the *types* are
    /// compatible, e.g. a too-large integer literal); other expressions
    /// delegate to the generic type coercer and get wrapped in
    /// [`ExprKind::Coerced`].
    pub fn coerce_to(&self, target: &Type) -> Option<Expression> {
        if &self.ty() == target || target.is_any() {
            return Some(self.clone());
        }

        if let ExprKind::Constant(c) = &self.kind {
            return ConstantCoercer::coerce(c, target).map(Expression::constant);
        }

        if TypeCoercer::can_coerce(&self.ty(), target) {
            Some(Expression::coerced(self.clone(), target.clone()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantKind;

    fn int_expr(value: i64, width: u8) -> Expression {
        Expression::constant(Constant::new(ConstantKind::Integer(value, width, true)))
    }

    fn int_ty(width: u8) -> Type {
        Type::new(TypeKind::Integer {
            width,
            signed: true,
        })
    }

    #[test]
    fn matching_type_coerces_to_itself_unchanged() {
        let e = int_expr(1, 32);
        let coerced = e.coerce_to(&int_ty(32)).unwrap();
        assert!(matches!(coerced.kind(), ExprKind::Constant(_)));
    }

    #[test]
    fn constant_expression_prefers_constant_coercer() {
        let e = int_expr(5, 32);
        let coerced = e.coerce_to(&int_ty(8)).unwrap();
        match coerced.kind() {
            ExprKind::Constant(c) => assert_eq!(c.kind(), &ConstantKind::Integer(5, 8, true)),
            other => panic!("expected a narrowed constant, got {:?}", other),
        }
    }

    #[test]
    fn constant_expression_that_does_not_fit_fails_to_coerce() {
        let e = int_expr(1000, 32);
        assert!(!e.can_coerce_to(&int_ty(8)));
    }

    #[test]
    fn non_constant_expression_wraps_in_coerced() {
        let inner = Expression::new(ExprKind::VariableRef(crate::node::NodeId::from_index(0)));
        // VariableRef's type is Unknown (not resolved here), which is an
        // any-match, so this exercises the "ty already equals target"
        // fast path rather than the wrap path; use a TypeRef with a real
        // widenable int type to exercise the wrap path instead.
        let e = Expression::new(ExprKind::TypeRef(int_ty(8)));
        let coerced = e.coerce_to(&int_ty(32)).unwrap();
        assert!(matches!(coerced.kind(), ExprKind::Coerced(_, _)));
        let _ = inner;
    }

    #[test]
    fn list_expression_types_as_a_tuple() {
        let e = Expression::new(ExprKind::List(vec![int_expr(1, 32), int_expr(2, 8)]));
        assert!(matches!(e.ty().kind(), TypeKind::Tuple(_)));
    }
}
