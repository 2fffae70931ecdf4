//! Constructor literals: composite literals producing heap values (§3.5).

use crate::constant::Constant;
use crate::expr::Expression;
use crate::types::{Type, TypeKind};

/// A composite literal. Containers with no elements yield a wildcard
/// container type (§3.5) so an empty `[]` can coerce into whatever
/// container type context requires.
#[derive(Debug, Clone)]
pub enum CtorKind {
    Bytes(Vec<u8>),
    List(Vec<Expression>),
    Vector(Vec<Expression>),
    Set(Vec<Expression>),
    Map(Vec<(Expression, Expression)>),
    /// A list of regexp patterns compiled together (the source language's
    /// multi-pattern classifier literal).
    RegexpList(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Ctor {
    kind: CtorKind,
}

impl Ctor {
    pub fn new(kind: CtorKind) -> Self {
        Ctor { kind }
    }

    pub fn kind(&self) -> &CtorKind {
        &self.kind
    }

    pub fn ty(&self) -> Type {
        match &self.kind {
            CtorKind::Bytes(_) => Type::new(TypeKind::Bytes),
            CtorKind::List(elems) => Self::container_ty(elems, TypeKind::List),
            CtorKind::Vector(elems) => Self::container_ty(elems, TypeKind::Vector),
            CtorKind::Set(elems) => Self::container_ty(elems, TypeKind::Set),
            CtorKind::Map(pairs) => {
                if pairs.is_empty() {
                    Type::wildcard(TypeKind::Map(
                        Box::new(Type::new(TypeKind::Unknown)),
                        Box::new(Type::new(TypeKind::Unknown)),
                    ))
                } else {
                    let (k, v) = &pairs[0];
                    Type::new(TypeKind::Map(Box::new(k.ty()), Box::new(v.ty())))
                }
            }
            CtorKind::RegexpList(_) => Type::new(TypeKind::Regexp),
        }
    }

    fn container_ty(elems: &[Expression], wrap: fn(Box<Type>) -> TypeKind) -> Type {
        match elems.first() {
            Some(first) => Type::new(wrap(Box::new(first.ty()))),
            None => Type::wildcard(wrap(Box::new(Type::new(TypeKind::Unknown)))),
        }
    }

    /// A ctor is constant-valued iff every element it's built from is.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            CtorKind::Bytes(_) | CtorKind::RegexpList(_) => true,
            CtorKind::List(elems) | CtorKind::Vector(elems) | CtorKind::Set(elems) => {
                elems.iter().all(Expression::is_constant)
            }
            CtorKind::Map(pairs) => pairs
                .iter()
                .all(|(k, v)| k.is_constant() && v.is_constant()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantKind;

    fn int_expr(value: i64) -> Expression {
        Expression::constant(Constant::new(ConstantKind::Integer(value, 64, true)))
    }

    #[test]
    fn empty_list_yields_wildcard_container_type() {
        let ctor = Ctor::new(CtorKind::List(vec![]));
        assert!(ctor.ty().is_wildcard());
    }

    #[test]
    fn nonempty_list_types_from_first_element() {
        let ctor = Ctor::new(CtorKind::List(vec![int_expr(1), int_expr(2)]));
        assert!(!ctor.ty().is_wildcard());
        assert!(matches!(ctor.ty().kind(), TypeKind::List(_)));
    }

    #[test]
    fn map_with_entries_types_from_first_pair() {
        let ctor = Ctor::new(CtorKind::Map(vec![(int_expr(1), int_expr(2))]));
        assert!(matches!(ctor.ty().kind(), TypeKind::Map(_, _)));
    }

    #[test]
    fn all_constant_elements_make_the_ctor_constant() {
        let ctor = Ctor::new(CtorKind::List(vec![int_expr(1), int_expr(2)]));
        assert!(ctor.is_constant());
    }
}
