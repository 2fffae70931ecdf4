//! Coercion (§4.3, §4.4): can one type convert to another, and can one
//! constant value be converted to a constant of another type.
//!
//! Both coercers dispatch on the *source*'s kind. `TypeCoercer::can_coerce`
//! never fails loudly — it's a yes/no question. `ConstantCoercer::coerce`
//! produces a value and returns `None` on failure; it never panics on a bad
//! but type-correct input (§4.4: "never throws").

use crate::constant::{Constant, ConstantKind};
use crate::types::{Type, TypeKind};

/// Type-to-type coercion (§4.3).
pub struct TypeCoercer;

impl TypeCoercer {
    /// True iff a value of type `src` can be converted to `dst`.
    pub fn can_coerce(src: &Type, dst: &Type) -> bool {
        if src == dst {
            return true;
        }
        if src.is_any() || dst.is_any() {
            return true;
        }

        match src.kind() {
            TypeKind::Integer { .. } => match dst.kind() {
                TypeKind::Bool => true,
                TypeKind::Integer {
                    width: dst_width, ..
                } => {
                    let TypeKind::Integer { width: src_width, .. } = src.kind() else {
                        unreachable!()
                    };
                    src_width <= dst_width
                }
                _ => false,
            },
            TypeKind::Tuple(src_elems) => match dst.kind() {
                _ if dst.is_wildcard() => matches!(dst.kind(), TypeKind::Tuple(_)),
                TypeKind::Tuple(dst_elems) => {
                    src_elems.len() == dst_elems.len()
                        && src_elems
                            .iter()
                            .zip(dst_elems.iter())
                            .all(|(s, d)| TypeCoercer::can_coerce(s, d))
                }
                _ => false,
            },
            TypeKind::Reference(src_inner) => match dst.kind() {
                TypeKind::Reference(dst_inner) => {
                    TypeCoercer::can_coerce(src_inner, dst_inner)
                }
                _ => false,
            },
            TypeKind::Iterator(src_elem) => match dst.kind() {
                TypeKind::Iterator(dst_elem) => TypeCoercer::can_coerce(src_elem, dst_elem),
                _ => false,
            },
            TypeKind::Unset => true,
            TypeKind::Union(members) => {
                members.iter().any(|m| TypeCoercer::can_coerce(m, dst))
            }
            _ => false,
        }
    }
}

/// Constant-to-constant coercion (§4.4). Yields a new constant value rather
/// than a boolean; fails by returning `None`, never by panicking.
pub struct ConstantCoercer;

impl ConstantCoercer {
    pub fn coerce(src: &Constant, dst: &Type) -> Option<Constant> {
        if &src.ty() == dst || dst.is_any() {
            return Some(src.clone());
        }

        match src.kind() {
            ConstantKind::Integer(value, _, signed) => match dst.kind() {
                TypeKind::Integer {
                    width: dst_width,
                    signed: dst_signed,
                } => {
                    if Self::fits_width(*value, *dst_width, *dst_signed) {
                        Some(Constant::new(ConstantKind::Integer(
                            *value,
                            *dst_width,
                            *dst_signed,
                        )))
                    } else {
                        None
                    }
                }
                TypeKind::Bool => Some(Constant::new(ConstantKind::Bool(*value != 0))),
                _ => {
                    let _ = signed;
                    None
                }
            },
            ConstantKind::Tuple(elems) => match dst.kind() {
                TypeKind::Tuple(dst_types) if dst_types.len() == elems.len() => {
                    let coerced: Option<Vec<Constant>> = elems
                        .iter()
                        .zip(dst_types.iter())
                        .map(|(e, t)| ConstantCoercer::coerce(e, t))
                        .collect();
                    coerced.map(|elems| Constant::new(ConstantKind::Tuple(elems)))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn fits_width(value: i64, width: u8, signed: bool) -> bool {
        if width >= 64 {
            return true;
        }
        if signed {
            let min = -(1i64 << (width - 1));
            let max = (1i64 << (width - 1)) - 1;
            value >= min && value <= max
        } else {
            value >= 0 && (value as u64) < (1u64 << width)
        }
    }
}
