//! Exception-handling AST supplement (§2b, §4.7.3): an `ExceptionType`
//! concept and the `ExceptionReference` wrapper a catch clause's declared
//! type is validated against.

use crate::types::{Type, TypeKind};

/// True if `ty` is usable as a catch clause's declared type: a reference
/// to an exception type (§4.7.3).
pub fn is_exception_reference(ty: &Type) -> bool {
    match ty.kind() {
        TypeKind::Reference(inner) => matches!(inner.kind(), TypeKind::Exception { .. }),
        _ => false,
    }
}

/// Builds the `ExceptionReference` wrapper type around a named exception
/// type, as produced by the parser for a catch clause's declared type.
pub fn exception_reference(name: impl Into<String>, params: Vec<Type>) -> Type {
    Type::new(TypeKind::Reference(Box::new(Type::new(
        TypeKind::Exception {
            name: name.into(),
            params,
        },
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_to_exception_type_is_recognized() {
        let ty = exception_reference("ProtocolError", vec![]);
        assert!(is_exception_reference(&ty));
    }

    #[test]
    fn plain_exception_type_without_reference_is_rejected() {
        let ty = Type::new(TypeKind::Exception {
            name: "ProtocolError".into(),
            params: vec![],
        });
        assert!(!is_exception_reference(&ty));
    }

    #[test]
    fn unrelated_type_is_rejected() {
        assert!(!is_exception_reference(&Type::new(TypeKind::Bool)));
    }
}
