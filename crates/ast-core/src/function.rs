//! Functions: name, function type, owning module, and body (§3.9).

use crate::ident::Identifier;
use crate::node::NodeId;
use crate::types::FunctionType;

#[derive(Debug, Clone)]
pub struct Function {
    name: Identifier,
    ty: FunctionType,
    /// The owning module, referenced but deliberately **not** added as a
    /// child edge (§3.9) — doing so would create a module -> function ->
    /// module cycle, since the module's body already reaches this function.
    module: NodeId,
    body: Option<NodeId>,
    /// Invoked automatically at module startup. Must have no parameters
    /// and no return (enforced by validation, not by this type).
    is_init_function: bool,
}

impl Function {
    pub fn new(name: Identifier, ty: FunctionType, module: NodeId) -> Self {
        Function {
            name,
            ty,
            module,
            body: None,
            is_init_function: false,
        }
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn ty(&self) -> &FunctionType {
        &self.ty
    }

    pub fn module(&self) -> NodeId {
        self.module
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    pub fn set_body(&mut self, body: NodeId) {
        self.body = Some(body);
    }

    pub fn is_init_function(&self) -> bool {
        self.is_init_function
    }

    /// Marks this as an init function. Callers are expected to have
    /// checked the no-params/no-return rule; this type doesn't enforce it
    /// since the function type itself can't express "called automatically".
    pub fn mark_init_function(&mut self) {
        self.is_init_function = true;
    }

    /// Whether this function's shape is valid for an init function
    /// (no parameters, no return value).
    pub fn is_valid_init_shape(&self) -> bool {
        self.ty.params.is_empty()
            && matches!(self.ty.result.kind(), crate::types::TypeKind::Unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::types::{Type, TypeKind};

    #[test]
    fn init_function_shape_check() {
        let ty = FunctionType {
            result: Box::new(Type::new(TypeKind::Unset)),
            params: vec![],
        };
        let f = Function::new(Identifier::simple("init"), ty, NodeId::from_index(0));
        assert!(f.is_valid_init_shape());
    }

    #[test]
    fn function_with_params_is_not_a_valid_init_shape() {
        let ty = FunctionType {
            result: Box::new(Type::new(TypeKind::Unset)),
            params: vec![Type::new(TypeKind::Bool)],
        };
        let f = Function::new(Identifier::simple("f"), ty, NodeId::from_index(0));
        assert!(!f.is_valid_init_shape());
    }
}
