//! Declarations: binding an identifier to a variable, constant, type,
//! function, or hook (§3.8).

use crate::expr::Expression;
use crate::ident::Identifier;
use crate::node::NodeId;
use crate::types::Type;

/// Linkage attribute a declaration carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Local,
    Private,
    Exported,
    Imported,
}

/// What a declaration binds its identifier to.
#[derive(Debug, Clone)]
pub enum DeclKind {
    Variable(NodeId),
    Constant(Expression),
    Type(Type),
    Function(NodeId),
    /// An event/message hook: a named extension point other declarations
    /// attach handler bodies to.
    Hook(NodeId),
}

#[derive(Debug, Clone)]
pub struct Declaration {
    id: Identifier,
    kind: DeclKind,
    linkage: Linkage,
}

impl Declaration {
    pub fn new(id: Identifier, kind: DeclKind, linkage: Linkage) -> Self {
        Declaration { id, kind, linkage }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// A per-variant property: variables are never constant; constants,
    /// types, functions, and hooks always are (§3.8).
    pub fn is_constant(&self) -> bool {
        !matches!(self.kind, DeclKind::Variable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{Constant, ConstantKind};
    use crate::node::NodeId;

    #[test]
    fn variable_declaration_is_not_constant() {
        let d = Declaration::new(
            Identifier::simple("x"),
            DeclKind::Variable(NodeId::from_index(0)),
            Linkage::Local,
        );
        assert!(!d.is_constant());
    }

    #[test]
    fn constant_declaration_is_constant() {
        let expr = Expression::constant(Constant::new(ConstantKind::Bool(true)));
        let d = Declaration::new(
            Identifier::simple("FLAG"),
            DeclKind::Constant(expr),
            Linkage::Exported,
        );
        assert!(d.is_constant());
    }

    #[test]
    fn function_and_type_declarations_are_constant() {
        let d = Declaration::new(
            Identifier::simple("f"),
            DeclKind::Function(NodeId::from_index(1)),
            Linkage::Private,
        );
        assert!(d.is_constant());
    }
}
