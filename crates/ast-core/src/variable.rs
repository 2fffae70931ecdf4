//! Variables: name, type, optional initialiser, and global/local variant
//! (§3.8).

use crate::expr::Expression;
use crate::ident::Identifier;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Global,
    Local,
}

#[derive(Debug, Clone)]
pub struct Variable {
    name: Identifier,
    ty: Type,
    init: Option<Expression>,
    scope: VariableScope,
    /// Assigned during/after resolution; unique within the enclosing
    /// function (§3.8). `None` for globals, which are addressed by their
    /// (already-unique, possibly-scoped) source name instead.
    internal_name: Option<String>,
}

impl Variable {
    pub fn new(name: Identifier, ty: Type, scope: VariableScope) -> Self {
        Variable {
            name,
            ty,
            init: None,
            scope,
            internal_name: None,
        }
    }

    pub fn with_init(mut self, init: Expression) -> Self {
        self.init = Some(init);
        self
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn init(&self) -> Option<&Expression> {
        self.init.as_ref()
    }

    pub fn scope(&self) -> VariableScope {
        self.scope
    }

    pub fn is_global(&self) -> bool {
        self.scope == VariableScope::Global
    }

    pub fn internal_name(&self) -> Option<&str> {
        self.internal_name.as_deref()
    }

    /// Assigns the post-resolution internal name. Only meaningful for
    /// locals (§3.8); setting it on a global is a caller bug.
    pub fn set_internal_name(&mut self, name: impl Into<String>) {
        debug_assert!(
            self.scope == VariableScope::Local,
            "internal names are only assigned to local variables"
        );
        self.internal_name = Some(name.into());
    }
}
