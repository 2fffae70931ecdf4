//! Modules: a compilation unit's imports, exports, and body (§3.7).

use crate::ident::Identifier;
use crate::node::NodeId;
use crate::types::Type;

/// One exported identifier, with whether the export was written explicitly
/// (`export` keyword) or inferred (e.g. top-level public linkage).
#[derive(Debug, Clone)]
pub struct ExportedIdentifier {
    pub id: Identifier,
    pub explicit: bool,
}

#[derive(Debug, Clone)]
pub struct Module {
    name: Identifier,
    file: Option<String>,
    /// The module's body statement (a block), referenced by id; the module
    /// does **not** add this as a child edge in the node graph, mirroring
    /// [`crate::function::Function`]'s own module-edge omission.
    body: Option<NodeId>,
    imports: Vec<Identifier>,
    exports: Vec<ExportedIdentifier>,
    exported_types: Vec<Type>,
}

impl Module {
    pub fn new(name: Identifier) -> Self {
        Module {
            name,
            file: None,
            body: None,
            imports: Vec::new(),
            exports: Vec::new(),
            exported_types: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    pub fn set_body(&mut self, body: NodeId) {
        self.body = Some(body);
    }

    pub fn add_import(&mut self, id: Identifier) {
        self.imports.push(id);
    }

    pub fn imports(&self) -> &[Identifier] {
        &self.imports
    }

    pub fn add_export(&mut self, id: Identifier, explicit: bool) {
        self.exports.push(ExportedIdentifier { id, explicit });
    }

    pub fn exports(&self) -> &[ExportedIdentifier] {
        &self.exports
    }

    pub fn add_exported_type(&mut self, ty: Type) {
        self.exported_types.push(ty);
    }

    pub fn exported_types(&self) -> &[Type] {
        &self.exported_types
    }
}
