//! Shared AST, visitor, coercion, and rewriting core for a two-language
//! compiler front/mid-end (a low-level IR and a higher-level parser
//! specification language that compiles through it).
//!
//! Lexing/parsing, code generation, and the compiler driver are out of
//! scope; this crate is the graph the front end builds and the passes run
//! over, not the front end or the passes' caller.

pub mod arena;
pub mod coerce;
pub mod collect;
pub mod constant;
pub mod context;
pub mod ctor;
pub mod decl;
pub mod exception;
pub mod expr;
pub mod function;
pub mod id_replace;
pub mod ident;
pub mod instruction;
pub mod intern;
pub mod location;
pub mod logger;
pub mod meta;
pub mod module;
pub mod node;
pub mod normalize;
pub mod printer;
pub mod scope;
pub mod stmt;
pub mod types;
pub mod variable;
pub mod visitor;

pub use arena::Arena;
pub use coerce::{ConstantCoercer, TypeCoercer};
pub use collect::GlobalCollector;
pub use constant::{Constant, ConstantKind};
pub use context::CompileCtxt;
pub use ctor::{Ctor, CtorKind};
pub use decl::{Declaration, DeclKind, Linkage};
pub use expr::{Expression, ExprKind};
pub use function::Function;
pub use id_replace::IdReplacer;
pub use ident::Identifier;
pub use instruction::{Instruction, InstructionInfo, InstructionRegistry, OperandValue, ResolvedStatement};
pub use intern::{InternPool, InternedStr};
pub use location::Location;
pub use logger::{Logger, Severity};
pub use module::Module;
pub use node::{NodeId, Slot};
pub use normalize::InstructionNormalizer;
pub use printer::{PrintConfig, Printer};
pub use scope::Scope;
pub use stmt::{Block, Statement, StmtKind};
pub use types::{Type, TypeKind};
pub use variable::{Variable, VariableScope};
pub use visitor::VisitorState;

/// The crate's unified fallible-operation result alias.
pub type Result<T> = ast_error::Result<T>;
