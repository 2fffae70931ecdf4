//! The printer pass (§4.7.1): renders an AST back to source-like text.
//!
//! A call-driven pass (§4.5 mode 3, the same style as [`crate::visitor`]'s
//! call-driven traversal, though the printer drives its own recursion
//! directly rather than through [`crate::visitor::VisitorRuntime`] — there
//! is no ancestor/result bookkeeping to share across its recursive calls,
//! just an indent level and a line-start flag). Every node type embeds a
//! call into this pass for its own `Display`-style representation (§2).
//!
//! Whitespace fidelity with the original is explicitly not a goal (§1); the
//! output only needs to be a valid rendering of the same AST.

use std::cell::Cell;
use std::fmt::Write as _;

use crate::arena::Arena;
use crate::constant::{Constant, ConstantKind};
use crate::ctor::{Ctor, CtorKind};
use crate::decl::{DeclKind, Declaration};
use crate::expr::{ExprKind, Expression};
use crate::instruction::ResolvedStatement;
use crate::node::NodeId;
use crate::stmt::{Block, CatchClause, ForEach, Statement, StmtKind, TryCatch};
use crate::types::Type;

/// Printer configuration (§2a: builder-style config struct with `with_*`
/// methods and a sensible `Default`, in the teacher's style).
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Collapse all line breaks to single spaces, for compact one-line
    /// output (e.g. in diagnostics).
    single_line: bool,
    indent_width: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        PrintConfig {
            single_line: false,
            indent_width: 2,
        }
    }
}

impl PrintConfig {
    pub fn with_single_line(mut self, enabled: bool) -> Self {
        self.single_line = enabled;
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}

/// A renders-to-a-`String` printer. One `Printer` renders one AST; build a
/// fresh one per call rather than reusing it across unrelated trees.
pub struct Printer<'a> {
    arena: &'a Arena,
    config: PrintConfig,
    buf: String,
    indent: usize,
    at_line_start: bool,
    /// Incremented by [`Printer::with_type_ids_suppressed`]; while
    /// non-zero, [`Printer::print_type`] renders a bare placeholder instead
    /// of the type's full (possibly recursive) structural form — used when
    /// a surrounding construct already names the type unambiguously.
    type_ids_suppressed: Cell<u32>,
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a Arena, config: PrintConfig) -> Self {
        Printer {
            arena,
            config,
            buf: String::new(),
            indent: 0,
            at_line_start: true,
            type_ids_suppressed: Cell::new(0),
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }

    // -- low-level writing ------------------------------------------------

    fn write(&mut self, s: &str) {
        if self.at_line_start && !s.is_empty() && !self.config.single_line {
            let pad = " ".repeat(self.indent * self.config.indent_width);
            self.buf.push_str(&pad);
        }
        self.at_line_start = false;
        self.buf.push_str(s);
    }

    fn newline(&mut self) {
        if self.config.single_line {
            if !self.buf.ends_with(' ') && !self.buf.is_empty() {
                self.buf.push(' ');
            }
        } else {
            // Never leave trailing whitespace on the line being closed.
            while self.buf.ends_with(' ') {
                self.buf.pop();
            }
            self.buf.push('\n');
            self.at_line_start = true;
        }
    }

    fn enter_indent(&mut self) {
        self.indent += 1;
    }

    fn exit_indent(&mut self) {
        self.indent -= 1;
    }

    /// Suppresses recursive structural printing of named types for the
    /// duration of `body` (§4.7.1's "recursion-safe type-ID elision").
    fn with_type_ids_suppressed<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        self.type_ids_suppressed.set(self.type_ids_suppressed.get() + 1);
        let result = body(self);
        self.type_ids_suppressed.set(self.type_ids_suppressed.get() - 1);
        result
    }

    /// Writes a comma-separated list, calling `item` for each element
    /// (§4.7.1 `printList` helper).
    fn print_list<T>(&mut self, items: &[T], mut item: impl FnMut(&mut Self, &T)) {
        for (i, it) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            item(self, it);
        }
    }

    // -- types --------------------------------------------------------------

    pub fn print_type(&mut self, ty: &Type) {
        if ty.name().is_some() && self.type_ids_suppressed.get() > 0 {
            self.write(&ty.name().unwrap().to_string());
            return;
        }
        self.with_type_ids_suppressed(|p| {
            let rendered = ty.to_string();
            p.write(&rendered);
        });
    }

    // -- constants / ctors ----------------------------------------------------

    pub fn print_constant(&mut self, c: &Constant) {
        match c.kind() {
            ConstantKind::Integer(v, _, _) => {
                let rendered = v.to_string();
                self.write(&rendered);
            }
            ConstantKind::Bool(b) => self.write(if *b { "true" } else { "false" }),
            ConstantKind::String(s) => {
                self.write("\"");
                self.write(s);
                self.write("\"");
            }
            ConstantKind::Double(d) => {
                let rendered = d.to_string();
                self.write(&rendered);
            }
            ConstantKind::Address(a) => self.write(a),
            ConstantKind::Network(a, prefix) => {
                let rendered = format!("{}/{}", a, prefix);
                self.write(&rendered);
            }
            ConstantKind::Port(n, proto) => {
                let rendered = format!("{}/{}", n, if matches!(proto, crate::constant::PortProtocol::Tcp) { "tcp" } else { "udp" });
                self.write(&rendered);
            }
            ConstantKind::Interval(v) | ConstantKind::Time(v) => {
                let rendered = v.to_string();
                self.write(&rendered);
            }
            ConstantKind::EnumLabel { enum_name, label } => {
                let rendered = format!("{}::{}", enum_name, label);
                self.write(&rendered);
            }
            ConstantKind::Bitset { labels, .. } => {
                self.write("{");
                self.print_list(labels, |p, l| p.write(l));
                self.write("}");
            }
            ConstantKind::Tuple(elems) => {
                self.write("(");
                self.print_list(elems, |p, e| p.print_constant(e));
                self.write(")");
            }
        }
    }

    pub fn print_ctor(&mut self, ctor: &Ctor) {
        match ctor.kind() {
            CtorKind::Bytes(bytes) => {
                self.write("b\"");
                for b in bytes {
                    let _ = write!(self.buf, "\\x{:02x}", b);
                }
                self.write("\"");
            }
            CtorKind::List(items) => {
                self.write("[");
                self.print_list(items, |p, e| p.print_expr(e));
                self.write("]");
            }
            CtorKind::Vector(items) => {
                self.write("vector(");
                self.print_list(items, |p, e| p.print_expr(e));
                self.write(")");
            }
            CtorKind::Set(items) => {
                self.write("set(");
                self.print_list(items, |p, e| p.print_expr(e));
                self.write(")");
            }
            CtorKind::Map(pairs) => {
                self.write("{");
                self.print_list(pairs, |p, (k, v)| {
                    p.print_expr(k);
                    p.write(": ");
                    p.print_expr(v);
                });
                self.write("}");
            }
            CtorKind::RegexpList(patterns) => {
                self.print_list(patterns, |p, pattern| {
                    p.write("/");
                    p.write(pattern);
                    p.write("/");
                });
            }
        }
    }

    // -- expressions ----------------------------------------------------------

    pub fn print_expr(&mut self, expr: &Expression) {
        match expr.kind() {
            ExprKind::List(items) => {
                self.write("(");
                self.print_list(items, |p, e| p.print_expr(e));
                self.write(")");
            }
            ExprKind::Constant(c) => self.print_constant(c),
            ExprKind::Ctor(c) => self.print_ctor(c),
            ExprKind::VariableRef(id) => self.write(&self.arena.variable(*id).name().to_string()),
            ExprKind::IdentifierRef(id) => self.write(&id.to_string()),
            ExprKind::TypeRef(ty) => self.print_type(ty),
            ExprKind::BlockRef(id) => self.print_block_ref(*id),
            ExprKind::ModuleRef(id) => self.write(&self.arena.module(*id).name().to_string()),
            ExprKind::FunctionRef(id) => self.write(&self.arena.function(*id).name().to_string()),
            ExprKind::ParameterRef(id) => {
                let rendered = format!("<param {:?}>", id);
                self.write(&rendered);
            }
            ExprKind::Coerced(inner, ty) => {
                self.print_expr(inner);
                self.write(" : ");
                self.print_type(ty);
            }
            ExprKind::CodeGen(cookie, ty) => {
                self.write("<codegen ");
                let rendered = cookie.to_string();
                self.write(&rendered);
                self.write(" : ");
                self.print_type(ty);
                self.write(">");
            }
        }
    }

    fn print_block_ref(&mut self, id: NodeId) {
        if self.arena.is_statement(id) {
            if let StmtKind::Block(b) = self.arena.statement(id).kind() {
                let rendered = b.name().unwrap_or("<block>").to_string();
                self.write(&rendered);
                return;
            }
        }
        let rendered = format!("<block {:?}>", id);
        self.write(&rendered);
    }

    // -- declarations / statements / blocks -----------------------------------

    pub fn print_decl(&mut self, decl: &Declaration) {
        match decl.kind() {
            DeclKind::Variable(id) => {
                self.write("var ");
                self.write(&decl.id().to_string());
                self.write(": ");
                self.print_type(self.arena.variable(*id).ty());
                if let Some(init) = self.arena.variable(*id).init() {
                    self.write(" = ");
                    self.print_expr(init);
                }
            }
            DeclKind::Constant(expr) => {
                self.write("const ");
                self.write(&decl.id().to_string());
                self.write(" = ");
                self.print_expr(expr);
            }
            DeclKind::Type(ty) => {
                self.write("type ");
                self.write(&decl.id().to_string());
                self.write(" = ");
                self.print_type(ty);
            }
            DeclKind::Function(id) => {
                self.write("function ");
                self.write(&self.arena.function(*id).name().to_string());
            }
            DeclKind::Hook(id) => {
                self.write("hook ");
                let rendered = format!("{:?}", id);
                self.write(&rendered);
            }
        }
        self.write(";");
    }

    pub fn print_block(&mut self, block: &Block) {
        if let Some(name) = block.name() {
            self.write(name);
            self.write(": ");
        }
        self.write("{");
        self.newline();
        self.enter_indent();
        for decl in block.decls() {
            self.print_decl(decl);
            self.newline();
        }
        for stmt in block.stmts() {
            self.print_stmt(stmt);
            self.newline();
        }
        self.exit_indent();
        self.write("}");
    }

    pub fn print_stmt(&mut self, stmt: &Statement) {
        match stmt.kind() {
            StmtKind::NoOp => self.write("nop;"),
            StmtKind::Block(b) => self.print_block(b),
            StmtKind::TryCatch(tc) => self.print_try_catch(tc),
            StmtKind::ForEach(fe) => self.print_for_each(fe),
            StmtKind::Instruction(resolved) => self.print_resolved(resolved),
        }
    }

    fn print_try_catch(&mut self, tc: &TryCatch) {
        self.write("try ");
        self.print_block(&tc.body);
        for catch in &tc.catches {
            self.write(" ");
            self.print_catch_clause(catch);
        }
    }

    fn print_catch_clause(&mut self, catch: &CatchClause) {
        self.write("catch");
        if let Some((id, ty)) = &catch.param {
            self.write(" (");
            self.print_type(ty);
            self.write(" ");
            self.write(&id.to_string());
            self.write(")");
        }
        self.write(" ");
        self.print_block(&catch.body);
    }

    fn print_for_each(&mut self, fe: &ForEach) {
        self.write("for (");
        self.write(&fe.var.to_string());
        self.write(" in ");
        self.print_expr(&fe.iterable);
        self.write(") ");
        self.print_block(&fe.body);
    }

    fn print_resolved(&mut self, resolved: &ResolvedStatement) {
        if let Some(target) = resolved.target() {
            self.print_expr(target);
            self.write(" = ");
        }
        self.write(resolved.instruction_name());
        self.write("(");
        self.print_list(resolved.operands(), |p, op| match op {
            Some(e) => p.print_expr(e),
            None => p.write("-"),
        });
        self.write(")");
        self.write(";");
        for comment in resolved.comments() {
            self.write(" # ");
            self.write(comment);
        }
    }
}
