//! The compiler's diagnostic channel (§4.8).
//!
//! `Logger` is the single mutable facility passes use to report warnings,
//! errors, internal errors, and fatal conditions. Its plain-text output
//! format is a compatibility contract (§6.5):
//!
//! ```text
//! basename(location): tag, message [logger-name]
//! ```
//!
//! Fatal calls don't unwind a call stack the way the original's exception
//! did (§9 redesign notes): instead they set a cancellation flag that the
//! visitor framework checks between visits and uses to cut a traversal
//! short, reporting failure to the caller.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::location::Location;

/// Severity of a logged diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
    InternalError,
    Fatal,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::InternalError => "internal error",
            Severity::Fatal => "fatal error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Destination for rendered log lines. The default sink writes to stderr;
/// tests and embedding callers can supply their own.
pub trait LogSink {
    fn write_line(&self, line: &str);
}

struct StderrSink;
impl LogSink for StderrSink {
    fn write_line(&self, line: &str) {
        eprintln!("{}", line);
    }
}

/// A recording sink useful for tests and for callers who want to inspect
/// exactly what the logger produced.
#[derive(Default)]
pub struct CapturingSink {
    lines: RefCell<Vec<String>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl LogSink for CapturingSink {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

struct LoggerState {
    name: String,
    sink: Box<dyn LogSink>,
    errors: Cell<u32>,
    warnings: Cell<u32>,
    debug_enabled: Cell<bool>,
    debug_indent: Cell<u32>,
    /// Fatal errors don't unwind; they latch this flag, which the visitor
    /// framework polls between visits (§9, "Exceptions for traversal
    /// cancellation").
    cancelled: Cell<bool>,
    forward: RefCell<Option<Rc<LoggerState>>>,
}

/// The diagnostic facility shared by a compile run.
///
/// Cloning a `Logger` shares the same underlying state (it's a thin `Rc`
/// handle), matching the source's single mutable logger instance.
#[derive(Clone)]
pub struct Logger {
    state: Rc<LoggerState>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sink(name, Box::new(StderrSink))
    }

    pub fn with_sink(name: impl Into<String>, sink: Box<dyn LogSink>) -> Self {
        Self {
            state: Rc::new(LoggerState {
                name: name.into(),
                sink,
                errors: Cell::new(0),
                warnings: Cell::new(0),
                debug_enabled: Cell::new(false),
                debug_indent: Cell::new(0),
                cancelled: Cell::new(false),
                forward: RefCell::new(None),
            }),
        }
    }

    /// Forward every call made on this logger to `target`'s state instead.
    /// Counters, cancellation, and output all become `target`'s from then on.
    pub fn forward_to(&self, target: &Logger) {
        *self.state.forward.borrow_mut() = Some(target.state.clone());
    }

    fn effective(&self) -> Rc<LoggerState> {
        match self.state.forward.borrow().as_ref() {
            Some(target) => target.clone(),
            None => self.state.clone(),
        }
    }

    pub fn name(&self) -> String {
        self.effective().name.clone()
    }

    pub fn set_debug(&self, enabled: bool) {
        self.effective().debug_enabled.set(enabled);
    }

    pub fn errors(&self) -> u32 {
        self.effective().errors.get()
    }

    /// Returns the error count.
    ///
    /// The source's `warnings()` accessor is documented as returning the
    /// error count rather than the warning count (spec.md Open Questions);
    /// that almost-certainly-a-bug is preserved here rather than silently
    /// fixed, since changing it would be a silent behavioral divergence
    /// from a documented "confirm with maintainers" item.
    pub fn warnings(&self) -> u32 {
        self.effective().errors.get()
    }

    /// The actual warning count, for callers who want the count the name
    /// implies. Not part of the compatibility surface.
    pub fn warning_count(&self) -> u32 {
        self.effective().warnings.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.effective().cancelled.get()
    }

    pub fn reset(&self) {
        let st = self.effective();
        st.errors.set(0);
        st.warnings.set(0);
        st.cancelled.set(false);
    }

    fn emit(&self, severity: Severity, message: &str, where_: &str) {
        let st = self.effective();
        match severity {
            Severity::Warning => st.warnings.set(st.warnings.get() + 1),
            Severity::Error | Severity::InternalError | Severity::Fatal => {
                st.errors.set(st.errors.get() + 1)
            }
        }

        let line = format!("{}: {}, {} [{}]", where_, severity.tag(), message, st.name);
        st.sink.write_line(&line);
        tracing::debug!(logger = %st.name, severity = %severity, "{}", message);

        match severity {
            Severity::InternalError => {
                panic!("internal error in [{}]: {}", st.name, message);
            }
            Severity::Fatal => st.cancelled.set(true),
            _ => {}
        }
    }

    pub fn warning(&self, message: impl fmt::Display) {
        self.emit(Severity::Warning, &message.to_string(), "<unknown>");
    }

    pub fn warning_at(&self, message: impl fmt::Display, location: impl fmt::Display) {
        self.emit(
            Severity::Warning,
            &message.to_string(),
            &location.to_string(),
        );
    }

    pub fn warning_node(&self, message: impl fmt::Display, location: &Location) {
        self.emit(Severity::Warning, &message.to_string(), &location.to_string());
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, &message.to_string(), "<unknown>");
    }

    pub fn error_at(&self, message: impl fmt::Display, location: impl fmt::Display) {
        self.emit(
            Severity::Error,
            &message.to_string(),
            &location.to_string(),
        );
    }

    pub fn error_node(&self, message: impl fmt::Display, location: &Location) {
        self.emit(Severity::Error, &message.to_string(), &location.to_string());
    }

    /// Aborts the process after writing the message (§4.8).
    pub fn internal_error(&self, message: impl fmt::Display) -> ! {
        self.emit(Severity::InternalError, &message.to_string(), "<unknown>");
        unreachable!("internal_error always panics")
    }

    pub fn internal_error_node(&self, message: impl fmt::Display, location: &Location) -> ! {
        self.emit(
            Severity::InternalError,
            &message.to_string(),
            &location.to_string(),
        );
        unreachable!("internal_error always panics")
    }

    /// Latches the cancellation flag so the enclosing traversal unwinds.
    pub fn fatal(&self, message: impl fmt::Display) {
        self.emit(Severity::Fatal, &message.to_string(), "<unknown>");
    }

    pub fn fatal_node(&self, message: impl fmt::Display, location: &Location) {
        self.emit(Severity::Fatal, &message.to_string(), &location.to_string());
    }

    pub fn debug(&self, indent: u32, message: impl fmt::Display) {
        let st = self.effective();
        if !st.debug_enabled.get() {
            return;
        }
        let pad = "  ".repeat(indent as usize);
        tracing::debug!(logger = %st.name, indent, "{}{}", pad, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing() -> (Logger, Rc<CapturingSink>) {
        let sink = Rc::new(CapturingSink::new());
        struct Proxy(Rc<CapturingSink>);
        impl LogSink for Proxy {
            fn write_line(&self, line: &str) {
                self.0.write_line(line);
            }
        }
        let logger = Logger::with_sink("test", Box::new(Proxy(sink.clone())));
        (logger, sink)
    }

    #[test]
    fn warning_increments_warning_count_but_not_errors_accessor_bug() {
        let (logger, _sink) = capturing();
        logger.warning("a warning");
        assert_eq!(logger.warning_count(), 1);
        assert_eq!(logger.errors(), 0);
        // Preserved quirk: warnings() mirrors errors(), not warning_count().
        assert_eq!(logger.warnings(), logger.errors());
    }

    #[test]
    fn error_increments_error_count() {
        let (logger, _sink) = capturing();
        logger.error("bad operand");
        assert_eq!(logger.errors(), 1);
    }

    #[test]
    fn fatal_sets_cancellation() {
        let (logger, _sink) = capturing();
        assert!(!logger.is_cancelled());
        logger.fatal("stop");
        assert!(logger.is_cancelled());
        assert_eq!(logger.errors(), 1);
    }

    #[test]
    fn reset_clears_counters_and_cancellation() {
        let (logger, _sink) = capturing();
        logger.error("x");
        logger.fatal("y");
        logger.reset();
        assert_eq!(logger.errors(), 0);
        assert!(!logger.is_cancelled());
    }

    #[test]
    fn forwarding_defers_all_state_to_target() {
        let (target, sink) = capturing();
        let source = Logger::new("source");
        source.forward_to(&target);

        source.error("forwarded error");

        assert_eq!(source.errors(), 1);
        assert_eq!(target.errors(), 1);
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.lines()[0].contains("target") || sink.lines()[0].contains("[test]"));
    }

    #[test]
    fn output_format_matches_compatibility_contract() {
        let (logger, sink) = capturing();
        logger.error_at("bad thing", "main.hlt:10");
        let lines = sink.lines();
        assert_eq!(lines[0], "main.hlt:10: error, bad thing [test]");
    }
}
