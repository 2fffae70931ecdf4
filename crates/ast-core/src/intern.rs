//! String interning for identifier components (§2a).
//!
//! §5 mandates synchronous single-threaded execution, so this is a `RefCell`
//! wrapper rather than the teacher's `RwLock`/`Arc` pool — one interner per
//! [`crate::context::CompileCtxt`], not one shared across threads.

use std::cell::RefCell;

use string_interner::backend::DefaultBackend;
use string_interner::symbol::DefaultSymbol;
use string_interner::StringInterner;

/// A handle to an interned string. Cheap to copy and compare; resolve back
/// to text via [`InternPool::resolve`].
pub type InternedStr = DefaultSymbol;

/// Deduplicates identifier-component text for one compile run.
#[derive(Default)]
pub struct InternPool {
    interner: RefCell<StringInterner<DefaultBackend>>,
}

impl InternPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `value`, returning the existing symbol if it was already
    /// interned.
    pub fn intern(&self, value: impl AsRef<str>) -> InternedStr {
        self.interner.borrow_mut().get_or_intern(value.as_ref())
    }

    /// Interns every string in `values`, in order.
    pub fn intern_batch(&self, values: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<InternedStr> {
        values.into_iter().map(|v| self.intern(v)).collect()
    }

    pub fn resolve(&self, symbol: InternedStr) -> Option<String> {
        self.interner.borrow().resolve(symbol).map(str::to_owned)
    }

    pub fn len(&self) -> usize {
        self.interner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
