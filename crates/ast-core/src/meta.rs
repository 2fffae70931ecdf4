//! The per-node metadata multimap (§3.6).
//!
//! Passes use this to stash analysis results or flags on arbitrary nodes
//! without extending the node schema itself — an "extra information"
//! side-channel keyed by name, with an optional typed payload.

use std::any::Any;
use std::fmt;

/// One entry in a node's metadata multimap: a name plus an optional typed
/// payload. A name alone (no payload) is a bare flag.
pub struct MetaEntry {
    name: String,
    payload: Option<Box<dyn Any>>,
}

impl MetaEntry {
    pub fn flag(name: impl Into<String>) -> Self {
        MetaEntry {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload<T: Any>(name: impl Into<String>, payload: T) -> Self {
        MetaEntry {
            name: name.into(),
            payload: Some(Box::new(payload)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for MetaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaEntry")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// A multimap from meta-entry name to all entries registered under it.
#[derive(Default)]
pub struct MetaMap {
    entries: Vec<MetaEntry>,
}

impl MetaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: MetaEntry) {
        self.entries.push(entry);
    }

    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.insert(MetaEntry::flag(name));
    }

    pub fn set_payload<T: Any>(&mut self, name: impl Into<String>, payload: T) {
        self.insert(MetaEntry::with_payload(name, payload));
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&MetaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaEntry> + 'a {
        self.entries.iter().filter(move |e| e.name == name)
    }

    pub fn payload<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name)?.payload::<T>()
    }

    pub fn remove_all(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MetaMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_flag_has_no_payload() {
        let mut m = MetaMap::new();
        m.set_flag("visited");
        assert!(m.has("visited"));
        assert!(m.get("visited").unwrap().payload::<()>().is_none());
    }

    #[test]
    fn typed_payload_round_trips() {
        let mut m = MetaMap::new();
        m.set_payload("depth", 3usize);
        assert_eq!(m.payload::<usize>("depth"), Some(&3));
        assert_eq!(m.payload::<String>("depth"), None);
    }

    #[test]
    fn multimap_keeps_every_entry_under_a_name() {
        let mut m = MetaMap::new();
        m.set_payload("tag", 1i32);
        m.set_payload("tag", 2i32);
        assert_eq!(m.get_all("tag").count(), 2);
    }

    #[test]
    fn remove_all_clears_every_entry_for_a_name() {
        let mut m = MetaMap::new();
        m.set_flag("a");
        m.set_flag("a");
        m.set_flag("b");
        assert_eq!(m.remove_all("a"), 2);
        assert!(!m.has("a"));
        assert!(m.has("b"));
    }
}
