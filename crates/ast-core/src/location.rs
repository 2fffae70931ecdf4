//! Source locations, including the distinguished "no location" sentinel.
//!
//! A `Location` is immutable once constructed (§3.1): nodes carry one at
//! creation time and it never changes as passes rewrite the tree.

use std::fmt;
use std::path::Path;

/// A source location: a file plus an optional line range.
///
/// `Location::NONE` is the sentinel "no location" value (§6.6). It prints as
/// `<no location>`; a location with only a start line prints as `file:from`;
/// one with both ends known prints as `file:from-to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    file: Option<String>,
    from: Option<u32>,
    to: Option<u32>,
}

impl Location {
    /// The sentinel "no location" value.
    pub const NONE: Location = Location {
        file: None,
        from: None,
        to: None,
    };

    pub fn new(file: impl Into<String>, from: u32) -> Self {
        Self {
            file: Some(file.into()),
            from: Some(from),
            to: None,
        }
    }

    pub fn with_range(file: impl Into<String>, from: u32, to: u32) -> Self {
        Self {
            file: Some(file.into()),
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn is_none(&self) -> bool {
        self.file.is_none() && self.from.is_none()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn from(&self) -> Option<u32> {
        self.from
    }

    pub fn to(&self) -> Option<u32> {
        self.to
    }

    /// A location spanning from the start of `a` to the end of `b`.
    ///
    /// Used by the instruction normaliser to synthesize locations for
    /// generated blocks that inherit a range covering the statement they
    /// replace (§2b).
    pub fn span(a: &Location, b: &Location) -> Location {
        if a.is_none() {
            return b.clone();
        }
        if b.is_none() {
            return a.clone();
        }
        let to = b.to.or(b.from).or(a.to).or(a.from);
        Location {
            file: a.file.clone().or_else(|| b.file.clone()),
            from: a.from,
            to,
        }
    }

    fn basename(&self) -> &str {
        match &self.file {
            Some(f) => Path::new(f)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(f.as_str()),
            None => "<unknown>",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "<no location>");
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) if to != from => {
                write!(f, "{}:{}-{}", self.basename(), from, to)
            }
            (Some(from), _) => write!(f, "{}:{}", self.basename(), from),
            (None, _) => write!(f, "{}", self.basename()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_prints_sentinel() {
        assert_eq!(Location::NONE.to_string(), "<no location>");
        assert!(Location::NONE.is_none());
    }

    #[test]
    fn single_point_prints_file_and_from() {
        let loc = Location::new("src/main.hlt", 10);
        assert_eq!(loc.to_string(), "main.hlt:10");
    }

    #[test]
    fn range_prints_from_dash_to() {
        let loc = Location::with_range("/a/b/main.hlt", 10, 20);
        assert_eq!(loc.to_string(), "main.hlt:10-20");
    }

    #[test]
    fn span_covers_both_ends() {
        let a = Location::with_range("f.hlt", 5, 8);
        let b = Location::with_range("f.hlt", 12, 15);
        let spanned = Location::span(&a, &b);
        assert_eq!(spanned.from(), Some(5));
        assert_eq!(spanned.to(), Some(15));
    }

    #[test]
    fn span_with_one_side_none_returns_other() {
        let a = Location::NONE;
        let b = Location::new("f.hlt", 3);
        assert_eq!(Location::span(&a, &b), b);
        assert_eq!(Location::span(&b, &a), b);
    }
}
