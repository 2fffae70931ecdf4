//! The type system: value/heap classification, structural equality with
//! wildcards and any-matching, and the behavioural traits types compose
//! through (§3.4).
//!
//! Traits here (`Parameterised`, `TypeList`, `Iterable`, ...) are "pure
//! behavioural interfaces, not part of the node hierarchy" per the data
//! model. Since concrete kinds are stored as an enum discriminant rather
//! than one struct per kind (the tagged-variant model used throughout this
//! crate, see `node.rs`), each trait is realized as an enum-dispatched
//! accessor on [`Type`] returning `Option` rather than a `dyn Trait` object
//! — the caller asks "does this type support X" by calling `x()` and
//! checking for `Some`.

use std::fmt;

use crate::ident::Identifier;

/// Value types are copied by value; heap types are manipulated by
/// reference and (per §2a/§3.4) are garbage collected by the target
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrHeap {
    Value,
    Heap,
}

/// One parameter in a `Parameterised` type's ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Type(Type),
    Integer(i64),
    EnumLabel(String),
    AttributeName(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub result: Box<Type>,
    pub params: Vec<Type>,
}

/// One entry in an `Unpackable` type's advertised format list: a
/// format-enum name, the argument type it expects, whether that argument
/// is optional, and free-form documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackFormat {
    pub name: &'static str,
    pub argument_type: Option<Type>,
    pub argument_optional: bool,
    pub doc: &'static str,
}

/// The concrete kind of a type. Two `TypeKind`s of the same discriminant
/// compare equal only when their payloads are (recursively) equal — see
/// [`Type`]'s `PartialEq` impl for where the wildcard/any short-circuits
/// happen before this is ever consulted.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Integer { width: u8, signed: bool },
    String,
    Double,
    Bytes,
    Address,
    Network,
    Port,
    Interval,
    Time,
    Regexp,
    EnumLabel { enum_name: String },
    Bitset { labels: Vec<String> },
    Tuple(Vec<Type>),
    List(Box<Type>),
    Vector(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Iterator(Box<Type>),
    Unset,
    Union(Vec<Type>),
    Function(Box<FunctionType>),
    Reference(Box<Type>),
    /// §2b/§3.4 supplement: a named, possibly-parameterised heap type
    /// usable as a catch clause's declared type.
    Exception { name: String, params: Vec<Type> },
    /// Unresolved or not-yet-inferred; distinct from `Unset` (which is a
    /// real first-class "unset" value type in the source language).
    Unknown,
}

/// A type. Types are nodes in the source data model (§3.4); here that's
/// represented structurally rather than through the generic node graph,
/// since a type's identity is its structural value, not its position in a
/// parent/child tree — types are typically owned by the node that
/// declares or requires them rather than participating in the DAG.
#[derive(Debug, Clone)]
pub struct Type {
    kind: TypeKind,
    name: Option<Identifier>,
    wildcard: bool,
    any: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            name: None,
            wildcard: false,
            any: false,
        }
    }

    pub fn any() -> Self {
        let mut t = Type::new(TypeKind::Unknown);
        t.any = true;
        t
    }

    pub fn wildcard(kind: TypeKind) -> Self {
        let mut t = Type::new(kind);
        t.wildcard = true;
        t
    }

    pub fn with_name(mut self, name: Identifier) -> Self {
        self.name = Some(name);
        self
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&Identifier> {
        self.name.as_ref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_any(&self) -> bool {
        self.any
    }

    pub fn value_or_heap(&self) -> ValueOrHeap {
        match &self.kind {
            TypeKind::Bytes
            | TypeKind::Regexp
            | TypeKind::List(_)
            | TypeKind::Vector(_)
            | TypeKind::Set(_)
            | TypeKind::Map(_, _)
            | TypeKind::Reference(_)
            | TypeKind::Exception { .. } => ValueOrHeap::Heap,
            _ => ValueOrHeap::Value,
        }
    }

    pub fn is_heap(&self) -> bool {
        self.value_or_heap() == ValueOrHeap::Heap
    }

    // -- Parameterised --------------------------------------------------

    /// The ordered parameter list for kinds that are `Parameterised`, or
    /// `None` for kinds that aren't.
    pub fn parameters(&self) -> Option<Vec<Param>> {
        match &self.kind {
            TypeKind::List(elem) | TypeKind::Vector(elem) | TypeKind::Set(elem) => {
                Some(vec![Param::Type((**elem).clone())])
            }
            TypeKind::Map(key, value) => Some(vec![
                Param::Type((**key).clone()),
                Param::Type((**value).clone()),
            ]),
            TypeKind::EnumLabel { enum_name } => {
                Some(vec![Param::EnumLabel(enum_name.clone())])
            }
            TypeKind::Bitset { labels } => Some(
                labels
                    .iter()
                    .map(|l| Param::AttributeName(l.clone()))
                    .collect(),
            ),
            TypeKind::Exception { params, .. } => {
                Some(params.iter().cloned().map(Param::Type).collect())
            }
            _ => None,
        }
    }

    /// Two parameterised types of the same kind are equal iff their
    /// parameter lists are element-wise equal (§3.4). This is a narrower
    /// check than full `Type` equality — it ignores wildcard/any on the
    /// outer type, used by callers that specifically want parameter-level
    /// comparison.
    pub fn parameters_equal(&self, other: &Type) -> bool {
        match (self.parameters(), other.parameters()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    // -- TypeList ---------------------------------------------------------

    /// The ordered sub-type list for tuples and struct-like kinds.
    pub fn type_list(&self) -> Option<&[Type]> {
        match &self.kind {
            TypeKind::Tuple(types) => Some(types),
            _ => None,
        }
    }

    // -- Iterable / Container --------------------------------------------

    /// `(iterator type, element type)` for iterable kinds.
    pub fn iterable(&self) -> Option<(Type, Type)> {
        match &self.kind {
            TypeKind::List(elem) | TypeKind::Vector(elem) | TypeKind::Set(elem) => {
                Some((Type::new(TypeKind::Iterator(elem.clone())), (**elem).clone()))
            }
            TypeKind::Map(key, value) => Some((
                Type::new(TypeKind::Iterator(Box::new(Type::new(TypeKind::Tuple(vec![
                    (**key).clone(),
                    (**value).clone(),
                ]))))),
                (**value).clone(),
            )),
            _ => None,
        }
    }

    /// Containers are iterable kinds that additionally support mutation
    /// (insertion/removal); all our iterable kinds do.
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::List(_) | TypeKind::Vector(_) | TypeKind::Set(_) | TypeKind::Map(_, _)
        )
    }

    // -- Hashable ---------------------------------------------------------

    pub fn is_hashable(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Bool
                | TypeKind::Integer { .. }
                | TypeKind::String
                | TypeKind::Bytes
                | TypeKind::Address
                | TypeKind::Port
                | TypeKind::EnumLabel { .. }
        )
    }

    // -- Unpackable --------------------------------------------------------

    /// Binary-format parseable kinds advertise the formats they support.
    /// Representative only (bytes and integers), not the full catalogue.
    pub fn unpack_formats(&self) -> Option<Vec<UnpackFormat>> {
        match &self.kind {
            TypeKind::Bytes => Some(vec![
                UnpackFormat {
                    name: "BytesRunLength",
                    argument_type: Some(Type::new(TypeKind::Integer {
                        width: 64,
                        signed: false,
                    })),
                    argument_optional: false,
                    doc: "a run of N bytes, where N is given by the argument",
                },
                UnpackFormat {
                    name: "BytesDelim",
                    argument_type: Some(Type::new(TypeKind::Bytes)),
                    argument_optional: false,
                    doc: "bytes up to and including a delimiter sequence",
                },
            ]),
            TypeKind::Integer { signed, .. } => Some(vec![UnpackFormat {
                name: if *signed { "IntBigEndian" } else { "UIntBigEndian" },
                argument_type: None,
                argument_optional: true,
                doc: "fixed-width integer in big-endian byte order",
            }]),
            _ => None,
        }
    }

    // -- Classifiable ------------------------------------------------------

    /// Additional types a classifier field of this type may be matched
    /// against, or `None` if this kind can't be used as a classifier field.
    pub fn classifiable_against(&self) -> Option<Vec<Type>> {
        match &self.kind {
            TypeKind::Address => Some(vec![Type::new(TypeKind::Network)]),
            TypeKind::Port | TypeKind::Network => Some(vec![]),
            _ => None,
        }
    }

    // -- GarbageCollected --------------------------------------------------

    pub fn is_garbage_collected(&self) -> bool {
        self.is_heap()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if self.any || other.any {
            return true;
        }
        if std::mem::discriminant(&self.kind) != std::mem::discriminant(&other.kind) {
            return false;
        }
        if self.wildcard || other.wildcard {
            return true;
        }
        self.kind == other.kind
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            return write!(f, "{}", name);
        }
        match &self.kind {
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Integer { width, signed } => {
                write!(f, "{}int<{}>", if *signed { "" } else { "u" }, width)
            }
            TypeKind::String => write!(f, "string"),
            TypeKind::Double => write!(f, "double"),
            TypeKind::Bytes => write!(f, "bytes"),
            TypeKind::Address => write!(f, "addr"),
            TypeKind::Network => write!(f, "net"),
            TypeKind::Port => write!(f, "port"),
            TypeKind::Interval => write!(f, "interval"),
            TypeKind::Time => write!(f, "time"),
            TypeKind::Regexp => write!(f, "regexp"),
            TypeKind::EnumLabel { enum_name } => write!(f, "enum<{}>", enum_name),
            TypeKind::Bitset { .. } => write!(f, "bitset"),
            TypeKind::Tuple(types) => {
                write!(f, "tuple<")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ">")
            }
            TypeKind::List(e) => write!(f, "list<{}>", e),
            TypeKind::Vector(e) => write!(f, "vector<{}>", e),
            TypeKind::Set(e) => write!(f, "set<{}>", e),
            TypeKind::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            TypeKind::Iterator(e) => write!(f, "iterator<{}>", e),
            TypeKind::Unset => write!(f, "unset"),
            TypeKind::Union(types) => {
                write!(f, "union<")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ">")
            }
            TypeKind::Function(ft) => write!(f, "function -> {}", ft.result),
            TypeKind::Reference(inner) => write!(f, "ref<{}>", inner),
            TypeKind::Exception { name, .. } => write!(f, "exception<{}>", name),
            TypeKind::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(width: u8) -> Type {
        Type::new(TypeKind::Integer {
            width,
            signed: true,
        })
    }

    #[test]
    fn identical_kinds_are_equal() {
        assert_eq!(int(32), int(32));
    }

    #[test]
    fn different_widths_are_not_equal() {
        assert_ne!(int(32), int(64));
    }

    #[test]
    fn any_matches_everything() {
        assert_eq!(Type::any(), int(32));
        assert_eq!(int(64), Type::any());
    }

    #[test]
    fn wildcard_matches_same_kind_regardless_of_payload() {
        let wc = Type::wildcard(TypeKind::Integer {
            width: 0,
            signed: true,
        });
        assert_eq!(wc, int(32));
        assert_eq!(wc, int(64));
    }

    #[test]
    fn wildcard_does_not_match_different_kind() {
        let wc = Type::wildcard(TypeKind::Tuple(vec![]));
        assert_ne!(wc, int(32));
    }

    #[test]
    fn empty_container_is_not_automatically_wildcard() {
        let t = Type::new(TypeKind::List(Box::new(int(32))));
        assert!(!t.is_wildcard());
    }

    #[test]
    fn tuple_is_a_type_list() {
        let t = Type::new(TypeKind::Tuple(vec![int(32), Type::new(TypeKind::Bool)]));
        assert_eq!(t.type_list().unwrap().len(), 2);
    }

    #[test]
    fn list_is_iterable_with_matching_element_type() {
        let elem = int(8);
        let t = Type::new(TypeKind::List(Box::new(elem.clone())));
        let (_iter, el) = t.iterable().unwrap();
        assert_eq!(el, elem);
        assert!(t.is_container());
    }

    #[test]
    fn scalar_types_are_hashable_heap_types_are_not() {
        assert!(int(32).is_hashable());
        let bytes = Type::new(TypeKind::Bytes);
        assert!(!bytes.is_hashable());
        assert!(bytes.is_heap());
        assert!(bytes.is_garbage_collected());
    }

    #[test]
    fn bytes_advertises_unpack_formats() {
        let formats = Type::new(TypeKind::Bytes).unpack_formats().unwrap();
        assert!(!formats.is_empty());
    }

    #[test]
    fn exception_is_a_named_heap_type() {
        let exc = Type::new(TypeKind::Exception {
            name: "MyError".into(),
            params: vec![],
        });
        assert!(exc.is_heap());
        assert_eq!(exc.to_string(), "exception<MyError>");
    }
}
