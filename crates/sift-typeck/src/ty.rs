//! Type representation for Sift queries.
//!
//! Defines the closed `Type` enum, named record types, the assignability
//! relation that inference and validation are built on, and `Slot`, the
//! per-node inference handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sift_parser::ast::{hash_name, names_eq};

/// A Sift type.
///
/// - value types: `Bool`, `Int32`, `Int64`, `Double`, `DateTimeOffset`
/// - reference types: `String`, `Object`, `Array`, `Sequence`, `Function`,
///   `Record`
/// - `Nullable(T)` for a value type `T`
///
/// `Sequence` is the only interface type: it is the capability of being
/// enumerated, satisfied by arrays and by sequences of assignable elements.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int32,
    Int64,
    Double,
    DateTimeOffset,
    String,
    /// The top type; everything is assignable to it.
    Object,
    Nullable(Box<Type>),
    Array(Box<Type>),
    Sequence(Box<Type>),
    /// A single-argument callable: `Function(argument, result)`.
    Function(Box<Type>, Box<Type>),
    Record(Arc<RecordType>),
}

impl Type {
    /// `T?` for a value type, the type itself for anything already nullable.
    pub fn nullable(inner: Type) -> Type {
        if inner.is_value_type() {
            Type::Nullable(Box::new(inner))
        } else {
            inner
        }
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn sequence(elem: Type) -> Type {
        Type::Sequence(Box::new(elem))
    }

    pub fn function(arg: Type, result: Type) -> Type {
        Type::Function(Box::new(arg), Box::new(result))
    }

    pub fn record(record: RecordType) -> Type {
        Type::Record(Arc::new(record))
    }

    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Type::Bool | Type::Int32 | Type::Int64 | Type::Double | Type::DateTimeOffset
        )
    }

    /// The type with any `Nullable` wrapper removed.
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.underlying(), Type::Int32 | Type::Int64 | Type::Double)
    }

    /// Whether `null` is a legal value of the type.
    pub fn is_nullable(&self) -> bool {
        !self.is_value_type()
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function(..))
    }

    /// Element type of an array or sequence.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) | Type::Sequence(elem) => Some(elem),
            _ => None,
        }
    }

    /// Whether a value of type `self` may be used where `to` is expected.
    pub fn is_assignable_to(&self, to: &Type) -> bool {
        if self == to {
            return true;
        }
        match (self, to) {
            (_, Type::Object) => true,
            (from, Type::Nullable(inner)) => from == &**inner,
            (Type::Array(a) | Type::Sequence(a), Type::Sequence(b)) => a.is_assignable_to(b),
            (Type::Record(from), Type::Record(to)) => from.derives_from(to),
            _ => false,
        }
    }

    /// The more specific of two related types, `None` when neither is
    /// assignable to the other.
    pub fn more_specific(a: &Type, b: &Type) -> Option<Type> {
        if a.is_assignable_to(b) {
            Some(a.clone())
        } else if b.is_assignable_to(a) {
            Some(b.clone())
        } else {
            None
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int32 => f.write_str("int"),
            Type::Int64 => f.write_str("long"),
            Type::Double => f.write_str("double"),
            Type::DateTimeOffset => f.write_str("datetime"),
            Type::String => f.write_str("string"),
            Type::Object => f.write_str("object"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Sequence(elem) => write!(f, "seq<{elem}>"),
            Type::Function(arg, result) => write!(f, "({arg}) => {result}"),
            Type::Record(record) => f.write_str(&record.name),
        }
    }
}

// ── Records ────────────────────────────────────────────────────────────

/// A field of a record type.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: Arc<str>,
    pub ty: Type,
}

/// A named data-model type with ordered fields and an optional base.
///
/// Identity is the name, compared case-insensitively: two `RecordType`s
/// with the same name are the same type regardless of their fields.
#[derive(Clone, Debug)]
pub struct RecordType {
    pub name: Arc<str>,
    pub fields: Vec<Field>,
    pub base: Option<Arc<RecordType>>,
}

impl RecordType {
    pub fn new(name: &str) -> Self {
        RecordType {
            name: Arc::from(name),
            fields: Vec::new(),
            base: None,
        }
    }

    pub fn with_field(mut self, name: &str, ty: Type) -> Self {
        self.fields.push(Field {
            name: Arc::from(name),
            ty,
        });
        self
    }

    pub fn with_base(mut self, base: Arc<RecordType>) -> Self {
        self.base = Some(base);
        self
    }

    /// Look a field up by name, here or in a base record.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| names_eq(&f.name, name))
            .or_else(|| self.base.as_deref().and_then(|b| b.find_field(name)))
    }

    /// Whether `other` is this record or one of its bases.
    pub fn derives_from(&self, other: &RecordType) -> bool {
        let mut current = Some(self);
        while let Some(record) = current {
            if record == other {
                return true;
            }
            current = record.base.as_deref();
        }
        false
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        names_eq(&self.name, &other.name)
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_name(&self.name, state);
    }
}

// ── Slots ──────────────────────────────────────────────────────────────

/// An inference slot: one per AST node, shared by every occurrence of a
/// bound identifier. Unique within one inference pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u32);

impl Slot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

// ── ena trait implementations ──────────────────────────────────────────

/// Slots joined by `SameAs` edges share one union-find class. The class
/// carries no value; constraints stay on the individual slots.
impl ena::unify::UnifyKey for Slot {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        Slot(u)
    }

    fn tag() -> &'static str {
        "Slot"
    }
}
