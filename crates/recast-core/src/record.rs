use crate::annotation::TypeAnnotation;
use crate::error::UsageError;
use crate::fields::{Field, FieldOptions};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

///
/// RecordType
///
/// Handle to a declared record type: a stable name plus a definition
/// thunk. The thunk (rather than a static definition) keeps self-referential
/// and mutually-recursive declarations well-founded.
///

#[derive(Clone, Copy)]
pub struct RecordType {
    pub name: &'static str,
    pub def: fn() -> RecordDef,
}

impl RecordType {
    #[must_use]
    pub fn definition(&self) -> RecordDef {
        (self.def)()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType").field("name", &self.name).finish()
    }
}

///
/// RecordDef
///
/// Ordered attribute list of a declared record type. Never mutated by the
/// core; rebuilt from the declaration thunk per serializer build.
///

#[derive(Clone, Debug)]
pub struct RecordDef {
    pub name: &'static str,
    pub attributes: Vec<AttributeDef>,
}

impl RecordDef {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

///
/// AttributeKind
///
/// `Data` attributes are stored and participate in reconstruction.
/// `Property` attributes are zero-argument computed values: always encoded,
/// never decoded.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AttributeKind {
    #[default]
    Data,
    Property,
}

///
/// AttributeDefault
///

#[derive(Clone, Debug)]
pub enum AttributeDefault {
    Value(Value),
    Factory(fn() -> Value),
}

impl AttributeDefault {
    #[must_use]
    pub fn materialize(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

///
/// AttributeMetadata
///
/// Free-form per-attribute configuration carried on the declaration itself:
/// an explicit field instance (wins over inference) or extra field options
/// merged beneath any serializer-level extras.
///

#[derive(Clone, Debug, Default)]
pub struct AttributeMetadata {
    pub field: Option<Box<dyn Field>>,
    pub options: Option<FieldOptions>,
}

///
/// AttributeDef
///

#[derive(Clone, Debug)]
pub struct AttributeDef {
    pub name: &'static str,
    pub annotation: TypeAnnotation,
    pub kind: AttributeKind,
    pub default: Option<AttributeDefault>,
    /// Whether the attribute participates in construction. Non-init
    /// attributes are set after the fact and never receive a not-supplied
    /// marker in partial mode.
    pub init: bool,
    pub is_final: bool,
    pub metadata: AttributeMetadata,
}

impl AttributeDef {
    #[must_use]
    pub fn new(name: &'static str, annotation: TypeAnnotation) -> Self {
        Self {
            name,
            annotation,
            kind: AttributeKind::Data,
            default: None,
            init: true,
            is_final: false,
            metadata: AttributeMetadata::default(),
        }
    }

    #[must_use]
    pub fn property(name: &'static str, annotation: TypeAnnotation) -> Self {
        Self {
            kind: AttributeKind::Property,
            init: false,
            ..Self::new(name, annotation)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(AttributeDefault::Value(value.into()));
        self
    }

    #[must_use]
    pub fn with_default_factory(mut self, factory: fn() -> Value) -> Self {
        self.default = Some(AttributeDefault::Factory(factory));
        self
    }

    #[must_use]
    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    #[must_use]
    pub fn no_init(mut self) -> Self {
        self.init = false;
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: Box<dyn Field>) -> Self {
        self.metadata.field = Some(field);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.metadata.options = Some(options);
        self
    }

    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

///
/// Record
///
/// The record-declaration seam: a typed value that can describe itself and
/// convert to/from the generic value representation. Nested records appear
/// as `Value::Map` inside `to_values` output.
///

pub trait Record: Clone + Sized {
    /// Static handle used by annotations, namespaces and serializers.
    fn record_type() -> RecordType;

    /// Current attribute values, computed properties included.
    fn to_values(&self) -> BTreeMap<String, Value>;

    /// Construct from a complete attribute-value mapping. Every data
    /// attribute must be present; the conversion reports the record name in
    /// failures.
    fn from_values(values: &BTreeMap<String, Value>) -> Result<Self, UsageError>;
}

///
/// Namespace
///
/// Name → record-type registry consulted when a forward reference is
/// resolved. Lookup happens at resolution time, so self-referential and
/// not-yet-registered declarations work as long as registration precedes the
/// serializer build.
///

#[derive(Clone, Debug, Default)]
pub struct Namespace {
    records: BTreeMap<&'static str, RecordType>,
}

impl Namespace {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with<T: Record>(mut self) -> Self {
        self.insert(T::record_type());
        self
    }

    pub fn insert(&mut self, record: RecordType) {
        self.records.insert(record.name, record);
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<RecordType> {
        self.records.get(name).copied()
    }
}
