mod composite;
mod nested;
mod relation;
mod scalar;
mod union;

pub use composite::{ListField, MapField};
pub use nested::NestedField;
pub use relation::{HyperlinkField, PrimaryKeyField};
pub use scalar::{
    BoolField, ChoiceField, DateField, DateTimeField, DecimalField, DurationField, FloatField,
    IntField, ReadOnlyField, TextField, UintField, UuidField,
};
pub use union::{DEFAULT_DISCRIMINATOR_KEY, DEFAULT_VALUE_KEY, UnionField, UnionMember};

use crate::error::ConfigError;
use crate::report::Report;
use crate::value::Value;
use std::fmt;

///
/// FieldConfig
///
/// Cross-cutting configuration shared by every field kind. Populated by the
/// Field Builder after dispatch; immutable once the field set is built.
///

#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub required: bool,
    pub allow_null: bool,
    pub read_only: bool,
    /// Record attribute this field binds to, when different from the field
    /// name.
    pub source: Option<String>,
    /// Wire-level default inserted when no input is supplied in full mode.
    pub default: Option<Value>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            required: true,
            allow_null: false,
            read_only: false,
            source: None,
            default: None,
        }
    }
}

///
/// Field
///
/// One attribute's validate/render unit. `decode` validates and normalizes a
/// wire value into an internal value, reporting problems at the current
/// report path; `encode` renders an internal value into its wire form.
///
/// Fields are stateless configuration: a built field set is reused across
/// independent decode/encode passes, concurrent ones included.
///

pub trait Field: fmt::Debug + Send + Sync {
    fn config(&self) -> &FieldConfig;

    fn config_mut(&mut self) -> &mut FieldConfig;

    fn boxed_clone(&self) -> Box<dyn Field>;

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value>;

    fn encode(&self, value: &Value) -> Result<Value, ConfigError>;

    /// Nested-record view, used by partial-update merging to recurse into
    /// record-shaped values. Every other field kind replaces wholesale.
    fn as_nested(&self) -> Option<&NestedField> {
        None
    }
}

impl Clone for Box<dyn Field> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl dyn Field + '_ {
    /// Decode with null handling applied ahead of the field's own logic.
    pub fn run_decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        if value.is_null() {
            if self.config().allow_null {
                return Some(Value::Null);
            }
            report.issue("this field may not be null");
            return None;
        }

        self.decode(value, report)
    }

    /// Encode with null passthrough.
    pub fn run_encode(&self, value: &Value) -> Result<Value, ConfigError> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        self.encode(value)
    }
}

///
/// FieldOptions
///
/// Per-attribute overrides supplied through serializer configuration or
/// declaration metadata. `None` means "infer"; any set option wins over the
/// inferred value. `child` routes options to a composite field's child
/// instead of the composite itself.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldOptions {
    pub required: Option<bool>,
    pub allow_null: Option<bool>,
    pub read_only: Option<bool>,
    pub allow_blank: Option<bool>,
    pub source: Option<String>,
    pub default: Option<Value>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
    pub child: Option<Box<Self>>,
}

impl FieldOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    #[must_use]
    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = Some(allow_null);
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    #[must_use]
    pub fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = Some(allow_blank);
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Layer `over` on top of `base`: every option set on `over` wins, child
    /// options layer recursively.
    #[must_use]
    pub fn layered(base: &Self, over: &Self) -> Self {
        Self {
            required: over.required.or(base.required),
            allow_null: over.allow_null.or(base.allow_null),
            read_only: over.read_only.or(base.read_only),
            allow_blank: over.allow_blank.or(base.allow_blank),
            source: over.source.clone().or_else(|| base.source.clone()),
            default: over.default.clone().or_else(|| base.default.clone()),
            min_value: over.min_value.or(base.min_value),
            max_value: over.max_value.or(base.max_value),
            min_length: over.min_length.or(base.min_length),
            max_length: over.max_length.or(base.max_length),
            max_digits: over.max_digits.or(base.max_digits),
            decimal_places: over.decimal_places.or(base.decimal_places),
            child: match (&base.child, &over.child) {
                (Some(b), Some(o)) => Some(Box::new(Self::layered(b, o))),
                (base_child, over_child) => over_child.clone().or_else(|| base_child.clone()),
            },
        }
    }
}

/// Short rendering of a wire value for validation messages.
#[must_use]
pub fn value_preview(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Text(s) => s.clone(),
        Value::Uint(u) => u.to_string(),
        Value::Uuid(u) => u.to_string(),
        other => other.type_label().to_string(),
    }
}

/// Shared `Field` plumbing for concrete field types.
macro_rules! field_common {
    () => {
        fn config(&self) -> &FieldConfig {
            &self.config
        }

        fn config_mut(&mut self) -> &mut FieldConfig {
            &mut self.config
        }

        fn boxed_clone(&self) -> Box<dyn Field> {
            Box::new(self.clone())
        }
    };
}

pub(crate) use field_common;
