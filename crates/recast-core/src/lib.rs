//! Core runtime for Recast: the declared-type resolver, field builder,
//! field library and serializer orchestration, plus the ergonomics exported
//! via the `prelude`.

pub mod annotation;
pub mod builder;
pub mod error;
pub mod fields;
pub mod record;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod serializer;
pub mod value;

pub use error::{ConfigError, Error, UsageError, ValidateError};

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Concrete fields, registries and hooks are imported from their modules.
///

pub mod prelude {
    pub use crate::{
        annotation::{
            EnumDef, LiteralValue, RelationDef, ScalarKind, SequenceKind, TypeAnnotation,
            TypeVarDef,
        },
        error::{ConfigError, Error, UsageError, ValidateError},
        fields::{Field, FieldOptions},
        record::{AttributeDef, Namespace, Record, RecordDef, RecordType},
        serializer::{
            FieldSelection, ManySerializer, RecordSerializer, RelationStyle, Serializer,
            SerializerConfig, Validated,
        },
        value::Value,
    };
}
