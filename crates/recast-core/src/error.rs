use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// ConfigError
///
/// Programming mistakes caught while building a serializer's field set.
/// Always fatal; never produced by bad input data.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("cannot set both `fields` and `exclude` on the serializer for record '{record}'")]
    ConflictingSelection { record: String },

    #[error(
        "field '{field}' is both declared and configured through extra options on record \
         '{record}'; move all options to the declaration"
    )]
    DuplicateFieldConfig { record: String, field: String },

    #[error("field '{field}' does not match any attribute on record '{record}'")]
    UnknownAttribute { record: String, field: String },

    #[error(
        "cannot exclude field '{field}' on record '{record}': it is explicitly declared; \
         remove the declaration instead"
    )]
    ExcludedDeclaredField { record: String, field: String },

    #[error(
        "field '{field}' is declared on the serializer for record '{record}' but missing from \
         the `fields` option"
    )]
    DeclaredFieldNotIncluded { record: String, field: String },

    #[error(
        "automatic field deduction is not supported for attribute '{attribute}' of type \
         '{annotation}'"
    )]
    UnsupportedType {
        attribute: String,
        annotation: String,
    },

    #[error(
        "union member '{tag}' serializes to a non-mapping value; enable nesting on the union \
         field to wrap it"
    )]
    NestingRequired { tag: String },

    #[error("union field requires at least one member type")]
    EmptyUnion,

    #[error("no union member matches a value of type '{label}'")]
    UnmatchedUnionValue { label: String },
}

///
/// ValidateError
///
/// Structured decode failure: issues collected per attribute path.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("validation failed")]
    ValidationFailed(BTreeMap<String, Vec<String>>),
}

impl ValidateError {
    /// Issue map keyed by dotted attribute path.
    #[must_use]
    pub const fn issues(&self) -> &BTreeMap<String, Vec<String>> {
        match self {
            Self::ValidationFailed(issues) => issues,
        }
    }
}

///
/// UsageError
///
/// Misuse of the save contract: reconstruction requested with data that can
/// never materialize a record.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UsageError {
    #[error("attribute '{attribute}' on record '{record}' has no validated value and no declared default")]
    MissingAttribute { record: String, attribute: String },

    #[error("record '{record}' could not be reconstructed: {message}")]
    Reconstruction { record: String, message: String },
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}
