use crate::error::ConfigError;
use crate::fields::{Field, FieldConfig, field_common};
use crate::record::RecordType;
use crate::report::Report;
use crate::serializer::{Serializer, SerializerConfig, Validated};
use crate::value::Value;
use std::sync::OnceLock;

///
/// Inner
///
/// Nested serializers build eagerly so configuration mistakes surface at
/// build time. A self-referential record would recurse forever, so builds
/// already on the stack defer to first use instead; runtime depth is then
/// bounded only by the data.
///

#[derive(Clone, Debug)]
enum Inner {
    Built(Serializer),
    Deferred {
        record: RecordType,
        config: Box<SerializerConfig>,
        cell: OnceLock<Result<Serializer, ConfigError>>,
    },
}

///
/// NestedField
///
/// A record-typed attribute serialized through its own serializer, built
/// through the injected nested-serializer factory.
///

#[derive(Clone, Debug)]
pub struct NestedField {
    pub config: FieldConfig,
    inner: Inner,
}

impl NestedField {
    #[must_use]
    pub fn new(serializer: Serializer) -> Self {
        Self {
            config: FieldConfig::default(),
            inner: Inner::Built(serializer),
        }
    }

    /// Defer the nested build until first use; breaks declaration cycles.
    #[must_use]
    pub fn deferred(record: RecordType, config: SerializerConfig) -> Self {
        Self {
            config: FieldConfig::default(),
            inner: Inner::Deferred {
                record,
                config: Box::new(config),
                cell: OnceLock::new(),
            },
        }
    }

    pub fn serializer(&self) -> Result<&Serializer, ConfigError> {
        match &self.inner {
            Inner::Built(serializer) => Ok(serializer),
            Inner::Deferred {
                record,
                config,
                cell,
            } => cell
                .get_or_init(|| (config.nested_factory)(*record, config))
                .as_ref()
                .map_err(Clone::clone),
        }
    }
}

impl Field for NestedField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let serializer = match self.serializer() {
            Ok(serializer) => serializer,
            Err(err) => {
                report.issue(err.to_string());
                return None;
            }
        };

        let decoded = serializer.decode_value(value, report)?;

        // Partial nested values keep their absences for the merge pass; full
        // builds materialize the nested record's declared defaults here, so
        // reconstruction sees a complete mapping at every depth.
        if serializer.is_partial() {
            return Some(decoded);
        }

        let values = decoded.into_map()?;
        match serializer.materialize(&Validated {
            values,
            partial: false,
        }) {
            Ok(complete) => Some(Value::Map(complete)),
            Err(err) => {
                report.issue(err.to_string());
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        let Some(values) = value.as_map() else {
            return Ok(value.clone());
        };
        self.serializer()?.encode_values(values)
    }

    fn as_nested(&self) -> Option<&Self> {
        Some(self)
    }
}
