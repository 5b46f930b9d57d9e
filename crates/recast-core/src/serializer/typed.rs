use crate::error::{Error, ValidateError};
use crate::record::Record;
use crate::report::Report;
use crate::serializer::{RelationStyle, Serializer, SerializerConfig, Validated};
use crate::value::Value;
use std::marker::PhantomData;

///
/// RecordSerializer
///
/// Binds the untyped orchestration core to a concrete `Record` type and
/// carries the save contract. `create` and `update` are the only paths from
/// validated data back to a record instance, and both strip the not-supplied
/// marker by construction.
///

#[derive(Clone, Debug)]
pub struct RecordSerializer<T: Record> {
    inner: Serializer,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordSerializer<T> {
    pub fn new() -> Result<Self, Error> {
        Self::with_config(SerializerConfig::default())
    }

    /// A serializer whose relation fields render hyperlinks instead of
    /// primary keys, propagated into nested builds.
    pub fn hyperlinked() -> Result<Self, Error> {
        Self::with_config(
            SerializerConfig::default().with_relation_style(RelationStyle::Hyperlinked),
        )
    }

    /// A partial-update serializer: unsupplied attributes stay unsupplied
    /// through decode and merge onto an existing instance in `update`.
    pub fn partial() -> Result<Self, Error> {
        Self::with_config(SerializerConfig::default().with_partial(true))
    }

    pub fn with_config(config: SerializerConfig) -> Result<Self, Error> {
        // The record's own namespace entry makes self-references resolvable
        // without explicit registration.
        let config = SerializerConfig {
            namespace: config.namespace.clone().with::<T>(),
            ..config
        };
        let inner = Serializer::build(T::record_type(), &config)?;
        Ok(Self {
            inner,
            _record: PhantomData,
        })
    }

    #[must_use]
    pub const fn inner(&self) -> &Serializer {
        &self.inner
    }

    ///
    /// DECODE / ENCODE
    ///

    pub fn decode(&self, data: &Value) -> Result<Validated, ValidateError> {
        self.inner.decode(data)
    }

    pub fn encode(&self, record: &T) -> Result<Value, Error> {
        let values = record.to_values();
        self.inner.encode_values(&values).map_err(Error::from)
    }

    ///
    /// SAVE CONTRACT
    ///

    /// Construct a new record: validated values where present, declared
    /// defaults otherwise.
    pub fn create(&self, validated: &Validated) -> Result<T, Error> {
        let values = self.inner.materialize(validated)?;
        T::from_values(&values).map_err(Error::from)
    }

    /// Produce a merged record from an existing instance. Partial mode
    /// overlays only the supplied attributes, recursing into nested records;
    /// full mode rebuilds every attribute from the validated data.
    pub fn update(&self, instance: &T, validated: &Validated) -> Result<T, Error> {
        let mut current = instance.to_values();

        if validated.partial {
            self.inner.merge_values(&mut current, &validated.values);
        } else {
            for (name, value) in self.inner.materialize(validated)? {
                current.insert(name, value);
            }
        }

        T::from_values(&current).map_err(Error::from)
    }

    pub fn save(&self, instance: Option<&T>, validated: &Validated) -> Result<T, Error> {
        match instance {
            Some(existing) => self.update(existing, validated),
            None => self.create(validated),
        }
    }
}

///
/// ManySerializer
///
/// Homogeneous-sequence wrapper: delegates per item and collects issues
/// under `[index]` paths.
///

#[derive(Clone, Debug)]
pub struct ManySerializer<T: Record> {
    item: RecordSerializer<T>,
    pub allow_empty: bool,
}

impl<T: Record> ManySerializer<T> {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            item: RecordSerializer::new()?,
            allow_empty: true,
        })
    }

    #[must_use]
    pub fn from_item(item: RecordSerializer<T>) -> Self {
        Self {
            item,
            allow_empty: true,
        }
    }

    #[must_use]
    pub const fn item(&self) -> &RecordSerializer<T> {
        &self.item
    }

    pub fn decode(&self, data: &Value) -> Result<Vec<Validated>, ValidateError> {
        let mut report = Report::new();

        let Some(items) = data.as_list() else {
            report.issue(format!("expected a list of items, got {}", data.type_label()));
            return Err(ValidateError::ValidationFailed(report.into_issues()));
        };

        if items.is_empty() && !self.allow_empty {
            report.issue("this list may not be empty");
            return Err(ValidateError::ValidationFailed(report.into_issues()));
        }

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let decoded =
                report.scoped(i, |r| self.item.inner().decode_value(item, r));
            if let Some(Value::Map(values)) = decoded {
                out.push(Validated {
                    values,
                    partial: self.item.inner().is_partial(),
                });
            }
        }

        if report.is_empty() {
            Ok(out)
        } else {
            Err(ValidateError::ValidationFailed(report.into_issues()))
        }
    }

    pub fn encode(&self, records: &[T]) -> Result<Value, Error> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.item.encode(record)?);
        }
        Ok(Value::List(out))
    }

    pub fn create(&self, validated: &[Validated]) -> Result<Vec<T>, Error> {
        validated.iter().map(|v| self.item.create(v)).collect()
    }
}
