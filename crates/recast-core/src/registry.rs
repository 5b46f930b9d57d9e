use crate::annotation::ScalarKind;
use crate::fields::{
    BoolField, DateField, DateTimeField, DecimalField, DurationField, Field, FieldOptions,
    FloatField, IntField, TextField, UintField, UuidField,
};
use crate::record::RecordType;
use std::collections::BTreeMap;

/// Builds a scalar field for a kind, applying the type-specific options the
/// cross-cutting pass cannot reach.
pub type ScalarFieldFactory = fn(ScalarKind, &FieldOptions) -> Box<dyn Field>;

/// Replaces the nested-serializer default for a specific record type.
pub type RecordFieldFactory = fn(RecordType, &FieldOptions) -> Box<dyn Field>;

///
/// FieldRegistry
///
/// The type → field mapping table. Owned by each serializer configuration
/// and inherited by copy-on-override, so concurrent builds never share a
/// mutable table. Scalar entries key by the kind's name (which is also how a
/// specific enumeration can be overridden); record entries key by record
/// type name.
///

#[derive(Clone, Debug)]
pub struct FieldRegistry {
    scalars: BTreeMap<&'static str, ScalarFieldFactory>,
    records: BTreeMap<&'static str, RecordFieldFactory>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        let mut scalars: BTreeMap<&'static str, ScalarFieldFactory> = BTreeMap::new();
        scalars.insert("bool", |_, _| Box::new(BoolField::new()));
        scalars.insert("date", |_, _| Box::new(DateField::new()));
        scalars.insert("datetime", |_, _| Box::new(DateTimeField::new()));
        scalars.insert("decimal", |_, options| {
            let mut field = DecimalField::new();
            if options.max_digits.is_some() {
                field.max_digits = options.max_digits;
            }
            if options.decimal_places.is_some() {
                field.decimal_places = options.decimal_places;
            }
            Box::new(field)
        });
        scalars.insert("duration", |_, _| Box::new(DurationField::new()));
        scalars.insert("float", |_, _| Box::new(FloatField::new()));
        scalars.insert("int", |_, options| {
            Box::new(IntField {
                min_value: options.min_value,
                max_value: options.max_value,
                ..IntField::new()
            })
        });
        scalars.insert("str", |_, options| {
            Box::new(TextField {
                allow_blank: options.allow_blank.unwrap_or(false),
                min_length: options.min_length,
                max_length: options.max_length,
                ..TextField::new()
            })
        });
        scalars.insert("uint", |_, options| {
            Box::new(UintField {
                min_value: options.min_value.and_then(|v| u64::try_from(v).ok()),
                max_value: options.max_value.and_then(|v| u64::try_from(v).ok()),
                ..UintField::new()
            })
        });
        scalars.insert("uuid", |_, _| Box::new(UuidField::new()));

        Self {
            scalars,
            records: BTreeMap::new(),
        }
    }
}

impl FieldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy-on-override: returns a registry with the scalar entry replaced.
    #[must_use]
    pub fn with_scalar(mut self, key: &'static str, factory: ScalarFieldFactory) -> Self {
        self.scalars.insert(key, factory);
        self
    }

    /// Copy-on-override: returns a registry with the record entry replaced.
    #[must_use]
    pub fn with_record(mut self, name: &'static str, factory: RecordFieldFactory) -> Self {
        self.records.insert(name, factory);
        self
    }

    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<ScalarFieldFactory> {
        self.scalars.get(key).copied()
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<RecordFieldFactory> {
        self.records.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overriding_does_not_touch_the_source_registry() {
        let base = FieldRegistry::new();
        let overridden =
            base.clone()
                .with_scalar("str", |_, _| Box::new(BoolField::new()));

        assert!(base.scalar("str").is_some());
        assert_ne!(
            format!("{:?}", base.scalar("str").map(|f| f as usize)),
            format!("{:?}", overridden.scalar("str").map(|f| f as usize)),
        );
    }
}
