use crate::fields::{Field, FieldConfig, field_common, value_preview};
use crate::report::Report;
use crate::value::{DATE_FORMAT, Value};
use crate::error::ConfigError;
use rust_decimal::Decimal;
use std::str::FromStr;
use time::{Date, Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

///
/// BoolField
///

#[derive(Clone, Debug, Default)]
pub struct BoolField {
    pub config: FieldConfig,
}

impl BoolField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for BoolField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        if let Some(b) = value.as_bool() {
            return Some(Value::Bool(b));
        }
        match value.as_text() {
            Some(s) if s == "true" || s == "false" => Some(Value::Bool(s == "true")),
            _ => {
                report.issue(format!("expected a boolean, got {}", value.type_label()));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// IntField
///

#[derive(Clone, Debug, Default)]
pub struct IntField {
    pub config: FieldConfig,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl IntField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for IntField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(i) = value.as_int() else {
            report.issue("a valid integer is required");
            return None;
        };

        if let Some(min) = self.min_value
            && i < min
        {
            report.issue(format!("ensure this value is greater than or equal to {min}"));
            return None;
        }
        if let Some(max) = self.max_value
            && i > max
        {
            report.issue(format!("ensure this value is less than or equal to {max}"));
            return None;
        }

        Some(Value::Int(i))
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// UintField
///

#[derive(Clone, Debug, Default)]
pub struct UintField {
    pub config: FieldConfig,
    pub min_value: Option<u64>,
    pub max_value: Option<u64>,
}

impl UintField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for UintField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(u) = value.as_uint() else {
            report.issue("a valid non-negative integer is required");
            return None;
        };

        if let Some(min) = self.min_value
            && u < min
        {
            report.issue(format!("ensure this value is greater than or equal to {min}"));
            return None;
        }
        if let Some(max) = self.max_value
            && u > max
        {
            report.issue(format!("ensure this value is less than or equal to {max}"));
            return None;
        }

        Some(Value::Uint(u))
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// FloatField
///

#[derive(Clone, Debug, Default)]
pub struct FloatField {
    pub config: FieldConfig,
}

impl FloatField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for FloatField {
    field_common!();

    #[expect(clippy::cast_precision_loss)]
    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        match value {
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Uint(u) => Some(Value::Float(*u as f64)),
            other => {
                report.issue(format!("a valid number is required, got {}", other.type_label()));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// DecimalField
///
/// Unbounded total digits and two fractional places unless configured
/// otherwise. Values render as strings at the configured scale.
///

#[derive(Clone, Debug)]
pub struct DecimalField {
    pub config: FieldConfig,
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
}

impl Default for DecimalField {
    fn default() -> Self {
        Self {
            config: FieldConfig::default(),
            max_digits: None,
            decimal_places: Some(2),
        }
    }
}

impl DecimalField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(value: &Value) -> Option<Decimal> {
        match value {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Uint(u) => Some(Decimal::from(*u)),
            Value::Float(f) => Decimal::try_from(*f).ok(),
            Value::Text(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }
}

impl Field for DecimalField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(decimal) = Self::parse(value) else {
            report.issue("a valid decimal number is required");
            return None;
        };

        let normalized = decimal.normalize();
        if let Some(places) = self.decimal_places
            && normalized.scale() > places
        {
            report.issue(format!("ensure there are no more than {places} decimal places"));
            return None;
        }
        if let Some(digits) = self.max_digits {
            let mantissa_digits = normalized.abs().mantissa().to_string().len() as u32;
            if mantissa_digits > digits {
                report.issue(format!("ensure there are no more than {digits} digits in total"));
                return None;
            }
        }

        Some(Value::Decimal(decimal))
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        let Value::Decimal(decimal) = value else {
            return Ok(value.clone());
        };

        let mut rendered = *decimal;
        if let Some(places) = self.decimal_places {
            rendered.rescale(places);
        }
        Ok(Value::Text(rendered.to_string()))
    }
}

///
/// TextField
///

#[derive(Clone, Debug, Default)]
pub struct TextField {
    pub config: FieldConfig,
    pub allow_blank: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl TextField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for TextField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(s) = value.as_text() else {
            report.issue(format!("expected a string, got {}", value.type_label()));
            return None;
        };

        if s.is_empty() && !self.allow_blank {
            report.issue("this field may not be blank");
            return None;
        }
        if let Some(min) = self.min_length
            && s.chars().count() < min
        {
            report.issue(format!("ensure this field has at least {min} characters"));
            return None;
        }
        if let Some(max) = self.max_length
            && s.chars().count() > max
        {
            report.issue(format!("ensure this field has no more than {max} characters"));
            return None;
        }

        Some(Value::Text(s.to_string()))
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// UuidField
///

#[derive(Clone, Debug, Default)]
pub struct UuidField {
    pub config: FieldConfig,
}

impl UuidField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for UuidField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        match value {
            Value::Uuid(u) => Some(Value::Uuid(*u)),
            Value::Text(s) => match Uuid::parse_str(s) {
                Ok(u) => Some(Value::Uuid(u)),
                Err(_) => {
                    report.issue(format!("\"{s}\" is not a valid uuid"));
                    None
                }
            },
            other => {
                report.issue(format!("expected a uuid string, got {}", other.type_label()));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        match value {
            Value::Uuid(u) => Ok(Value::Text(u.to_string())),
            other => Ok(other.clone()),
        }
    }
}

///
/// DateField
///

#[derive(Clone, Debug, Default)]
pub struct DateField {
    pub config: FieldConfig,
}

impl DateField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for DateField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        match value {
            Value::Date(d) => Some(Value::Date(*d)),
            Value::Text(s) => match Date::parse(s, DATE_FORMAT) {
                Ok(d) => Some(Value::Date(d)),
                Err(_) => {
                    report.issue(format!(
                        "\"{s}\" is not a valid date; expected YYYY-MM-DD"
                    ));
                    None
                }
            },
            other => {
                report.issue(format!("expected a date string, got {}", other.type_label()));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        match value {
            Value::Date(d) => Ok(Value::Text(
                d.format(DATE_FORMAT).unwrap_or_else(|_| d.to_string()),
            )),
            other => Ok(other.clone()),
        }
    }
}

///
/// DateTimeField
///

#[derive(Clone, Debug, Default)]
pub struct DateTimeField {
    pub config: FieldConfig,
}

impl DateTimeField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for DateTimeField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        match value {
            Value::DateTime(dt) => Some(Value::DateTime(*dt)),
            Value::Text(s) => match OffsetDateTime::parse(s, &Rfc3339) {
                Ok(dt) => Some(Value::DateTime(dt)),
                Err(_) => {
                    report.issue(format!(
                        "\"{s}\" is not a valid datetime; expected RFC 3339"
                    ));
                    None
                }
            },
            other => {
                report.issue(format!(
                    "expected a datetime string, got {}",
                    other.type_label()
                ));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        match value {
            Value::DateTime(dt) => Ok(Value::Text(
                dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()),
            )),
            other => Ok(other.clone()),
        }
    }
}

///
/// DurationField
///
/// Whole seconds on the wire.
///

#[derive(Clone, Debug, Default)]
pub struct DurationField {
    pub config: FieldConfig,
}

impl DurationField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for DurationField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        match value {
            Value::Duration(d) => Some(Value::Duration(*d)),
            _ => value.as_int().map_or_else(
                || {
                    report.issue("a duration in whole seconds is required");
                    None
                },
                |secs| Some(Value::Duration(Duration::seconds(secs))),
            ),
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        match value {
            Value::Duration(d) => Ok(Value::Int(d.whole_seconds())),
            other => Ok(other.clone()),
        }
    }
}

///
/// ChoiceField
///
/// Accepts exactly the configured value set. Backs both literal-choice
/// annotations and enumeration scalars.
///

#[derive(Clone, Debug, Default)]
pub struct ChoiceField {
    pub config: FieldConfig,
    pub choices: Vec<Value>,
    pub allow_blank: bool,
}

impl ChoiceField {
    #[must_use]
    pub fn new(choices: Vec<Value>) -> Self {
        Self {
            config: FieldConfig::default(),
            choices,
            allow_blank: false,
        }
    }

    fn matches(a: &Value, b: &Value) -> bool {
        if a == b {
            return true;
        }
        // Cross-variant integer equality (e.g. Int(1) vs Uint(1)).
        matches!((a.as_int(), b.as_int()), (Some(x), Some(y)) if x == y)
    }
}

impl Field for ChoiceField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        if self.allow_blank && value.as_text() == Some("") {
            return Some(Value::Text(String::new()));
        }

        if let Some(choice) = self.choices.iter().find(|c| Self::matches(c, value)) {
            return Some(choice.clone());
        }

        report.issue(format!(
            "\"{}\" is not a valid choice",
            value_preview(value)
        ));
        None
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// ReadOnlyField
///
/// Output-only passthrough for computed properties and untyped read-only
/// attributes.
///

#[derive(Clone, Debug, Default)]
pub struct ReadOnlyField {
    pub config: FieldConfig,
}

impl ReadOnlyField {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FieldConfig {
                required: false,
                read_only: true,
                ..FieldConfig::default()
            },
        }
    }
}

impl Field for ReadOnlyField {
    field_common!();

    fn decode(&self, value: &Value, _report: &mut Report) -> Option<Value> {
        // Read-only fields are skipped during decode; a direct call is a
        // passthrough so the field stays total.
        Some(value.clone())
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn decode_ok(field: &dyn Field, value: Value) -> Value {
        let mut report = Report::new();
        let out = field.run_decode(&value, &mut report);
        assert!(report.is_empty(), "unexpected issues: {:?}", report.into_issues());
        out.expect("decode failed")
    }

    fn encode_ok(field: &dyn Field, value: &Value) -> Value {
        field.run_encode(value).expect("encode failed")
    }

    fn decode_err(field: &dyn Field, value: Value) -> Vec<String> {
        let mut report = Report::new();
        let out = field.run_decode(&value, &mut report);
        assert!(out.is_none());
        report
            .into_issues()
            .into_values()
            .next()
            .expect("expected issues")
    }

    #[test]
    fn int_field_accepts_both_integer_variants() {
        let field = IntField::new();
        assert_eq!(decode_ok(&field, Value::Int(-3)), Value::Int(-3));
        assert_eq!(decode_ok(&field, Value::Uint(7)), Value::Int(7));
        decode_err(&field, Value::Text("7".into()));
    }

    #[test]
    fn int_field_enforces_bounds() {
        let field = IntField {
            min_value: Some(0),
            max_value: Some(10),
            ..IntField::new()
        };
        decode_err(&field, Value::Int(-1));
        decode_err(&field, Value::Int(11));
        assert_eq!(decode_ok(&field, Value::Int(10)), Value::Int(10));
    }

    #[test]
    fn decimal_field_validates_places() {
        let field = DecimalField::new();
        let issues = decode_err(&field, Value::Text("1.234".into()));
        assert!(issues[0].contains("decimal places"));

        assert_eq!(
            decode_ok(&field, Value::Text("1.25".into())),
            Value::Decimal(Decimal::from_str("1.25").unwrap())
        );
    }

    #[test]
    fn decimal_field_renders_at_scale() {
        let field = DecimalField::new();
        let encoded = encode_ok(&field, &Value::Decimal(Decimal::from(3)));
        assert_eq!(encoded, Value::Text("3.00".into()));
    }

    #[test]
    fn date_field_round_trips_iso_text() {
        let field = DateField::new();
        let decoded = decode_ok(&field, Value::Text("2024-01-02".into()));
        assert_eq!(decoded, Value::Date(date!(2024 - 01 - 02)));

        let encoded = encode_ok(&field, &decoded);
        assert_eq!(encoded, Value::Text("2024-01-02".into()));
    }

    #[test]
    fn choice_field_rejects_unknown_values() {
        let field = ChoiceField::new(vec![Value::Text("red".into()), Value::Text("green".into())]);
        let issues = decode_err(&field, Value::Text("blue".into()));
        assert!(issues[0].contains("blue"));
    }

    #[test]
    fn null_is_gated_by_allow_null() {
        let mut field = TextField::new();
        let issues = decode_err(&field, Value::Null);
        assert_eq!(issues, vec!["this field may not be null".to_string()]);

        field.config.allow_null = true;
        assert_eq!(decode_ok(&field, Value::Null), Value::Null);
    }
}
