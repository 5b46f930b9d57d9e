use crate::annotation::ScalarKind;
use crate::error::ConfigError;
use crate::fields::{Field, FieldConfig, field_common};
use crate::record::AttributeKind;
use crate::report::Report;
use crate::resolve::{TypeDescription, TypeKind};
use crate::value::Value;
use std::collections::BTreeMap;

pub const DEFAULT_DISCRIMINATOR_KEY: &str = "type";
pub const DEFAULT_VALUE_KEY: &str = "value";

///
/// UnionMember
///
/// One alternative of a discriminated union: its normalized description (for
/// runtime matching), its wire tag, and its fully-built field.
///

#[derive(Clone, Debug)]
pub struct UnionMember {
    pub tag: String,
    pub description: TypeDescription,
    pub field: Box<dyn Field>,
}

impl UnionMember {
    #[must_use]
    pub fn new(description: TypeDescription, field: Box<dyn Field>) -> Self {
        let tag = default_tag(&description);
        Self {
            tag,
            description,
            field,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Default discriminator tag: the member type's declared name.
fn default_tag(description: &TypeDescription) -> String {
    match &description.kind {
        TypeKind::Scalar(kind) => kind.key().to_string(),
        TypeKind::Record(record) => record.name.to_string(),
        TypeKind::Relation(def) => def.name.to_string(),
        TypeKind::List { .. } => "list".to_string(),
        TypeKind::Map { .. } => "map".to_string(),
        TypeKind::Literal(_) => "literal".to_string(),
        TypeKind::Union(_) => "union".to_string(),
        TypeKind::Unknown(_) => "unknown".to_string(),
    }
}

/// Structural match of a runtime value against a member description.
/// Declaration order decides ambiguous matches; callers take the first hit.
fn member_matches(description: &TypeDescription, value: &Value) -> bool {
    if value.is_null() {
        return description.nullable;
    }

    match &description.kind {
        TypeKind::Scalar(kind) => scalar_matches(*kind, value),
        // A record matches when every non-defaulted data attribute has a
        // key. Overlapping shapes still resolve to the first declared match.
        TypeKind::Record(record) => value.as_map().is_some_and(|map| {
            record
                .definition()
                .attributes
                .iter()
                .filter(|a| a.kind == AttributeKind::Data && !a.has_default())
                .all(|a| map.contains_key(a.name))
        }),
        TypeKind::Map { .. } => value.as_map().is_some(),
        TypeKind::Relation(def) => scalar_matches(def.key, value),
        TypeKind::List { .. } => value.as_list().is_some(),
        TypeKind::Literal(choices) => choices.iter().any(|c| c.to_value() == *value),
        TypeKind::Union(members) => members.iter().any(|m| member_matches(m, value)),
        TypeKind::Unknown(_) => false,
    }
}

fn scalar_matches(kind: ScalarKind, value: &Value) -> bool {
    match kind {
        ScalarKind::Bool => matches!(value, Value::Bool(_)),
        ScalarKind::Date => matches!(value, Value::Date(_)),
        ScalarKind::DateTime => matches!(value, Value::DateTime(_)),
        ScalarKind::Decimal => matches!(value, Value::Decimal(_)),
        ScalarKind::Duration => matches!(value, Value::Duration(_)),
        ScalarKind::Enum(def) => value
            .as_text()
            .is_some_and(|s| def.variants.contains(&s)),
        ScalarKind::Float => matches!(value, Value::Float(_)),
        ScalarKind::Int => value.as_int().is_some(),
        ScalarKind::Text => matches!(value, Value::Text(_)),
        ScalarKind::Uint => value.as_uint().is_some(),
        ScalarKind::Uuid => matches!(value, Value::Uuid(_)),
    }
}

///
/// UnionField
///
/// Discriminated encoding for union-typed attributes. Without nesting the
/// tag is merged into the member's mapping output under the discriminator
/// key; with nesting every member wraps as
/// `{discriminator_key: tag, value_key: payload}`.
///

#[derive(Clone, Debug)]
pub struct UnionField {
    pub config: FieldConfig,
    pub members: Vec<UnionMember>,
    pub nested: bool,
    pub discriminator_key: String,
    pub value_key: String,
}

impl UnionField {
    #[must_use]
    pub fn new(members: Vec<UnionMember>) -> Self {
        Self {
            config: FieldConfig::default(),
            members,
            nested: false,
            discriminator_key: DEFAULT_DISCRIMINATOR_KEY.to_string(),
            value_key: DEFAULT_VALUE_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    #[must_use]
    pub fn discriminator_key(mut self, key: impl Into<String>) -> Self {
        self.discriminator_key = key.into();
        self
    }

    #[must_use]
    pub fn value_key(mut self, key: impl Into<String>) -> Self {
        self.value_key = key.into();
        self
    }

    fn allowed_tags(&self) -> String {
        self.members
            .iter()
            .map(|m| m.tag.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Field for UnionField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(map) = value.as_map() else {
            report.issue(format!(
                "expected a mapping with a \"{}\" discriminator, got {}",
                self.discriminator_key,
                value.type_label()
            ));
            return None;
        };

        let Some(tag_value) = map.get(&self.discriminator_key) else {
            report.issue(format!(
                "missing discriminator key \"{}\"",
                self.discriminator_key
            ));
            return None;
        };
        let Some(tag) = tag_value.as_text() else {
            report.issue("the discriminator must be a string");
            return None;
        };

        let Some(member) = self.members.iter().find(|m| m.tag == tag) else {
            report.issue(format!(
                "\"{tag}\" is not a valid discriminator (expected one of: {})",
                self.allowed_tags()
            ));
            return None;
        };

        let payload = if self.nested {
            match map.get(&self.value_key) {
                Some(inner) => inner.clone(),
                None => {
                    report.issue(format!("missing value key \"{}\"", self.value_key));
                    return None;
                }
            }
        } else {
            let mut rest = map.clone();
            rest.remove(&self.discriminator_key);
            Value::Map(rest)
        };

        member.field.run_decode(&payload, report)
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        let member = self
            .members
            .iter()
            .find(|m| member_matches(&m.description, value))
            .ok_or_else(|| ConfigError::UnmatchedUnionValue {
                label: value.type_label().to_string(),
            })?;

        let rendered = member.field.run_encode(value)?;

        if self.nested {
            let mut map = BTreeMap::new();
            map.insert(
                self.discriminator_key.clone(),
                Value::Text(member.tag.clone()),
            );
            map.insert(self.value_key.clone(), rendered);
            return Ok(Value::Map(map));
        }

        match rendered {
            Value::Map(mut map) => {
                map.insert(
                    self.discriminator_key.clone(),
                    Value::Text(member.tag.clone()),
                );
                Ok(Value::Map(map))
            }
            _ => Err(ConfigError::NestingRequired {
                tag: member.tag.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IntField, TextField};

    fn scalar_desc(kind: ScalarKind) -> TypeDescription {
        TypeDescription {
            kind: TypeKind::Scalar(kind),
            nullable: false,
            is_final: false,
        }
    }

    fn int_or_str() -> UnionField {
        UnionField::new(vec![
            UnionMember::new(scalar_desc(ScalarKind::Int), Box::new(IntField::new())),
            UnionMember::new(scalar_desc(ScalarKind::Text), Box::new(TextField::new())),
        ])
        .nested(true)
    }

    #[test]
    fn encode_tags_by_first_declared_match() {
        let field = int_or_str();
        let out = (&field as &dyn Field).run_encode(&Value::Int(42)).unwrap();
        assert_eq!(
            out,
            Value::from_entries(vec![
                ("type", Value::Text("int".into())),
                ("value", Value::Int(42)),
            ])
        );
    }

    #[test]
    fn decode_selects_the_member_by_tag() {
        let field = int_or_str();
        let mut report = Report::new();
        let out = (&field as &dyn Field).run_decode(
            &Value::from_entries(vec![
                ("type", Value::Text("str".into())),
                ("value", Value::Text("x".into())),
            ]),
            &mut report,
        );
        assert_eq!(out, Some(Value::Text("x".into())));
        assert!(report.is_empty());
    }

    #[test]
    fn unknown_tags_name_the_allowed_set() {
        let field = int_or_str();
        let mut report = Report::new();
        let out = (&field as &dyn Field).run_decode(
            &Value::from_entries(vec![
                ("type", Value::Text("bogus".into())),
                ("value", Value::Int(1)),
            ]),
            &mut report,
        );
        assert!(out.is_none());

        let issues = report.into_issues();
        let messages = issues.into_values().next().unwrap();
        assert!(messages[0].contains("bogus"));
        assert!(messages[0].contains("int, str"));
    }

    #[test]
    fn scalar_members_require_nesting_to_encode() {
        let field = int_or_str().nested(false);
        let err = (&field as &dyn Field).run_encode(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, ConfigError::NestingRequired { .. }));
    }

    #[test]
    fn custom_keys_and_tags_are_honored() {
        let field = UnionField::new(vec![
            UnionMember::new(scalar_desc(ScalarKind::Int), Box::new(IntField::new()))
                .with_tag("integer"),
        ])
        .nested(true)
        .discriminator_key("kind")
        .value_key("payload");

        let out = (&field as &dyn Field).run_encode(&Value::Int(7)).unwrap();
        assert_eq!(
            out,
            Value::from_entries(vec![
                ("kind", Value::Text("integer".into())),
                ("payload", Value::Int(7)),
            ])
        );
    }
}
