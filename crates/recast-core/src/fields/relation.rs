use crate::annotation::{RelationDef, ScalarKind};
use crate::error::ConfigError;
use crate::fields::{Field, FieldConfig, field_common, value_preview};
use crate::report::Report;
use crate::value::Value;
use uuid::Uuid;

fn decode_key(kind: ScalarKind, value: &Value, report: &mut Report) -> Option<Value> {
    match kind {
        ScalarKind::Int => value.as_int().map(Value::Int),
        ScalarKind::Uint => value.as_uint().map(Value::Uint),
        ScalarKind::Uuid => match value {
            Value::Uuid(u) => Some(Value::Uuid(*u)),
            Value::Text(s) => Uuid::parse_str(s).ok().map(Value::Uuid),
            _ => None,
        },
        _ => value.as_text().map(|s| Value::Text(s.to_string())),
    }
    .or_else(|| {
        report.issue(format!(
            "\"{}\" is not a valid key",
            value_preview(value)
        ));
        None
    })
}

fn parse_key_segment(kind: ScalarKind, segment: &str) -> Option<Value> {
    match kind {
        ScalarKind::Int => segment.parse().ok().map(Value::Int),
        ScalarKind::Uint => segment.parse().ok().map(Value::Uint),
        ScalarKind::Uuid => Uuid::parse_str(segment).ok().map(Value::Uuid),
        _ => Some(Value::Text(segment.to_string())),
    }
}

///
/// PrimaryKeyField
///
/// References a related entity by its primary key; the attribute's runtime
/// value is the key itself.
///

#[derive(Clone, Debug)]
pub struct PrimaryKeyField {
    pub config: FieldConfig,
    pub relation: &'static RelationDef,
}

impl PrimaryKeyField {
    #[must_use]
    pub fn new(relation: &'static RelationDef) -> Self {
        Self {
            config: FieldConfig::default(),
            relation,
        }
    }
}

impl Field for PrimaryKeyField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        decode_key(self.relation.key, value, report)
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(value.clone())
    }
}

///
/// HyperlinkField
///
/// Renders the related entity as `/{entity}/{key}/` and decodes by parsing
/// the trailing key segment back through the relation's key kind.
///

#[derive(Clone, Debug)]
pub struct HyperlinkField {
    pub config: FieldConfig,
    pub relation: &'static RelationDef,
}

impl HyperlinkField {
    #[must_use]
    pub fn new(relation: &'static RelationDef) -> Self {
        Self {
            config: FieldConfig::default(),
            relation,
        }
    }

    fn key_from_href(&self, href: &str) -> Option<Value> {
        let prefix = format!("/{}/", self.relation.name);
        let segment = href.strip_prefix(prefix.as_str())?.strip_suffix('/')?;
        if segment.is_empty() || segment.contains('/') {
            return None;
        }
        parse_key_segment(self.relation.key, segment)
    }
}

impl Field for HyperlinkField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(href) = value.as_text() else {
            report.issue(format!(
                "expected a hyperlink string, got {}",
                value.type_label()
            ));
            return None;
        };

        match self.key_from_href(href) {
            Some(key) => Some(key),
            None => {
                report.issue(format!("invalid hyperlink: \"{href}\""));
                None
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        Ok(Value::Text(format!(
            "/{}/{}/",
            self.relation.name,
            value_preview(value)
        )))
    }
}
