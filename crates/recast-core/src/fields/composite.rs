use crate::annotation::SequenceKind;
use crate::error::ConfigError;
use crate::fields::{Field, FieldConfig, field_common};
use crate::report::Report;
use crate::value::Value;
use std::collections::BTreeMap;

///
/// ListField
///
/// Sequence container with a recursively-built child field. The declared
/// container kind is applied after per-item validation: sets keep the first
/// occurrence of each value, unique lists report duplicates.
///

#[derive(Clone, Debug)]
pub struct ListField {
    pub config: FieldConfig,
    pub child: Box<dyn Field>,
    pub container: SequenceKind,
    pub allow_empty: bool,
}

impl ListField {
    #[must_use]
    pub fn new(child: Box<dyn Field>) -> Self {
        Self {
            config: FieldConfig::default(),
            child,
            container: SequenceKind::List,
            allow_empty: true,
        }
    }

    #[must_use]
    pub fn with_container(mut self, container: SequenceKind) -> Self {
        self.container = container;
        self
    }

    fn apply_container(&self, items: Vec<Value>, report: &mut Report) -> Option<Vec<Value>> {
        match self.container {
            SequenceKind::List => Some(items),
            SequenceKind::Set => {
                let mut seen: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !seen.contains(&item) {
                        seen.push(item);
                    }
                }
                Some(seen)
            }
            SequenceKind::Unique => {
                let mut seen: Vec<Value> = Vec::with_capacity(items.len());
                let mut ok = true;
                for (i, item) in items.into_iter().enumerate() {
                    if seen.contains(&item) {
                        report.scoped(i, |r| r.issue("duplicate value"));
                        ok = false;
                    } else {
                        seen.push(item);
                    }
                }
                ok.then_some(seen)
            }
        }
    }
}

impl Field for ListField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(items) = value.as_list() else {
            report.issue(format!(
                "expected a list of items, got {}",
                value.type_label()
            ));
            return None;
        };

        if items.is_empty() && !self.allow_empty {
            report.issue("this list may not be empty");
            return None;
        }

        let mut decoded = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match report.scoped(i, |r| self.child.run_decode(item, r)) {
                Some(value) => decoded.push(value),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        self.apply_container(decoded, report).map(Value::List)
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        let Some(items) = value.as_list() else {
            return Ok(value.clone());
        };

        let mut encoded = Vec::with_capacity(items.len());
        for item in items {
            encoded.push(self.child.run_encode(item)?);
        }
        Ok(Value::List(encoded))
    }
}

///
/// MapField
///
/// String-keyed mapping container; values validate through the child field
/// under their key's path segment.
///

#[derive(Clone, Debug)]
pub struct MapField {
    pub config: FieldConfig,
    pub child: Box<dyn Field>,
}

impl MapField {
    #[must_use]
    pub fn new(child: Box<dyn Field>) -> Self {
        Self {
            config: FieldConfig::default(),
            child,
        }
    }
}

impl Field for MapField {
    field_common!();

    fn decode(&self, value: &Value, report: &mut Report) -> Option<Value> {
        let Some(entries) = value.as_map() else {
            report.issue(format!("expected a mapping, got {}", value.type_label()));
            return None;
        };

        let mut decoded = BTreeMap::new();
        let mut ok = true;
        for (key, entry) in entries {
            match report.scoped(key.as_str(), |r| self.child.run_decode(entry, r)) {
                Some(value) => {
                    decoded.insert(key.clone(), value);
                }
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        Some(Value::Map(decoded))
    }

    fn encode(&self, value: &Value) -> Result<Value, ConfigError> {
        let Some(entries) = value.as_map() else {
            return Ok(value.clone());
        };

        let mut encoded = BTreeMap::new();
        for (key, entry) in entries {
            encoded.insert(key.clone(), self.child.run_encode(entry)?);
        }
        Ok(Value::Map(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::IntField;

    fn int_list(container: SequenceKind) -> ListField {
        ListField::new(Box::new(IntField::new())).with_container(container)
    }

    fn decode(field: &dyn Field, value: &Value) -> (Option<Value>, BTreeMap<String, Vec<String>>) {
        let mut report = Report::new();
        let out = field.run_decode(value, &mut report);
        (out, report.into_issues())
    }

    #[test]
    fn items_validate_under_index_paths() {
        let field = int_list(SequenceKind::List);
        let (out, issues) = decode(
            &field,
            &Value::from_list(vec![Value::Int(1), Value::Text("x".into()), Value::Int(3)]),
        );
        assert!(out.is_none());
        assert_eq!(issues["[1]"], vec!["a valid integer is required".to_string()]);
    }

    #[test]
    fn set_container_deduplicates_first_seen() {
        let field = int_list(SequenceKind::Set);
        let (out, issues) = decode(
            &field,
            &Value::from_list(vec![Value::Int(2), Value::Int(1), Value::Int(2)]),
        );
        assert!(issues.is_empty());
        assert_eq!(
            out,
            Some(Value::from_list(vec![Value::Int(2), Value::Int(1)]))
        );
    }

    #[test]
    fn unique_container_reports_duplicates() {
        let field = int_list(SequenceKind::Unique);
        let (_, issues) = decode(
            &field,
            &Value::from_list(vec![Value::Int(1), Value::Int(1)]),
        );
        assert_eq!(issues["[1]"], vec!["duplicate value".to_string()]);
    }

    #[test]
    fn map_values_validate_under_key_paths() {
        let field = MapField::new(Box::new(IntField::new()));
        let (out, issues) = decode(
            &field,
            &Value::from_entries(vec![("a", Value::Int(1)), ("b", Value::Bool(true))]),
        );
        assert!(out.is_none());
        assert_eq!(issues["b"], vec!["a valid integer is required".to_string()]);
    }
}
