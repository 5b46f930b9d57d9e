mod typed;

pub use typed::{ManySerializer, RecordSerializer};

use crate::builder::{BuildHooks, FieldBuilder};
use crate::error::{ConfigError, UsageError, ValidateError};
use crate::fields::{Field, FieldOptions};
use crate::record::{AttributeKind, Namespace, RecordDef, RecordType};
use crate::registry::FieldRegistry;
use crate::report::Report;
use crate::value::Value;
use std::collections::BTreeMap;

///
/// FieldSelection
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldSelection {
    /// The all-fields sentinel: every declared field plus every record
    /// attribute.
    #[default]
    All,
    /// An explicit include list.
    Names(Vec<String>),
}

impl FieldSelection {
    #[must_use]
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }
}

///
/// RelationStyle
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RelationStyle {
    #[default]
    PrimaryKey,
    Hyperlinked,
}

/// Builds the serializer for a nested record attribute. Injected so that
/// serializer specialization is factory substitution rather than
/// inheritance.
pub type NestedFactory = fn(RecordType, &SerializerConfig) -> Result<Serializer, ConfigError>;

fn default_nested_factory(
    record: RecordType,
    parent: &SerializerConfig,
) -> Result<Serializer, ConfigError> {
    let config = SerializerConfig {
        fields: FieldSelection::All,
        exclude: Vec::new(),
        read_only_fields: Vec::new(),
        extra: BTreeMap::new(),
        declared: Vec::new(),
        ..parent.clone()
    };
    Serializer::build(record, &config)
}

///
/// SerializerConfig
///
/// Everything the build phase consumes. Selection options apply to the
/// record being built; ambient options (registry, namespace, hooks, relation
/// style, partial mode) are inherited by nested builds through the factory.
///

#[derive(Clone, Debug)]
pub struct SerializerConfig {
    pub fields: FieldSelection,
    pub exclude: Vec<String>,
    pub read_only_fields: Vec<String>,
    pub extra: BTreeMap<String, FieldOptions>,
    pub declared: Vec<(String, Box<dyn Field>)>,
    pub registry: FieldRegistry,
    pub relation_style: RelationStyle,
    pub namespace: Namespace,
    pub hooks: BuildHooks,
    pub nested_factory: NestedFactory,
    pub partial: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            fields: FieldSelection::All,
            exclude: Vec::new(),
            read_only_fields: Vec::new(),
            extra: BTreeMap::new(),
            declared: Vec::new(),
            registry: FieldRegistry::default(),
            relation_style: RelationStyle::default(),
            namespace: Namespace::default(),
            hooks: BuildHooks::default(),
            nested_factory: default_nested_factory,
            partial: false,
        }
    }
}

impl SerializerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_read_only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, options: FieldOptions) -> Self {
        self.extra.insert(name.into(), options);
        self
    }

    #[must_use]
    pub fn with_declared(mut self, name: impl Into<String>, field: Box<dyn Field>) -> Self {
        self.declared.push((name.into(), field));
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_relation_style(mut self, style: RelationStyle) -> Self {
        self.relation_style = style;
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: BuildHooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_nested_factory(mut self, factory: NestedFactory) -> Self {
        self.nested_factory = factory;
        self
    }

    #[must_use]
    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }
}

///
/// Validated
///
/// The validated value container. An attribute that received no input is
/// simply absent; the partial flag records which materialization contract
/// applies. A finished record can never hold "absent", so the marker cannot
/// leak past `create`/`update`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Validated {
    pub values: BTreeMap<String, Value>,
    pub partial: bool,
}

impl Validated {
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    #[must_use]
    pub fn is_supplied(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }
}

///
/// FieldSpec
///
/// One built field bound to its wire name and record attribute source.
///

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub source: String,
    pub field: Box<dyn Field>,
}

///
/// Serializer
///
/// The untyped orchestration core: a field set built once per record type
/// and configuration, then reused as immutable state across encode/decode
/// passes. The typed wrappers in `typed` bind it to a concrete `Record`.
///

#[derive(Clone, Debug)]
pub struct Serializer {
    record: RecordType,
    def: RecordDef,
    specs: Vec<FieldSpec>,
    partial: bool,
}

// Record names currently being built on this thread. Nested builds consult
// this to defer self-referential constructions instead of recursing forever.
thread_local! {
    static BUILD_STACK: std::cell::RefCell<Vec<&'static str>> =
        const { std::cell::RefCell::new(Vec::new()) };
}

struct BuildGuard;

impl BuildGuard {
    fn enter(name: &'static str) -> Self {
        BUILD_STACK.with_borrow_mut(|stack| stack.push(name));
        Self
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILD_STACK.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

impl Serializer {
    ///
    /// BUILD PHASE
    ///

    /// True while a serializer for `name` is being built on this thread.
    #[must_use]
    pub fn is_building(name: &str) -> bool {
        BUILD_STACK.with_borrow(|stack| stack.iter().any(|n| *n == name))
    }

    pub fn build(record: RecordType, config: &SerializerConfig) -> Result<Self, ConfigError> {
        let _guard = BuildGuard::enter(record.name);
        let def = record.definition();
        let names = Self::field_names(&def, config)?;
        Self::check_extra_targets(&def, config)?;

        let mut extra = config.extra.clone();
        for name in &config.read_only_fields {
            let entry = extra.entry(name.clone()).or_default();
            entry.read_only = Some(true);
        }

        let declared: BTreeMap<&str, &Box<dyn Field>> = config
            .declared
            .iter()
            .map(|(name, field)| (name.as_str(), field))
            .collect();

        let builder = FieldBuilder { config };
        let mut specs = Vec::with_capacity(names.len());

        for name in &names {
            // Explicit declarations win outright, and clash with extra
            // options.
            let declaration = declared
                .get(name.as_str())
                .map(|field| (*field).clone())
                .or_else(|| {
                    def.attribute(name)
                        .and_then(|attr| attr.metadata.field.clone())
                });
            if let Some(field) = declaration {
                if extra.contains_key(name) {
                    return Err(ConfigError::DuplicateFieldConfig {
                        record: def.name.to_string(),
                        field: name.clone(),
                    });
                }
                let source = field
                    .config()
                    .source
                    .clone()
                    .unwrap_or_else(|| name.clone());
                specs.push(FieldSpec {
                    name: name.clone(),
                    source,
                    field,
                });
                continue;
            }

            // Metadata options layer beneath serializer-level extras.
            let serializer_options = extra.get(name).cloned().unwrap_or_default();
            let source = serializer_options
                .source
                .clone()
                .unwrap_or_else(|| name.clone());

            let Some(attr) = def.attribute(&source) else {
                return Err(ConfigError::UnknownAttribute {
                    record: def.name.to_string(),
                    field: source,
                });
            };
            let options = attr.metadata.options.as_ref().map_or_else(
                || serializer_options.clone(),
                |meta| FieldOptions::layered(meta, &serializer_options),
            );

            let field = builder.build(attr, &options)?;
            specs.push(FieldSpec {
                name: name.clone(),
                source,
                field,
            });
        }

        Ok(Self {
            record,
            def,
            specs,
            partial: config.partial,
        })
    }

    fn field_names(def: &RecordDef, config: &SerializerConfig) -> Result<Vec<String>, ConfigError> {
        let declared_names: Vec<&str> = config
            .declared
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();

        let include = match &config.fields {
            FieldSelection::All => None,
            FieldSelection::Names(names) => Some(names),
        };

        if include.is_some() && !config.exclude.is_empty() {
            return Err(ConfigError::ConflictingSelection {
                record: def.name.to_string(),
            });
        }

        if let Some(names) = include {
            for name in names {
                if !def.has_attribute(name) && !declared_names.contains(&name.as_str()) {
                    return Err(ConfigError::UnknownAttribute {
                        record: def.name.to_string(),
                        field: name.clone(),
                    });
                }
            }
            for declared in &declared_names {
                if !names.iter().any(|n| n == declared) {
                    return Err(ConfigError::DeclaredFieldNotIncluded {
                        record: def.name.to_string(),
                        field: (*declared).to_string(),
                    });
                }
            }
            return Ok(names.clone());
        }

        let mut names: Vec<String> = declared_names.iter().map(|s| (*s).to_string()).collect();
        for attr in &def.attributes {
            if !names.iter().any(|n| n == attr.name) {
                names.push(attr.name.to_string());
            }
        }

        for excluded in &config.exclude {
            if declared_names.contains(&excluded.as_str()) {
                return Err(ConfigError::ExcludedDeclaredField {
                    record: def.name.to_string(),
                    field: excluded.clone(),
                });
            }
            let before = names.len();
            names.retain(|n| n != excluded);
            if names.len() == before {
                return Err(ConfigError::UnknownAttribute {
                    record: def.name.to_string(),
                    field: excluded.clone(),
                });
            }
        }

        Ok(names)
    }

    fn check_extra_targets(def: &RecordDef, config: &SerializerConfig) -> Result<(), ConfigError> {
        for name in config.extra.keys().chain(config.read_only_fields.iter()) {
            if !def.has_attribute(name) {
                return Err(ConfigError::UnknownAttribute {
                    record: def.name.to_string(),
                    field: name.clone(),
                });
            }
        }
        Ok(())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn record(&self) -> RecordType {
        self.record
    }

    #[must_use]
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    ///
    /// DECODE
    ///

    /// Run field-level validation over a wire mapping, reporting issues at
    /// the current report path. Returns the validated attribute map; absent
    /// attributes stay absent (partial mode) or fall to explicit wire
    /// defaults (full mode).
    pub(crate) fn decode_value(&self, data: &Value, report: &mut Report) -> Option<Value> {
        let Some(map) = data.as_map() else {
            report.issue(format!(
                "expected a mapping, got {}",
                data.type_label()
            ));
            return None;
        };

        let mut out = BTreeMap::new();
        let mut ok = true;

        for spec in &self.specs {
            if spec.field.config().read_only {
                continue;
            }

            match map.get(&spec.name) {
                Some(value) => {
                    match report.scoped(spec.name.as_str(), |r| spec.field.run_decode(value, r)) {
                        Some(decoded) => {
                            out.insert(spec.source.clone(), decoded);
                        }
                        None => ok = false,
                    }
                }
                None if self.partial => {}
                None => {
                    if let Some(default) = &spec.field.config().default {
                        out.insert(spec.source.clone(), default.clone());
                    } else if spec.field.config().required {
                        report.scoped(spec.name.as_str(), |r| r.issue("this field is required"));
                        ok = false;
                    }
                }
            }
        }

        ok.then_some(Value::Map(out))
    }

    /// Full decode pass: validation issues become a structured error.
    pub fn decode(&self, data: &Value) -> Result<Validated, ValidateError> {
        let mut report = Report::new();
        match self.decode_value(data, &mut report) {
            Some(Value::Map(values)) if report.is_empty() => Ok(Validated {
                values,
                partial: self.partial,
            }),
            _ => Err(ValidateError::ValidationFailed(report.into_issues())),
        }
    }

    ///
    /// ENCODE
    ///

    /// Render an attribute-value mapping through the field set.
    pub fn encode_values(
        &self,
        values: &BTreeMap<String, Value>,
    ) -> Result<Value, ConfigError> {
        let mut out = BTreeMap::new();
        for spec in &self.specs {
            let value = values.get(&spec.source).cloned().unwrap_or(Value::Null);
            out.insert(spec.name.clone(), spec.field.run_encode(&value)?);
        }
        Ok(Value::Map(out))
    }

    ///
    /// RECONSTRUCTION
    ///

    /// Total full-mode materialization: validated values where present,
    /// declared defaults otherwise. The absence marker cannot survive this
    /// transform.
    pub fn materialize(&self, validated: &Validated) -> Result<BTreeMap<String, Value>, UsageError> {
        let mut out = BTreeMap::new();
        for attr in &self.def.attributes {
            if attr.kind != AttributeKind::Data {
                continue;
            }

            if let Some(value) = validated.values.get(attr.name) {
                out.insert(attr.name.to_string(), value.clone());
            } else if let Some(default) = &attr.default {
                out.insert(attr.name.to_string(), default.materialize());
            } else {
                return Err(UsageError::MissingAttribute {
                    record: self.def.name.to_string(),
                    attribute: attr.name.to_string(),
                });
            }
        }
        Ok(out)
    }

    /// Partial-mode merge: overlay supplied attributes onto current values,
    /// recursing into nested records but replacing composite and scalar
    /// values wholesale.
    pub fn merge_values(
        &self,
        current: &mut BTreeMap<String, Value>,
        incoming: &BTreeMap<String, Value>,
    ) {
        for spec in &self.specs {
            let Some(new_value) = incoming.get(&spec.source) else {
                continue;
            };

            if let Some(nested) = spec.field.as_nested()
                && let Ok(serializer) = nested.serializer()
                && let Value::Map(new_map) = new_value
                && let Some(Value::Map(current_map)) = current.get_mut(&spec.source)
            {
                serializer.merge_values(current_map, new_map);
                continue;
            }

            current.insert(spec.source.clone(), new_value.clone());
        }
    }
}
