use crate::annotation::{LiteralValue, ScalarKind};
use crate::error::ConfigError;
use crate::fields::{
    ChoiceField, Field, FieldOptions, HyperlinkField, ListField, MapField, NestedField,
    PrimaryKeyField, ReadOnlyField, UnionField, UnionMember,
};
use crate::record::{AttributeDef, AttributeKind};
use crate::resolve::{TypeDescription, TypeKind, resolve};
use crate::serializer::{RelationStyle, Serializer, SerializerConfig};
use crate::value::Value;

/// Per-kind build override: return a field to replace the default strategy
/// for this attribute, or `None` to fall through.
pub type BuildHook = fn(&str, &TypeDescription) -> Option<Box<dyn Field>>;

///
/// BuildHooks
///
/// Extension points over the builder's dispatch. The `unknown` hook is the
/// only escape hatch for un-inferable types; without it they are
/// configuration errors.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildHooks {
    pub scalar: Option<BuildHook>,
    pub relation: Option<BuildHook>,
    pub record: Option<BuildHook>,
    pub union: Option<BuildHook>,
    pub literal: Option<BuildHook>,
    pub composite: Option<BuildHook>,
    pub unknown: Option<BuildHook>,
}

impl BuildHooks {
    const fn for_kind(&self, kind: &TypeKind) -> Option<BuildHook> {
        match kind {
            TypeKind::Scalar(_) => self.scalar,
            TypeKind::Relation(_) => self.relation,
            TypeKind::Record(_) => self.record,
            TypeKind::Union(_) => self.union,
            TypeKind::Literal(_) => self.literal,
            TypeKind::List { .. } | TypeKind::Map { .. } => self.composite,
            TypeKind::Unknown(_) => self.unknown,
        }
    }
}

///
/// FieldBuilder
///
/// Turns one attribute declaration plus its resolved description and options
/// into a configured field. Dispatch is an exhaustive match over the
/// description kind; qualifiers apply after dispatch, explicit options win.
///

pub struct FieldBuilder<'a> {
    pub config: &'a SerializerConfig,
}

impl FieldBuilder<'_> {
    /// Build the field for a record attribute.
    pub fn build(
        &self,
        attr: &AttributeDef,
        options: &FieldOptions,
    ) -> Result<Box<dyn Field>, ConfigError> {
        // An explicit field instance on the declaration bypasses inference.
        if let Some(field) = &attr.metadata.field {
            return Ok(field.clone());
        }

        let description = resolve(&attr.annotation, &self.config.namespace);

        // A computed property with no inferable type still encodes; it gets
        // an untyped read-only passthrough instead of a build error.
        if attr.kind == AttributeKind::Property
            && matches!(description.kind, TypeKind::Unknown(_))
        {
            return Ok(Box::new(ReadOnlyField::new()));
        }

        let mut field = self.build_described(attr.name, &description, options)?;
        Self::apply_qualifiers(field.as_mut(), attr, &description, options);
        Ok(field)
    }

    /// Dispatch on the description kind. Shared by attribute builds,
    /// composite children and union members.
    pub fn build_described(
        &self,
        attribute: &str,
        description: &TypeDescription,
        options: &FieldOptions,
    ) -> Result<Box<dyn Field>, ConfigError> {
        if let Some(hook) = self.config.hooks.for_kind(&description.kind)
            && let Some(field) = hook(attribute, description)
        {
            return Ok(field);
        }

        match &description.kind {
            TypeKind::Scalar(kind) => self.build_scalar(attribute, *kind, options),
            TypeKind::Record(record) => {
                if let Some(factory) = self.config.registry.record(record.name) {
                    return Ok(factory(*record, options));
                }
                // A record already on the build stack would recurse forever;
                // defer that build to first use.
                if Serializer::is_building(record.name) {
                    return Ok(Box::new(NestedField::deferred(
                        *record,
                        self.config.clone(),
                    )));
                }
                let serializer = (self.config.nested_factory)(*record, self.config)?;
                Ok(Box::new(NestedField::new(serializer)))
            }
            TypeKind::Relation(def) => Ok(match self.config.relation_style {
                RelationStyle::PrimaryKey => Box::new(PrimaryKeyField::new(def)),
                RelationStyle::Hyperlinked => Box::new(HyperlinkField::new(def)),
            }),
            TypeKind::Union(members) => {
                self.build_union(attribute, members, options)
            }
            TypeKind::Literal(choices) => Ok(Self::build_literal(choices)),
            TypeKind::List { item, container } => {
                let child = self.build_child(attribute, item, options)?;
                Ok(Box::new(
                    ListField::new(child).with_container(*container),
                ))
            }
            TypeKind::Map { value } => {
                let child = self.build_child(attribute, value, options)?;
                Ok(Box::new(MapField::new(child)))
            }
            TypeKind::Unknown(annotation) => Err(ConfigError::UnsupportedType {
                attribute: attribute.to_string(),
                annotation: annotation.clone(),
            }),
        }
    }

    fn build_scalar(
        &self,
        attribute: &str,
        kind: ScalarKind,
        options: &FieldOptions,
    ) -> Result<Box<dyn Field>, ConfigError> {
        if let Some(factory) = self.config.registry.scalar(kind.key()) {
            return Ok(factory(kind, options));
        }

        // Enumerations fall back to a choice field over the variant names
        // unless the registry carries a per-enum override.
        if let ScalarKind::Enum(def) = kind {
            let choices = def
                .variants
                .iter()
                .map(|v| Value::Text((*v).to_string()))
                .collect();
            return Ok(Box::new(ChoiceField::new(choices)));
        }

        Err(ConfigError::UnsupportedType {
            attribute: attribute.to_string(),
            annotation: kind.to_string(),
        })
    }

    fn build_union(
        &self,
        attribute: &str,
        members: &[TypeDescription],
        options: &FieldOptions,
    ) -> Result<Box<dyn Field>, ConfigError> {
        if members.is_empty() {
            return Err(ConfigError::EmptyUnion);
        }

        // The reserved child-options key routes to every member.
        let child_options = options.child.as_deref().cloned().unwrap_or_default();

        let mut built = Vec::with_capacity(members.len());
        for member in members {
            let mut field = self.build_described(attribute, member, &child_options)?;
            Self::apply_described_qualifiers(field.as_mut(), member, &child_options);
            built.push(UnionMember::new(member.clone(), field));
        }

        Ok(Box::new(UnionField::new(built)))
    }

    fn build_literal(choices: &[LiteralValue]) -> Box<dyn Field> {
        let allow_blank = choices.iter().any(|c| *c == LiteralValue::Text(""));
        let values = choices
            .iter()
            .filter(|c| **c != LiteralValue::Text(""))
            .map(LiteralValue::to_value)
            .collect();

        let mut field = ChoiceField::new(values);
        field.allow_blank = allow_blank;
        Box::new(field)
    }

    fn build_child(
        &self,
        attribute: &str,
        description: &TypeDescription,
        options: &FieldOptions,
    ) -> Result<Box<dyn Field>, ConfigError> {
        let child_options = options.child.as_deref().cloned().unwrap_or_default();
        let mut child = self.build_described(attribute, description, &child_options)?;
        Self::apply_described_qualifiers(child.as_mut(), description, &child_options);
        Ok(child)
    }

    /// Reduced qualifier pass for children and union members: they have no
    /// attribute of their own, so only the description and explicit options
    /// participate.
    fn apply_described_qualifiers(
        field: &mut dyn Field,
        description: &TypeDescription,
        options: &FieldOptions,
    ) {
        let config = field.config_mut();
        config.allow_null = options.allow_null.unwrap_or(description.nullable);
        if let Some(required) = options.required {
            config.required = required;
        }
        if let Some(read_only) = options.read_only {
            config.read_only = read_only;
        }
    }

    /// Cross-cutting qualifier application, after dispatch: required-ness
    /// from default presence, nullability from the description, read-only
    /// from finality (and computed properties). Explicit options always win;
    /// read-only scrubs the write-oriented ones.
    fn apply_qualifiers(
        field: &mut dyn Field,
        attr: &AttributeDef,
        description: &TypeDescription,
        options: &FieldOptions,
    ) {
        let inferred_read_only =
            attr.is_final || description.is_final || attr.kind == AttributeKind::Property;

        let config = field.config_mut();
        config.required = options.required.unwrap_or(!attr.has_default());
        config.allow_null = options.allow_null.unwrap_or(description.nullable);
        config.read_only = options.read_only.unwrap_or(inferred_read_only);
        config.source = options.source.clone();
        config.default = options.default.clone();

        if config.read_only {
            // Write-oriented configuration is meaningless on a read-only
            // field; drop it rather than erroring.
            config.required = false;
            config.allow_null = false;
            config.default = None;
        } else if config.default.is_some() {
            // An explicit default implies the field may be omitted.
            config.required = false;
        }
    }
}
