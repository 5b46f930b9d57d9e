use crate::record::RecordType;
use crate::value::Value;
use std::fmt;

///
/// ScalarKind
///
/// Concrete scalar classes an attribute annotation can name. Enumerations
/// carry their declaration so choice inference can see the variant set.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarKind {
    Bool,
    Date,
    DateTime,
    Decimal,
    Duration,
    Enum(&'static EnumDef),
    Float,
    Int,
    Text,
    Uint,
    Uuid,
}

impl ScalarKind {
    /// Stable lowercase name; doubles as the default union discriminator tag
    /// and as the field-registry lookup key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Decimal => "decimal",
            Self::Duration => "duration",
            Self::Enum(def) => def.name,
            Self::Float => "float",
            Self::Int => "int",
            Self::Text => "str",
            Self::Uint => "uint",
            Self::Uuid => "uuid",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

///
/// EnumDef
///
/// Static declaration of an enumeration scalar: a name and its closed
/// variant set. Variant names are the wire representation.
///

#[derive(Debug, Eq, PartialEq)]
pub struct EnumDef {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

///
/// RelationDef
///
/// Static declaration of a host-framework entity reachable by reference.
/// The related attribute's runtime value is the entity's primary key.
///

#[derive(Debug, Eq, PartialEq)]
pub struct RelationDef {
    pub name: &'static str,
    pub key: ScalarKind,
}

///
/// LiteralValue
///
/// One member of a literal-choice pseudo-type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Null,
    Text(&'static str),
}

impl LiteralValue {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Null => Value::Null,
            Self::Text(s) => Value::Text((*s).to_string()),
        }
    }
}

///
/// SequenceKind
///
/// Concrete in-memory container a sequence annotation declares.
///
/// - `List` preserves input order and duplicates.
/// - `Set` keeps the first occurrence of each value, discarding later
///   duplicates on decode.
/// - `Unique` preserves order but treats a duplicate as a validation issue.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SequenceKind {
    #[default]
    List,
    Set,
    Unique,
}

///
/// TypeVarDef
///
/// A generic type parameter: either bounded (single upper bound), constrained
/// (finite alternative set), or fully open.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TypeVarDef {
    pub name: &'static str,
    pub bound: Option<Box<TypeAnnotation>>,
    pub constraints: Vec<TypeAnnotation>,
}

///
/// TypeAnnotation
///
/// The declared type of a record attribute, as written at the declaration
/// site. `Named` is a forward reference resolved against a namespace when
/// resolution is requested, not when the annotation is built.
///

#[derive(Clone, Debug, PartialEq)]
pub enum TypeAnnotation {
    Any,
    Final(Box<Self>),
    List {
        item: Box<Self>,
        container: SequenceKind,
    },
    Literal(Vec<LiteralValue>),
    Map {
        value: Box<Self>,
    },
    Named(&'static str),
    Null,
    Optional(Box<Self>),
    Record(RecordType),
    Relation(&'static RelationDef),
    Scalar(ScalarKind),
    Union(Vec<Self>),
    Var(TypeVarDef),
}

impl TypeAnnotation {
    ///
    /// CONSTRUCTION
    ///

    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn final_(inner: Self) -> Self {
        Self::Final(Box::new(inner))
    }

    #[must_use]
    pub fn list(item: Self) -> Self {
        Self::List {
            item: Box::new(item),
            container: SequenceKind::List,
        }
    }

    #[must_use]
    pub fn list_of(item: Self, container: SequenceKind) -> Self {
        Self::List {
            item: Box::new(item),
            container,
        }
    }

    #[must_use]
    pub fn map(value: Self) -> Self {
        Self::Map {
            value: Box::new(value),
        }
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Final(inner) => write!(f, "final[{inner}]"),
            Self::List { item, .. } => write!(f, "list[{item}]"),
            Self::Literal(values) => {
                f.write_str("literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match value {
                        LiteralValue::Bool(b) => write!(f, "{b}")?,
                        LiteralValue::Int(i) => write!(f, "{i}")?,
                        LiteralValue::Null => f.write_str("null")?,
                        LiteralValue::Text(s) => write!(f, "{s:?}")?,
                    }
                }
                f.write_str("]")
            }
            Self::Map { value } => write!(f, "map[str, {value}]"),
            Self::Named(name) => write!(f, "'{name}'"),
            Self::Null => f.write_str("null"),
            Self::Optional(inner) => write!(f, "option[{inner}]"),
            Self::Record(record) => f.write_str(record.name),
            Self::Relation(def) => write!(f, "relation[{}]", def.name),
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Self::Var(var) => write!(f, "{}", var.name),
        }
    }
}
