use crate::annotation::{LiteralValue, RelationDef, ScalarKind, SequenceKind, TypeAnnotation};
use crate::record::{Namespace, RecordType};

///
/// TypeKind
///
/// Closed tagged union the Field Builder dispatches over. `Unknown` carries
/// the declared annotation rendering for diagnostics.
///

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    List {
        item: Box<TypeDescription>,
        container: SequenceKind,
    },
    Literal(Vec<LiteralValue>),
    Map {
        value: Box<TypeDescription>,
    },
    Record(RecordType),
    Relation(&'static RelationDef),
    Scalar(ScalarKind),
    Union(Vec<TypeDescription>),
    Unknown(String),
}

///
/// TypeDescription
///
/// Normalized description of a declared attribute type. `nullable` is true
/// iff the annotation includes the null alternative at any unwrapping step;
/// `is_final` records a final qualifier without changing the kind.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDescription {
    pub kind: TypeKind,
    pub nullable: bool,
    pub is_final: bool,
}

impl TypeDescription {
    const fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
            is_final: false,
        }
    }

    fn unknown(display: impl Into<String>) -> Self {
        Self::new(TypeKind::Unknown(display.into()))
    }
}

/// Normalize a declared annotation into a `TypeDescription`.
///
/// Resolution is total: unrecognized or unresolvable shapes degrade to
/// `TypeKind::Unknown` and are left for the Field Builder's fallback path.
/// Forward references are looked up in `namespace` here, at resolution time.
#[must_use]
pub fn resolve(annotation: &TypeAnnotation, namespace: &Namespace) -> TypeDescription {
    let display = annotation.to_string();
    let mut nullable = false;
    let mut is_final = false;
    let mut current = annotation.clone();

    // Unwrap qualifier layers: final markers, optional wrappers, forward
    // references and type variables can stack in any order.
    loop {
        current = match current {
            TypeAnnotation::Final(inner) => {
                is_final = true;
                *inner
            }
            TypeAnnotation::Optional(inner) => {
                nullable = true;
                *inner
            }
            TypeAnnotation::Named(name) => match namespace.lookup(name) {
                Some(record) => TypeAnnotation::Record(record),
                None => {
                    let mut desc = TypeDescription::unknown(display);
                    desc.nullable = nullable;
                    desc.is_final = is_final;
                    return desc;
                }
            },
            TypeAnnotation::Var(var) => {
                if var.constraints.is_empty() {
                    match var.bound {
                        Some(bound) => *bound,
                        None => {
                            let mut desc = TypeDescription::unknown(display);
                            desc.nullable = nullable;
                            desc.is_final = is_final;
                            return desc;
                        }
                    }
                } else {
                    TypeAnnotation::Union(var.constraints)
                }
            }
            other => {
                let mut desc = resolve_base(&other, &display, namespace);
                desc.nullable |= nullable;
                desc.is_final |= is_final;
                return desc;
            }
        };
    }
}

fn resolve_base(
    annotation: &TypeAnnotation,
    display: &str,
    namespace: &Namespace,
) -> TypeDescription {
    match annotation {
        TypeAnnotation::Scalar(kind) => TypeDescription::new(TypeKind::Scalar(*kind)),
        TypeAnnotation::Record(record) => TypeDescription::new(TypeKind::Record(*record)),
        TypeAnnotation::Relation(def) => TypeDescription::new(TypeKind::Relation(def)),
        TypeAnnotation::List { item, container } => TypeDescription::new(TypeKind::List {
            item: Box::new(resolve(item, namespace)),
            container: *container,
        }),
        TypeAnnotation::Map { value } => TypeDescription::new(TypeKind::Map {
            value: Box::new(resolve(value, namespace)),
        }),
        TypeAnnotation::Literal(values) => resolve_literal(values),
        TypeAnnotation::Union(members) => resolve_union(members, display, namespace),
        TypeAnnotation::Any | TypeAnnotation::Null => TypeDescription::unknown(display),
        // Qualifier layers are unwrapped by the caller before dispatch.
        TypeAnnotation::Final(_)
        | TypeAnnotation::Optional(_)
        | TypeAnnotation::Named(_)
        | TypeAnnotation::Var(_) => TypeDescription::unknown(display),
    }
}

fn resolve_literal(values: &[LiteralValue]) -> TypeDescription {
    let nullable = values.iter().any(|v| *v == LiteralValue::Null);
    let choices: Vec<LiteralValue> = values
        .iter()
        .filter(|v| **v != LiteralValue::Null)
        .cloned()
        .collect();

    let mut desc = TypeDescription::new(TypeKind::Literal(choices));
    desc.nullable = nullable;
    desc
}

fn resolve_union(
    members: &[TypeAnnotation],
    display: &str,
    namespace: &Namespace,
) -> TypeDescription {
    let mut nullable = false;
    let mut resolved: Vec<TypeDescription> = Vec::new();

    for member in members {
        if *member == TypeAnnotation::Null {
            nullable = true;
            continue;
        }

        let desc = resolve(member, namespace);
        nullable |= desc.nullable;

        // Nested unions flatten into the parent member list.
        if let TypeKind::Union(inner) = desc.kind {
            resolved.extend(inner);
        } else {
            resolved.push(desc);
        }
    }

    let mut desc = match resolved.len() {
        0 => TypeDescription::unknown(display),
        // Degenerate union: exactly one non-null alternative collapses to
        // that alternative's kind.
        1 => resolved.remove(0),
        _ => TypeDescription::new(TypeKind::Union(resolved)),
    };
    desc.nullable |= nullable;
    desc
}
