//! End-to-end serializer behavior: round-trips, defaults, partial updates,
//! discriminated unions and the save contract.

use recast_core::annotation::{RelationDef, ScalarKind, TypeAnnotation};
use recast_core::error::UsageError;
use recast_core::fields::{TextField, UnionField, UnionMember};
use recast_core::record::{
    AttributeDef, Namespace, Record, RecordDef, RecordType,
};
use recast_core::resolve::resolve;
use recast_core::serializer::{
    ManySerializer, RecordSerializer, RelationStyle, Serializer, SerializerConfig,
};
use recast_core::value::Value;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

///
/// Fixtures
///

fn take(
    values: &BTreeMap<String, Value>,
    record: &'static str,
    attr: &'static str,
) -> Result<Value, UsageError> {
    values
        .get(attr)
        .cloned()
        .ok_or_else(|| UsageError::Reconstruction {
            record: record.to_string(),
            message: format!("missing attribute '{attr}'"),
        })
}

fn bad(record: &'static str, attr: &'static str, value: &Value) -> UsageError {
    UsageError::Reconstruction {
        record: record.to_string(),
        message: format!("unexpected value for '{attr}': {value:?}"),
    }
}

fn take_text(
    values: &BTreeMap<String, Value>,
    record: &'static str,
    attr: &'static str,
) -> Result<String, UsageError> {
    match take(values, record, attr)? {
        Value::Text(s) => Ok(s),
        other => Err(bad(record, attr, &other)),
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Pet {
    animal: String,
    name: String,
}

fn pet_def() -> RecordDef {
    RecordDef {
        name: "pet",
        attributes: vec![
            AttributeDef::new("animal", TypeAnnotation::Scalar(ScalarKind::Text)),
            AttributeDef::new("name", TypeAnnotation::Scalar(ScalarKind::Text)),
        ],
    }
}

impl Record for Pet {
    fn record_type() -> RecordType {
        RecordType {
            name: "pet",
            def: pet_def,
        }
    }

    fn to_values(&self) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        values.insert("animal".to_string(), Value::Text(self.animal.clone()));
        values.insert("name".to_string(), Value::Text(self.name.clone()));
        values
    }

    fn from_values(values: &BTreeMap<String, Value>) -> Result<Self, UsageError> {
        Ok(Self {
            animal: take_text(values, "pet", "animal")?,
            name: take_text(values, "pet", "name")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Person {
    id: u64,
    name: String,
    email: String,
    age: i64,
    nickname: Option<String>,
    weight: Option<Decimal>,
    pet: Option<Pet>,
    tags: Vec<String>,
}

impl Person {
    fn email_domain(&self) -> String {
        self.email
            .split_once('@')
            .map_or_else(String::new, |(_, domain)| domain.to_string())
    }
}

fn empty_tags() -> Value {
    Value::List(Vec::new())
}

fn person_def() -> RecordDef {
    RecordDef {
        name: "person",
        attributes: vec![
            AttributeDef::new("id", TypeAnnotation::Scalar(ScalarKind::Uint))
                .final_()
                .with_default(0u64),
            AttributeDef::new("name", TypeAnnotation::Scalar(ScalarKind::Text)),
            AttributeDef::new("email", TypeAnnotation::Scalar(ScalarKind::Text)),
            AttributeDef::new("age", TypeAnnotation::Scalar(ScalarKind::Int)).with_default(0i64),
            AttributeDef::new(
                "nickname",
                TypeAnnotation::optional(TypeAnnotation::Scalar(ScalarKind::Text)),
            )
            .with_default(Value::Null),
            AttributeDef::new(
                "weight",
                TypeAnnotation::optional(TypeAnnotation::Scalar(ScalarKind::Decimal)),
            )
            .with_default(Value::Null),
            AttributeDef::new(
                "pet",
                TypeAnnotation::optional(TypeAnnotation::Record(Pet::record_type())),
            )
            .with_default(Value::Null),
            AttributeDef::new(
                "tags",
                TypeAnnotation::list(TypeAnnotation::Scalar(ScalarKind::Text)),
            )
            .with_default_factory(empty_tags),
            AttributeDef::property("email_domain", TypeAnnotation::Scalar(ScalarKind::Text)),
        ],
    }
}

impl Record for Person {
    fn record_type() -> RecordType {
        RecordType {
            name: "person",
            def: person_def,
        }
    }

    fn to_values(&self) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        values.insert("id".to_string(), Value::Uint(self.id));
        values.insert("name".to_string(), Value::Text(self.name.clone()));
        values.insert("email".to_string(), Value::Text(self.email.clone()));
        values.insert("age".to_string(), Value::Int(self.age));
        values.insert("nickname".to_string(), self.nickname.clone().into());
        values.insert("weight".to_string(), self.weight.into());
        values.insert(
            "pet".to_string(),
            self.pet
                .as_ref()
                .map_or(Value::Null, |p| Value::Map(p.to_values())),
        );
        values.insert(
            "tags".to_string(),
            Value::List(self.tags.iter().cloned().map(Value::Text).collect()),
        );
        values.insert("email_domain".to_string(), Value::Text(self.email_domain()));
        values
    }

    fn from_values(values: &BTreeMap<String, Value>) -> Result<Self, UsageError> {
        let nickname = match take(values, "person", "nickname")? {
            Value::Null => None,
            Value::Text(s) => Some(s),
            other => return Err(bad("person", "nickname", &other)),
        };
        let weight = match take(values, "person", "weight")? {
            Value::Null => None,
            Value::Decimal(d) => Some(d),
            other => return Err(bad("person", "weight", &other)),
        };
        let pet = match take(values, "person", "pet")? {
            Value::Null => None,
            Value::Map(map) => Some(Pet::from_values(&map)?),
            other => return Err(bad("person", "pet", &other)),
        };
        let tags = match take(values, "person", "tags")? {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Text(s) => Ok(s),
                    other => Err(bad("person", "tags", &other)),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(bad("person", "tags", &other)),
        };

        let id = match take(values, "person", "id")? {
            Value::Uint(u) => u,
            Value::Int(i) if i >= 0 => u64::try_from(i).unwrap_or_default(),
            other => return Err(bad("person", "id", &other)),
        };
        let age = match take(values, "person", "age")? {
            Value::Int(i) => i,
            Value::Uint(u) => i64::try_from(u).unwrap_or_default(),
            other => return Err(bad("person", "age", &other)),
        };

        Ok(Self {
            id,
            name: take_text(values, "person", "name")?,
            email: take_text(values, "person", "email")?,
            age,
            nickname,
            weight,
            pet,
            tags,
        })
    }
}

fn alice() -> Person {
    Person {
        id: 12,
        name: "Alice".to_string(),
        email: "alice@example.org".to_string(),
        age: 37,
        nickname: Some("Ally".to_string()),
        weight: Some(Decimal::new(7250, 2)),
        pet: Some(Pet {
            animal: "cat".to_string(),
            name: "Whiskers".to_string(),
        }),
        tags: vec!["staff".to_string(), "admin".to_string()],
    }
}

fn wire(value: serde_json::Value) -> Value {
    serde_json::from_value(value).expect("wire value")
}

///
/// Round-trips and defaults
///

#[test]
fn encode_renders_every_field() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let encoded = serializer.encode(&alice()).unwrap();

    let expected = json!({
        "id": 12,
        "name": "Alice",
        "email": "alice@example.org",
        "age": 37,
        "nickname": "Ally",
        "weight": "72.50",
        "pet": {"animal": "cat", "name": "Whiskers"},
        "tags": ["staff", "admin"],
        "email_domain": "example.org",
    });
    assert_eq!(serde_json::to_value(&encoded).unwrap(), expected);
}

#[test]
fn full_round_trip_reconstructs_the_record() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let encoded = serializer.encode(&alice()).unwrap();

    let validated = serializer.decode(&encoded).unwrap();
    let rebuilt = serializer.create(&validated).unwrap();

    // Read-only fields are dropped on decode by design, so the identifier
    // falls back to its declared default.
    let expected = Person {
        id: 0,
        ..alice()
    };
    assert_eq!(rebuilt, expected);
}

#[test]
fn defaults_materialize_without_input() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let validated = serializer
        .decode(&wire(json!({"name": "Bob", "email": "bob@example.org"})))
        .unwrap();

    // Unsupplied attributes never show up in the validated container.
    assert!(!validated.is_supplied("age"));
    assert!(!validated.is_supplied("tags"));

    let person = serializer.create(&validated).unwrap();
    assert_eq!(person.age, 0);
    assert_eq!(person.nickname, None);
    assert_eq!(person.tags, Vec::<String>::new());
    assert_eq!(person.pet, None);
}

#[test]
fn nullable_attributes_accept_null() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let validated = serializer
        .decode(&wire(json!({
            "name": "Bob",
            "email": "bob@example.org",
            "nickname": null,
            "pet": null,
        })))
        .unwrap();

    assert_eq!(validated.get("nickname"), Some(&Value::Null));
    let person = serializer.create(&validated).unwrap();
    assert_eq!(person.nickname, None);
    assert_eq!(person.pet, None);
}

#[test]
fn validation_issues_key_by_nested_path() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let err = serializer
        .decode(&wire(json!({
            "name": "Bob",
            "email": "bob@example.org",
            "age": "old",
            "pet": {"animal": "dog"},
            "tags": ["ok", 5],
        })))
        .unwrap_err();

    let issues = err.issues();
    assert_eq!(issues["age"], vec!["a valid integer is required".to_string()]);
    assert_eq!(issues["pet.name"], vec!["this field is required".to_string()]);
    assert_eq!(issues["tags[1]"], vec!["expected a string, got int".to_string()]);
}

#[test]
fn missing_required_fields_are_reported() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let err = serializer.decode(&wire(json!({}))).unwrap_err();

    let issues = err.issues();
    assert_eq!(issues["name"], vec!["this field is required".to_string()]);
    assert_eq!(issues["email"], vec!["this field is required".to_string()]);
    assert!(!issues.contains_key("age"));
}

#[test]
fn read_only_input_is_ignored() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let validated = serializer
        .decode(&wire(json!({
            "id": 999,
            "name": "Bob",
            "email": "bob@example.org",
        })))
        .unwrap();

    assert!(!validated.is_supplied("id"));
    let person = serializer.create(&validated).unwrap();
    assert_eq!(person.id, 0);
}

///
/// Partial updates
///

#[test]
fn partial_update_touches_only_supplied_leaves() {
    let serializer = RecordSerializer::<Person>::partial().unwrap();
    let existing = alice();

    let validated = serializer
        .decode(&wire(json!({
            "pet": {"name": "Felix"},
            "tags": ["x", "y"],
        })))
        .unwrap();
    assert!(validated.partial);
    assert!(!validated.is_supplied("age"));

    let updated = serializer.update(&existing, &validated).unwrap();

    // The nested record merged field-by-field...
    assert_eq!(
        updated.pet,
        Some(Pet {
            animal: "cat".to_string(),
            name: "Felix".to_string(),
        })
    );
    // ...the composite replaced wholesale...
    assert_eq!(updated.tags, vec!["x".to_string(), "y".to_string()]);
    // ...and everything untouched survived.
    assert_eq!(updated.age, 37);
    assert_eq!(updated.name, "Alice");
    assert_eq!(updated.nickname, Some("Ally".to_string()));
}

#[test]
fn partial_decode_of_empty_payload_changes_nothing() {
    let serializer = RecordSerializer::<Person>::partial().unwrap();
    let existing = Person {
        age: 5,
        ..alice()
    };

    let validated = serializer.decode(&wire(json!({}))).unwrap();
    let updated = serializer.update(&existing, &validated).unwrap();
    assert_eq!(updated, existing);
}

#[test]
fn full_mode_update_rebuilds_from_validated_data() {
    let serializer = RecordSerializer::<Person>::new().unwrap();
    let existing = alice();

    let validated = serializer
        .decode(&wire(json!({"name": "Alicia", "email": "alicia@example.org"})))
        .unwrap();
    let updated = serializer.update(&existing, &validated).unwrap();

    assert_eq!(updated.name, "Alicia");
    // Full mode applies declared defaults, not the instance's old values.
    assert_eq!(updated.age, 0);
    assert_eq!(updated.pet, None);
}

#[test]
fn save_routes_between_create_and_update() {
    let full = RecordSerializer::<Person>::new().unwrap();
    let validated = full
        .decode(&wire(json!({"name": "Bob", "email": "bob@example.org"})))
        .unwrap();

    let created = full.save(None, &validated).unwrap();
    assert_eq!(created.name, "Bob");

    let partial = RecordSerializer::<Person>::partial().unwrap();
    let validated = partial.decode(&wire(json!({"age": 44}))).unwrap();
    let updated = partial.save(Some(&created), &validated).unwrap();
    assert_eq!(updated.age, 44);
    assert_eq!(updated.name, "Bob");
}

///
/// Discriminated unions
///

fn scalar_union_field() -> UnionField {
    let namespace = Namespace::new();
    let int_desc = resolve(&TypeAnnotation::Scalar(ScalarKind::Int), &namespace);
    let text_desc = resolve(&TypeAnnotation::Scalar(ScalarKind::Text), &namespace);

    UnionField::new(vec![
        UnionMember::new(int_desc, Box::new(recast_core::fields::IntField::new())),
        UnionMember::new(text_desc, Box::new(TextField::new())),
    ])
    .nested(true)
}

fn reading_def() -> RecordDef {
    RecordDef {
        name: "reading",
        attributes: vec![
            AttributeDef::new(
                "value",
                TypeAnnotation::Union(vec![
                    TypeAnnotation::Scalar(ScalarKind::Int),
                    TypeAnnotation::Scalar(ScalarKind::Text),
                ]),
            )
            .with_field(Box::new(scalar_union_field())),
        ],
    }
}

const READING: RecordType = RecordType {
    name: "reading",
    def: reading_def,
};

#[test]
fn union_encoding_matches_the_documented_shape() {
    let serializer = Serializer::build(READING, &SerializerConfig::default()).unwrap();

    let mut values = BTreeMap::new();
    values.insert("value".to_string(), Value::Int(42));
    let encoded = serializer.encode_values(&values).unwrap();

    assert_eq!(
        serde_json::to_value(&encoded).unwrap(),
        json!({"value": {"type": "int", "value": 42}})
    );
}

#[test]
fn union_decoding_selects_the_member_by_tag() {
    let serializer = Serializer::build(READING, &SerializerConfig::default()).unwrap();

    let validated = serializer
        .decode(&wire(json!({"value": {"type": "str", "value": "x"}})))
        .unwrap();
    assert_eq!(validated.get("value"), Some(&Value::Text("x".to_string())));
}

#[test]
fn union_decoding_rejects_unknown_tags() {
    let serializer = Serializer::build(READING, &SerializerConfig::default()).unwrap();

    let err = serializer
        .decode(&wire(json!({"value": {"type": "float", "value": 1.5}})))
        .unwrap_err();
    let issues = err.issues();
    assert!(issues["value"][0].contains("float"));
    assert!(issues["value"][0].contains("int, str"));
}

fn cat_def() -> RecordDef {
    RecordDef {
        name: "cat",
        attributes: vec![AttributeDef::new(
            "meow",
            TypeAnnotation::Scalar(ScalarKind::Text),
        )],
    }
}

fn dog_def() -> RecordDef {
    RecordDef {
        name: "dog",
        attributes: vec![AttributeDef::new(
            "bark",
            TypeAnnotation::Scalar(ScalarKind::Text),
        )],
    }
}

const CAT: RecordType = RecordType {
    name: "cat",
    def: cat_def,
};
const DOG: RecordType = RecordType {
    name: "dog",
    def: dog_def,
};

fn shelter_def() -> RecordDef {
    RecordDef {
        name: "shelter",
        attributes: vec![AttributeDef::new(
            "resident",
            TypeAnnotation::Union(vec![
                TypeAnnotation::Record(CAT),
                TypeAnnotation::Record(DOG),
                TypeAnnotation::Null,
            ]),
        )],
    }
}

const SHELTER: RecordType = RecordType {
    name: "shelter",
    def: shelter_def,
};

#[test]
fn record_unions_merge_the_tag_into_the_mapping() {
    let serializer = Serializer::build(SHELTER, &SerializerConfig::default()).unwrap();

    let mut values = BTreeMap::new();
    values.insert(
        "resident".to_string(),
        wire(json!({"bark": "woof"})),
    );
    let encoded = serializer.encode_values(&values).unwrap();

    assert_eq!(
        serde_json::to_value(&encoded).unwrap(),
        json!({"resident": {"bark": "woof", "type": "dog"}})
    );
}

#[test]
fn record_unions_decode_by_tag_and_accept_null() {
    let serializer = Serializer::build(SHELTER, &SerializerConfig::default()).unwrap();

    let validated = serializer
        .decode(&wire(json!({"resident": {"type": "cat", "meow": "purr"}})))
        .unwrap();
    assert_eq!(
        validated.get("resident"),
        Some(&wire(json!({"meow": "purr"})))
    );

    // Null round-trips regardless of union arity.
    let validated = serializer.decode(&wire(json!({"resident": null}))).unwrap();
    assert_eq!(validated.get("resident"), Some(&Value::Null));
    let encoded = serializer
        .encode_values(&validated.values)
        .unwrap();
    assert_eq!(
        serde_json::to_value(&encoded).unwrap(),
        json!({"resident": null})
    );
}

///
/// Relations
///

static ARTIST: RelationDef = RelationDef {
    name: "artist",
    key: ScalarKind::Uint,
};

fn album_def() -> RecordDef {
    RecordDef {
        name: "album",
        attributes: vec![
            AttributeDef::new("title", TypeAnnotation::Scalar(ScalarKind::Text)),
            AttributeDef::new("artist", TypeAnnotation::Relation(&ARTIST)),
        ],
    }
}

const ALBUM: RecordType = RecordType {
    name: "album",
    def: album_def,
};

#[test]
fn relations_render_keys_or_hyperlinks() {
    let mut values = BTreeMap::new();
    values.insert("title".to_string(), Value::Text("Blue".to_string()));
    values.insert("artist".to_string(), Value::Uint(7));

    let by_key = Serializer::build(ALBUM, &SerializerConfig::default()).unwrap();
    assert_eq!(
        serde_json::to_value(by_key.encode_values(&values).unwrap()).unwrap(),
        json!({"title": "Blue", "artist": 7})
    );

    let by_link = Serializer::build(
        ALBUM,
        &SerializerConfig::default().with_relation_style(RelationStyle::Hyperlinked),
    )
    .unwrap();
    assert_eq!(
        serde_json::to_value(by_link.encode_values(&values).unwrap()).unwrap(),
        json!({"title": "Blue", "artist": "/artist/7/"})
    );

    let validated = by_link
        .decode(&wire(json!({"title": "Blue", "artist": "/artist/7/"})))
        .unwrap();
    assert_eq!(validated.get("artist"), Some(&Value::Uint(7)));
}

///
/// Many mode
///

#[test]
fn many_mode_collects_issues_under_index_paths() {
    let serializer = ManySerializer::<Person>::new().unwrap();

    let err = serializer
        .decode(&wire(json!([
            {"name": "Ann", "email": "ann@example.org"},
            {"email": "nameless@example.org"},
        ])))
        .unwrap_err();
    assert_eq!(
        err.issues()["[1].name"],
        vec!["this field is required".to_string()]
    );
}

#[test]
fn many_mode_round_trips_lists() {
    let serializer = ManySerializer::<Person>::new().unwrap();

    let validated = serializer
        .decode(&wire(json!([
            {"name": "Ann", "email": "ann@example.org"},
            {"name": "Ben", "email": "ben@example.org", "age": 2},
        ])))
        .unwrap();
    let people = serializer.create(&validated).unwrap();

    assert_eq!(people.len(), 2);
    assert_eq!(people[0].name, "Ann");
    assert_eq!(people[1].age, 2);

    let encoded = serializer.encode(&people).unwrap();
    let rendered = serde_json::to_value(&encoded).unwrap();
    assert_eq!(rendered[0]["name"], json!("Ann"));
    assert_eq!(rendered[1]["age"], json!(2));
}

#[test]
fn explicit_wire_defaults_fill_unsupplied_fields() {
    use recast_core::fields::FieldOptions;

    let config = SerializerConfig::default()
        .with_extra("age", FieldOptions::new().default_value(18i64));
    let serializer = RecordSerializer::<Person>::with_config(config).unwrap();

    let validated = serializer
        .decode(&wire(json!({"name": "Bob", "email": "bob@example.org"})))
        .unwrap();
    assert_eq!(validated.get("age"), Some(&Value::Int(18)));

    let person = serializer.create(&validated).unwrap();
    assert_eq!(person.age, 18);
}

fn name_only_nested_factory(
    record: RecordType,
    parent: &SerializerConfig,
) -> Result<Serializer, recast_core::ConfigError> {
    let config = SerializerConfig {
        fields: recast_core::serializer::FieldSelection::names(["name"]),
        exclude: Vec::new(),
        read_only_fields: Vec::new(),
        extra: std::collections::BTreeMap::new(),
        declared: Vec::new(),
        ..parent.clone()
    };
    Serializer::build(record, &config)
}

#[test]
fn nested_serializer_factory_substitution_changes_nested_shapes() {
    let config = SerializerConfig::default().with_nested_factory(name_only_nested_factory);
    let serializer = RecordSerializer::<Person>::with_config(config).unwrap();

    let encoded = serializer.encode(&alice()).unwrap();
    let rendered = serde_json::to_value(&encoded).unwrap();
    assert_eq!(rendered["pet"], json!({"name": "Whiskers"}));
}

#[test]
fn many_mode_can_reject_empty_lists() {
    let mut serializer = ManySerializer::from_item(RecordSerializer::<Person>::new().unwrap());
    serializer.allow_empty = false;

    let err = serializer.decode(&wire(json!([]))).unwrap_err();
    assert_eq!(
        err.issues()["non_field_errors"],
        vec!["this list may not be empty".to_string()]
    );
}

///
/// Declared fields
///

#[test]
fn declared_fields_redirect_through_their_source() {
    let mut title_field = TextField::new();
    title_field.config.source = Some("name".to_string());
    title_field.config.required = true;

    let config = SerializerConfig::default()
        .with_declared("title", Box::new(title_field))
        .with_exclude(["name"]);
    let serializer = Serializer::build(Person::record_type(), &config).unwrap();

    let values = alice().to_values();
    let encoded = serializer.encode_values(&values).unwrap();
    let rendered = serde_json::to_value(&encoded).unwrap();
    assert_eq!(rendered["title"], json!("Alice"));
    assert!(rendered.get("name").is_none());

    let validated = serializer
        .decode(&wire(json!({
            "title": "Carol",
            "email": "carol@example.org",
        })))
        .unwrap();
    assert_eq!(validated.get("name"), Some(&Value::Text("Carol".to_string())));
}

///
/// Determinism
///

#[test]
fn building_twice_is_structurally_equivalent() {
    let first = RecordSerializer::<Person>::new().unwrap();
    let second = RecordSerializer::<Person>::new().unwrap();
    assert_eq!(
        format!("{:?}", first.inner().specs()),
        format!("{:?}", second.inner().specs())
    );
}
