use chrono::{TimeZone, Utc};
use mongolayer::{
    bson::{Bson, doc, ser::serialize_to_bson},
    prelude::*,
};
use rstest::rstest;
use uuid::Uuid;

#[derive(Debug, Default, Record)]
struct Account {
    #[record(rename = "ID")]
    id: Option<String>,
    #[allow(non_snake_case)]
    LastName: Option<String>,
    age: Option<u32>,
    #[record(keep_empty)]
    active: bool,
    #[record(skip)]
    #[allow(dead_code)]
    cache_hint: u32,
    r#type: Option<String>,
}

#[derive(Debug, Default, Record)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Debug, Default, Record)]
struct Customer {
    name: String,
    address: Option<Address>,
}

#[derive(Debug, Default, Record)]
struct Colliding {
    name: String,
    #[record(rename = "NAME")]
    other: String,
}

fn normalize<R: Record>(record: &R) -> FieldMap {
    FieldNormalizer::default().normalize(record).unwrap()
}

#[test]
fn default_record_keeps_only_forced_fields() {
    let fields = normalize(&Account::default());

    assert_eq!(fields.len(), 1);
    assert_eq!(fields.get("active"), Some(&FieldValue::Bool(false)));
}

#[test]
fn names_are_lower_cased_after_renaming() {
    let fields = normalize(&Account {
        id: Some("A1".to_string()),
        LastName: Some("Smith".to_string()),
        r#type: Some("admin".to_string()),
        ..Default::default()
    });

    assert_eq!(
        fields.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["active", "id", "lastname", "type"]
    );
}

#[test]
fn skipped_fields_never_appear() {
    let account = Account {
        cache_hint: 7,
        ..Default::default()
    };

    assert!(!normalize(&account).contains_key("cache_hint"));
    assert!(
        account
            .fields()
            .unwrap()
            .iter()
            .all(|field| field.name != "cache_hint")
    );
}

#[test]
fn without_omission_every_field_is_kept() {
    let fields = FieldNormalizer::new(false).normalize(&Account::default()).unwrap();

    assert_eq!(fields.len(), 5);
    assert_eq!(fields.get("id"), Some(&FieldValue::Null));
}

#[rstest]
#[case::stringified(Coercion::Stringify, doc! { "active": false, "age": "42", "id": "A1" })]
#[case::native(Coercion::Native, doc! { "active": false, "age": 42_i64, "id": "A1" })]
fn filters_follow_coercion(#[case] coercion: Coercion, #[case] expected: mongolayer::bson::Document) {
    let filter = FilterBuilder::new(coercion)
        .build_from(
            &FieldNormalizer::default(),
            &Account {
                id: Some("A1".to_string()),
                age: Some(42),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(filter, expected);
}

#[test]
fn nested_records_become_maps() {
    let fields = normalize(&Customer {
        name: "Alice".to_string(),
        address: Some(Address {
            city: "Oslo".to_string(),
            zip: "0150".to_string(),
        }),
    });

    let filter = FilterBuilder::new(Coercion::Native).build(&fields);
    assert_eq!(
        filter,
        doc! { "address": { "city": "Oslo", "zip": "0150" }, "name": "Alice" }
    );

    let filter = FilterBuilder::default().build(&fields);
    assert_eq!(filter.get_str("address").unwrap(), "{city: Oslo, zip: 0150}");
}

#[test]
fn missing_nested_record_is_omitted() {
    let fields = normalize(&Customer {
        name: "Alice".to_string(),
        address: None,
    });

    assert_eq!(fields.len(), 1);
}

#[test]
fn colliding_names_are_rejected() {
    let err = FieldNormalizer::default()
        .normalize(&Colliding {
            name: "a".to_string(),
            other: "b".to_string(),
        })
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidInput(_)));
}

#[derive(Debug, Default, Record)]
struct Event {
    id: Option<Uuid>,
    at: Option<chrono::DateTime<Utc>>,
    logged: Option<mongolayer::bson::DateTime>,
    tags: Vec<String>,
}

#[test]
fn native_values_take_their_written_form() {
    let id = Uuid::from_u128(0x1234);
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let logged = mongolayer::bson::DateTime::from_millis(at.timestamp_millis());

    let filter = FilterBuilder::new(Coercion::Native)
        .build_from(
            &FieldNormalizer::default(),
            &Event {
                id: Some(id),
                at: Some(at),
                logged: Some(logged),
                tags: vec!["a".to_string()],
            },
        )
        .unwrap();

    assert_eq!(filter.get("id"), Some(&Bson::String(id.to_string())));
    assert_eq!(filter.get("at"), Some(&serialize_to_bson(&at).unwrap()));
    assert_eq!(filter.get("logged"), Some(&Bson::DateTime(logged)));
    assert_eq!(filter.get_array("tags").unwrap(), &vec![Bson::String("a".to_string())]);

    let filter = FilterBuilder::default()
        .build_from(
            &FieldNormalizer::default(),
            &Event {
                id: Some(id),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(filter, doc! { "id": id.to_string() });
}

#[derive(Debug, Record)]
struct Tagged<T> {
    label: String,
    value: T,
}

#[test]
fn generic_records_bound_their_parameters() {
    let fields = normalize(&Tagged {
        label: "limit".to_string(),
        value: 5_i64,
    });

    assert_eq!(fields.get("value"), Some(&FieldValue::Int(5)));

    let nested = Tagged {
        label: "outer".to_string(),
        value: Tagged { label: "inner".to_string(), value: true },
    };
    assert!(matches!(normalize(&nested).get("value"), Some(FieldValue::Map(map)) if map.len() == 2));
}

#[test]
fn nil_uuid_counts_as_empty() {
    let fields = normalize(&Event {
        id: Some(Uuid::nil()),
        ..Default::default()
    });

    assert!(fields.is_empty());
}
