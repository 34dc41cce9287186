//! Records and their field values.
//!
//! A [`Record`] is anything that can enumerate its fields as `(name, value)`
//! pairs. Structs get an implementation from `#[derive(Record)]`; maps, BSON
//! documents, JSON objects and [`Serialized`] values are decomposed at runtime
//! and fail with [`ClientError::InvalidInput`] when they are not document shaped.
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::prelude::*;
//!
//! #[derive(Record)]
//! pub struct UserSelector {
//!     pub name: Option<String>,
//!     #[record(keep_empty)]
//!     pub active: Option<bool>,
//! }
//! ```

use bson::{Bson, Document, oid::ObjectId, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// Type-erased value of a single record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absence of a value.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    ObjectId(ObjectId),
    List(Vec<FieldValue>),
    /// Nested record or map, keyed by field name.
    Map(BTreeMap<String, FieldValue>),
    /// Any other BSON value, kept as is.
    Raw(Bson),
}

impl FieldValue {
    /// Returns `true` for the zero value of the field's type (`null`, `false`,
    /// `0`, `""`, empty list or map, nil UUID).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(value) => !value,
            FieldValue::Int(value) => *value == 0,
            FieldValue::UInt(value) => *value == 0,
            FieldValue::Float(value) => *value == 0.0,
            FieldValue::String(value) => value.is_empty(),
            FieldValue::Uuid(value) => value.is_nil(),
            FieldValue::List(values) => values.is_empty(),
            FieldValue::Map(values) => values.is_empty(),
            FieldValue::DateTime(_) | FieldValue::ObjectId(_) => false,
            FieldValue::Raw(value) => matches!(value, Bson::Null | Bson::Undefined),
        }
    }

    /// Converts the value to BSON, keeping its native type.
    ///
    /// Unsigned integers that do not fit into an `i64` are stored as doubles.
    /// Times and UUIDs take the form serde writes them in, a string, so a
    /// selector matches values inserted through the client. Use
    /// [`bson::DateTime`] or [`bson::Uuid`] fields for BSON-typed values.
    pub fn to_bson(&self) -> Bson {
        match self {
            FieldValue::Null => Bson::Null,
            FieldValue::Bool(value) => Bson::Boolean(*value),
            FieldValue::Int(value) => Bson::Int64(*value),
            FieldValue::UInt(value) => match i64::try_from(*value) {
                Ok(value) => Bson::Int64(value),
                Err(_) => Bson::Double(*value as f64),
            },
            FieldValue::Float(value) => Bson::Double(*value),
            FieldValue::String(value) => Bson::String(value.clone()),
            FieldValue::DateTime(value) => written_form(value),
            FieldValue::Uuid(value) => written_form(value),
            FieldValue::ObjectId(value) => Bson::ObjectId(*value),
            FieldValue::List(values) => Bson::Array(values.iter().map(FieldValue::to_bson).collect()),
            FieldValue::Map(values) => Bson::Document(
                values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_bson()))
                    .collect(),
            ),
            FieldValue::Raw(value) => value.clone(),
        }
    }
}

/// The BSON a value serializes to when written as part of a document.
fn written_form<T: Serialize + fmt::Display>(value: &T) -> Bson {
    serialize_to_bson(value).unwrap_or_else(|_| Bson::String(value.to_string()))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::UInt(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::String(value) => f.write_str(value),
            FieldValue::DateTime(value) => write!(f, "{value}"),
            FieldValue::Uuid(value) => write!(f, "{value}"),
            FieldValue::ObjectId(value) => write!(f, "{value}"),
            FieldValue::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            FieldValue::Map(values) => {
                f.write_str("{")?;
                for (index, (key, value)) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            FieldValue::Raw(value) => write!(f, "{value}"),
        }
    }
}

impl From<&Bson> for FieldValue {
    fn from(value: &Bson) -> Self {
        match value {
            Bson::Null | Bson::Undefined => FieldValue::Null,
            Bson::Boolean(value) => FieldValue::Bool(*value),
            Bson::Int32(value) => FieldValue::Int(i64::from(*value)),
            Bson::Int64(value) => FieldValue::Int(*value),
            Bson::Double(value) => FieldValue::Float(*value),
            Bson::String(value) => FieldValue::String(value.clone()),
            Bson::ObjectId(value) => FieldValue::ObjectId(*value),
            Bson::Array(values) => FieldValue::List(values.iter().map(FieldValue::from).collect()),
            Bson::Document(doc) => FieldValue::Map(
                doc.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
            other => FieldValue::Raw(other.clone()),
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(value) => FieldValue::Bool(*value),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    FieldValue::Int(value)
                } else if let Some(value) = number.as_u64() {
                    FieldValue::UInt(value)
                } else {
                    FieldValue::Float(number.as_f64().unwrap_or_default())
                }
            }
            Value::String(value) => FieldValue::String(value.clone()),
            Value::Array(values) => FieldValue::List(values.iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Conversion of a Rust value into a [`FieldValue`].
///
/// Implemented for primitives, strings, common id and time types, `Option`,
/// `Vec`, string-keyed maps and every `#[derive(Record)]` type.
pub trait IntoFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

macro_rules! impl_into_field_value {
    ($variant:ident as $target:ty => $($ty:ty),+ $(,)?) => {
        $(
            impl IntoFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

impl_into_field_value!(Int as i64 => i8, i16, i32, i64);
impl_into_field_value!(UInt as u64 => u8, u16, u32, u64);
impl_into_field_value!(Float as f64 => f32, f64);

impl IntoFieldValue for isize {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Int(*self as i64)
    }
}

impl IntoFieldValue for usize {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::UInt(*self as u64)
    }
}

impl IntoFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl IntoFieldValue for char {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.to_string())
    }
}

impl IntoFieldValue for str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.to_string())
    }
}

impl IntoFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }
}

impl IntoFieldValue for DateTime<Utc> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }
}

impl IntoFieldValue for Uuid {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Uuid(*self)
    }
}

impl IntoFieldValue for bson::DateTime {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Raw(Bson::DateTime(*self))
    }
}

impl IntoFieldValue for bson::Uuid {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Raw(Bson::from(*self))
    }
}

impl IntoFieldValue for ObjectId {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::ObjectId(*self)
    }
}

impl IntoFieldValue for Bson {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::from(self)
    }
}

impl IntoFieldValue for Value {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::from(self)
    }
}

impl IntoFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}

impl<T: IntoFieldValue + ?Sized> IntoFieldValue for &T {
    fn to_field_value(&self) -> FieldValue {
        (**self).to_field_value()
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Vec<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(IntoFieldValue::to_field_value).collect())
    }
}

impl<T: IntoFieldValue> IntoFieldValue for BTreeMap<String, T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_field_value()))
                .collect(),
        )
    }
}

impl<T: IntoFieldValue> IntoFieldValue for HashMap<String, T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_field_value()))
                .collect(),
        )
    }
}

/// A single named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    /// Keep the field even when its value is empty and empties are omitted.
    pub keep_empty: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
            keep_empty: false,
        }
    }

    pub fn keep_empty(mut self, keep_empty: bool) -> Self {
        self.keep_empty = keep_empty;
        self
    }
}

/// A typed aggregate that can enumerate its named fields.
///
/// Derive it with `#[derive(Record)]` or implement it by hand:
///
/// ```ignore
/// impl Record for Account {
///     fn fields(&self) -> ClientResult<Vec<Field>> {
///         Ok(vec![Field::new("Owner", self.owner.to_field_value())])
///     }
/// }
/// ```
pub trait Record {
    /// Returns the record's fields, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] if the value has no named fields.
    fn fields(&self) -> ClientResult<Vec<Field>>;
}

impl<R: Record + ?Sized> Record for &R {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        (**self).fields()
    }
}

/// The empty selector, matching every document of a collection.
impl Record for () {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        Ok(Vec::new())
    }
}

impl Record for Document {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        Ok(self
            .iter()
            .map(|(k, v)| Field::new(k.clone(), FieldValue::from(v)))
            .collect())
    }
}

impl Record for Bson {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        match self {
            Bson::Document(doc) => doc.fields(),
            other => Err(ClientError::InvalidInput(format!(
                "expected a document, got {:?}",
                other.element_type()
            ))),
        }
    }
}

impl Record for Value {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        match self {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| Field::new(k.clone(), FieldValue::from(v)))
                .collect()),
            other => Err(ClientError::InvalidInput(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl<T: IntoFieldValue> Record for BTreeMap<String, T> {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        Ok(self
            .iter()
            .map(|(k, v)| Field::new(k.clone(), v.to_field_value()))
            .collect())
    }
}

impl<T: IntoFieldValue> Record for HashMap<String, T> {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        Ok(self
            .iter()
            .map(|(k, v)| Field::new(k.clone(), v.to_field_value()))
            .collect())
    }
}

/// Decomposes any `Serialize` value through its BSON representation.
///
/// Useful for types that cannot derive [`Record`]. Serialization failures
/// surface as [`ClientError::Serialization`]; values that do not serialize to a
/// document fail with [`ClientError::InvalidInput`].
#[derive(Debug)]
pub struct Serialized<'a, T: ?Sized>(pub &'a T);

impl<T: Serialize + ?Sized> Record for Serialized<'_, T> {
    fn fields(&self) -> ClientResult<Vec<Field>> {
        serialize_to_bson(self.0)?.fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bson::doc;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::null(FieldValue::Null, true)]
    #[case::false_bool(FieldValue::Bool(false), true)]
    #[case::true_bool(FieldValue::Bool(true), false)]
    #[case::zero_int(FieldValue::Int(0), true)]
    #[case::int(FieldValue::Int(-3), false)]
    #[case::zero_float(FieldValue::Float(0.0), true)]
    #[case::empty_string(FieldValue::String(String::new()), true)]
    #[case::string(FieldValue::String("a".to_string()), false)]
    #[case::empty_list(FieldValue::List(vec![]), true)]
    #[case::nil_uuid(FieldValue::Uuid(Uuid::nil()), true)]
    #[case::object_id(FieldValue::ObjectId(ObjectId::new()), false)]
    fn empty_values(#[case] value: FieldValue, #[case] expected: bool) {
        assert_eq!(value.is_empty(), expected);
    }

    #[rstest]
    #[case::int(FieldValue::Int(42), "42")]
    #[case::negative(FieldValue::Int(-7), "-7")]
    #[case::float(FieldValue::Float(1.5), "1.5")]
    #[case::string(FieldValue::String("A1".to_string()), "A1")]
    #[case::list(
        FieldValue::List(vec![FieldValue::Int(1), FieldValue::String("b".to_string())]),
        "[1, b]"
    )]
    #[case::map(
        FieldValue::Map(BTreeMap::from([("k".to_string(), FieldValue::Int(2))])),
        "{k: 2}"
    )]
    fn display_form(#[case] value: FieldValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(None::<i32>.to_field_value(), FieldValue::Null);
        assert_eq!(Some(5u8).to_field_value(), FieldValue::UInt(5));
    }

    #[test]
    fn times_and_uuids_take_their_serialized_form() {
        let id = Uuid::from_u128(0xabcdef);
        let at = DateTime::from_timestamp_millis(1_714_564_800_000).unwrap();

        assert_eq!(FieldValue::Uuid(id).to_bson(), serialize_to_bson(&id).unwrap());
        assert_eq!(FieldValue::Uuid(id).to_bson(), Bson::String(id.to_string()));
        assert_eq!(FieldValue::DateTime(at).to_bson(), serialize_to_bson(&at).unwrap());
    }

    #[test]
    fn bson_typed_values_stay_typed() {
        let at = bson::DateTime::from_millis(1_714_564_800_000);

        assert_eq!(at.to_field_value().to_bson(), Bson::DateTime(at));
        assert_eq!(FieldValue::from(&Bson::DateTime(at)).to_bson(), Bson::DateTime(at));
    }

    #[test]
    fn large_unsigned_falls_back_to_double() {
        assert_eq!(FieldValue::UInt(u64::MAX).to_bson(), Bson::Double(u64::MAX as f64));
        assert_eq!(FieldValue::UInt(9).to_bson(), Bson::Int64(9));
    }

    #[test]
    fn documents_decompose_into_fields() {
        let fields = doc! { "Name": "Alice", "age": 30 }.fields().unwrap();

        assert_eq!(
            fields,
            vec![
                Field::new("Name", FieldValue::String("Alice".to_string())),
                Field::new("age", FieldValue::Int(30)),
            ]
        );
    }

    #[rstest]
    #[case::scalar(Bson::Int32(1))]
    #[case::array(Bson::Array(vec![Bson::Int32(1)]))]
    fn non_documents_are_invalid(#[case] value: Bson) {
        assert!(matches!(value.fields(), Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn json_objects_decompose_and_arrays_fail() {
        let fields = json!({ "id": "A1", "count": 3 }).fields().unwrap();
        assert_eq!(fields.len(), 2);

        assert!(matches!(json!([1, 2]).fields(), Err(ClientError::InvalidInput(_))));
    }

    #[derive(Serialize)]
    struct Plain {
        id: String,
        score: u32,
    }

    #[test]
    fn serialized_values_decompose_through_bson() {
        let plain = Plain { id: "A1".to_string(), score: 7 };
        let fields = Serialized(&plain).fields().unwrap();

        assert_eq!(fields[0], Field::new("id", FieldValue::String("A1".to_string())));
        assert_eq!(fields[1].name, "score");
    }

    #[test]
    fn serialized_scalars_are_invalid() {
        assert!(matches!(Serialized(&12).fields(), Err(ClientError::InvalidInput(_))));
    }
}
