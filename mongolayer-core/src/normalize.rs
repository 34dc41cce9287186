//! Flattening of records into lower-cased field maps.

use std::collections::{BTreeMap, btree_map::Entry};

use crate::{
    error::{ClientError, ClientResult},
    record::{FieldValue, Record},
};

/// Mapping of lower-cased field name to field value.
///
/// Produced fresh for every operation and discarded afterwards.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Converts records into [`FieldMap`]s.
///
/// With `omit_empty` set (the default), zero-valued fields are dropped so
/// partially populated selectors only constrain the fields they set. Fields
/// marked `keep_empty` are always retained.
#[derive(Debug, Clone, Copy)]
pub struct FieldNormalizer {
    omit_empty: bool,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self { omit_empty: true }
    }
}

impl FieldNormalizer {
    pub fn new(omit_empty: bool) -> Self {
        Self { omit_empty }
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// Flattens `record` into a map keyed by lower-cased field names.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] if the record cannot be decomposed, or
    /// if two of its field names are equal once lower-cased.
    pub fn normalize<R: Record + ?Sized>(&self, record: &R) -> ClientResult<FieldMap> {
        let mut map = FieldMap::new();

        for field in record.fields()? {
            if self.omit_empty && !field.keep_empty && field.value.is_empty() {
                continue;
            }

            match map.entry(field.name.to_lowercase()) {
                Entry::Vacant(entry) => {
                    entry.insert(field.value);
                }
                Entry::Occupied(entry) => {
                    return Err(ClientError::InvalidInput(format!(
                        "field {} collides with another field named {}",
                        field.name,
                        entry.key()
                    )));
                }
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bson::{Bson, doc};
    use rstest::rstest;

    use crate::record::{Field, IntoFieldValue};

    struct Account {
        owner: String,
        balance: i64,
        frozen: Option<bool>,
        note: Option<String>,
    }

    impl Record for Account {
        fn fields(&self) -> ClientResult<Vec<Field>> {
            Ok(vec![
                Field::new("Owner", self.owner.to_field_value()),
                Field::new("Balance", self.balance.to_field_value()),
                Field::new("Frozen", self.frozen.to_field_value()).keep_empty(true),
                Field::new("Note", self.note.to_field_value()),
            ])
        }
    }

    fn account() -> Account {
        Account {
            owner: "Alice".to_string(),
            balance: 0,
            frozen: Some(false),
            note: None,
        }
    }

    #[test]
    fn keys_are_lower_cased() {
        let map = FieldNormalizer::new(false).normalize(&account()).unwrap();

        assert_eq!(
            map.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["balance", "frozen", "note", "owner"]
        );
    }

    #[test]
    fn empties_are_omitted_unless_kept() {
        let map = FieldNormalizer::default().normalize(&account()).unwrap();

        assert_eq!(
            map,
            FieldMap::from([
                ("owner".to_string(), FieldValue::String("Alice".to_string())),
                ("frozen".to_string(), FieldValue::Bool(false)),
            ])
        );
    }

    #[test]
    fn empties_are_kept_when_not_omitting() {
        let map = FieldNormalizer::new(false).normalize(&account()).unwrap();

        assert_eq!(map.get("balance"), Some(&FieldValue::Int(0)));
        assert_eq!(map.get("note"), Some(&FieldValue::Null));
    }

    #[test]
    fn empty_record_yields_empty_map() {
        assert!(FieldNormalizer::default().normalize(&()).unwrap().is_empty());
    }

    #[test]
    fn colliding_names_are_rejected() {
        let record = doc! { "Id": "a", "ID": "b" };

        assert!(matches!(
            FieldNormalizer::default().normalize(&record),
            Err(ClientError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case::string(Bson::String("x".to_string()))]
    #[case::null(Bson::Null)]
    fn non_records_are_invalid(#[case] value: Bson) {
        assert!(matches!(
            FieldNormalizer::default().normalize(&value),
            Err(ClientError::InvalidInput(_))
        ));
    }
}
