//! Secondary index descriptors.

use bson::{Bson, Document};

use crate::error::{ClientError, ClientResult};

/// Ordering of a single index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    Asc,
    Desc,
}

impl IndexOrder {
    /// The direction as written in an index key document.
    pub fn as_i32(&self) -> i32 {
        match self {
            IndexOrder::Asc => 1,
            IndexOrder::Desc => -1,
        }
    }
}

/// A parsed index key. `-name` is descending, `name` or `+name` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    pub field: String,
    pub order: IndexOrder,
}

impl IndexKey {
    pub fn parse(key: &str) -> Self {
        let key = key.trim();

        if let Some(field) = key.strip_prefix('-') {
            Self { field: field.to_string(), order: IndexOrder::Desc }
        } else {
            Self {
                field: key.strip_prefix('+').unwrap_or(key).to_string(),
                order: IndexOrder::Asc,
            }
        }
    }
}

/// Describes a secondary index to create on a collection.
///
/// # Example
///
/// ```ignore
/// let index = IndexDescriptor::new("users", ["id"]).unique(true);
/// client.ensure_index(&index).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub collection: String,
    /// Ordered key field names; a leading `-` marks a descending key.
    pub keys: Vec<String>,
    pub unique: bool,
    /// Drop documents violating a unique index while it is built.
    pub drop_duplicates: bool,
    pub background: bool,
    pub sparse: bool,
}

impl IndexDescriptor {
    pub fn new<K, S>(collection: impl Into<String>, keys: K) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection: collection.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn drop_duplicates(mut self, drop_duplicates: bool) -> Self {
        self.drop_duplicates = drop_duplicates;
        self
    }

    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    pub fn parsed_keys(&self) -> Vec<IndexKey> {
        self.keys.iter().map(|key| IndexKey::parse(key)).collect()
    }

    /// Checks that the descriptor names at least one key and that no key is
    /// blank once its direction prefix is removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] otherwise.
    pub fn validate(&self) -> ClientResult<()> {
        if self.keys.is_empty() {
            return Err(ClientError::InvalidInput(format!(
                "index on collection {} has no keys",
                self.collection
            )));
        }

        match self.keys.iter().find(|key| IndexKey::parse(key).field.is_empty()) {
            Some(key) => Err(ClientError::InvalidInput(format!(
                "index on collection {} has a key without a field name: {key:?}",
                self.collection
            ))),
            None => Ok(()),
        }
    }

    /// The key document, e.g. `{ "name": 1, "age": -1 }`.
    pub fn key_document(&self) -> Document {
        self.parsed_keys()
            .into_iter()
            .map(|key| (key.field, Bson::Int32(key.order.as_i32())))
            .collect()
    }

    /// The index name the store derives from the keys, e.g. `name_1_age_-1`.
    pub fn name(&self) -> String {
        self.parsed_keys()
            .iter()
            .map(|key| format!("{}_{}", key.field, key.order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bson::doc;
    use rstest::rstest;

    #[rstest]
    #[case::plain("name", "name", IndexOrder::Asc)]
    #[case::plus("+name", "name", IndexOrder::Asc)]
    #[case::minus("-created", "created", IndexOrder::Desc)]
    #[case::padded(" -created ", "created", IndexOrder::Desc)]
    fn keys_parse(#[case] raw: &str, #[case] field: &str, #[case] order: IndexOrder) {
        assert_eq!(IndexKey::parse(raw), IndexKey { field: field.to_string(), order });
    }

    #[rstest]
    #[case::no_keys(vec![])]
    #[case::bare_minus(vec!["-"])]
    #[case::bare_plus(vec!["name", "+"])]
    #[case::blank(vec!["  "])]
    fn keyless_descriptors_are_invalid(#[case] keys: Vec<&str>) {
        let index = IndexDescriptor::new("users", keys).unique(true);

        assert!(matches!(index.validate(), Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn descriptors_with_fields_are_valid() {
        assert!(IndexDescriptor::new("users", ["-created", "+name"]).validate().is_ok());
    }

    #[test]
    fn key_document_and_name_follow_key_order() {
        let index = IndexDescriptor::new("users", ["lastname", "-age"]).unique(true);

        assert_eq!(index.key_document(), doc! { "lastname": 1, "age": -1 });
        assert_eq!(index.name(), "lastname_1_age_-1");
        assert!(index.unique);
        assert!(!index.sparse);
    }
}
