//! Translation of field maps into filter documents.
//!
//! Filters are flat equality documents. Booleans and nulls always keep their
//! BSON type. Every other value is either stringified ([`Coercion::Stringify`],
//! the legacy default) or kept native ([`Coercion::Native`]).
//!
//! With stringification a selector `{ age: 42 }` produces `{ "age": "42" }`,
//! which does not match documents storing `age` as an integer. Use
//! [`Coercion::Native`] to let the store compare typed values.
//!
//! An empty field map yields an empty filter, which matches every document in
//! the collection.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::{
    error::ClientResult,
    normalize::{FieldMap, FieldNormalizer},
    record::{FieldValue, Record},
};

/// How non-boolean, non-null field values are written into filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    /// Use the value's display string.
    #[default]
    Stringify,
    /// Keep the value's native BSON type.
    Native,
}

/// Builds filter documents from [`FieldMap`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder {
    coercion: Coercion,
}

impl FilterBuilder {
    pub fn new(coercion: Coercion) -> Self {
        Self { coercion }
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    /// Builds the filter document for `fields`.
    pub fn build(&self, fields: &FieldMap) -> Document {
        fields
            .iter()
            .map(|(name, value)| (name.clone(), self.coerce(value)))
            .collect()
    }

    /// Normalizes `record` and builds its filter document.
    pub fn build_from<R: Record + ?Sized>(
        &self,
        normalizer: &FieldNormalizer,
        record: &R,
    ) -> ClientResult<Document> {
        Ok(self.build(&normalizer.normalize(record)?))
    }

    fn coerce(&self, value: &FieldValue) -> Bson {
        match value {
            FieldValue::Bool(value) => Bson::Boolean(*value),
            FieldValue::Null => Bson::Null,
            other => match self.coercion {
                Coercion::Stringify => Bson::String(other.to_string()),
                Coercion::Native => other.to_bson(),
            },
        }
    }
}
