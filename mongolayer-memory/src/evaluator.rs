//! Filter evaluation for in-memory documents.
//!
//! Filters are flat equality documents. A filter entry matches when the stored
//! field compares equal to the filter value, when the stored field is an array
//! containing the value, or, for a `null` filter value, when the field is
//! missing or null. Comparison is type aware: numbers compare across integer
//! and double types, but a string never equals a number. Embedded documents
//! are equal only with the same fields in the same order.

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

/// Comparable representation of BSON values.
///
/// Integers keep their exact value; only doubles are held as `f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Any other value, compared by BSON equality.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) | (Comparable::Number(b), Comparable::Int(a)) => {
                int_equals_double(*a, *b)
            }
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// Exact comparison: the double must hold precisely the integer's value.
fn int_equals_double(int: i64, double: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    double.fract() == 0.0 && (-LIMIT..LIMIT).contains(&double) && double as i64 == int
}

/// Evaluates equality filters against a single document.
pub(crate) struct DocumentMatcher<'a> {
    document: &'a Document,
}

impl<'a> DocumentMatcher<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if every entry of `filter` matches. An empty filter matches.
    pub fn matches(&self, filter: &Document) -> bool {
        filter
            .iter()
            .all(|(field, value)| self.matches_field(field, value))
    }

    fn matches_field(&self, field: &str, expected: &Bson) -> bool {
        let expected = Comparable::from(expected);

        match self.document.get(field).map(Comparable::from) {
            None => expected == Comparable::Null,
            Some(Comparable::Array(items)) if !matches!(expected, Comparable::Array(_)) => {
                items.iter().any(|item| item == &expected)
            }
            Some(stored) => stored == expected,
        }
    }
}

/// Returns `true` if the indexed values of two documents collide.
///
/// Missing fields index as null.
pub(crate) fn same_key(left: &Document, right: &Document, fields: &[String]) -> bool {
    fields.iter().all(|field| {
        let left = left.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = right.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

        left == right
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use bson::doc;
    use rstest::rstest;

    fn stored() -> Document {
        doc! {
            "name": "Alice",
            "age": 42,
            "score": 1.5,
            "admin": false,
            "note": Bson::Null,
            "tags": ["a", "b"],
            "address": { "city": "Oslo", "zip": 150 },
        }
    }

    #[rstest]
    #[case::empty(doc! {}, true)]
    #[case::string(doc! { "name": "Alice" }, true)]
    #[case::string_mismatch(doc! { "name": "Bob" }, false)]
    #[case::integer_across_widths(doc! { "age": 42_i64 }, true)]
    #[case::integer_as_double(doc! { "age": 42.0 }, true)]
    #[case::stringified_integer(doc! { "age": "42" }, false)]
    #[case::stringified_double(doc! { "score": "1.5" }, false)]
    #[case::boolean(doc! { "admin": false }, true)]
    #[case::stringified_boolean(doc! { "admin": "false" }, false)]
    #[case::null_field(doc! { "note": Bson::Null }, true)]
    #[case::missing_field_null(doc! { "missing": Bson::Null }, true)]
    #[case::missing_field_value(doc! { "missing": "x" }, false)]
    #[case::array_element(doc! { "tags": "b" }, true)]
    #[case::whole_array(doc! { "tags": ["a", "b"] }, true)]
    #[case::conjunction(doc! { "name": "Alice", "age": 41 }, false)]
    #[case::fractional_double(doc! { "age": 42.5 }, false)]
    #[case::embedded(doc! { "address": { "city": "Oslo", "zip": 150 } }, true)]
    #[case::embedded_reordered(doc! { "address": { "zip": 150, "city": "Oslo" } }, false)]
    #[case::embedded_subset(doc! { "address": { "city": "Oslo" } }, false)]
    fn matches_filters(#[case] filter: Document, #[case] expected: bool) {
        assert_eq!(DocumentMatcher::new(&stored()).matches(&filter), expected);
    }

    #[rstest]
    #[case::beyond_double_precision(doc! { "n": 9_007_199_254_740_993_i64 }, false)]
    #[case::exact(doc! { "n": 9_007_199_254_740_992_i64 }, true)]
    #[case::exact_double(doc! { "n": 9_007_199_254_740_992.0 }, true)]
    fn large_integers_compare_exactly(#[case] filter: Document, #[case] expected: bool) {
        let stored = doc! { "n": 9_007_199_254_740_992_i64 };

        assert_eq!(DocumentMatcher::new(&stored).matches(&filter), expected);
    }

    #[test]
    fn large_integers_are_distinct_keys() {
        let fields = vec!["n".to_string()];

        assert!(!same_key(
            &doc! { "n": 9_007_199_254_740_992_i64 },
            &doc! { "n": 9_007_199_254_740_993_i64 },
            &fields
        ));
        assert!(same_key(&doc! { "n": 7 }, &doc! { "n": 7_i64 }, &fields));
    }

    #[test]
    fn keys_collide_on_equal_values() {
        let fields = vec!["id".to_string()];

        assert!(same_key(&doc! { "id": "A1" }, &doc! { "id": "A1", "x": 1 }, &fields));
        assert!(!same_key(&doc! { "id": "A1" }, &doc! { "id": "A2" }, &fields));
        assert!(same_key(&doc! {}, &doc! { "id": Bson::Null }, &fields));
    }
}
