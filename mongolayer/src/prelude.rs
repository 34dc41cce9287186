//! Convenient re-exports of commonly used types from mongolayer.
//!
//! ```ignore
//! use mongolayer::prelude::*;
//! ```

pub use mongolayer_core::{
    backend::{ConnectionBuilder, ConnectionProvider, StoreBackend, UpdateOutcome},
    client::DataClient,
    error::{ClientError, ClientResult},
    filter::{Coercion, FilterBuilder},
    index::{IndexDescriptor, IndexKey, IndexOrder},
    normalize::{FieldMap, FieldNormalizer},
    record::{Field, FieldValue, IntoFieldValue, Record, Serialized},
    settings::Settings,
};
pub use mongolayer_macros::Record;
