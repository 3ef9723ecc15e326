pub mod memory;

use crate::transform::{TransformError, ValueTransform};
use crate::window::{IdentifierRange, Window};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The sensitive field as the store holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Null,
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "Text",
            FieldValue::Null => "Null",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            FieldValue::Null => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    #[error("transform failed for identifier {id}: {source}")]
    Transform {
        id: i64,
        #[source]
        source: TransformError,
    },
}

/// Contract the record store must satisfy to be driven by a scrub run.
///
/// Records are keyed by a totally ordered `i64` identifier and carry one
/// sensitive [`FieldValue`]. The run never creates or destroys records, it
/// only rewrites the sensitive field in place.
pub trait RowStore: Send {
    /// Minimum and maximum identifiers currently present, `None` when the
    /// record set is empty.
    fn identifier_bounds(&self) -> Result<Option<IdentifierRange>, StoreError>;

    /// Applies `transform` to the sensitive field of every record whose
    /// identifier lies in `window`, staged as a single unit of work. Returns
    /// the number of rows touched, which may be zero when the window spans
    /// an identifier gap. On error the staged window must be discarded
    /// entirely; no partial effect may survive.
    fn apply_window(
        &mut self,
        window: Window,
        transform: &dyn ValueTransform,
    ) -> Result<u64, StoreError>;

    /// Makes the staged window durable and atomic. After a successful
    /// return the window's effect is irreversible within the run; on error
    /// none of it may be observable.
    fn checkpoint(&mut self) -> Result<(), StoreError>;
}
