use crate::store::FieldValue;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Prefix marking values this crate has already pseudonymized. Transformers
/// that emit it can recognize their own output on a re-run.
pub const PSEUDONYM_MARKER: &str = "scrubbed:";

/// Declared reapply behavior of a transformer.
///
/// The run never tracks which rows have already been transformed. Re-running
/// after a partial failure revisits committed rows, so reapply safety is a
/// contract the transformer carries, not something the run enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Idempotence {
    /// Applying the transformer to its own output returns that output.
    Idempotent,
    /// Reapplication produces a different value; re-runs double-transform.
    ReapplyUnsafe,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("unsupported value kind: {kind}")]
    Unsupported { kind: &'static str },
    #[error("{message}")]
    Custom { message: String },
}

/// The anonymization function applied to each matched field.
///
/// Invoked once per matched row during a bulk update; an error on any row
/// aborts the enclosing window.
pub trait ValueTransform: Send + Sync {
    fn apply(&self, value: &FieldValue) -> Result<FieldValue, TransformError>;

    fn idempotence(&self) -> Idempotence;
}

/// Replaces every non-null value with a fixed placeholder.
#[derive(Debug, Clone)]
pub struct FixedRedaction {
    replacement: String,
}

impl FixedRedaction {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }
}

impl ValueTransform for FixedRedaction {
    fn apply(&self, value: &FieldValue) -> Result<FieldValue, TransformError> {
        Ok(match value {
            FieldValue::Null => FieldValue::Null,
            FieldValue::Text(_) => FieldValue::Text(self.replacement.clone()),
        })
    }

    fn idempotence(&self) -> Idempotence {
        Idempotence::Idempotent
    }
}

/// Keyed pseudonymization: HMAC-SHA256 of the original value, rendered as
/// `scrubbed:<hex>`. Equal inputs map to equal pseudonyms, so joins on the
/// scrubbed column keep working. Values already carrying the marker pass
/// through unchanged, which makes re-runs over previously committed windows
/// safe.
#[derive(Clone)]
pub struct HmacPseudonym {
    key: Arc<Zeroizing<Vec<u8>>>,
}

impl HmacPseudonym {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key: Arc::new(Zeroizing::new(key)),
        }
    }
}

impl fmt::Debug for HmacPseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacPseudonym").finish_non_exhaustive()
    }
}

impl ValueTransform for HmacPseudonym {
    fn apply(&self, value: &FieldValue) -> Result<FieldValue, TransformError> {
        let text = match value {
            FieldValue::Null => return Ok(FieldValue::Null),
            FieldValue::Text(text) => text,
        };
        if text.starts_with(PSEUDONYM_MARKER) {
            return Ok(value.clone());
        }
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|e| {
            TransformError::Custom {
                message: format!("invalid pseudonym key: {e}"),
            }
        })?;
        mac.update(text.as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(FieldValue::Text(format!(
            "{PSEUDONYM_MARKER}{}",
            hex::encode(digest)
        )))
    }

    fn idempotence(&self) -> Idempotence {
        Idempotence::Idempotent
    }
}

/// Erases the field outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullErasure;

impl ValueTransform for NullErasure {
    fn apply(&self, _value: &FieldValue) -> Result<FieldValue, TransformError> {
        Ok(FieldValue::Null)
    }

    fn idempotence(&self) -> Idempotence {
        Idempotence::Idempotent
    }
}
