use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubErrorCode {
    InvalidConfig,
    TransformNotReapplySafe,
    Encode,
    Decode,
    RangeQuery,
    WindowUpdate,
    Checkpoint,
}

impl ScrubErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrubErrorCode::InvalidConfig => "invalid_config",
            ScrubErrorCode::TransformNotReapplySafe => "transform_not_reapply_safe",
            ScrubErrorCode::Encode => "encode",
            ScrubErrorCode::Decode => "decode",
            ScrubErrorCode::RangeQuery => "range_query_failed",
            ScrubErrorCode::WindowUpdate => "window_update_failed",
            ScrubErrorCode::Checkpoint => "checkpoint_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("transformer is not safe to reapply and the config requires reapply safety")]
    TransformNotReapplySafe,
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("identifier range query failed: {source}")]
    RangeQuery {
        #[source]
        source: StoreError,
    },
    #[error("bulk update failed for window at lower bound {lower_bound}: {source}")]
    WindowUpdate {
        lower_bound: i64,
        #[source]
        source: StoreError,
    },
    #[error("checkpoint failed for window at lower bound {lower_bound}: {source}")]
    Checkpoint {
        lower_bound: i64,
        #[source]
        source: StoreError,
    },
}

impl ScrubError {
    pub fn code(&self) -> ScrubErrorCode {
        match self {
            ScrubError::InvalidConfig { .. } => ScrubErrorCode::InvalidConfig,
            ScrubError::TransformNotReapplySafe => ScrubErrorCode::TransformNotReapplySafe,
            ScrubError::Encode(_) => ScrubErrorCode::Encode,
            ScrubError::Decode(_) => ScrubErrorCode::Decode,
            ScrubError::RangeQuery { .. } => ScrubErrorCode::RangeQuery,
            ScrubError::WindowUpdate { .. } => ScrubErrorCode::WindowUpdate,
            ScrubError::Checkpoint { .. } => ScrubErrorCode::Checkpoint,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }
}
