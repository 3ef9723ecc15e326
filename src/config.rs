use crate::error::ScrubError;
use crate::window::AdvancePolicy;
use serde::{Deserialize, Serialize};

/// Whether the identifier range is fixed at run start or tracks the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Derive `[min, max]` once before the first window. Rows inserted above
    /// the original maximum while the run executes are never visited.
    #[default]
    SnapshotBounded,
    /// Re-derive the maximum after every committed window, so the run chases
    /// a live-growing record set until the cursor catches up with it.
    FollowGrowth,
}

/// Runtime configuration for one scrub run.
#[derive(Debug, Clone)]
pub struct ScrubConfig {
    /// Identifiers per window. Bounds both memory footprint and the lock /
    /// transaction duration of a single checkpoint. Must be positive.
    pub batch_size: u32,
    pub advance_policy: AdvancePolicy,
    pub range_policy: RangePolicy,
    /// When set, a transformer that declares itself unsafe to reapply is
    /// rejected before any window is processed instead of merely warned
    /// about.
    pub require_reapply_safe: bool,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            advance_policy: AdvancePolicy::default(),
            range_policy: RangePolicy::default(),
            require_reapply_safe: false,
        }
    }
}

impl ScrubConfig {
    /// Legacy partitioning: boundary-gap advance, range snapshot taken
    /// once.
    pub fn legacy() -> Self {
        Self::default()
    }

    /// True half-open partition; every identifier in range is visited.
    pub fn full_coverage() -> Self {
        Self {
            advance_policy: AdvancePolicy::Contiguous,
            ..Self::default()
        }
    }

    /// Strictest profile: full coverage plus a hard requirement that the
    /// transformer is safe to reapply, so interrupted runs can always be
    /// re-invoked.
    pub fn compliance() -> Self {
        Self {
            advance_policy: AdvancePolicy::Contiguous,
            require_reapply_safe: true,
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_advance_policy(mut self, advance_policy: AdvancePolicy) -> Self {
        self.advance_policy = advance_policy;
        self
    }

    pub fn with_range_policy(mut self, range_policy: RangePolicy) -> Self {
        self.range_policy = range_policy;
        self
    }

    pub fn with_require_reapply_safe(mut self, require_reapply_safe: bool) -> Self {
        self.require_reapply_safe = require_reapply_safe;
        self
    }

    pub fn validate(&self) -> Result<(), ScrubError> {
        if self.batch_size == 0 {
            return Err(ScrubError::InvalidConfig {
                message: "batch_size must be positive".into(),
            });
        }
        Ok(())
    }
}
