use serde::{Deserialize, Serialize};

/// Number of identifier values left unprocessed at each window boundary by
/// [`AdvancePolicy::LegacyGap`]. The stride formula in
/// [`AdvancePolicy::stride`] is the only place this enters the arithmetic.
pub const LEGACY_BOUNDARY_GAP: i64 = 1;

/// Inclusive identifier extrema of the record set, derived from the store
/// when a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRange {
    pub min: i64,
    pub max: i64,
}

impl IdentifierRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Half-open identifier interval `[lower, upper)` processed as one atomic
/// unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub lower: i64,
    pub upper: i64,
}

impl Window {
    /// Window of `batch_size` identifiers starting at `lower`. The upper
    /// bound saturates at `i64::MAX` instead of wrapping.
    pub fn starting_at(lower: i64, batch_size: u32) -> Self {
        let upper = lower
            .checked_add(i64::from(batch_size))
            .unwrap_or(i64::MAX);
        Self { lower, upper }
    }

    pub fn contains(&self, id: i64) -> bool {
        id >= self.lower && id < self.upper
    }
}

/// How the cursor moves from one window to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdvancePolicy {
    /// Advance by `batch_size + LEGACY_BOUNDARY_GAP`. The identifier sitting
    /// exactly at the previous window's exclusive upper bound is never
    /// covered by any window. Default, so existing runs keep their exact
    /// coverage.
    #[default]
    LegacyGap,
    /// Advance by `batch_size`: a true half-open partition with no gaps.
    Contiguous,
}

impl AdvancePolicy {
    pub fn stride(self, batch_size: u32) -> i64 {
        match self {
            AdvancePolicy::LegacyGap => i64::from(batch_size) + LEGACY_BOUNDARY_GAP,
            AdvancePolicy::Contiguous => i64::from(batch_size),
        }
    }
}
