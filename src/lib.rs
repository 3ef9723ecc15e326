pub mod config;
pub mod error;
#[cfg(test)]
mod lib_tests;
pub mod progress;
pub mod store;
pub mod transform;
pub mod window;

use crate::config::{RangePolicy, ScrubConfig};
use crate::error::ScrubError;
use crate::progress::{ProgressHook, ProgressRecord};
use crate::store::RowStore;
use crate::transform::{Idempotence, ValueTransform};
use crate::window::{IdentifierRange, Window};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrubReport {
    pub run_id: Uuid,
    pub windows_processed: u64,
    pub rows_affected: u64,
    /// Extrema derived at run start; `None` when the record set was empty.
    pub range: Option<IdentifierRange>,
    pub elapsed_micros: u64,
}

/// Drives an entire record set through a [`ValueTransform`] in bounded,
/// independently checkpointed windows.
///
/// Each window is one bulk update followed by one checkpoint; window N+1 is
/// never started before window N's checkpoint returns, which bounds peak
/// lock duration and in-flight row count to a single window regardless of
/// record-set size. A failure anywhere aborts the run and leaves completed
/// windows committed; re-invoking `run` re-derives the range from current
/// data and is safe whenever the transformer is safe to reapply.
pub struct Scrubber {
    config: ScrubConfig,
    transform: Arc<dyn ValueTransform>,
    progress_hooks: Vec<Arc<dyn ProgressHook>>,
}

impl Scrubber {
    /// Fails fast on an invalid config, before any store access.
    pub fn new(
        config: ScrubConfig,
        transform: Arc<dyn ValueTransform>,
    ) -> Result<Self, ScrubError> {
        config.validate()?;
        Ok(Self {
            config,
            transform,
            progress_hooks: Vec::new(),
        })
    }

    pub fn with_progress_hook(mut self, hook: Arc<dyn ProgressHook>) -> Self {
        self.progress_hooks.push(hook);
        self
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    /// Runs the full scrub: derive the identifier range, then update and
    /// checkpoint one window at a time until the cursor passes the maximum.
    ///
    /// All failures are fatal to the run; there is no retry and no
    /// skip-and-continue. Windows checkpointed before the failure stay
    /// committed, the failing window leaves no effect, later windows are
    /// untouched.
    pub fn run<S: RowStore>(&self, store: &mut S) -> Result<ScrubReport, ScrubError> {
        if self.transform.idempotence() == Idempotence::ReapplyUnsafe {
            if self.config.require_reapply_safe {
                return Err(ScrubError::TransformNotReapplySafe);
            }
            warn!(
                "transformer is not reapply-safe; re-running after a partial \
                 failure will double-transform already committed rows"
            );
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();

        let bounds = store
            .identifier_bounds()
            .map_err(|source| ScrubError::RangeQuery { source })?;
        let Some(range) = bounds else {
            info!(%run_id, "record set is empty; nothing to scrub");
            return Ok(ScrubReport {
                run_id,
                windows_processed: 0,
                rows_affected: 0,
                range: None,
                elapsed_micros: elapsed_micros(started),
            });
        };

        info!(
            %run_id,
            min_id = range.min,
            max_id = range.max,
            batch_size = self.config.batch_size,
            advance_policy = ?self.config.advance_policy,
            range_policy = ?self.config.range_policy,
            "starting scrub"
        );

        let stride = self.config.advance_policy.stride(self.config.batch_size);
        let mut lo = range.min;
        let mut hi = range.max;
        let mut windows_processed = 0u64;
        let mut rows_affected = 0u64;

        while lo <= hi {
            let window = Window::starting_at(lo, self.config.batch_size);
            let affected = store
                .apply_window(window, self.transform.as_ref())
                .map_err(|source| ScrubError::WindowUpdate {
                    lower_bound: lo,
                    source,
                })?;
            store
                .checkpoint()
                .map_err(|source| ScrubError::Checkpoint {
                    lower_bound: lo,
                    source,
                })?;

            windows_processed += 1;
            rows_affected += affected;
            let record = ProgressRecord {
                window_lower_bound: lo,
                rows_affected: affected,
            };
            info!(
                %run_id,
                window_lower_bound = record.window_lower_bound,
                rows_affected = record.rows_affected,
                "window committed"
            );
            self.emit(&record);

            if self.config.range_policy == RangePolicy::FollowGrowth {
                match store
                    .identifier_bounds()
                    .map_err(|source| ScrubError::RangeQuery { source })?
                {
                    Some(current) => hi = current.max,
                    None => break,
                }
            }

            match lo.checked_add(stride) {
                Some(next) => lo = next,
                None => break,
            }
        }

        let report = ScrubReport {
            run_id,
            windows_processed,
            rows_affected,
            range: Some(range),
            elapsed_micros: elapsed_micros(started),
        };
        info!(
            %run_id,
            windows_processed = report.windows_processed,
            rows_affected = report.rows_affected,
            elapsed_micros = report.elapsed_micros,
            "scrub complete"
        );
        Ok(report)
    }

    fn emit(&self, record: &ProgressRecord) {
        for hook in &self.progress_hooks {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.on_window(record)
            }))
            .is_err()
            {
                warn!("progress hook panicked while handling window report");
            }
        }
    }
}

fn elapsed_micros(started: Instant) -> u64 {
    started.elapsed().as_micros() as u64
}
