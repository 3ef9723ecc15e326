use crate::config::{RangePolicy, ScrubConfig};
use crate::error::ScrubErrorCode;
use crate::progress::{MemoryProgress, ProgressHook, ProgressRecord};
use crate::store::memory::MemoryRowStore;
use crate::store::{FieldValue, RowStore, StoreError};
use crate::transform::{
    FixedRedaction, Idempotence, TransformError, ValueTransform,
};
use crate::window::{IdentifierRange, Window};
use crate::Scrubber;
use std::sync::Arc;

fn email(id: i64) -> FieldValue {
    FieldValue::Text(format!("user-{id}@example.com"))
}

fn seeded(ids: impl IntoIterator<Item = i64>) -> MemoryRowStore {
    MemoryRowStore::seeded(ids.into_iter().map(|id| (id, email(id))))
}

fn redacting_scrubber(config: ScrubConfig) -> (Scrubber, Arc<MemoryProgress>) {
    let progress = Arc::new(MemoryProgress::new());
    let scrubber = Scrubber::new(config, Arc::new(FixedRedaction::new("[redacted]")))
        .expect("valid config")
        .with_progress_hook(progress.clone());
    (scrubber, progress)
}

struct RehashEachTime;

impl ValueTransform for RehashEachTime {
    fn apply(&self, value: &FieldValue) -> Result<FieldValue, TransformError> {
        Ok(match value {
            FieldValue::Null => FieldValue::Null,
            FieldValue::Text(text) => FieldValue::Text(format!("{text}+")),
        })
    }

    fn idempotence(&self) -> Idempotence {
        Idempotence::ReapplyUnsafe
    }
}

/// Inserts one extra committed row right after the first checkpoint, to
/// model a record set growing while the run executes.
struct GrowingStore {
    inner: MemoryRowStore,
    pending: Option<(i64, FieldValue)>,
}

impl GrowingStore {
    fn new(inner: MemoryRowStore, id: i64, value: FieldValue) -> Self {
        Self {
            inner,
            pending: Some((id, value)),
        }
    }
}

impl RowStore for GrowingStore {
    fn identifier_bounds(&self) -> Result<Option<IdentifierRange>, StoreError> {
        self.inner.identifier_bounds()
    }

    fn apply_window(
        &mut self,
        window: Window,
        transform: &dyn ValueTransform,
    ) -> Result<u64, StoreError> {
        self.inner.apply_window(window, transform)
    }

    fn checkpoint(&mut self) -> Result<(), StoreError> {
        self.inner.checkpoint()?;
        if let Some((id, value)) = self.pending.take() {
            self.inner.insert(id, value);
        }
        Ok(())
    }
}

#[test]
fn empty_record_set_is_a_successful_noop() {
    let (scrubber, progress) = redacting_scrubber(ScrubConfig::default());
    let mut store = MemoryRowStore::new();

    let report = scrubber.run(&mut store).expect("empty run");
    assert_eq!(report.windows_processed, 0);
    assert_eq!(report.rows_affected, 0);
    assert_eq!(report.range, None);
    assert!(progress.snapshot().is_empty());
}

#[test]
fn single_record_yields_one_window_with_one_row() {
    let (scrubber, progress) = redacting_scrubber(ScrubConfig::default());
    let mut store = seeded([7]);

    let report = scrubber.run(&mut store).expect("run");
    assert_eq!(report.windows_processed, 1);
    assert_eq!(report.rows_affected, 1);
    assert_eq!(report.range, Some(IdentifierRange::new(7, 7)));
    assert_eq!(
        progress.snapshot(),
        vec![ProgressRecord {
            window_lower_bound: 7,
            rows_affected: 1
        }]
    );
    assert_eq!(store.get(7), Some(&FieldValue::Text("[redacted]".into())));
}

#[test]
fn legacy_advance_window_arithmetic() {
    let (scrubber, progress) =
        redacting_scrubber(ScrubConfig::default().with_batch_size(1000));
    let mut store = seeded(1..=2500);

    let report = scrubber.run(&mut store).expect("run");

    let records = progress.snapshot();
    let lower_bounds: Vec<i64> = records.iter().map(|r| r.window_lower_bound).collect();
    let affected: Vec<u64> = records.iter().map(|r| r.rows_affected).collect();
    assert_eq!(lower_bounds, vec![1, 1002, 2003]);
    assert_eq!(affected, vec![1000, 1000, 498]);

    assert_eq!(report.windows_processed, 3);
    assert_eq!(report.rows_affected, 2498);
    assert_eq!(
        report.rows_affected,
        records.iter().map(|r| r.rows_affected).sum::<u64>(),
        "report total must equal the sum of progress records"
    );
}

#[test]
fn boundary_identifiers_are_never_visited_under_legacy_advance() {
    let (scrubber, _) = redacting_scrubber(ScrubConfig::default().with_batch_size(1000));
    let mut store = seeded(1..=2500);

    scrubber.run(&mut store).expect("run");

    // 1001 and 2002 sit exactly at the exclusive upper bounds of the first
    // two windows; the +1 advance never revisits them.
    assert_eq!(store.get(1001), Some(&email(1001)));
    assert_eq!(store.get(2002), Some(&email(2002)));
    for id in [1, 1000, 1002, 2001, 2003, 2500] {
        assert_eq!(
            store.get(id),
            Some(&FieldValue::Text("[redacted]".into())),
            "identifier {id} must have been transformed"
        );
    }
}

#[test]
fn contiguous_policy_covers_every_identifier() {
    let (scrubber, progress) =
        redacting_scrubber(ScrubConfig::full_coverage().with_batch_size(1000));
    let mut store = seeded(1..=2500);

    let report = scrubber.run(&mut store).expect("run");

    let lower_bounds: Vec<i64> = progress
        .snapshot()
        .iter()
        .map(|r| r.window_lower_bound)
        .collect();
    assert_eq!(lower_bounds, vec![1, 1001, 2001]);
    assert_eq!(report.rows_affected, 2500);
    for (id, value) in store.rows() {
        assert_eq!(
            value,
            &FieldValue::Text("[redacted]".into()),
            "identifier {id} must have been transformed"
        );
    }
}

#[test]
fn rerun_with_idempotent_transform_is_stable() {
    let (scrubber, _) = redacting_scrubber(ScrubConfig::default().with_batch_size(100));
    let mut store = seeded(1..=450);

    scrubber.run(&mut store).expect("first run");
    let after_first: Vec<(i64, FieldValue)> =
        store.rows().map(|(id, v)| (*id, v.clone())).collect();

    scrubber.run(&mut store).expect("second run");
    let after_second: Vec<(i64, FieldValue)> =
        store.rows().map(|(id, v)| (*id, v.clone())).collect();

    assert_eq!(after_first, after_second);
}

#[test]
fn reapply_unsafe_transformer_is_rejected_when_required() {
    let scrubber = Scrubber::new(
        ScrubConfig::default().with_require_reapply_safe(true),
        Arc::new(RehashEachTime),
    )
    .expect("config itself is valid");
    let mut store = seeded([1, 2, 3]);

    let err = scrubber
        .run(&mut store)
        .expect_err("unsafe transformer must be rejected");
    assert_eq!(err.code(), ScrubErrorCode::TransformNotReapplySafe);
    assert_eq!(store.get(1), Some(&email(1)), "store must be untouched");
}

#[test]
fn reapply_unsafe_transformer_is_tolerated_by_default() {
    let scrubber =
        Scrubber::new(ScrubConfig::default(), Arc::new(RehashEachTime)).expect("valid");
    let mut store = seeded([1, 2, 3]);

    let report = scrubber.run(&mut store).expect("run proceeds with warning");
    assert_eq!(report.rows_affected, 3);
}

#[test]
fn zero_batch_size_fails_before_any_store_access() {
    let err = Scrubber::new(
        ScrubConfig::default().with_batch_size(0),
        Arc::new(FixedRedaction::new("x")),
    )
    .err()
    .expect("zero batch size must be rejected at construction");
    assert_eq!(err.code(), ScrubErrorCode::InvalidConfig);
}

#[test]
fn progress_reports_zero_for_gap_windows() {
    let (scrubber, progress) =
        redacting_scrubber(ScrubConfig::default().with_batch_size(1000));
    let mut store = seeded((1..=10).chain(5000..=5004));

    let report = scrubber.run(&mut store).expect("run");

    let records = progress.snapshot();
    let lower_bounds: Vec<i64> = records.iter().map(|r| r.window_lower_bound).collect();
    let affected: Vec<u64> = records.iter().map(|r| r.rows_affected).collect();
    assert_eq!(lower_bounds, vec![1, 1002, 2003, 3004, 4005]);
    assert_eq!(affected, vec![10, 0, 0, 0, 5]);
    assert_eq!(report.rows_affected, 15);
}

#[test]
fn snapshot_bounded_run_ignores_rows_inserted_above_the_original_max() {
    let (scrubber, _) = redacting_scrubber(ScrubConfig::default().with_batch_size(5));
    let mut store = GrowingStore::new(seeded(1..=10), 100, email(100));

    let report = scrubber.run(&mut store).expect("run");

    assert_eq!(report.windows_processed, 2);
    assert_eq!(
        store.inner.get(100),
        Some(&email(100)),
        "late row above the snapshot max must not be visited"
    );
}

#[test]
fn follow_growth_run_chases_rows_inserted_above_the_original_max() {
    let (scrubber, _) = redacting_scrubber(
        ScrubConfig::default()
            .with_batch_size(5)
            .with_range_policy(RangePolicy::FollowGrowth),
    );
    let mut store = GrowingStore::new(seeded(1..=10), 100, email(100));

    let report = scrubber.run(&mut store).expect("run");

    assert_eq!(
        store.inner.get(100),
        Some(&FieldValue::Text("[redacted]".into())),
        "late row must be caught once the maximum is re-derived"
    );
    // Boundary identifier 6 is still skipped by the legacy advance.
    assert_eq!(store.inner.get(6), Some(&email(6)));
    assert_eq!(report.rows_affected, 10);
}

#[test]
fn panicking_progress_hook_does_not_abort_the_run() {
    struct PanickyHook;

    impl ProgressHook for PanickyHook {
        fn on_window(&self, _record: &ProgressRecord) {
            panic!("hook blew up");
        }
    }

    let progress = Arc::new(MemoryProgress::new());
    let scrubber = Scrubber::new(
        ScrubConfig::default().with_batch_size(10),
        Arc::new(FixedRedaction::new("[redacted]")),
    )
    .expect("valid config")
    .with_progress_hook(Arc::new(PanickyHook))
    .with_progress_hook(progress.clone());
    let mut store = seeded(1..=25);

    let report = scrubber.run(&mut store).expect("run survives hook panic");
    assert_eq!(report.windows_processed, 3);
    assert_eq!(
        progress.snapshot().len(),
        3,
        "later hooks must still receive every record"
    );
}
