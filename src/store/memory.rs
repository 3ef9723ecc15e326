use crate::store::{FieldValue, RowStore, StoreError};
use crate::transform::ValueTransform;
use crate::window::{IdentifierRange, Window};
use im::OrdMap;
use std::ops::Bound;

/// In-memory reference implementation of [`RowStore`].
///
/// Rows live in a persistent ordered map. A bulk update clones the committed
/// map into a staged copy and mutates that; `checkpoint` promotes the staged
/// map wholesale. Readers of the committed view therefore never observe a
/// half-applied window, and a failed update simply drops the stage.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    committed: OrdMap<i64, FieldValue>,
    staged: Option<OrdMap<i64, FieldValue>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(rows: impl IntoIterator<Item = (i64, FieldValue)>) -> Self {
        let mut store = Self::new();
        for (id, value) in rows {
            store.insert(id, value);
        }
        store
    }

    /// Inserts directly into the committed view; intended for seeding.
    pub fn insert(&mut self, id: i64, value: FieldValue) {
        self.committed.insert(id, value);
    }

    /// Committed view of one record's sensitive field.
    pub fn get(&self, id: i64) -> Option<&FieldValue> {
        self.committed.get(&id)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&i64, &FieldValue)> {
        self.committed.iter()
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }
}

impl RowStore for MemoryRowStore {
    fn identifier_bounds(&self) -> Result<Option<IdentifierRange>, StoreError> {
        Ok(
            match (self.committed.get_min(), self.committed.get_max()) {
                (Some((min, _)), Some((max, _))) => Some(IdentifierRange::new(*min, *max)),
                _ => None,
            },
        )
    }

    fn apply_window(
        &mut self,
        window: Window,
        transform: &dyn ValueTransform,
    ) -> Result<u64, StoreError> {
        let mut working = self
            .staged
            .take()
            .unwrap_or_else(|| self.committed.clone());

        let matched: Vec<(i64, FieldValue)> = working
            .range((Bound::Included(window.lower), Bound::Excluded(window.upper)))
            .map(|(id, value)| (*id, value.clone()))
            .collect();

        for (id, old) in &matched {
            match transform.apply(old) {
                Ok(new) => {
                    working.insert(*id, new);
                }
                // The stage was taken above and is dropped here, which rolls
                // the whole window back.
                Err(source) => return Err(StoreError::Transform { id: *id, source }),
            }
        }

        self.staged = Some(working);
        Ok(matched.len() as u64)
    }

    fn checkpoint(&mut self) -> Result<(), StoreError> {
        if let Some(staged) = self.staged.take() {
            self.committed = staged;
        }
        Ok(())
    }
}
