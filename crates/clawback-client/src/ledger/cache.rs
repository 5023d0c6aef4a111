use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ClientResult;
use crate::ledger::types::LedgerEntry;

/// Parameters of one ledger query. The ledger query has no filters, so the
/// database location is the whole key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerQuery {
    pub db_path: PathBuf,
}

impl LedgerQuery {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

pub trait LedgerSource {
    fn load(&self, query: &LedgerQuery) -> ClientResult<Vec<LedgerEntry>>;
}

/// Memoizes ledger snapshots per query until the caller invalidates them.
///
/// Snapshots are immutable and shared through `Arc`, so a reader holding an
/// old snapshot is unaffected by a later `invalidate`.
pub struct SnapshotCache<S: LedgerSource> {
    source: S,
    snapshots: HashMap<LedgerQuery, Arc<Vec<LedgerEntry>>>,
}

impl<S: LedgerSource> SnapshotCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshots: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, query: &LedgerQuery) -> ClientResult<Arc<Vec<LedgerEntry>>> {
        if let Some(snapshot) = self.snapshots.get(query) {
            log::debug!(
                "ledger cache hit for {} ({} entries)",
                query.db_path.display(),
                snapshot.len()
            );
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.source.load(query)?);
        log::debug!(
            "ledger cache miss for {}; loaded {} entries",
            query.db_path.display(),
            snapshot.len()
        );
        self.snapshots.insert(query.clone(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drops the snapshot for `query`. Returns whether one was cached.
    pub fn invalidate(&mut self, query: &LedgerQuery) -> bool {
        self.snapshots.remove(query).is_some()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use crate::ClientResult;
    use crate::ledger::cache::{LedgerQuery, LedgerSource, SnapshotCache};
    use crate::ledger::types::LedgerEntry;

    #[derive(Default)]
    struct CountingSource {
        loads: Cell<usize>,
    }

    impl LedgerSource for CountingSource {
        fn load(&self, _query: &LedgerQuery) -> ClientResult<Vec<LedgerEntry>> {
            self.loads.set(self.loads.get() + 1);
            Ok(vec![LedgerEntry {
                policy_id: self.loads.get() as i64,
                policy_number: "POL-1".to_string(),
                statement_date: "2024-01-01".to_string(),
                override_amount: 100.0,
            }])
        }
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let mut cache = SnapshotCache::new(CountingSource::default());
        let query = LedgerQuery::new("/tmp/a.db");

        let first = cache.get_or_load(&query);
        let second = cache.get_or_load(&query);
        assert!(first.is_ok() && second.is_ok());
        if let (Ok(first), Ok(second)) = (first, second) {
            assert!(Arc::ptr_eq(&first, &second));
        }
        assert_eq!(cache.source().loads.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_queries_are_cached_separately() {
        let mut cache = SnapshotCache::new(CountingSource::default());
        assert!(cache.get_or_load(&LedgerQuery::new("/tmp/a.db")).is_ok());
        assert!(cache.get_or_load(&LedgerQuery::new("/tmp/b.db")).is_ok());
        assert_eq!(cache.source().loads.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_forces_a_reload_and_keeps_old_snapshots_intact() {
        let mut cache = SnapshotCache::new(CountingSource::default());
        let query = LedgerQuery::new("/tmp/a.db");

        let before = cache.get_or_load(&query);
        assert!(cache.invalidate(&query));
        assert!(!cache.invalidate(&query));
        let after = cache.get_or_load(&query);

        assert!(before.is_ok() && after.is_ok());
        if let (Ok(before), Ok(after)) = (before, after) {
            assert_eq!(before[0].policy_id, 1);
            assert_eq!(after[0].policy_id, 2);
        }
    }

    #[test]
    fn clear_empties_every_snapshot() {
        let mut cache = SnapshotCache::new(CountingSource::default());
        assert!(cache.get_or_load(&LedgerQuery::new("/tmp/a.db")).is_ok());
        cache.clear();
        assert!(cache.is_empty());
    }
}
