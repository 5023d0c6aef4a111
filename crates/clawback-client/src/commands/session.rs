use std::path::Path;

use crate::ClientResult;
use crate::commands::common::load_setup;
use crate::commands::import::{ImportRunOptions, run_with_options as run_import};
use crate::contracts::envelope::SuccessEnvelope;
use crate::ledger::cache::{LedgerQuery, LedgerSource, SnapshotCache};
use crate::ledger::pipeline::LedgerReport;
use crate::ledger::query::SqliteLedgerSource;
use crate::ledger::types::RangeRequest;
use crate::setup::SetupContext;

/// Holds ledger snapshots across report calls.
///
/// Nothing is refreshed behind the caller's back: a snapshot stays until
/// `invalidate`/`clear` is called, or until an import committed through
/// [`ReportSession::import`] drops it.
pub struct ReportSession<S: LedgerSource = SqliteLedgerSource> {
    cache: SnapshotCache<S>,
}

impl ReportSession<SqliteLedgerSource> {
    pub fn new() -> Self {
        Self::with_source(SqliteLedgerSource)
    }
}

impl Default for ReportSession<SqliteLedgerSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LedgerSource> ReportSession<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            cache: SnapshotCache::new(source),
        }
    }

    pub(crate) fn build_report(
        &mut self,
        setup: &SetupContext,
        range: &RangeRequest,
    ) -> ClientResult<LedgerReport> {
        let snapshot = self.cache.get_or_load(&LedgerQuery::new(setup.db_path()))?;
        Ok(LedgerReport::build(&snapshot, range))
    }

    /// Runs an import and, when it committed rows, drops the snapshot of the
    /// ledger it wrote to.
    pub fn import(&mut self, options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
        let home_override = options.home_override;
        let dry_run = options.dry_run;
        let envelope = run_import(options)?;
        if !dry_run {
            self.invalidate(home_override)?;
        }
        Ok(envelope)
    }

    /// Drops the cached snapshot for the ledger at `home_override` (or the
    /// default home). Returns whether anything was cached.
    pub fn invalidate(&mut self, home_override: Option<&Path>) -> ClientResult<bool> {
        let setup = load_setup(home_override)?;
        Ok(self.cache.invalidate(&LedgerQuery::new(setup.db_path())))
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_snapshots(&self) -> usize {
        self.cache.len()
    }
}
