//! The two-phase import driver.
//!
//! `load` tokenizes and validates the source and resolves the default
//! category without writing anything. `execute` then reconciles every record
//! in file order, exactly once.

use crate::category::CategoryResolver;
use crate::error::{ImportError, RecordError};
use crate::reconcile::ReconciliationEngine;
use crate::source::{ImportOptions, SourceTable};
use crate::tracker::{ImportOutcome, OutputSink, ResultTracker, RunSummary};
use chrono::{DateTime, Utc};
use coursesync_core::{Backend, CategoryId, ColumnMapping, ImportRecord, REQUIRED_FIELD_COUNT};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Everything an executed import produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// SHA-256 of the source bytes, hex encoded.
    pub import_id: String,
    pub outcomes: Vec<ImportOutcome>,
    pub summary: RunSummary,
}

pub struct ImportOrchestrator<'b, B: Backend + ?Sized> {
    backend: &'b mut B,
    options: ImportOptions,
    headers: Vec<String>,
    records: Vec<ImportRecord>,
    default_category: CategoryId,
    import_id: String,
    executed: bool,
}

impl<'b, B: Backend + ?Sized> ImportOrchestrator<'b, B> {
    /// Load phase. Fails before any backend write if the source cannot be
    /// tokenized, the header is too short, the default category does not
    /// resolve, or there are no data rows.
    pub fn load(
        backend: &'b mut B,
        source: &[u8],
        options: ImportOptions,
        mapping: Option<ColumnMapping>,
    ) -> Result<Self, ImportError> {
        let table = SourceTable::parse(source, &options)?;
        if table.headers.len() < REQUIRED_FIELD_COUNT {
            return Err(ImportError::HeaderMismatch {
                found: table.headers.len(),
                required: REQUIRED_FIELD_COUNT,
            });
        }

        let default_category = resolve_default_category(&*backend, &options)?;

        let mapping = mapping.unwrap_or_default();
        let records: Vec<ImportRecord> = table
            .rows
            .iter()
            .map(|row| ImportRecord::from_row(row, &mapping, default_category))
            .collect();
        if records.is_empty() {
            return Err(ImportError::NoRecords);
        }

        let import_id = digest_hex(source);
        tracing::info!(
            import_id = %import_id,
            records = records.len(),
            default_category,
            delimiter = %options.delimiter,
            "import loaded"
        );

        Ok(Self {
            backend,
            options,
            headers: table.headers,
            records,
            default_category,
            import_id,
            executed: false,
        })
    }

    /// Header row as found in the source.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn default_category(&self) -> CategoryId {
        self.default_category
    }

    pub fn import_id(&self) -> &str {
        &self.import_id
    }

    pub fn backend(&self) -> &B {
        &*self.backend
    }

    /// Execute phase. Can run once; a second call is an
    /// [`ImportError::IllegalState`].
    pub fn execute(&mut self, sink: &mut dyn OutputSink) -> Result<ImportReport, ImportError> {
        self.execute_at(sink, Utc::now())
    }

    /// [`Self::execute`] with an explicit import time for new course start
    /// dates.
    pub fn execute_at(
        &mut self,
        sink: &mut dyn OutputSink,
        now: DateTime<Utc>,
    ) -> Result<ImportReport, ImportError> {
        if self.executed {
            return Err(ImportError::IllegalState("import has already been executed"));
        }
        self.executed = true;

        let mut engine = ReconciliationEngine::new(&self.options, now);
        let mut tracker = ResultTracker::new(sink);
        tracker.start();

        for (idx, record) in self.records.iter().enumerate() {
            let outcome = engine.process(&mut *self.backend, idx + 1, record);
            tracker.output(outcome);
        }

        let (outcomes, summary) = tracker.finish();
        tracing::info!(
            import_id = %self.import_id,
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            errors = summary.errors,
            "import finished"
        );

        Ok(ImportReport {
            import_id: self.import_id.clone(),
            outcomes,
            summary,
        })
    }
}

fn resolve_default_category<B: Backend + ?Sized>(
    backend: &B,
    options: &ImportOptions,
) -> Result<CategoryId, ImportError> {
    match options.default_category.as_deref().map(str::trim) {
        Some(reference) if !reference.is_empty() => CategoryResolver::new()
            .resolve(backend, reference)
            .map_err(|err| match err {
                RecordError::Backend(e) => ImportError::Backend(e),
                other => ImportError::CategoryResolution(other.to_string()),
            }),
        _ => backend.default_category()?.ok_or_else(|| {
            ImportError::CategoryResolution("backend has no default category".to_string())
        }),
    }
}

fn digest_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
