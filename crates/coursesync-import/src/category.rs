//! Category resolution with a per-run cache.

use crate::error::RecordError;
use coursesync_core::{Backend, BackendError, CategoryId, ImportRecord};
use std::collections::HashMap;

/// Resolves category references and creates missing record categories.
///
/// Resolved ids and "not found" misses are cached per `(idnumber, name)`
/// pair, so such a pair reaches the backend once per run. Backend failures
/// are not cached; the next record with that pair tries again.
#[derive(Debug, Default)]
pub struct CategoryResolver {
    cache: HashMap<(String, String), Result<CategoryId, RecordError>>,
}

impl CategoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a numeric id or a category idnumber to an existing category.
    pub fn resolve<B: Backend + ?Sized>(
        &self,
        backend: &B,
        reference: &str,
    ) -> Result<CategoryId, RecordError> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<CategoryId>() {
            return if backend.category_exists(id)? {
                Ok(id)
            } else {
                Err(RecordError::Category(reference.to_string()))
            };
        }
        backend
            .find_category_by_idnumber(reference)?
            .map(|c| c.id)
            .ok_or_else(|| RecordError::Category(reference.to_string()))
    }

    /// The category a record's course belongs in.
    ///
    /// A record without a category idnumber uses its default category. With
    /// one, an existing category is looked up by that idnumber; if none
    /// exists and the record names one, it is created under the record's
    /// default category.
    pub fn resolve_or_create<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        record: &ImportRecord,
    ) -> Result<CategoryId, RecordError> {
        let Some(idnumber) = record.category_idnumber() else {
            return Ok(record.category);
        };
        let name = record.category_name().unwrap_or_default();
        let key = (idnumber.to_string(), name.to_string());

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(idnumber, name, "category cache hit");
            return cached.clone();
        }

        let outcome = Self::lookup_or_create(backend, idnumber, name, record.category);
        if !matches!(outcome, Err(RecordError::Backend(_))) {
            self.cache.insert(key, outcome.clone());
        }
        outcome
    }

    fn lookup_or_create<B: Backend + ?Sized>(
        backend: &mut B,
        idnumber: &str,
        name: &str,
        parent: CategoryId,
    ) -> Result<CategoryId, RecordError> {
        if let Some(existing) = backend.find_category_by_idnumber(idnumber)? {
            return Ok(existing.id);
        }
        if name.is_empty() {
            return Err(RecordError::Category(idnumber.to_string()));
        }

        match backend.create_category(parent, name, idnumber) {
            Ok(created) => {
                tracing::info!(id = created.id, parent, idnumber, name, "category created");
                Ok(created.id)
            }
            Err(BackendError::NotFound { .. }) => Err(RecordError::Category(parent.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
