//! Coursesync reference storage
//!
//! A complete in-memory implementation of the [`Backend`] port:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     MemoryBackend                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  categories   idnumber unique (when set)                 │
//! │  courses      idnumber unique, summary normalized        │
//! │  pages ◄────► modules   (one module per page instance)   │
//! │  criteria     one per (course, module)                   │
//! │  aggregation  one per (course, criteria type)            │
//! └──────────────────────────────────────────────────────────┘
//!                      │ snapshot::save / load
//!                      ▼
//!                 store.json
//! ```
//!
//! It enforces the same uniqueness rules a real host does, so a pipeline bug
//! that would double-create an entity surfaces as a `Conflict` instead of a
//! silent duplicate.

pub mod snapshot;

#[cfg(test)]
mod tests;

use coursesync_core::{
    AggregationRule, Backend, BackendError, Category, CategoryId, CompletionCriterion, Course,
    CourseId, CreatedActivity, CriteriaType, ModuleId, Page, PageId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use snapshot::SnapshotError;

/// Name of the category every fresh site starts with.
pub const DEFAULT_CATEGORY_NAME: &str = "Miscellaneous";

/// An activity module hosting one page instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityModule {
    pub id: ModuleId,
    pub course: CourseId,
    pub module_type: String,
    pub instance: PageId,
    pub idnumber: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    category: u64,
    course: u64,
    page: u64,
    module: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Everything the store holds; this is also the snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    categories: BTreeMap<CategoryId, Category>,
    courses: BTreeMap<CourseId, Course>,
    pages: BTreeMap<PageId, Page>,
    modules: BTreeMap<ModuleId, ActivityModule>,
    criteria: Vec<CompletionCriterion>,
    aggregations: Vec<AggregationRule>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: StoreState,
}

impl MemoryBackend {
    /// A site with only the default category.
    pub fn new() -> Self {
        let mut backend = Self::empty();
        let id = next(&mut backend.state.sequences.category);
        backend.state.categories.insert(
            id,
            Category {
                id,
                idnumber: None,
                name: DEFAULT_CATEGORY_NAME.to_string(),
                parent: None,
            },
        );
        backend
    }

    /// A site with no categories at all.
    pub fn empty() -> Self {
        Self {
            state: StoreState::default(),
        }
    }

    pub fn from_state(state: StoreState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.state.categories.values()
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.state.courses.values()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.state.pages.values()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ActivityModule> {
        self.state.modules.values()
    }

    pub fn criteria(&self) -> &[CompletionCriterion] {
        &self.state.criteria
    }

    pub fn aggregation_rules(&self) -> &[AggregationRule] {
        &self.state.aggregations
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.state.courses.get(&id)
    }

    pub fn module(&self, id: ModuleId) -> Option<&ActivityModule> {
        self.state.modules.get(&id)
    }

    /// Pages attached to a course.
    pub fn pages_of(&self, course: CourseId) -> Vec<&Page> {
        self.state
            .pages
            .values()
            .filter(|p| p.course == Some(course))
            .collect()
    }

    fn course_with_idnumber(&self, idnumber: &str) -> Option<&Course> {
        self.state
            .courses
            .values()
            .find(|c| c.idnumber == idnumber)
    }

    fn saved_course(&self, course: &Course, id: CourseId) -> Course {
        let mut saved = course.clone();
        saved.id = Some(id);
        saved.summary = self.normalize_rich_text(&course.summary);
        saved
    }
}

impl Backend for MemoryBackend {
    fn category_exists(&self, id: CategoryId) -> Result<bool, BackendError> {
        Ok(self.state.categories.contains_key(&id))
    }

    fn find_category_by_idnumber(&self, idnumber: &str) -> Result<Option<Category>, BackendError> {
        Ok(self
            .state
            .categories
            .values()
            .find(|c| c.idnumber.as_deref() == Some(idnumber))
            .cloned())
    }

    fn default_category(&self) -> Result<Option<CategoryId>, BackendError> {
        Ok(self.state.categories.keys().next().copied())
    }

    fn create_category(
        &mut self,
        parent: CategoryId,
        name: &str,
        idnumber: &str,
    ) -> Result<Category, BackendError> {
        if !self.state.categories.contains_key(&parent) {
            return Err(BackendError::not_found("category", parent));
        }
        if !idnumber.is_empty() && self.find_category_by_idnumber(idnumber)?.is_some() {
            return Err(BackendError::Conflict(format!(
                "category idnumber '{idnumber}' already exists"
            )));
        }

        let id = next(&mut self.state.sequences.category);
        let category = Category {
            id,
            idnumber: (!idnumber.is_empty()).then(|| idnumber.to_string()),
            name: name.to_string(),
            parent: Some(parent),
        };
        self.state.categories.insert(id, category.clone());
        tracing::debug!(id, parent, name, idnumber, "category created");
        Ok(category)
    }

    fn find_course_by_idnumber(&self, idnumber: &str) -> Result<Option<Course>, BackendError> {
        Ok(self.course_with_idnumber(idnumber).cloned())
    }

    fn create_course(&mut self, course: &Course) -> Result<Course, BackendError> {
        if !self.state.categories.contains_key(&course.category) {
            return Err(BackendError::not_found("category", course.category));
        }
        if self.course_with_idnumber(&course.idnumber).is_some() {
            return Err(BackendError::Conflict(format!(
                "course idnumber '{}' already exists",
                course.idnumber
            )));
        }

        let id = next(&mut self.state.sequences.course);
        let saved = self.saved_course(course, id);
        self.state.courses.insert(id, saved.clone());
        tracing::debug!(id, idnumber = %saved.idnumber, "course created");
        Ok(saved)
    }

    fn update_course(&mut self, course: &Course) -> Result<(), BackendError> {
        let id = course
            .id
            .ok_or_else(|| BackendError::Storage("course has no id".to_string()))?;
        if !self.state.courses.contains_key(&id) {
            return Err(BackendError::not_found("course", id));
        }
        if !self.state.categories.contains_key(&course.category) {
            return Err(BackendError::not_found("category", course.category));
        }
        if let Some(other) = self.course_with_idnumber(&course.idnumber) {
            if other.id != Some(id) {
                return Err(BackendError::Conflict(format!(
                    "course idnumber '{}' already exists",
                    course.idnumber
                )));
            }
        }

        let saved = self.saved_course(course, id);
        self.state.courses.insert(id, saved);
        tracing::debug!(id, "course updated");
        Ok(())
    }

    fn find_page(&self, name: &str, course: CourseId) -> Result<Option<Page>, BackendError> {
        Ok(self
            .state
            .pages
            .values()
            .find(|p| p.course == Some(course) && p.name == name)
            .cloned())
    }

    fn create_page_activity(&mut self, page: &Page) -> Result<CreatedActivity, BackendError> {
        let course = page
            .course
            .ok_or_else(|| BackendError::Storage("page has no course".to_string()))?;
        if !self.state.courses.contains_key(&course) {
            return Err(BackendError::not_found("course", course));
        }
        if self.find_page(&page.name, course)?.is_some() {
            return Err(BackendError::Conflict(format!(
                "page '{}' already exists in course {course}",
                page.name
            )));
        }

        let page_id = next(&mut self.state.sequences.page);
        let module_id = next(&mut self.state.sequences.module);

        let mut saved = page.clone();
        saved.id = Some(page_id);
        saved.module = Some(module_id);
        self.state.pages.insert(page_id, saved);
        self.state.modules.insert(
            module_id,
            ActivityModule {
                id: module_id,
                course,
                module_type: "page".to_string(),
                instance: page_id,
                idnumber: None,
            },
        );
        tracing::debug!(page = page_id, module = module_id, course, "page activity created");

        Ok(CreatedActivity {
            page: page_id,
            module: module_id,
        })
    }

    fn update_page_activity(&mut self, page: &Page) -> Result<(), BackendError> {
        let id = page
            .id
            .ok_or_else(|| BackendError::Storage("page has no id".to_string()))?;
        let stored = self
            .state
            .pages
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("page", id))?;
        stored.name = page.name.clone();
        stored.intro = page.intro.clone();
        stored.content = page.content.clone();
        stored.content_format = page.content_format;
        stored.display = page.display.clone();
        tracing::debug!(id, "page activity updated");
        Ok(())
    }

    fn link_module_idnumber(&mut self, module: ModuleId, idnumber: &str) -> Result<(), BackendError> {
        let stored = self
            .state
            .modules
            .get_mut(&module)
            .ok_or_else(|| BackendError::not_found("module", module))?;
        stored.idnumber = Some(idnumber.to_string());
        Ok(())
    }

    fn find_completion_criterion(
        &self,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Option<CompletionCriterion>, BackendError> {
        Ok(self
            .state
            .criteria
            .iter()
            .find(|c| c.course == course && c.module == module)
            .cloned())
    }

    fn save_completion_criterion(
        &mut self,
        criterion: &CompletionCriterion,
    ) -> Result<(), BackendError> {
        if self
            .find_completion_criterion(criterion.course, criterion.module)?
            .is_some()
        {
            return Err(BackendError::Conflict(format!(
                "completion criterion for module {} already exists",
                criterion.module
            )));
        }
        self.state.criteria.push(criterion.clone());
        Ok(())
    }

    fn find_aggregation_rule(
        &self,
        course: CourseId,
        criteria_type: CriteriaType,
    ) -> Result<Option<AggregationRule>, BackendError> {
        Ok(self
            .state
            .aggregations
            .iter()
            .find(|a| a.course == course && a.criteria_type == criteria_type)
            .cloned())
    }

    /// Insert or replace the rule for `(course, criteria_type)`.
    fn save_aggregation_rule(&mut self, rule: &AggregationRule) -> Result<(), BackendError> {
        match self
            .state
            .aggregations
            .iter_mut()
            .find(|a| a.course == rule.course && a.criteria_type == rule.criteria_type)
        {
            Some(existing) => existing.method = rule.method,
            None => self.state.aggregations.push(rule.clone()),
        }
        Ok(())
    }
}
