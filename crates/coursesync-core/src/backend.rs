//! The persistence port.
//!
//! The import pipeline never touches a database directly. Everything it
//! needs from the host platform (categories, courses, page activities and
//! completion rules) goes through [`Backend`], which callers inject.
//!
//! All calls are synchronous; a run drives one backend from one thread.

use crate::model::{
    AggregationRule, Category, CategoryId, CompletionCriterion, Course, CourseId, CriteriaType,
    ModuleId, Page, PageId,
};
use crate::richtext::normalize_html;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BackendError {
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Ids assigned when a page activity is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedActivity {
    pub page: PageId,
    pub module: ModuleId,
}

pub trait Backend {
    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    fn category_exists(&self, id: CategoryId) -> Result<bool, BackendError>;

    /// Exact-match lookup on the category's symbolic id.
    fn find_category_by_idnumber(&self, idnumber: &str) -> Result<Option<Category>, BackendError>;

    /// The category used when the caller names none (first on the site).
    fn default_category(&self) -> Result<Option<CategoryId>, BackendError>;

    fn create_category(
        &mut self,
        parent: CategoryId,
        name: &str,
        idnumber: &str,
    ) -> Result<Category, BackendError>;

    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    /// Exact-match lookup on the course business key. Tags are returned as
    /// stored and the summary in its saved (normalized) form.
    fn find_course_by_idnumber(&self, idnumber: &str) -> Result<Option<Course>, BackendError>;

    /// Create a course and return it with its storage id assigned.
    fn create_course(&mut self, course: &Course) -> Result<Course, BackendError>;

    fn update_course(&mut self, course: &Course) -> Result<(), BackendError>;

    // ------------------------------------------------------------------
    // Page activities
    // ------------------------------------------------------------------

    fn find_page(&self, name: &str, course: CourseId) -> Result<Option<Page>, BackendError>;

    /// Create the page instance and the activity module that hosts it.
    fn create_page_activity(&mut self, page: &Page) -> Result<CreatedActivity, BackendError>;

    fn update_page_activity(&mut self, page: &Page) -> Result<(), BackendError>;

    /// Bind a business idnumber to an activity module.
    fn link_module_idnumber(&mut self, module: ModuleId, idnumber: &str) -> Result<(), BackendError>;

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    fn find_completion_criterion(
        &self,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Option<CompletionCriterion>, BackendError>;

    fn save_completion_criterion(
        &mut self,
        criterion: &CompletionCriterion,
    ) -> Result<(), BackendError>;

    fn find_aggregation_rule(
        &self,
        course: CourseId,
        criteria_type: CriteriaType,
    ) -> Result<Option<AggregationRule>, BackendError>;

    fn save_aggregation_rule(&mut self, rule: &AggregationRule) -> Result<(), BackendError>;

    // ------------------------------------------------------------------
    // Rich text
    // ------------------------------------------------------------------

    /// The transform applied to rich-text fields on write. Implementations
    /// that override it must use the same function when saving.
    fn normalize_rich_text(&self, text: &str) -> String {
        normalize_html(text)
    }
}
