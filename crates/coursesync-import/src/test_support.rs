//! A backend that fails selected writes a set number of times.

use coursesync_core::{
    AggregationRule, Backend, BackendError, Category, CategoryId, CompletionCriterion, Course,
    CourseId, CreatedActivity, CriteriaType, ModuleId, Page,
};
use coursesync_storage::MemoryBackend;
use std::collections::HashMap;

pub struct FlakyBackend {
    pub inner: MemoryBackend,
    failures: HashMap<&'static str, usize>,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            failures: HashMap::new(),
        }
    }

    /// Make the next `times` calls of `op` fail with a storage error.
    pub fn fail(&mut self, op: &'static str, times: usize) {
        self.failures.insert(op, times);
    }

    fn trip(&mut self, op: &'static str) -> Result<(), BackendError> {
        match self.failures.get_mut(op) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(BackendError::Storage(format!("{op} unavailable")))
            }
            _ => Ok(()),
        }
    }
}

impl Backend for FlakyBackend {
    fn category_exists(&self, id: CategoryId) -> Result<bool, BackendError> {
        self.inner.category_exists(id)
    }

    fn find_category_by_idnumber(&self, idnumber: &str) -> Result<Option<Category>, BackendError> {
        self.inner.find_category_by_idnumber(idnumber)
    }

    fn default_category(&self) -> Result<Option<CategoryId>, BackendError> {
        self.inner.default_category()
    }

    fn create_category(
        &mut self,
        parent: CategoryId,
        name: &str,
        idnumber: &str,
    ) -> Result<Category, BackendError> {
        self.trip("create_category")?;
        self.inner.create_category(parent, name, idnumber)
    }

    fn find_course_by_idnumber(&self, idnumber: &str) -> Result<Option<Course>, BackendError> {
        self.inner.find_course_by_idnumber(idnumber)
    }

    fn create_course(&mut self, course: &Course) -> Result<Course, BackendError> {
        self.trip("create_course")?;
        self.inner.create_course(course)
    }

    fn update_course(&mut self, course: &Course) -> Result<(), BackendError> {
        self.trip("update_course")?;
        self.inner.update_course(course)
    }

    fn find_page(&self, name: &str, course: CourseId) -> Result<Option<Page>, BackendError> {
        self.inner.find_page(name, course)
    }

    fn create_page_activity(&mut self, page: &Page) -> Result<CreatedActivity, BackendError> {
        self.trip("create_page_activity")?;
        self.inner.create_page_activity(page)
    }

    fn update_page_activity(&mut self, page: &Page) -> Result<(), BackendError> {
        self.trip("update_page_activity")?;
        self.inner.update_page_activity(page)
    }

    fn link_module_idnumber(&mut self, module: ModuleId, idnumber: &str) -> Result<(), BackendError> {
        self.inner.link_module_idnumber(module, idnumber)
    }

    fn find_completion_criterion(
        &self,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Option<CompletionCriterion>, BackendError> {
        self.inner.find_completion_criterion(course, module)
    }

    fn save_completion_criterion(
        &mut self,
        criterion: &CompletionCriterion,
    ) -> Result<(), BackendError> {
        self.inner.save_completion_criterion(criterion)
    }

    fn find_aggregation_rule(
        &self,
        course: CourseId,
        criteria_type: CriteriaType,
    ) -> Result<Option<AggregationRule>, BackendError> {
        self.inner.find_aggregation_rule(course, criteria_type)
    }

    fn save_aggregation_rule(&mut self, rule: &AggregationRule) -> Result<(), BackendError> {
        self.inner.save_aggregation_rule(rule)
    }
}
