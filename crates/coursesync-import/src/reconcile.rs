//! Per-record reconciliation: look up, diff, decide, persist.
//!
//! Every record ends in exactly one [`Action`]:
//!
//! ```text
//! record ─► validate ──fail──► Errored ("Invalid Import Record")
//!              │
//!              ▼
//!       category ──fail──► Errored ("Category Not Found")
//!              │
//!              ▼
//!   find course by idnumber ──none──► create course + page ─► Created
//!              │
//!              ▼
//!   diff course, find/diff page ──no change──► Unchanged
//!              │
//!              ▼
//!   update course / add page / update page ─► Updated
//! ```
//!
//! Deciding is separated from persisting: [`plan`] only reads from the
//! backend, [`ReconciliationEngine::apply`] only writes.

use crate::category::CategoryResolver;
use crate::completion::CompletionWirer;
use crate::error::RecordError;
use crate::source::ImportOptions;
use crate::tracker::{Action, ImportOutcome};
use chrono::{DateTime, Utc};
use coursesync_core::{
    build_course, build_page, diff_course, diff_page, Backend, Course, CourseDelta, CourseSnapshot,
    ImportRecord, Page, PageDelta,
};

pub const STATUS_COURSE_CREATED: &str = "Course Created";
pub const STATUS_COURSE_UPDATED: &str = "Course Updated";
pub const STATUS_COURSE_NOT_UPDATED: &str = "Course Not Updated";
pub const STATUS_PAGE_ADDED: &str = "Page Activity Added";
pub const STATUS_PAGE_UPDATED: &str = "Page Activity Updated";

// ============================================================================
// Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CoursePlan {
    Create(Course),
    Update { merged: Course, delta: CourseDelta },
    Keep(Course),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    Add(Page),
    Update { merged: Page, delta: PageDelta },
    Keep,
}

/// What to do for one record, decided before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub course: CoursePlan,
    pub page: PagePlan,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        matches!(self.course, CoursePlan::Keep(_)) && matches!(self.page, PagePlan::Keep)
    }

    /// Diff explanations for the fields that will change.
    pub fn changes(&self) -> Vec<String> {
        let mut changes = Vec::new();
        if let CoursePlan::Update { delta, .. } = &self.course {
            changes.extend(delta.explain());
        }
        if let PagePlan::Update { delta, .. } = &self.page {
            changes.extend(delta.explain().into_iter().map(|c| format!("page {c}")));
        }
        changes
    }
}

/// Decide create / update / no-change for a built course and page.
pub fn plan<B: Backend + ?Sized>(
    backend: &B,
    course: Course,
    page: Page,
) -> Result<Plan, RecordError> {
    let Some(existing) = backend.find_course_by_idnumber(&course.idnumber)? else {
        return Ok(Plan {
            course: CoursePlan::Create(course),
            page: PagePlan::Add(page),
        });
    };

    let delta = diff_course(&existing, &course, |text| backend.normalize_rich_text(text));
    let course_id = existing.id;
    let course_plan = if delta.is_empty() {
        CoursePlan::Keep(existing)
    } else {
        let merged = delta.apply(&existing, &course);
        CoursePlan::Update { merged, delta }
    };

    let page_plan = match course_id {
        Some(id) => match backend.find_page(&page.name, id)? {
            Some(existing_page) => {
                let delta = diff_page(&existing_page, &page);
                if delta.is_empty() {
                    PagePlan::Keep
                } else {
                    let merged = delta.apply(&existing_page, &page);
                    PagePlan::Update { merged, delta }
                }
            }
            None => PagePlan::Add(Page {
                course: Some(id),
                ..page
            }),
        },
        None => PagePlan::Add(page),
    };

    Ok(Plan {
        course: course_plan,
        page: page_plan,
    })
}

// ============================================================================
// Engine
// ============================================================================

pub struct ReconciliationEngine {
    tag_delimiter: String,
    now: DateTime<Utc>,
    resolver: CategoryResolver,
    wirer: CompletionWirer,
}

impl ReconciliationEngine {
    pub fn new(options: &ImportOptions, now: DateTime<Utc>) -> Self {
        Self {
            tag_delimiter: options.tag_delimiter.clone(),
            now,
            resolver: CategoryResolver::new(),
            wirer: CompletionWirer::new(),
        }
    }

    /// Reconcile one record against the backend and report the outcome.
    ///
    /// Failures are contained in the returned outcome; writes made before a
    /// failure are kept.
    pub fn process<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        line: usize,
        record: &ImportRecord,
    ) -> ImportOutcome {
        match self.reconcile(backend, record) {
            Ok(outcome) => outcome.at(line),
            Err(err) => {
                tracing::warn!(line, idnumber = %record.course_idnumber, error = %err, "record failed");
                let course = match err {
                    RecordError::Validation(_) => None,
                    RecordError::Category(_) => Some(record_snapshot(record)),
                    // The course may have been saved before the failing write.
                    RecordError::Backend(_) => Some(
                        match backend.find_course_by_idnumber(&record.course_idnumber) {
                            Ok(Some(stored)) => stored.snapshot(),
                            _ => record_snapshot(record),
                        },
                    ),
                };
                ImportOutcome {
                    line,
                    success: false,
                    action: Action::Errored,
                    statuses: vec![err.status()],
                    course,
                    changes: Vec::new(),
                }
            }
        }
    }

    fn reconcile<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        record: &ImportRecord,
    ) -> Result<Applied, RecordError> {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            return Err(RecordError::Validation(missing));
        }

        let category = self.resolver.resolve_or_create(backend, record)?;
        let course = build_course(record, category, &self.tag_delimiter, self.now);
        let page = build_page(record);

        let plan = plan(backend, course, page)?;
        self.apply(backend, plan)
    }

    /// Persist a plan. Any page add or update is followed by completion
    /// wiring.
    pub fn apply<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        plan: Plan,
    ) -> Result<Applied, RecordError> {
        let changes = plan.changes();
        if !changes.is_empty() {
            tracing::debug!(?changes, "record differs from stored course");
        }

        let mut statuses = Vec::new();
        let (course, action) = match plan.course {
            CoursePlan::Create(course) => {
                let created = backend.create_course(&course)?;
                statuses.push(STATUS_COURSE_CREATED.to_string());
                (created, Action::Created)
            }
            CoursePlan::Update { merged, .. } => {
                backend.update_course(&merged)?;
                statuses.push(STATUS_COURSE_UPDATED.to_string());
                (merged, Action::Updated)
            }
            CoursePlan::Keep(existing) => {
                let action = if matches!(plan.page, PagePlan::Keep) {
                    Action::Unchanged
                } else {
                    Action::Updated
                };
                (existing, action)
            }
        };
        let course_id = course.id.ok_or_else(|| {
            coursesync_core::BackendError::Storage("course has no id after save".to_string())
        })?;

        match plan.page {
            PagePlan::Add(page) => {
                let page = Page {
                    course: Some(course_id),
                    ..page
                };
                let activity = backend.create_page_activity(&page)?;
                backend.link_module_idnumber(activity.module, &course.idnumber)?;
                self.wirer.wire(backend, course_id, activity.module)?;
                statuses.push(STATUS_PAGE_ADDED.to_string());
            }
            PagePlan::Update { merged, .. } => {
                backend.update_page_activity(&merged)?;
                if let Some(module) = merged.module {
                    backend.link_module_idnumber(module, &course.idnumber)?;
                    self.wirer.wire(backend, course_id, module)?;
                }
                statuses.push(STATUS_PAGE_UPDATED.to_string());
            }
            PagePlan::Keep => {}
        }

        if action == Action::Unchanged {
            statuses.push(STATUS_COURSE_NOT_UPDATED.to_string());
        }

        Ok(Applied {
            action,
            statuses,
            course: course.snapshot(),
            changes,
        })
    }
}

/// The persisted result of one record, before it is given a line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub action: Action,
    pub statuses: Vec<String>,
    pub course: CourseSnapshot,
    pub changes: Vec<String>,
}

impl Applied {
    fn at(self, line: usize) -> ImportOutcome {
        ImportOutcome {
            line,
            success: true,
            action: self.action,
            statuses: self.statuses,
            course: Some(self.course),
            changes: self.changes,
        }
    }
}

fn record_snapshot(record: &ImportRecord) -> CourseSnapshot {
    CourseSnapshot {
        id: None,
        shortname: record.course_shortname.clone(),
        fullname: record.course_fullname.clone(),
        idnumber: record.course_idnumber.clone(),
    }
}
