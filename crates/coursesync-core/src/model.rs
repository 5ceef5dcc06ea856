//! Target entities: categories, courses, pages and completion rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type CategoryId = u64;
pub type CourseId = u64;
pub type PageId = u64;
pub type ModuleId = u64;

/// Text storage format for rich-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Plain,
    #[default]
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub idnumber: Option<String>,
    pub name: String,
    pub parent: Option<CategoryId>,
}

/// Fixed structural settings of an imported course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLayout {
    pub format: String,
    pub activity_type: String,
    pub num_sections: u32,
    pub news_items: u32,
    pub show_grades: bool,
    pub show_reports: bool,
    pub enable_completion: bool,
}

impl Default for CourseLayout {
    fn default() -> Self {
        Self {
            format: "singleactivity".to_string(),
            activity_type: "page".to_string(),
            num_sections: 0,
            news_items: 0,
            show_grades: false,
            show_reports: false,
            enable_completion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Storage id; `None` until the backend has created the course.
    pub id: Option<CourseId>,
    pub idnumber: String,
    pub shortname: String,
    pub fullname: String,
    pub summary: String,
    pub summary_format: TextFormat,
    pub visible: bool,
    pub tags: BTreeSet<String>,
    pub category: CategoryId,
    pub layout: CourseLayout,
    pub start_date: DateTime<Utc>,
}

impl Course {
    pub fn snapshot(&self) -> CourseSnapshot {
        CourseSnapshot {
            id: self.id,
            shortname: self.shortname.clone(),
            fullname: self.fullname.clone(),
            idnumber: self.idnumber.clone(),
        }
    }
}

/// The columns a result line reports about a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSnapshot {
    pub id: Option<CourseId>,
    pub shortname: String,
    pub fullname: String,
    pub idnumber: String,
}

/// Display flags of a page activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDisplay {
    pub print_intro: bool,
    pub print_heading: bool,
    pub completion_view: bool,
}

impl Default for PageDisplay {
    fn default() -> Self {
        Self {
            print_intro: false,
            print_heading: true,
            completion_view: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: Option<PageId>,
    /// Owning course; set once the course exists.
    pub course: Option<CourseId>,
    /// Activity module backing this page.
    pub module: Option<ModuleId>,
    pub name: String,
    pub intro: String,
    pub content: String,
    pub content_format: TextFormat,
    pub display: PageDisplay,
}

/// Criteria type families a course completion aggregation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
    Activity,
    Course,
    Role,
    /// Overall aggregation, not tied to a criteria type.
    Overall,
}

impl CriteriaType {
    pub const ALL: [CriteriaType; 4] = [Self::Activity, Self::Course, Self::Role, Self::Overall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Course => "course",
            Self::Role => "role",
            Self::Overall => "overall",
        }
    }
}

impl std::fmt::Display for CriteriaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    All,
    Any,
}

/// "Course is complete when this activity is complete."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCriterion {
    pub course: CourseId,
    pub module: ModuleId,
    pub module_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRule {
    pub course: CourseId,
    pub criteria_type: CriteriaType,
    pub method: AggregationMethod,
}
