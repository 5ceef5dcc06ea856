//! Coursesync core
//!
//! Types and pure logic for importing "course + single page" rows into a
//! course backend:
//!
//! ```text
//! raw row ──► ColumnMapping ──► ImportRecord ──► validate
//!                                    │
//!                                    ▼
//!                    build_course / build_page
//!                                    │
//!                                    ▼
//!          existing entity ──► diff_course / diff_page ──► delta
//! ```
//!
//! Nothing in this crate performs I/O. The host platform is reached only
//! through the [`Backend`] port, which the import crate drives.

pub mod backend;
pub mod builder;
pub mod diff;
pub mod fields;
pub mod model;
pub mod record;
pub mod richtext;

pub use backend::{Backend, BackendError, CreatedActivity};
pub use builder::{build_course, build_page, parse_visible, split_tags, DEFAULT_TAG_DELIMITER};
pub use diff::{diff_course, diff_page, CourseDelta, CourseField, PageDelta, PageField};
pub use fields::{ColumnMapping, ImportField, REQUIRED_FIELD_COUNT};
pub use model::{
    AggregationMethod, AggregationRule, Category, CategoryId, CompletionCriterion, Course,
    CourseId, CourseLayout, CourseSnapshot, CriteriaType, ModuleId, Page, PageDisplay, PageId,
    TextFormat,
};
pub use record::ImportRecord;
