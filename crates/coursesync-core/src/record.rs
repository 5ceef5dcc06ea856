//! One parsed import row and its mandatory-field validation.

use crate::fields::{ColumnMapping, ImportField};
use crate::model::CategoryId;
use serde::{Deserialize, Serialize};

/// Fields that must be non-blank for a record to be imported.
pub const MANDATORY_FIELDS: [ImportField; 6] = [
    ImportField::CourseIdnumber,
    ImportField::CourseShortname,
    ImportField::CourseFullname,
    ImportField::PageName,
    ImportField::PageIntro,
    ImportField::PageContent,
];

/// A raw import row mapped onto semantic fields.
///
/// `category` is the import-level default category, already resolved during
/// the load phase. Records whose own category columns are blank land there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub course_idnumber: String,
    pub course_shortname: String,
    pub course_fullname: String,
    pub course_summary: String,
    pub course_tags: String,
    pub course_visible: String,
    pub course_categoryidnumber: String,
    pub course_categoryname: String,
    pub page_name: String,
    pub page_intro: String,
    pub page_content: String,
    pub category: CategoryId,
}

impl ImportRecord {
    pub fn from_row(row: &[String], mapping: &ColumnMapping, category: CategoryId) -> Self {
        let get = |field| mapping.value(row, field).to_string();
        Self {
            course_idnumber: get(ImportField::CourseIdnumber),
            course_shortname: get(ImportField::CourseShortname),
            course_fullname: get(ImportField::CourseFullname),
            course_summary: get(ImportField::CourseSummary),
            course_tags: get(ImportField::CourseTags),
            course_visible: get(ImportField::CourseVisible),
            course_categoryidnumber: get(ImportField::CourseCategoryIdnumber),
            course_categoryname: get(ImportField::CourseCategoryName),
            page_name: get(ImportField::PageName),
            page_intro: get(ImportField::PageIntro),
            page_content: get(ImportField::PageContent),
            category,
        }
    }

    pub fn field(&self, field: ImportField) -> &str {
        match field {
            ImportField::CourseIdnumber => &self.course_idnumber,
            ImportField::CourseShortname => &self.course_shortname,
            ImportField::CourseFullname => &self.course_fullname,
            ImportField::CourseSummary => &self.course_summary,
            ImportField::CourseTags => &self.course_tags,
            ImportField::CourseVisible => &self.course_visible,
            ImportField::CourseCategoryIdnumber => &self.course_categoryidnumber,
            ImportField::CourseCategoryName => &self.course_categoryname,
            ImportField::PageName => &self.page_name,
            ImportField::PageIntro => &self.page_intro,
            ImportField::PageContent => &self.page_content,
        }
    }

    /// Mandatory fields that are blank after trimming.
    pub fn missing_fields(&self) -> Vec<ImportField> {
        MANDATORY_FIELDS
            .iter()
            .copied()
            .filter(|f| self.field(*f).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Symbolic category id supplied by the row, if any.
    pub fn category_idnumber(&self) -> Option<&str> {
        non_blank(&self.course_categoryidnumber)
    }

    /// Category name supplied by the row, if any.
    pub fn category_name(&self) -> Option<&str> {
        non_blank(&self.course_categoryname)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
