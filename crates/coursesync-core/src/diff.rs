//! Field-level diffs between an existing entity and its imported form.
//!
//! Diffing is pure: both sides are borrowed immutably and the result is an
//! explicit delta. Merging is a separate step that builds a new value from
//! the existing one plus the changed fields.

use crate::model::{Course, Page};
use serde::{Deserialize, Serialize};

/// Course attributes that take part in reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseField {
    Fullname,
    Shortname,
    Idnumber,
    Summary,
    Visible,
    Tags,
    Category,
}

impl CourseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fullname => "fullname",
            Self::Shortname => "shortname",
            Self::Idnumber => "idnumber",
            Self::Summary => "summary",
            Self::Visible => "visible",
            Self::Tags => "tags",
            Self::Category => "category",
        }
    }
}

impl std::fmt::Display for CourseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDelta {
    pub changed: Vec<CourseField>,
}

impl CourseDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn contains(&self, field: CourseField) -> bool {
        self.changed.contains(&field)
    }

    /// One line per changed field, e.g. `"fullname is different"`.
    pub fn explain(&self) -> Vec<String> {
        self.changed
            .iter()
            .map(|f| format!("{f} is different"))
            .collect()
    }

    /// `existing` with every changed field taken from `imported`.
    ///
    /// Storage id, layout and start date always stay those of `existing`.
    pub fn apply(&self, existing: &Course, imported: &Course) -> Course {
        let mut merged = existing.clone();
        for field in &self.changed {
            match field {
                CourseField::Fullname => merged.fullname = imported.fullname.clone(),
                CourseField::Shortname => merged.shortname = imported.shortname.clone(),
                CourseField::Idnumber => merged.idnumber = imported.idnumber.clone(),
                CourseField::Summary => {
                    merged.summary = imported.summary.clone();
                    merged.summary_format = imported.summary_format;
                }
                CourseField::Visible => merged.visible = imported.visible,
                CourseField::Tags => merged.tags = imported.tags.clone(),
                CourseField::Category => merged.category = imported.category,
            }
        }
        merged
    }
}

/// Compare an existing course with its imported form.
///
/// `normalize` must be the rich-text transform the store applies to
/// `summary` on write; it is applied to the imported summary only, since the
/// existing one is already in stored form. Tags are sets, so ordering never
/// registers as a change.
pub fn diff_course<F>(existing: &Course, imported: &Course, normalize: F) -> CourseDelta
where
    F: Fn(&str) -> String,
{
    let mut changed = Vec::new();

    if existing.fullname != imported.fullname {
        changed.push(CourseField::Fullname);
    }
    if existing.shortname != imported.shortname {
        changed.push(CourseField::Shortname);
    }
    if existing.idnumber != imported.idnumber {
        changed.push(CourseField::Idnumber);
    }
    if existing.summary != normalize(&imported.summary) {
        changed.push(CourseField::Summary);
    }
    if existing.visible != imported.visible {
        changed.push(CourseField::Visible);
    }
    if existing.tags != imported.tags {
        changed.push(CourseField::Tags);
    }
    if existing.category != imported.category {
        changed.push(CourseField::Category);
    }

    CourseDelta { changed }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageField {
    Name,
    Intro,
    Content,
}

impl PageField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Intro => "intro",
            Self::Content => "content",
        }
    }
}

impl std::fmt::Display for PageField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDelta {
    pub changed: Vec<PageField>,
}

impl PageDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn explain(&self) -> Vec<String> {
        self.changed
            .iter()
            .map(|f| format!("{f} is different"))
            .collect()
    }

    /// `existing` with every changed field taken from `imported`. Ids, module
    /// and display flags stay those of `existing`.
    pub fn apply(&self, existing: &Page, imported: &Page) -> Page {
        let mut merged = existing.clone();
        for field in &self.changed {
            match field {
                PageField::Name => merged.name = imported.name.clone(),
                PageField::Intro => merged.intro = imported.intro.clone(),
                PageField::Content => merged.content = imported.content.clone(),
            }
        }
        merged
    }
}

pub fn diff_page(existing: &Page, imported: &Page) -> PageDelta {
    let mut changed = Vec::new();
    if existing.name != imported.name {
        changed.push(PageField::Name);
    }
    if existing.intro != imported.intro {
        changed.push(PageField::Intro);
    }
    if existing.content != imported.content {
        changed.push(PageField::Content);
    }
    PageDelta { changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseLayout, PageDisplay, TextFormat};
    use crate::richtext::normalize_html;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn course(fullname: &str, tags: &[&str]) -> Course {
        Course {
            id: Some(42),
            idnumber: "C1".to_string(),
            shortname: "S1".to_string(),
            fullname: fullname.to_string(),
            summary: "<p>Summary</p>".to_string(),
            summary_format: TextFormat::Html,
            visible: true,
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            category: 1,
            layout: CourseLayout::default(),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn page(intro: &str) -> Page {
        Page {
            id: Some(5),
            course: Some(42),
            module: Some(77),
            name: "P1".to_string(),
            intro: intro.to_string(),
            content: "body".to_string(),
            content_format: TextFormat::Html,
            display: PageDisplay::default(),
        }
    }

    #[test]
    fn identical_course_has_empty_delta() {
        let a = course("F1", &["x", "y"]);
        let mut b = course("F1", &["y", "x"]);
        b.id = None;
        b.start_date = Utc::now();
        assert!(diff_course(&a, &b, normalize_html).is_empty());
    }

    #[test]
    fn changed_fullname_is_reported_and_merged() {
        let existing = course("F1", &["x"]);
        let imported = course("F2", &["x"]);
        let delta = diff_course(&existing, &imported, normalize_html);
        assert_eq!(delta.changed, vec![CourseField::Fullname]);
        assert_eq!(delta.explain(), vec!["fullname is different".to_string()]);

        let merged = delta.apply(&existing, &imported);
        assert_eq!(merged.fullname, "F2");
        assert_eq!(merged.id, Some(42));
        assert_eq!(merged.start_date, existing.start_date);
    }

    #[test]
    fn summary_compared_after_normalization() {
        let existing = course("F1", &[]);
        let mut imported = course("F1", &[]);
        imported.summary = "  <p>Summary</p>\r\n".to_string();
        assert!(diff_course(&existing, &imported, normalize_html).is_empty());

        imported.summary = "<p>Other</p>".to_string();
        let delta = diff_course(&existing, &imported, normalize_html);
        assert!(delta.contains(CourseField::Summary));
    }

    #[test]
    fn tag_set_change_is_detected() {
        let existing = course("F1", &["x", "y"]);
        let imported = course("F1", &["x", "z"]);
        let delta = diff_course(&existing, &imported, normalize_html);
        assert_eq!(delta.changed, vec![CourseField::Tags]);
        let merged = delta.apply(&existing, &imported);
        assert!(merged.tags.contains("z"));
    }

    #[test]
    fn several_fields_change_together() {
        let existing = course("F1", &[]);
        let mut imported = course("F1", &[]);
        imported.visible = false;
        imported.category = 9;
        imported.shortname = "S2".to_string();
        let delta = diff_course(&existing, &imported, normalize_html);
        assert_eq!(
            delta.changed,
            vec![CourseField::Shortname, CourseField::Visible, CourseField::Category]
        );
        let merged = delta.apply(&existing, &imported);
        assert!(!merged.visible);
        assert_eq!(merged.category, 9);
        assert_eq!(merged.shortname, "S2");
        assert_eq!(merged.fullname, "F1");
    }

    #[test]
    fn page_diff_and_merge_keep_ids() {
        let existing = page("old intro");
        let mut imported = page("new intro");
        imported.id = None;
        imported.module = None;
        let delta = diff_page(&existing, &imported);
        assert_eq!(delta.changed, vec![PageField::Intro]);
        let merged = delta.apply(&existing, &imported);
        assert_eq!(merged.intro, "new intro");
        assert_eq!(merged.id, Some(5));
        assert_eq!(merged.module, Some(77));
    }

    #[test]
    fn unchanged_page_has_empty_delta() {
        assert!(diff_page(&page("i"), &page("i")).is_empty());
    }
}
