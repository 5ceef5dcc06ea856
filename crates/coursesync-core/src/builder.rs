//! Turn validated import records into target `Course` / `Page` values.

use crate::model::{CategoryId, Course, CourseLayout, Page, PageDisplay, TextFormat};
use crate::record::ImportRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Separator between tags inside the `COURSE_TAGS` cell.
pub const DEFAULT_TAG_DELIMITER: &str = "|";

/// Split a delimited tag cell into a tag set. Tags are trimmed and blanks
/// dropped, so `""` and `" | "` both give an empty set.
pub fn split_tags(raw: &str, delimiter: &str) -> BTreeSet<String> {
    if raw.trim().is_empty() {
        return BTreeSet::new();
    }
    let delimiter = if delimiter.is_empty() {
        DEFAULT_TAG_DELIMITER
    } else {
        delimiter
    };
    raw.split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret the `COURSE_VISIBLE` cell.
///
/// Only explicit "off" spellings hide a course; a blank cell keeps the course
/// visible.
pub fn parse_visible(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "n" | "off" | "hidden"
    )
}

pub fn build_course(
    record: &ImportRecord,
    category: CategoryId,
    tag_delimiter: &str,
    now: DateTime<Utc>,
) -> Course {
    Course {
        id: None,
        idnumber: record.course_idnumber.clone(),
        shortname: record.course_shortname.clone(),
        fullname: record.course_fullname.clone(),
        summary: record.course_summary.clone(),
        summary_format: TextFormat::Html,
        visible: parse_visible(&record.course_visible),
        tags: split_tags(&record.course_tags, tag_delimiter),
        category,
        layout: CourseLayout::default(),
        start_date: now,
    }
}

pub fn build_page(record: &ImportRecord) -> Page {
    Page {
        id: None,
        course: None,
        module: None,
        name: record.page_name.clone(),
        intro: record.page_intro.clone(),
        content: record.page_content.clone(),
        content_format: TextFormat::Html,
        display: PageDisplay::default(),
    }
}
