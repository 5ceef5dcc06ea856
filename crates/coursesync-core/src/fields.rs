//! Semantic import fields and the column mapping that locates them in a row.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of semantic fields an import row carries.
pub const REQUIRED_FIELD_COUNT: usize = 11;

/// One semantic column of the import file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportField {
    CourseIdnumber,
    CourseShortname,
    CourseFullname,
    CourseSummary,
    CourseTags,
    CourseVisible,
    CourseCategoryIdnumber,
    CourseCategoryName,
    PageName,
    PageIntro,
    PageContent,
}

impl ImportField {
    /// All fields, in default positional order.
    pub const ALL: [ImportField; REQUIRED_FIELD_COUNT] = [
        Self::CourseIdnumber,
        Self::CourseShortname,
        Self::CourseFullname,
        Self::CourseSummary,
        Self::CourseTags,
        Self::CourseVisible,
        Self::CourseCategoryIdnumber,
        Self::CourseCategoryName,
        Self::PageName,
        Self::PageIntro,
        Self::PageContent,
    ];

    /// Header label expected in the source file.
    pub fn header(&self) -> &'static str {
        match self {
            Self::CourseIdnumber => "COURSE_IDNUMBER",
            Self::CourseShortname => "COURSE_SHORTNAME",
            Self::CourseFullname => "COURSE_FULLNAME",
            Self::CourseSummary => "COURSE_SUMMARY",
            Self::CourseTags => "COURSE_TAGS",
            Self::CourseVisible => "COURSE_VISIBLE",
            Self::CourseCategoryIdnumber => "COURSE_CATEGORYIDNUMBER",
            Self::CourseCategoryName => "COURSE_CATEGORYNAME",
            Self::PageName => "PAGE_NAME",
            Self::PageIntro => "PAGE_INTRO",
            Self::PageContent => "PAGE_CONTENT",
        }
    }

    /// Snake-case key used in mapping files and structured output.
    pub fn key(&self) -> &'static str {
        match self {
            Self::CourseIdnumber => "course_idnumber",
            Self::CourseShortname => "course_shortname",
            Self::CourseFullname => "course_fullname",
            Self::CourseSummary => "course_summary",
            Self::CourseTags => "course_tags",
            Self::CourseVisible => "course_visible",
            Self::CourseCategoryIdnumber => "course_categoryidnumber",
            Self::CourseCategoryName => "course_categoryname",
            Self::PageName => "page_name",
            Self::PageIntro => "page_intro",
            Self::PageContent => "page_content",
        }
    }

    /// Position of the field in the default layout.
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Parse a mapping key (`course_idnumber`) or header label (`COURSE_IDNUMBER`).
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.key() == s || f.header().eq_ignore_ascii_case(s))
    }

    /// Header labels of every field, in default positional order.
    pub fn required_headers() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.header()).collect()
    }
}

impl std::fmt::Display for ImportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where each semantic field lives in a raw row.
///
/// `None` means the field is not present in the source and reads as an empty
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: [Option<usize>; REQUIRED_FIELD_COUNT],
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::positional()
    }
}

impl ColumnMapping {
    /// Field `n` is read from column `n`.
    pub fn positional() -> Self {
        let mut columns = [None; REQUIRED_FIELD_COUNT];
        for (i, slot) in columns.iter_mut().enumerate() {
            *slot = Some(i);
        }
        Self { columns }
    }

    /// No field mapped; every value reads empty.
    pub fn empty() -> Self {
        Self {
            columns: [None; REQUIRED_FIELD_COUNT],
        }
    }

    /// Build from one index per field in default order, as a mapping form
    /// submits them. Negative indices mean "none".
    pub fn from_indices(indices: [i64; REQUIRED_FIELD_COUNT]) -> Self {
        let mut columns = [None; REQUIRED_FIELD_COUNT];
        for (slot, idx) in columns.iter_mut().zip(indices) {
            *slot = usize::try_from(idx).ok();
        }
        Self { columns }
    }

    /// Build from a `field key -> column index` table. Unknown keys are
    /// reported back; fields missing from the table are unmapped.
    pub fn from_keyed(table: &BTreeMap<String, i64>) -> Result<Self, String> {
        let mut mapping = Self::empty();
        for (key, idx) in table {
            let field = ImportField::from_key(key)
                .ok_or_else(|| format!("unknown import field '{key}'"))?;
            mapping.set(field, usize::try_from(*idx).ok());
        }
        Ok(mapping)
    }

    pub fn set(&mut self, field: ImportField, column: Option<usize>) -> &mut Self {
        self.columns[field.position()] = column;
        self
    }

    pub fn column(&self, field: ImportField) -> Option<usize> {
        self.columns[field.position()]
    }

    /// Read a field out of a raw row. Unmapped or out-of-range columns read
    /// as an empty string.
    pub fn value<'r>(&self, row: &'r [String], field: ImportField) -> &'r str {
        self.column(field)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// `(field, column)` pairs in default field order.
    pub fn entries(&self) -> impl Iterator<Item = (ImportField, Option<usize>)> + '_ {
        ImportField::ALL.iter().map(|f| (*f, self.column(*f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn positional_mapping_reads_columns_in_order() {
        let mapping = ColumnMapping::positional();
        let r = row(&["C1", "S1", "F1", "sum", "a|b", "1", "cat", "Cat", "P1", "i", "c"]);
        assert_eq!(mapping.value(&r, ImportField::CourseIdnumber), "C1");
        assert_eq!(mapping.value(&r, ImportField::CourseTags), "a|b");
        assert_eq!(mapping.value(&r, ImportField::PageContent), "c");
    }

    #[test]
    fn negative_index_means_absent() {
        let mut indices = [0i64, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        indices[3] = -1;
        let mapping = ColumnMapping::from_indices(indices);
        assert_eq!(mapping.column(ImportField::CourseSummary), None);

        let r = row(&["C1", "S1", "F1", "ignored"]);
        assert_eq!(mapping.value(&r, ImportField::CourseSummary), "");
    }

    #[test]
    fn out_of_range_column_reads_empty() {
        let mapping = ColumnMapping::positional();
        let r = row(&["C1", "S1"]);
        assert_eq!(mapping.value(&r, ImportField::PageName), "");
    }

    #[test]
    fn keyed_mapping_accepts_keys_and_headers() {
        let mut table = BTreeMap::new();
        table.insert("course_idnumber".to_string(), 4);
        table.insert("PAGE_NAME".to_string(), 0);
        table.insert("course_summary".to_string(), -1);
        let mapping = ColumnMapping::from_keyed(&table).unwrap();
        assert_eq!(mapping.column(ImportField::CourseIdnumber), Some(4));
        assert_eq!(mapping.column(ImportField::PageName), Some(0));
        assert_eq!(mapping.column(ImportField::CourseSummary), None);
        assert_eq!(mapping.column(ImportField::CourseShortname), None);
    }

    #[test]
    fn keyed_mapping_rejects_unknown_field() {
        let mut table = BTreeMap::new();
        table.insert("course_colour".to_string(), 1);
        let err = ColumnMapping::from_keyed(&table).unwrap_err();
        assert!(err.contains("course_colour"));
    }

    #[test]
    fn required_headers_follow_default_order() {
        let headers = ImportField::required_headers();
        assert_eq!(headers.len(), REQUIRED_FIELD_COUNT);
        assert_eq!(headers[0], "COURSE_IDNUMBER");
        assert_eq!(headers[10], "PAGE_CONTENT");
    }
}
