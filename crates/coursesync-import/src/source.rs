//! Source decoding, tokenizing and run options.

use crate::error::ImportError;
use coursesync_core::DEFAULT_TAG_DELIMITER;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Delimiter
// ============================================================================

/// Field separator of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    #[serde(alias = "cfg")]
    Comma,
    Semicolon,
    Colon,
    Tab,
}

impl Delimiter {
    pub const NAMES: [&'static str; 5] = ["comma", "semicolon", "colon", "tab", "cfg"];

    pub fn byte(&self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Colon => b':',
            Self::Tab => b'\t',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Comma => "comma",
            Self::Semicolon => "semicolon",
            Self::Colon => "colon",
            Self::Tab => "tab",
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "cfg" is the site-configured default, which is a comma.
            "comma" | "cfg" | "," => Ok(Self::Comma),
            "semicolon" | ";" => Ok(Self::Semicolon),
            "colon" | ":" => Ok(Self::Colon),
            "tab" => Ok(Self::Tab),
            other => Err(format!(
                "unknown delimiter '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Options
// ============================================================================

/// Settings of one import run.
///
/// Serializable so the CLI can read a base configuration from JSON and
/// override it with flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub delimiter: Delimiter,
    /// Encoding label of the source (`UTF-8`, `ISO-8859-1`, `windows-1252`, ...).
    pub encoding: String,
    /// Separator inside the `COURSE_TAGS` cell.
    pub tag_delimiter: String,
    /// Default category as a numeric id or a category idnumber. `None` uses
    /// the backend's default category.
    pub default_category: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            encoding: "UTF-8".to_string(),
            tag_delimiter: DEFAULT_TAG_DELIMITER.to_string(),
            default_category: None,
        }
    }
}

/// Resolve an encoding label. A blank label means UTF-8.
pub fn encoding_for(label: &str) -> Result<&'static Encoding, ImportError> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(encoding_rs::UTF_8);
    }
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ImportError::UnsupportedEncoding(label.to_string()))
}

pub fn check_encoding(label: &str) -> Result<(), ImportError> {
    encoding_for(label).map(|_| ())
}

/// Decode raw source bytes to UTF-8 text, dropping a leading BOM.
pub fn decode(bytes: &[u8], label: &str) -> Result<String, ImportError> {
    let encoding = encoding_for(label)?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(ImportError::InvalidFormat(format!(
            "source is not valid {}",
            encoding.name()
        )));
    }
    tracing::debug!(encoding = encoding.name(), bytes = bytes.len(), "source decoded");
    Ok(text.into_owned())
}

// ============================================================================
// Tokenizing
// ============================================================================

/// A tokenized source: the header row and the data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Decode and tokenize `bytes` with the options' encoding and delimiter.
    pub fn parse(bytes: &[u8], options: &ImportOptions) -> Result<Self, ImportError> {
        let text = decode(bytes, &options.encoding)?;
        tokenize(&text, options.delimiter)
    }
}

/// Split delimited text into a header row and data rows.
///
/// Quoted fields follow the usual CSV rules. Rows may be ragged; a short row
/// reads its missing cells as empty through the column mapping.
pub fn tokenize(text: &str, delimiter: Delimiter) -> Result<SourceTable, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::InvalidFormat("source is empty".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ImportError::InvalidFormat(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| row_error(&e, idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SourceTable { headers, rows })
}

/// Name the file line of a bad row. Quoted cells may span lines, so the
/// reader's position is preferred over the record index.
fn row_error(err: &csv::Error, idx: usize) -> ImportError {
    let line = err
        .position()
        .map(|pos| pos.line())
        .unwrap_or(idx as u64 + 2);
    ImportError::InvalidFormat(format!("line {line}: {err}"))
}
