//! Import options from an optional JSON file plus command-line overrides.

use anyhow::{anyhow, Context, Result};
use coursesync_core::ColumnMapping;
use coursesync_import::{check_encoding, Delimiter, ImportOptions};
use std::collections::BTreeMap;
use std::path::Path;

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
    pub category: Option<String>,
    pub tag_delimiter: Option<String>,
}

pub fn build_options(config: Option<&Path>, overrides: &OptionOverrides) -> Result<ImportOptions> {
    let mut options = match config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ImportOptions::default(),
    };
    apply_overrides(&mut options, overrides)?;
    check_encoding(&options.encoding).context("Invalid Encoding Specified")?;
    Ok(options)
}

fn apply_overrides(options: &mut ImportOptions, overrides: &OptionOverrides) -> Result<()> {
    if let Some(name) = &overrides.delimiter {
        options.delimiter = name.parse::<Delimiter>().map_err(|e| anyhow!(e))?;
    }
    if let Some(encoding) = &overrides.encoding {
        options.encoding = encoding.clone();
    }
    if let Some(category) = &overrides.category {
        options.default_category = Some(category.clone());
    }
    if let Some(tags) = &overrides.tag_delimiter {
        options.tag_delimiter = tags.clone();
    }
    Ok(())
}

/// Read a `field key -> column index` JSON object.
pub fn load_mapping(path: &Path) -> Result<ColumnMapping> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read mapping {}", path.display()))?;
    let table: BTreeMap<String, i64> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid mapping {}", path.display()))?;
    ColumnMapping::from_keyed(&table).map_err(|e| anyhow!(e))
}
