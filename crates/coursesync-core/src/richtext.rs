//! Rich-text normalization applied to HTML fields on save.
//!
//! A store that cleans HTML on write would report a spurious change on every
//! re-import if the diff compared raw input against the stored form. The
//! comparator therefore runs imported text through the same function the
//! store uses before comparing.

use regex::Regex;
use std::sync::OnceLock;

fn script_blocks() -> &'static Regex {
    static SCRIPT_BLOCKS: OnceLock<Regex> = OnceLock::new();
    SCRIPT_BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex compiles")
    })
}

/// Normalize HTML text the way the store saves it.
///
/// - line endings become `\n`
/// - `<script>` blocks are removed
/// - surrounding whitespace is trimmed
///
/// The function is idempotent.
pub fn normalize_html(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = script_blocks().replace_all(&unified, "");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings() {
        assert_eq!(normalize_html("<p>a</p>\r\n<p>b</p>\r"), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn strips_script_blocks() {
        let html = "<p>Intro</p><SCRIPT type=\"text/javascript\">alert(1)</script>";
        assert_eq!(normalize_html(html), "<p>Intro</p>");
    }

    #[test]
    fn trims_outer_whitespace_only() {
        assert_eq!(normalize_html("  <p> a  b </p>\n"), "<p> a  b </p>");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize_html(""), "");
        assert_eq!(normalize_html(" \r\n "), "");
    }
}
