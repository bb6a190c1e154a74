//! Small helpers for text cleanup, logging and the output directory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace (including `&nbsp;` and full-width spaces) and trim.
///
/// Result pages pad cell text with newlines and indentation.
pub fn clean_text(s: &str) -> String {
    WHITESPACE
        .replace_all(s.trim_matches(|c: char| c.is_whitespace()), " ")
        .into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Make `s` safe to use as one component of a file name.
///
/// Path separators, characters Windows rejects and control characters become
/// `_`, and leading dots are dropped, so the result can never name a parent
/// directory or a hidden file.
///
/// ```ignore
/// assert_eq!(sanitize_file_component("C/C++"), "C_C++");
/// assert_eq!(sanitize_file_component("../../x"), "_.._x");
/// ```
pub fn sanitize_file_component(s: &str) -> String {
    s.replace(
        |c: char| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control(),
        "_",
    )
    .trim_start_matches('.')
    .to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path)?;
    let probe_path = path.join("..__probe_write__");
    fs::File::create(&probe_path)?;
    let _ = fs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
