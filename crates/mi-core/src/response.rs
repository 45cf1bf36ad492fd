//! Parsing of model responses produced under the quality gate.

use std::sync::LazyLock;

use regex::Regex;

static MODIFIED_FILES_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MODIFIED_FILES:[ \t]*\r?\n").unwrap());

/// Files listed under the `MODIFIED_FILES:` section of a response.
///
/// The section runs until the first blank line or the end of the text.
/// A leading `-` bullet is stripped from each line.
pub fn extract_modified_files(response: &str) -> Vec<String> {
    let Some(header) = MODIFIED_FILES_HEADER.find(response) else {
        return Vec::new();
    };

    response[header.end()..]
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.strip_prefix('-').unwrap_or(line).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
