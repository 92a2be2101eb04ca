use std::sync::LazyLock;

use regex::Regex;

pub const CONTENT_NOT_FOUND: &str = "Jira XML content not found";
pub const RESULT_NOT_FOUND: &str = "AI result not found";

const FILENAME_MAX_CHARS: usize = 80;

static FILENAME_UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\n\r\t]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Generated test cases, one per non-blank line.
pub fn test_cases(result: &str) -> Vec<String> {
    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// File-name-safe version of `input`, at most 80 characters.
pub fn sanitize_file_name(input: &str) -> String {
    let spaced = FILENAME_UNSAFE_RE.replace_all(input, " ");
    let collapsed = WHITESPACE_RE.replace_all(&spaced, " ");
    collapsed.trim().chars().take(FILENAME_MAX_CHARS).collect()
}
