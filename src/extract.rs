//! Field extraction from a Jira XML export page.
//!
//! These are plain substring searches, not an XML parser. Each search takes the
//! first opening marker and the first closing marker independently, so they are
//! only correct for exports holding a single `<item>` with a single field of
//! each kind. Jira's single-issue XML view guarantees that.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

const ITEM_OPEN: &str = "<item>";
const ITEM_CLOSE: &str = "</item>";
const DESCRIPTION_OPEN: &str = "<description>";
const DESCRIPTION_CLOSE: &str = "</description>";
const LINK_OPEN: &str = "<link>";
const LINK_CLOSE: &str = "</link>";

static ISSUE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([A-Z]+-\d+)(?:\?.*)?$").unwrap());
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[:/?#\[\\\]@!$&'()*+,;=]"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingFieldError {
    #[error("Cannot find item tag in XML")]
    Item,
    #[error("Cannot find description tag in XML")]
    Description,
    #[error("Cannot find link tag in XML")]
    Link,
}

/// Raw (still entity-escaped) markup of the item's `<description>` field.
pub fn extract_delimited_field(raw: &str) -> Result<&str, MissingFieldError> {
    let item = span_between(raw, ITEM_OPEN, ITEM_CLOSE, true).ok_or(MissingFieldError::Item)?;
    span_between(item, DESCRIPTION_OPEN, DESCRIPTION_CLOSE, false)
        .ok_or(MissingFieldError::Description)
}

/// Contents of the first `<link>` element in the page.
///
/// Open and close markers are found independently; if the first `</link>`
/// precedes the first `<link>` the result is empty rather than the text between.
pub fn extract_link_field(raw: &str) -> Result<&str, MissingFieldError> {
    span_between(raw, LINK_OPEN, LINK_CLOSE, false).ok_or(MissingFieldError::Link)
}

/// Issue key (`ABC-123`) from a browse link, or the whole link made filename-safe.
pub fn derive_identifier(link: &str) -> String {
    if let Some(caps) = ISSUE_KEY_RE.captures(link) {
        return caps[1].to_string();
    }
    UNSAFE_CHARS_RE.replace_all(link, "_").into_owned()
}

/// Unbalanced search: first `open`, first `close`, looked up independently.
///
/// With `keep_open` the returned span starts at the opening marker itself
/// (the record span), otherwise right after it. A close marker that precedes
/// the open marker yields an empty span.
fn span_between<'a>(haystack: &'a str, open: &str, close: &str, keep_open: bool) -> Option<&'a str> {
    let start = haystack.find(open)?;
    let end = haystack.find(close)?;
    let from = if keep_open { start } else { start + open.len() };
    Some(haystack.get(from..end).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "<rss><channel><item><link>https://x/browse/ABC-123</link>\
        <description>&lt;p&gt;Hello&lt;/p&gt;</description></item></channel></rss>";

    #[test]
    fn description_round_trip() {
        assert_eq!(extract_delimited_field(EXPORT).unwrap(), "&lt;p&gt;Hello&lt;/p&gt;");
    }

    #[test]
    fn link_and_identifier() {
        let link = extract_link_field(EXPORT).unwrap();
        assert_eq!(link, "https://x/browse/ABC-123");
        assert_eq!(derive_identifier(link), "ABC-123");
    }

    #[test]
    fn missing_item_reported_first() {
        let err = extract_delimited_field("<rss><description>x</description></rss>").unwrap_err();
        assert_eq!(err, MissingFieldError::Item);
        assert_eq!(err.to_string(), "Cannot find item tag in XML");
    }

    #[test]
    fn missing_description() {
        let err = extract_delimited_field("<item><link>l</link></item>").unwrap_err();
        assert_eq!(err, MissingFieldError::Description);
    }

    #[test]
    fn description_outside_item_is_not_found() {
        let raw = "<description>channel</description><item><title>t</title></item>";
        assert_eq!(extract_delimited_field(raw), Err(MissingFieldError::Description));
    }

    #[test]
    fn missing_link() {
        assert_eq!(extract_link_field("<item></item>"), Err(MissingFieldError::Link));
    }

    #[test]
    fn first_occurrence_wins() {
        let raw = "<item><description>one</description><description>two</description></item>";
        assert_eq!(extract_delimited_field(raw).unwrap(), "one");
    }

    #[test]
    fn close_before_open_is_empty() {
        assert_eq!(extract_link_field("</link><link>").unwrap(), "");
    }

    #[test]
    fn jira_fixture_fields() {
        let xml = std::fs::read_to_string("tests/fixtures/jira_issue.xml").unwrap();
        // the channel-level description sits outside <item> and is ignored
        assert!(extract_delimited_field(&xml).unwrap().starts_with("&lt;h1&gt;Overview"));
        assert_eq!(derive_identifier(extract_link_field(&xml).unwrap()), "SET-482");
    }

    #[test]
    fn identifier_with_query_string() {
        assert_eq!(
            derive_identifier("https://jira.example.com/browse/PROJ-42?focusedId=1"),
            "PROJ-42"
        );
    }

    #[test]
    fn identifier_fallback_sanitizes() {
        assert_eq!(
            derive_identifier("https://host/issues?id=7&x=(a)"),
            "https___host_issues_id_7_x__a_"
        );
    }

    #[test]
    fn identifier_needs_uppercase_key_at_end() {
        assert_eq!(derive_identifier("https://x/browse/abc-1"), "https___x_browse_abc-1");
    }
}
