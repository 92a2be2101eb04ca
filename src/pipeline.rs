use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::client::GenerationClient;
use crate::db;
use crate::extract::{self, MissingFieldError};
use crate::outline::{self, RenderResult};
use crate::prompt::{self, PromptInput};

pub struct ProcessedIssue {
    pub link: String,
    pub identifier: String,
    pub outline: RenderResult,
}

/// Export page → link, identifier and rendered description.
pub fn process_export(xml: &str) -> Result<ProcessedIssue, MissingFieldError> {
    let link = extract::extract_link_field(xml)?.trim().to_string();
    let identifier = extract::derive_identifier(&link);
    let description = extract::extract_delimited_field(xml)?;
    let outline = outline::render(description);
    info!("Processed {} ({} outline lines)", identifier, outline.text.lines().count());
    Ok(ProcessedIssue {
        link,
        identifier,
        outline,
    })
}

/// Stored custom template, or the built-in one when none is set or it cannot be read.
pub fn prompt_template(conn: &Connection) -> String {
    match db::read(conn, db::CUSTOM_PROMPT_TEMPLATE) {
        Ok(Some(template)) if !template.trim().is_empty() => template,
        Ok(_) => prompt::DEFAULT_PROMPT_TEMPLATE.to_string(),
        Err(e) => {
            warn!("Could not load custom prompt, using default: {}", e);
            prompt::DEFAULT_PROMPT_TEMPLATE.to_string()
        }
    }
}

/// Full run: render, store the outline, generate, store and archive the result.
pub async fn generate(
    conn: &Connection,
    client: &GenerationClient,
    xml: &str,
) -> Result<(ProcessedIssue, String)> {
    let issue = process_export(xml)?;

    db::save(conn, db::JIRA_CONTENT, &issue.outline.text)?;
    db::save(conn, db::JIRA_CONTENT_HTML, &issue.outline.html)?;

    let template = prompt_template(conn);
    let prompt = prompt::build_prompt(&template, &PromptInput::from_outline(&issue.outline.text));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Generating test outline for {}...", issue.identifier));
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    let generated = client.generate(&prompt).await;
    spinner.finish_and_clear();
    let result = generated.with_context(|| format!("AI API call error for {}", issue.identifier))?;

    db::save(conn, db::AI_RESULT, &result)?;
    db::insert_run(
        conn,
        &db::RunRow {
            identifier: issue.identifier.clone(),
            link: issue.link.clone(),
            text: issue.outline.text.clone(),
            html: issue.outline.html.clone(),
            result: result.clone(),
        },
    )?;
    info!("Test outline for {} saved", issue.identifier);

    Ok((issue, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn escaped_paragraph_round_trip() {
        let xml = "<rss><channel><item><link>https://x/browse/ABC-123</link>\
            <description>&lt;p&gt;Hello&lt;/p&gt;</description></item></channel></rss>";
        let issue = process_export(xml).unwrap();
        assert_eq!(issue.link, "https://x/browse/ABC-123");
        assert_eq!(issue.identifier, "ABC-123");
        assert_eq!(issue.outline.text, "Hello");
        assert_eq!(
            issue.outline.html,
            r#"<p style="margin: 8px 0; line-height: 1.5;">Hello</p>"#
        );
    }

    #[test]
    fn missing_description_fails_whole_export() {
        let xml = "<item><link>https://x/browse/ABC-1</link></item>";
        assert!(matches!(process_export(xml), Err(MissingFieldError::Description)));
    }

    #[test]
    fn fixture_export() {
        let xml = std::fs::read_to_string("tests/fixtures/jira_issue.xml").unwrap();
        let issue = process_export(&xml).unwrap();
        assert_eq!(issue.identifier, "SET-482");
        assert!(issue.outline.text.starts_with("1. Overview"));
    }

    #[test]
    fn default_template_when_unset() {
        let conn = memory();
        assert_eq!(prompt_template(&conn), prompt::DEFAULT_PROMPT_TEMPLATE);
        db::save(&conn, db::CUSTOM_PROMPT_TEMPLATE, "   ").unwrap();
        assert_eq!(prompt_template(&conn), prompt::DEFAULT_PROMPT_TEMPLATE);
    }

    #[test]
    fn custom_template_wins() {
        let conn = memory();
        db::save(&conn, db::CUSTOM_PROMPT_TEMPLATE, "Cases for: {CONTENT}").unwrap();
        assert_eq!(prompt_template(&conn), "Cases for: {CONTENT}");
    }
}
