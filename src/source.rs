use std::io::Read;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Current page is not an XML page (content type: {0})")]
    NotXml(String),
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where the raw export comes from: `-` for stdin, an `http(s)` URL, or a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    Url(String),
    File(String),
}

impl Source {
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Source::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Url(arg.to_string())
        } else {
            Source::File(arg.to_string())
        }
    }

    pub async fn load(&self, timeout: Duration) -> Result<String, SourceError> {
        match self {
            Source::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|source| SourceError::Read {
                        path: "<stdin>".into(),
                        source,
                    })?;
                Ok(buf)
            }
            Source::File(path) => std::fs::read_to_string(path).map_err(|source| SourceError::Read {
                path: path.clone(),
                source,
            }),
            Source::Url(url) => fetch_xml(url, timeout).await,
        }
    }
}

async fn fetch_xml(url: &str, timeout: Duration) -> Result<String, SourceError> {
    let fetch_err = |source| SourceError::Fetch {
        url: url.to_string(),
        source,
    };

    info!("Fetching Jira export: {}", url);
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_xml_content_type(&content_type) {
        return Err(SourceError::NotXml(content_type));
    }
    response.text().await.map_err(fetch_err)
}

fn is_xml_content_type(content_type: &str) -> bool {
    content_type.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kinds() {
        assert_eq!(Source::parse("-"), Source::Stdin);
        assert_eq!(
            Source::parse("https://jira.example.com/si/jira.issueviews:issue-xml/SET-1/SET-1.xml"),
            Source::Url("https://jira.example.com/si/jira.issueviews:issue-xml/SET-1/SET-1.xml".into())
        );
        assert_eq!(Source::parse("export.xml"), Source::File("export.xml".into()));
    }

    #[test]
    fn xml_content_types() {
        assert!(is_xml_content_type("text/xml;charset=UTF-8"));
        assert!(is_xml_content_type("application/rss+xml"));
        assert!(!is_xml_content_type("text/html"));
        assert!(!is_xml_content_type(""));
    }

    #[tokio::test]
    async fn missing_file() {
        let err = Source::parse("tests/fixtures/does-not-exist.xml")
            .load(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }

    #[tokio::test]
    async fn fixture_file() {
        let xml = Source::parse("tests/fixtures/jira_issue.xml")
            .load(Duration::from_secs(1))
            .await
            .unwrap();
        assert!(xml.contains("<item>"));
    }
}
