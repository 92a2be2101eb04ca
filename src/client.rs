use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::Settings;

const PING_PROMPT: &str = "Hello";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error - Server unavailable or blocked by firewall. Check network connection and security settings. ({0})")]
    Network(#[source] reqwest::Error),
    #[error("HTTP {code}: {reason} - {body}")]
    Status {
        code: u16,
        reason: String,
        body: String,
    },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl GenerationError {
    fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            GenerationError::Network(e)
        } else {
            GenerationError::Request(e)
        }
    }

    fn status(status: StatusCode, body: String) -> Self {
        GenerationError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    gauss_token: &'a str,
    model_id: &'a str,
    user_id: &'a str,
}

/// Client for the remote text-generation endpoint. One request per call, bounded
/// by the configured timeout, no retries.
pub struct GenerationClient {
    http: reqwest::Client,
    url: String,
    token: String,
    model_id: String,
    user_id: String,
}

impl GenerationClient {
    pub fn new(settings: &Settings) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            http,
            url: settings.api_url.clone(),
            token: settings.api_token.clone(),
            model_id: settings.model_id.clone(),
            user_id: settings.user_id.clone(),
        })
    }

    /// Send `prompt` and return the generated text, normalised for display.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = self.post(prompt).await?;
        Ok(normalize_generated(&body))
    }

    /// Connectivity check; returns the HTTP status of a trivial request.
    pub async fn ping(&self) -> Result<StatusCode, GenerationError> {
        info!("Testing API connection: {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .json(&self.request(PING_PROMPT))
            .send()
            .await
            .map_err(GenerationError::from_send)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("API test failed: {} {}", status, body);
            return Err(GenerationError::status(status, body));
        }
        Ok(status)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            prompt,
            gauss_token: &self.token,
            model_id: &self.model_id,
            user_id: &self.user_id,
        }
    }

    async fn post(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(url = %self.url, prompt_len = prompt.len(), "sending generation request");
        let response = self
            .http
            .post(&self.url)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(GenerationError::from_send)?;

        let status = response.status();
        let body = response.text().await.map_err(GenerationError::from_send)?;
        if !status.is_success() {
            warn!("Generation request failed with {}", status);
            return Err(GenerationError::status(status, body));
        }
        debug!(status = %status, body_len = body.len(), "generation response received");
        Ok(body)
    }
}

/// Turn a raw response body into display text.
///
/// JSON strings are unwrapped, other JSON values pretty-printed, non-JSON kept
/// as is. Escaped `\n` sequences become real line breaks.
pub fn normalize_generated(body: &str) -> String {
    let text = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    };
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_body() {
        assert_eq!(normalize_generated("Check A\\nCheck B"), "Check A\nCheck B");
    }

    #[test]
    fn json_string_body() {
        assert_eq!(normalize_generated(r#""Check A\nCheck B""#), "Check A\nCheck B");
    }

    #[test]
    fn json_object_body_is_pretty_printed() {
        let out = normalize_generated(r#"{"answer":"Check A\nCheck B"}"#);
        assert!(out.starts_with("{\n  \"answer\": \"Check A"));
        // the re-escaped newline inside the pretty JSON is unfolded too
        assert!(out.contains("Check A\nCheck B"));
    }

    #[test]
    fn status_error_message() {
        let err = GenerationError::status(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway - upstream down");
    }

    #[test]
    fn request_shape() {
        let settings = Settings {
            api_url: "http://localhost/chat".into(),
            api_token: "tok".into(),
            model_id: "m".into(),
            user_id: "u".into(),
            timeout_secs: 1,
            db_path: ":memory:".into(),
        };
        let client = GenerationClient::new(&settings).unwrap();
        let json = serde_json::to_value(client.request("hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "prompt": "hi", "gauss_token": "tok", "model_id": "m", "user_id": "u" })
        );
    }
}
