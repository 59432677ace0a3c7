use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::text::sanitize;

/// Shown verbatim when the relay's reply lacks the expected candidate path.
pub const REPLY_FALLBACK: &str = "Sorry, I could not process that response.";

#[derive(Serialize)]
struct RelayRequest {
    message: String,
}

// The relay forwards the generative-AI provider's response untouched, so the
// success body mirrors that provider's shape.
#[derive(Deserialize)]
struct RelayReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct RelayErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// Relay one user message and return the assistant's reply text.
    pub async fn send(&self, message: &str) -> Result<String> {
        let request = RelayRequest {
            message: message.to_string(),
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<RelayErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "Failed to parse error response from relay".to_string());
            return Err(anyhow!("chat relay error {}: {}", status, detail));
        }

        let reply: RelayReply = response.json().await?;
        Ok(extract_reply(&reply))
    }
}

fn extract_reply(reply: &RelayReply) -> String {
    reply
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.as_deref())
        .map(sanitize)
        .unwrap_or_else(|| REPLY_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> RelayReply {
        serde_json::from_str(json).expect("reply should deserialize")
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let json = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "Here is your answer." } ] } },
                { "content": { "parts": [ { "text": "Ignored second candidate." } ] } }
            ]
        }"#;
        assert_eq!(extract_reply(&reply(json)), "Here is your answer.");
    }

    #[test]
    fn test_missing_candidates_yields_fallback() {
        assert_eq!(extract_reply(&reply("{}")), REPLY_FALLBACK);
        assert_eq!(extract_reply(&reply(r#"{ "candidates": [] }"#)), REPLY_FALLBACK);
    }

    #[test]
    fn test_missing_parts_yields_fallback() {
        let json = r#"{ "candidates": [ { "content": { "parts": [] } } ] }"#;
        assert_eq!(extract_reply(&reply(json)), REPLY_FALLBACK);

        let json = r#"{ "candidates": [ { "content": null } ] }"#;
        assert_eq!(extract_reply(&reply(json)), REPLY_FALLBACK);
    }

    #[test]
    fn test_reply_text_is_sanitized() {
        let json = "{ \"candidates\": [ { \"content\": { \"parts\": [ { \"text\": \"ok\\u001b[31m fine\" } ] } } ] }";
        assert_eq!(extract_reply(&reply(json)), "ok[31m fine");
    }

    #[test]
    fn test_error_body_parses_with_optional_field() {
        let body: RelayErrorBody = serde_json::from_str(r#"{ "error": "quota exceeded" }"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("quota exceeded"));

        let body: RelayErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());
    }
}
