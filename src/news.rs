use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::text::sanitize;

pub const FALLBACK_DESCRIPTION: &str = "No description available.";
pub const FALLBACK_IMAGE_URL: &str = "https://via.placeholder.com/400x200?text=No+Image";

#[derive(Deserialize)]
struct ListingResponse {
    status: String,
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url_to_image: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    source: RawSource,
    url: String,
}

#[derive(Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

/// Display record for one article, with fallbacks already applied.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub url: String,
}

impl Article {
    fn from_raw(raw: RawArticle) -> Self {
        Self {
            title: sanitize(raw.title.as_deref().unwrap_or("(untitled)")),
            description: raw
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(sanitize)
                .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
            image_url: raw
                .url_to_image
                .unwrap_or_else(|| FALLBACK_IMAGE_URL.to_string()),
            published_at: raw.published_at,
            source: sanitize(raw.source.name.as_deref().unwrap_or("")),
            url: raw.url,
        }
    }

    pub fn published_label(&self) -> String {
        match self.published_at {
            Some(ts) => ts.format("%b %d, %Y").to_string(),
            None => "unknown date".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch the first page of articles. An empty query means top headlines
    /// for the fixed region; anything else is a full-text search.
    pub async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        let request = if query.is_empty() {
            self.client
                .get(format!("{}/top-headlines", self.base_url))
                .query(&[("country", "us"), ("apiKey", self.api_key.as_str())])
        } else {
            self.client
                .get(format!("{}/everything", self.base_url))
                .query(&[("q", query), ("apiKey", self.api_key.as_str())])
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("news API error {}: {}", status, text));
        }

        let listing: ListingResponse = response.json().await?;
        parse_listing(listing)
    }
}

fn parse_listing(listing: ListingResponse) -> Result<Vec<Article>> {
    if listing.status != "ok" {
        return Err(anyhow!(
            "news API reported failure: {}",
            listing.message.unwrap_or(listing.status)
        ));
    }
    Ok(listing.articles.into_iter().map(Article::from_raw).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> ListingResponse {
        serde_json::from_str(json).expect("listing should deserialize")
    }

    #[test]
    fn test_parse_listing_returns_every_article() {
        let json = r#"{
            "status": "ok",
            "articles": [
                {
                    "title": "Rates hold steady",
                    "description": "The central bank left rates unchanged.",
                    "urlToImage": "https://example.com/rates.jpg",
                    "publishedAt": "2026-03-05T14:30:00Z",
                    "source": { "name": "Example Wire" },
                    "url": "https://example.com/rates"
                },
                {
                    "title": "Storm heads east",
                    "description": "Forecasters expect landfall Tuesday.",
                    "urlToImage": "https://example.com/storm.jpg",
                    "publishedAt": "2026-03-04T09:00:00Z",
                    "source": { "name": "Weather Desk" },
                    "url": "https://example.com/storm"
                }
            ]
        }"#;

        let articles = parse_listing(listing(json)).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Rates hold steady");
        assert_eq!(articles[0].source, "Example Wire");
        assert_eq!(articles[0].url, "https://example.com/rates");
        assert_eq!(articles[0].published_label(), "Mar 05, 2026");
        assert_eq!(articles[1].source, "Weather Desk");
    }

    #[test]
    fn test_missing_description_and_image_use_fallbacks() {
        let json = r#"{
            "status": "ok",
            "articles": [
                {
                    "title": "Bare article",
                    "description": null,
                    "urlToImage": null,
                    "publishedAt": null,
                    "source": { "name": "Wire" },
                    "url": "https://example.com/bare"
                }
            ]
        }"#;

        let articles = parse_listing(listing(json)).unwrap();
        assert_eq!(articles[0].description, FALLBACK_DESCRIPTION);
        assert_eq!(articles[0].image_url, FALLBACK_IMAGE_URL);
        assert_eq!(articles[0].published_label(), "unknown date");
    }

    #[test]
    fn test_blank_description_uses_fallback() {
        let json = r#"{
            "status": "ok",
            "articles": [
                {
                    "title": "Spaces only",
                    "description": "   ",
                    "source": { "name": "Wire" },
                    "url": "https://example.com/spaces"
                }
            ]
        }"#;

        let articles = parse_listing(listing(json)).unwrap();
        assert_eq!(articles[0].description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_non_ok_status_is_an_error() {
        let json = r#"{
            "status": "error",
            "message": "apiKeyInvalid",
            "articles": []
        }"#;

        let err = parse_listing(listing(json)).unwrap_err();
        assert!(err.to_string().contains("apiKeyInvalid"));
    }

    #[test]
    fn test_control_characters_are_stripped_from_fields() {
        let json = "{
            \"status\": \"ok\",
            \"articles\": [
                {
                    \"title\": \"bad\\u001b[2Jtitle\",
                    \"description\": \"desc\\u0007ription\",
                    \"source\": { \"name\": \"Wi\\u0000re\" },
                    \"url\": \"https://example.com/x\"
                }
            ]
        }";

        let articles = parse_listing(listing(json)).unwrap();
        assert_eq!(articles[0].title, "bad[2Jtitle");
        assert_eq!(articles[0].description, "description");
        assert_eq!(articles[0].source, "Wire");
    }
}
