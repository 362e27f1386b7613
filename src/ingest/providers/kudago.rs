// src/ingest/providers/kudago.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::ingest::types::{Batch, NewsSource};
use crate::news::NewsPage;

const FIELDS: &str =
    "id,title,place,description,site_url,favorites_count,comments_count,publication_date";

/// KudaGo public news API (`/public-api/v1.4/news/`).
///
/// The API answers 404 past the last page; that surfaces as an error, which the
/// worker turns into an empty batch.
pub struct KudaGoSource {
    client: reqwest::Client,
    api_url: String,
    location: String,
    page_size: u32,
}

impl KudaGoSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building kudago http client")?;
        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            location: cfg.location.clone(),
            page_size: cfg.page_size.max(1),
        })
    }

    /// Decode one response body. Unknown keys are ignored.
    pub fn parse_page(body: &str) -> Result<Batch> {
        let page: NewsPage = serde_json::from_str(body).context("parsing kudago news page")?;
        Ok(page.results)
    }
}

#[async_trait]
impl NewsSource for KudaGoSource {
    async fn fetch_page(&self, page: u32) -> Result<Batch> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("location", self.location.as_str()),
                ("text_format", "text"),
                ("expand", "place"),
                ("fields", FIELDS),
            ])
            .query(&[("page_size", self.page_size), ("page", page)])
            .send()
            .await
            .context("kudago http get()")?
            .error_for_status()
            .with_context(|| format!("kudago page {page}"))?;

        let body = resp.text().await.context("kudago http .text()")?;
        Self::parse_page(&body)
    }

    fn name(&self) -> &'static str {
        "KudaGo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_missing_place() {
        let body = r#"{
            "count": 1, "next": null, "previous": null,
            "results": [{
                "id": 5, "title": "t", "description": "d",
                "site_url": "https://kudago.com/news/5/",
                "favorites_count": 1, "comments_count": 0,
                "publication_date": 1697740800
            }]
        }"#;
        let items = KudaGoSource::parse_page(body).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].place.is_none());
    }

    #[test]
    fn rejects_non_page_body() {
        assert!(KudaGoSource::parse_page(r#"{"detail": "Not found."}"#).is_err());
    }
}
