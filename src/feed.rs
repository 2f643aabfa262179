use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::IngestConfig;

const USER_AGENT: &str = concat!("nihmeet/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One entry of the document listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub document_number: String,
}

#[derive(Deserialize)]
struct ListingPage {
    #[serde(default)]
    results: Vec<FeedItem>,
}

#[derive(Deserialize)]
struct DocumentDetail {
    full_text_xml_url: Option<String>,
}

/// Client for the Federal Register documents API.
///
/// Requests are issued one at a time with a fixed pause before each; failures
/// are returned to the caller, never retried here.
pub struct FeedClient {
    client: reqwest::Client,
    api_base: String,
    agency_id: u32,
    delay: Duration,
}

impl FeedClient {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        Self::with_builder(config, reqwest::Client::builder())
    }

    /// Finish `builder` with the feed's user agent and timeout.
    pub fn with_builder(config: &IngestConfig, builder: reqwest::ClientBuilder) -> Result<Self> {
        let client = builder
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FeedClient {
            client,
            api_base: config.api_base.clone(),
            agency_id: config.agency_id,
            delay: config.request_delay,
        })
    }

    /// Fetch one page (1-based) of the agency's documents, newest first.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<FeedItem>> {
        let url = listing_url(&self.api_base, self.agency_id, page);
        info!("Fetching listing page {}: {}", page, url);
        let listing: ListingPage = self
            .get(&url)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode listing page {}", page))?;
        Ok(listing.results)
    }

    /// Look up the full-text XML location of a document, if it has one.
    pub async fn resolve_xml_url(&self, document_number: &str) -> Result<Option<String>> {
        let url = format!("{}/documents/{}", self.api_base, document_number);
        let detail: DocumentDetail = self
            .get(&url)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode document {}", document_number))?;
        Ok(detail.full_text_xml_url)
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.get(url)
            .await?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        tokio::time::sleep(self.delay).await;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        response
            .error_for_status()
            .with_context(|| format!("Request to {} was rejected", url))
    }
}

pub fn listing_url(api_base: &str, agency_id: u32, page: u32) -> String {
    format!(
        "{}/documents?conditions%5Bagency_ids%5D%5B%5D={}&format=json&order=newest&page={}",
        api_base, agency_id, page
    )
}

// ── Tests ──
