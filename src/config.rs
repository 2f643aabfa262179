use std::time::Duration;

use chrono::NaiveDate;

pub const DEFAULT_STORE_PATH: &str = "data.jsonl";
pub const DEFAULT_REPORT_PATH: &str = "index.html";
pub const DEFAULT_API_BASE: &str = "https://www.federalregister.gov/api/v1";
pub const DEFAULT_CUTOFF: &str = "2025-02-01";
/// Listing pages read per run; `run --pages` raises it.
pub const DEFAULT_MAX_PAGES: u32 = 1;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 250;
/// Federal Register agency id of the National Institutes of Health.
pub const NIH_AGENCY_ID: u32 = 353;

const API_BASE_ENV: &str = "FEDREG_API_BASE";

/// Settings for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_base: String,
    pub agency_id: u32,
    /// Notices published before this date end the scan.
    pub cutoff: NaiveDate,
    pub max_pages: u32,
    pub request_delay: Duration,
}

impl IngestConfig {
    pub fn new(cutoff: NaiveDate) -> Self {
        IngestConfig {
            api_base: api_base_from_env(),
            agency_id: NIH_AGENCY_ID,
            cutoff,
            max_pages: DEFAULT_MAX_PAGES,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
        }
    }
}

fn api_base_from_env() -> String {
    std::env::var(API_BASE_ENV)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

// ── Tests ──
