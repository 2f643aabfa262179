use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::dedup::KnownHashes;
use crate::feed::{FeedClient, FeedItem};
use crate::parser;
use crate::record::MeetingRecord;
use crate::store::RecordStore;

const NOTICE_TYPE: &str = "Notice";
const CLOSED_MEETING_PHRASE: &str = "Notice of Closed Meeting";

/// A listing entry selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub document_number: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub publication_date: String,
}

/// Ingest run stats.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub candidates: usize,
    pub documents_ok: usize,
    pub documents_failed: usize,
    pub extracted: usize,
    pub duplicates: usize,
    pub appended: usize,
}

/// Whether a listing scan should keep reading further items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    Continue,
    ReachedCutoff,
}

/// Add the closed-meeting notices of one listing page to `out`.
///
/// The feed is newest first, so the first item published before `cutoff` ends
/// the scan for this page and every later one.
pub fn select_candidates(items: &[FeedItem], cutoff: NaiveDate, out: &mut Vec<Candidate>) -> Scan {
    for item in items {
        let published = match NaiveDate::parse_from_str(item.publication_date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    "Ignoring listing item {:?} with bad publication date {:?}: {}",
                    item.document_number, item.publication_date, e
                );
                continue;
            }
        };
        if published < cutoff {
            info!("Reached recency cutoff {} at {}", cutoff, published);
            return Scan::ReachedCutoff;
        }
        if item.kind == NOTICE_TYPE && item.title.contains(CLOSED_MEETING_PHRASE) {
            out.push(Candidate {
                document_number: item.document_number.clone(),
                title: item.title.clone(),
                publication_date: published.format("%Y-%m-%d").to_string(),
            });
        }
    }
    Scan::Continue
}

/// Page through the listing until the cutoff, an empty page, or `max_pages`.
///
/// Failing to reach the feed at all aborts the run; a later page failing
/// only ends pagination early.
pub async fn collect_candidates(feed: &FeedClient, config: &IngestConfig) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for page in 1..=config.max_pages {
        let items = match feed.fetch_page(page).await {
            Ok(items) => items,
            Err(e) if page == 1 => return Err(e.context("Could not reach the document listing feed")),
            Err(e) => {
                warn!("Stopping at listing page {}: {:#}", page, e);
                break;
            }
        };
        if items.is_empty() {
            break;
        }
        if select_candidates(&items, config.cutoff, &mut candidates) == Scan::ReachedCutoff {
            break;
        }
    }
    info!("Found {} closed meeting notices", candidates.len());
    Ok(candidates)
}

async fn fetch_meetings(feed: &FeedClient, candidate: &Candidate) -> Result<Vec<MeetingRecord>> {
    let xml_url = feed
        .resolve_xml_url(&candidate.document_number)
        .await?
        .ok_or_else(|| anyhow!("document has no full-text XML"))?;
    let xml = feed.fetch_text(&xml_url).await?;
    parser::extract_meetings(&xml, &candidate.publication_date)
}

/// Fetch, extract, deduplicate and append every new meeting.
///
/// Documents are handled one at a time; a document that fails to fetch or
/// parse is logged and skipped. Store write failures abort the run.
pub async fn run(
    config: &IngestConfig,
    feed: &FeedClient,
    store: &RecordStore,
    known: &KnownHashes,
) -> Result<IngestStats> {
    info!("{} meetings already stored", known.len());
    let candidates = collect_candidates(feed, config).await?;
    let mut stats = IngestStats {
        candidates: candidates.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for candidate in &candidates {
        match fetch_meetings(feed, candidate).await {
            Ok(records) => {
                let count = records.len();
                stats.documents_ok += 1;
                stats.extracted += count;
                let fresh = known.filter_new(records);
                stats.duplicates += count - fresh.len();
                stats.appended += store.append(&fresh)?;
            }
            Err(e) => {
                stats.documents_failed += 1;
                pb.suspend(|| {
                    warn!(
                        "Skipping document {} ({}): {:#}",
                        candidate.document_number, candidate.title, e
                    )
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Ingested {} documents ({} failed): {} meetings, {} new, {} already stored",
        stats.documents_ok,
        stats.documents_failed,
        stats.extracted,
        stats.appended,
        stats.duplicates
    );
    Ok(stats)
}

// ── Tests ──
