use std::collections::HashSet;

use anyhow::Result;
use tracing::info;

use crate::record::MeetingRecord;
use crate::store::RecordStore;

/// Identity hashes already in the store when the run started.
///
/// Loaded once and only read afterwards; records appended during the run are
/// not added, so the gate guards against the store as of run start.
pub struct KnownHashes {
    hashes: HashSet<String>,
}

impl KnownHashes {
    pub fn from_store(store: &RecordStore) -> Result<Self> {
        let hashes = store.load_hashes()?;
        info!("Loaded {} known record hashes from {}", hashes.len(), store.path().display());
        Ok(KnownHashes { hashes })
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_new(&self, hash: &str) -> bool {
        !self.hashes.contains(hash)
    }

    /// Keep unseen records in extraction order; log the ones dropped.
    pub fn filter_new(&self, records: Vec<MeetingRecord>) -> Vec<MeetingRecord> {
        records
            .into_iter()
            .filter(|r| {
                let fresh = self.is_new(r.hash());
                if !fresh {
                    info!(
                        "Skipping data that already exists: {} - {}",
                        r.committee(),
                        r.raw_date().unwrap_or("(no date)")
                    );
                }
                fresh
            })
            .collect()
    }
}

impl FromIterator<String> for KnownHashes {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        KnownHashes {
            hashes: iter.into_iter().collect(),
        }
    }
}

// ── Tests ──
