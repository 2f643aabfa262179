use std::collections::{BTreeSet, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::record::MeetingRecord;

/// Append-only JSON-lines file of meeting records.
///
/// Lines are only ever added. A missing file reads as an empty store, and a
/// line that does not parse (e.g. torn by a crash mid-write) is skipped.
pub struct RecordStore {
    path: PathBuf,
}

#[derive(Deserialize)]
struct HashOnly {
    hash: String,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        RecordStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored record, in file order.
    pub fn load(&self) -> Result<Vec<MeetingRecord>> {
        self.read_lines()
    }

    /// The identity hash of every stored record.
    pub fn load_hashes(&self) -> Result<HashSet<String>> {
        let rows: Vec<HashOnly> = self.read_lines()?;
        Ok(rows.into_iter().map(|r| r.hash).collect())
    }

    /// Append records, one flushed line each. Returns how many were written.
    pub fn append(&self, records: &[MeetingRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for appending", self.path.display()))?;
        for record in records {
            let line = record.to_json_line()?;
            writeln!(file, "{}", line)
                .and_then(|_| file.flush())
                .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        }
        Ok(records.len())
    }

    fn read_lines<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No record store at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", self.path.display()))
            }
        };

        let mut rows = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping malformed line {} of {}: {}", i + 1, self.path.display(), e),
            }
        }
        Ok(rows)
    }
}

// ── Summaries ──

pub struct StoreStats {
    pub total: usize,
    pub committees: usize,
    pub first_published: Option<String>,
    pub last_published: Option<String>,
    pub missing_dates: usize,
    pub missing_times: usize,
}

pub fn get_stats(records: &[MeetingRecord]) -> StoreStats {
    let committees: HashSet<&str> = records.iter().map(|r| r.committee()).collect();
    let published: BTreeSet<&str> = records.iter().map(|r| r.publication_date()).collect();
    StoreStats {
        total: records.len(),
        committees: committees.len(),
        first_published: published.first().map(|d| d.to_string()),
        last_published: published.last().map(|d| d.to_string()),
        missing_dates: records.iter().filter(|r| r.start_date().is_none()).count(),
        missing_times: records.iter().filter(|r| r.start_time().is_none()).count(),
    }
}

/// Most recently published records first, optionally filtered by a
/// case-insensitive committee substring.
pub fn fetch_overview<'a>(
    records: &'a [MeetingRecord],
    committee: Option<&str>,
    limit: usize,
) -> Vec<&'a MeetingRecord> {
    let needle = committee.map(str::to_lowercase);
    let mut rows: Vec<&MeetingRecord> = records
        .iter()
        .filter(|r| match &needle {
            Some(n) => r.committee().to_lowercase().contains(n),
            None => true,
        })
        .collect();
    // Stable sort keeps file order within a publication date.
    rows.sort_by(|a, b| b.publication_date().cmp(a.publication_date()));
    rows.truncate(limit);
    rows
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::groups::FieldGroup;

    fn record(committee: &str, published: &str, date: Option<&str>) -> MeetingRecord {
        MeetingRecord::new(
            FieldGroup {
                committee: committee.into(),
                date: date.map(Into::into),
                time: Some("9:00 a.m. to 5:00 p.m.".into()),
                agenda: Some("To review and evaluate grant applications.".into()),
                meeting_format: Some("Virtual Meeting.".into()),
            },
            published,
        )
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.jsonl"));
        assert!(store.load().unwrap().is_empty());
        assert!(store.load_hashes().unwrap().is_empty());
    }

    #[test]
    fn append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.jsonl"));
        let a = record("Panel A", "2025-02-11", Some("March 4, 2025."));
        let b = record("Panel B", "2025-02-12", None);
        assert_eq!(store.append(&[a.clone()]).unwrap(), 1);
        assert_eq!(store.append(&[b.clone()]).unwrap(), 1);

        assert_eq!(store.load().unwrap(), vec![a.clone(), b.clone()]);
        let hashes = store.load_hashes().unwrap();
        assert!(hashes.contains(a.hash()));
        assert!(hashes.contains(b.hash()));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn torn_and_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        let a = record("Panel A", "2025-02-11", Some("March 4, 2025."));
        std::fs::write(
            &path,
            format!("{}\n\n{{\"fed_reg_publication_date\":\"2025-", a.to_json_line().unwrap()),
        )
        .unwrap();
        let store = RecordStore::open(&path);
        assert_eq!(store.load().unwrap().len(), 1);
        assert_eq!(store.load_hashes().unwrap().len(), 1);
    }

    #[test]
    fn hashes_read_from_foreign_lines() {
        // Only the hash column is needed to build the known set.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        std::fs::write(&path, "{\"hash\":\"abc\",\"committee\":null}\n").unwrap();
        let store = RecordStore::open(&path);
        assert!(store.load_hashes().unwrap().contains("abc"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn stats_and_overview() {
        let records = vec![
            record("Panel A", "2025-02-11", Some("March 4, 2025.")),
            record("Panel B", "2025-03-01", None),
            record("panel a", "2025-02-20", Some("March 9, 2025.")),
        ];
        let s = get_stats(&records);
        assert_eq!(s.total, 3);
        assert_eq!(s.committees, 3);
        assert_eq!(s.first_published.as_deref(), Some("2025-02-11"));
        assert_eq!(s.last_published.as_deref(), Some("2025-03-01"));
        assert_eq!(s.missing_dates, 1);
        assert_eq!(s.missing_times, 0);

        let rows = fetch_overview(&records, Some("PANEL A"), 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].publication_date(), "2025-02-20");
        assert_eq!(fetch_overview(&records, None, 1).len(), 1);
    }
}
