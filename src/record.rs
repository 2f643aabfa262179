//! The meeting record written to and read back from the record store.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::parser::groups::FieldGroup;
use crate::parser::temporal::{self, DateRange, TimeRange};

/// One announced closed meeting.
///
/// Built once from a field group and never changed afterwards; `hash` is
/// computed at construction and identifies the meeting across runs. Field
/// names and order are the on-disk line format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRecord {
    fed_reg_publication_date: String,
    committee: String,
    start_date: Option<String>,
    start_time: Option<String>,
    end_date: Option<String>,
    end_time: Option<String>,
    date: Option<String>,
    time: Option<String>,
    agenda: Option<String>,
    meeting_format: Option<String>,
    hash: String,
}

impl MeetingRecord {
    /// Normalize the group's date and time and hash the result.
    ///
    /// Never fails: a date or time that cannot be normalized is logged and its
    /// derived fields stay `None`.
    pub fn new(group: FieldGroup, publication_date: &str) -> Self {
        let dates = normalize_field("date", &group.committee, group.date.as_deref(), |raw| {
            temporal::parse_date_range(raw)
        });
        let single_day = dates.as_ref().map_or(true, DateRange::is_single_day);
        let times = normalize_field("time", &group.committee, group.time.as_deref(), |raw| {
            temporal::parse_time_range(raw, single_day)
        });

        let (start_date, end_date) = match dates {
            Some(r) => (
                Some(r.start.format("%Y-%m-%d").to_string()),
                Some(r.end.format("%Y-%m-%d").to_string()),
            ),
            None => (None, None),
        };
        let (start_time, end_time) = match times {
            Some(TimeRange { start, end }) => (
                segment("start time", &group.committee, start),
                segment("end time", &group.committee, end),
            ),
            None => (None, None),
        };

        let hash = identity_hash(&[
            publication_date,
            group.committee.as_str(),
            start_date.as_deref().unwrap_or_default(),
            start_time.as_deref().unwrap_or_default(),
            end_date.as_deref().unwrap_or_default(),
            end_time.as_deref().unwrap_or_default(),
            group.agenda.as_deref().unwrap_or_default(),
            group.meeting_format.as_deref().unwrap_or_default(),
        ]);

        MeetingRecord {
            fed_reg_publication_date: publication_date.to_string(),
            committee: group.committee,
            start_date,
            start_time,
            end_date,
            end_time,
            date: group.date,
            time: group.time,
            agenda: group.agenda,
            meeting_format: group.meeting_format,
            hash,
        }
    }

    pub fn publication_date(&self) -> &str {
        &self.fed_reg_publication_date
    }

    pub fn committee(&self) -> &str {
        &self.committee
    }

    pub fn raw_date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn agenda(&self) -> Option<&str> {
        self.agenda.as_deref()
    }

    pub fn meeting_format(&self) -> Option<&str> {
        self.meeting_format.as_deref()
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Serialize as one store line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Display columns in store order, `None` rendered as empty.
    pub fn columns(&self) -> [(&'static str, &str); 11] {
        fn opt(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("")
        }
        [
            ("fed_reg_publication_date", self.fed_reg_publication_date.as_str()),
            ("committee", self.committee.as_str()),
            ("start_date", opt(&self.start_date)),
            ("start_time", opt(&self.start_time)),
            ("end_date", opt(&self.end_date)),
            ("end_time", opt(&self.end_time)),
            ("date", opt(&self.date)),
            ("time", opt(&self.time)),
            ("agenda", opt(&self.agenda)),
            ("meeting_format", opt(&self.meeting_format)),
            ("hash", self.hash.as_str()),
        ]
    }
}

/// SHA-256 over the parts concatenated in order, as lowercase hex.
///
/// Stored hashes depend on this exact algorithm and ordering.
pub fn identity_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn normalize_field<T>(
    field: &str,
    committee: &str,
    raw: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match parse(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(committee = %committee, "Could not normalize {} {:?}: {:#}", field, raw, e);
            None
        }
    }
}

fn segment(field: &str, committee: &str, converted: Result<String>) -> Option<String> {
    converted
        .map_err(|e| warn!(committee = %committee, "Could not normalize {}: {:#}", field, e))
        .ok()
}

// ── Tests ──
