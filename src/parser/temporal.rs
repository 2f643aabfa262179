use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use regex::Regex;

static TO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bto\b").unwrap());
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

const AM: &str = "a.m.";
const PM: &str = "p.m.";

/// Inclusive calendar span of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

/// Start and end clock times, each normalized on its own.
///
/// A side holds its 24-hour `H:MM` form when the source carried an a.m./p.m.
/// marker, or the error that kept it from converting.
#[derive(Debug)]
pub struct TimeRange {
    pub start: Result<String>,
    pub end: Result<String>,
}

/// Parse `"March 4, 2025."` or `"March 4-5, 2025."` into a date range.
pub fn parse_date_range(raw: &str) -> Result<DateRange> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let &[month, day, year] = tokens.as_slice() else {
        bail!(
            "expected '<Month> <day>, <year>.' but found {} tokens",
            tokens.len()
        );
    };
    let day = day.trim_end_matches(',');
    let year = year.trim_end_matches('.');

    let (start_day, end_day) = day.split_once('-').unwrap_or((day, day));
    let range = DateRange {
        start: calendar_date(month, start_day, year)?,
        end: calendar_date(month, end_day, year)?,
    };
    if range.end < range.start {
        bail!("date range ends before it starts: {}", raw);
    }
    Ok(range)
}

fn calendar_date(month: &str, day: &str, year: &str) -> Result<NaiveDate> {
    let text = format!("{} {} {}", month, day, year);
    NaiveDate::parse_from_str(&text, "%B %d %Y")
        .with_context(|| format!("'{}' is not a calendar date", text))
}

/// Parse a single time or a `start-end` / `start to end` range.
///
/// Segments carrying an a.m./p.m. marker are converted to 24-hour form; other
/// segments pass through trimmed and lower-cased. One segment failing leaves
/// the other intact. Only a range that does not split into two segments, or a
/// `single_day` range whose converted end precedes its start, fails as a whole.
/// An end of `00:00` after a later start means midnight closing the day.
pub fn parse_time_range(raw: &str, single_day: bool) -> Result<TimeRange> {
    let (start, end) = split_time_range(raw)?;
    let range = TimeRange {
        start: to_24_hour(start),
        end: to_24_hour(end),
    };
    if single_day {
        if let (Ok(start), Ok(end)) = (&range.start, &range.end) {
            if let (Some(s), Some(e)) = (clock_minutes(start), clock_minutes(end)) {
                if end_of_day(s, e) < s {
                    bail!("time range ends before it starts: {}", raw);
                }
            }
        }
    }
    Ok(range)
}

fn end_of_day(start: u32, end: u32) -> u32 {
    if end == 0 && start > 0 {
        24 * 60
    } else {
        end
    }
}

fn split_time_range(raw: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = if raw.contains('-') {
        raw.split('-').collect()
    } else if TO_RE.is_match(raw) {
        TO_RE.split(raw).collect()
    } else {
        return Ok((raw, raw));
    };
    match parts.as_slice() {
        &[start, end] => Ok((start, end)),
        _ => bail!("expected a start and an end time in '{}'", raw),
    }
}

/// Convert one clock segment like `"2:30 p.m."` to `"14:30"`.
pub fn to_24_hour(segment: &str) -> Result<String> {
    let time = segment.trim().to_lowercase();

    if let Some(clock) = time.strip_suffix(AM) {
        let clock = clock.trim();
        // 12 a.m. is midnight
        return Ok(match clock.split_once(':') {
            Some(("12", minutes)) => format!("00:{}", minutes),
            _ => clock.to_string(),
        });
    }

    if let Some(clock) = time.strip_suffix(PM) {
        let clock = clock.trim();
        if clock.starts_with("12:") {
            return Ok(clock.to_string());
        }
        let (hours, minutes) = clock
            .split_once(':')
            .with_context(|| format!("'{}' has no hour:minute separator", segment.trim()))?;
        let hours: u32 = hours
            .trim()
            .parse()
            .with_context(|| format!("'{}' has a non-numeric hour", segment.trim()))?;
        if !(1..12).contains(&hours) {
            bail!("hour {} is out of range for p.m.", hours);
        }
        return Ok(format!("{}:{}", hours + 12, minutes));
    }

    Ok(time)
}

fn clock_minutes(clock: &str) -> Option<u32> {
    let caps = CLOCK_RE.captures(clock)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    Some(hours * 60 + minutes)
}

// ── Tests ──
