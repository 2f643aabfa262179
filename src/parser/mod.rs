pub mod elements;
pub mod groups;
pub mod temporal;

use anyhow::Result;

use crate::record::MeetingRecord;

/// Two-pass pipeline: XML → inline label elements → field groups → records.
///
/// Structural XML errors fail the whole document; date and time problems only
/// blank the affected fields of a single record.
pub fn extract_meetings(xml: &str, publication_date: &str) -> Result<Vec<MeetingRecord>> {
    let elements = elements::collect_inline_elements(xml)?;
    let records = groups::group_fields(&elements)
        .into_iter()
        .map(|group| MeetingRecord::new(group, publication_date))
        .collect();
    Ok(records)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.xml", name)).unwrap()
    }

    #[test]
    fn allergy_notice_two_meetings() {
        let records = extract_meetings(&fixture("niaid_closed_meeting"), "2025-02-11").unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert!(first.committee().starts_with("Microbiology, Infectious Diseases and AIDS"));
        assert_eq!(first.start_date(), Some("2025-03-04"));
        assert_eq!(first.end_date(), Some("2025-03-05"));
        assert_eq!(first.start_time(), Some("10:00"));
        assert_eq!(first.end_time(), Some("18:00"));
        assert_eq!(first.agenda(), Some("To review and evaluate grant applications."));
        assert_eq!(first.meeting_format(), Some("Virtual Meeting."));
        assert_eq!(first.publication_date(), "2025-02-11");

        let second = &records[1];
        assert!(second.committee().contains("Vaccine Adjuvant Discovery"));
        assert_eq!(second.start_date(), Some("2025-03-12"));
        assert_eq!(second.end_date(), Some("2025-03-12"));
        assert_eq!(second.start_time(), Some("11:00"));
        assert_eq!(second.end_time(), Some("15:00"));
        // No format label in the second block.
        assert_eq!(second.meeting_format(), None);
        assert_ne!(first.hash(), second.hash());
    }

    #[test]
    fn bad_date_record_still_emitted() {
        let records = extract_meetings(&fixture("cancer_panel_bad_date"), "2025-03-20").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_date(), Some("April 9,"));
        assert!(records[0].start_date().is_none());
        assert!(records[0].end_date().is_none());
        assert_eq!(records[0].start_time(), Some("13:00"));
    }

    #[test]
    fn notice_without_committee_is_empty() {
        let records = extract_meetings(&fixture("no_committee"), "2025-03-20").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_document_emits_nothing() {
        let mut xml = fixture("niaid_closed_meeting");
        xml.truncate(xml.len() / 2);
        assert!(extract_meetings(&xml, "2025-02-11").is_err());
    }

    #[test]
    fn extraction_is_repeatable() {
        let xml = fixture("niaid_closed_meeting");
        let a = extract_meetings(&xml, "2025-02-11").unwrap();
        let b = extract_meetings(&xml, "2025-02-11").unwrap();
        assert_eq!(a, b);
    }
}
