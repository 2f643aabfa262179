use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use tracing::info;

use crate::record::MeetingRecord;

const TITLE: &str = "NIH Federal Register Closed Meeting Tracker";

/// Records per publication date, oldest first, with a running total.
#[derive(Debug, PartialEq, Eq)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
    pub cumulative: usize,
}

pub fn daily_counts(records: &[MeetingRecord]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *by_date.entry(r.publication_date()).or_default() += 1;
    }
    let mut running = 0;
    by_date
        .into_iter()
        .map(|(date, count)| {
            running += count;
            DailyCount {
                date: date.to_string(),
                count,
                cumulative: running,
            }
        })
        .collect()
}

/// Render the standalone HTML report.
pub fn render(records: &[MeetingRecord]) -> Result<String> {
    let counts = daily_counts(records);
    let max = counts.iter().map(|c| c.count).max().unwrap_or(1).max(1);

    let mut html = String::new();
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<link href="https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/css/bootstrap.min.css" rel="stylesheet">
<link href="https://cdn.datatables.net/2.0.2/css/dataTables.bootstrap5.min.css" rel="stylesheet">
<style>
body {{ padding: 20px; }}
.bar {{ background: #1f77b4; height: 14px; }}
.table-container {{ max-height: 600px; overflow-y: auto; }}
</style>
</head>
<body>
<div class="container-fluid">
<h1 class="text-center mb-4">{title}</h1>
<p class="text-center">Closed meetings announced by the <a href="https://www.federalregister.gov/agencies/national-institutes-of-health">National Institutes of Health</a> in the Federal Register.</p>
<p class="text-center fw-bold">This report may contain errors. Please verify the details before drawing any conclusions.</p>
"#,
        title = TITLE
    )?;

    html.push_str("<h2>Federal Register Publication Dates</h2>\n");
    html.push_str("<table class=\"table table-sm\" id=\"datesTable\">\n<thead><tr><th>Date</th><th>Entries</th><th>Cumulative</th><th></th></tr></thead>\n<tbody>\n");
    for c in &counts {
        let width = c.count * 100 / max;
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td><div class=\"bar\" style=\"width: {}%\"></div></td></tr>",
            escape(&c.date),
            c.count,
            c.cumulative,
            width
        )?;
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str("<div class=\"table-container mt-4\">\n<table class=\"table table-striped table-hover\" id=\"meetingsTable\">\n<thead><tr>");
    if let Some(first) = records.first() {
        for (name, _) in first.columns() {
            write!(html, "<th>{}</th>", name)?;
        }
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for r in records {
        html.push_str("<tr>");
        for (_, value) in r.columns() {
            write!(html, "<td>{}</td>", escape(value))?;
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</div>\n</div>\n");

    html.push_str(
        r#"<script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>
<script src="https://cdn.datatables.net/2.0.2/js/dataTables.min.js"></script>
<script src="https://cdn.datatables.net/2.0.2/js/dataTables.bootstrap5.min.js"></script>
<script>
$(document).ready(function() {
    $('#meetingsTable').DataTable({
        pageLength: 25,
        lengthMenu: [[10, 25, 50, 100, -1], [10, 25, 50, 100, "All"]],
        order: []
    });
});
</script>
</body>
</html>
"#,
    );
    Ok(html)
}

pub fn write_report(records: &[MeetingRecord], path: &Path) -> Result<()> {
    std::fs::write(path, render(records)?)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Report with {} records written to {}", records.len(), path.display());
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::groups::FieldGroup;

    fn record(committee: &str, published: &str) -> MeetingRecord {
        MeetingRecord::new(
            FieldGroup {
                committee: committee.into(),
                date: Some("March 4, 2025.".into()),
                ..Default::default()
            },
            published,
        )
    }

    #[test]
    fn counts_accumulate_in_date_order() {
        let records = vec![
            record("A", "2025-02-12"),
            record("B", "2025-02-11"),
            record("C", "2025-02-12"),
        ];
        let counts = daily_counts(&records);
        assert_eq!(
            counts,
            vec![
                DailyCount { date: "2025-02-11".into(), count: 1, cumulative: 1 },
                DailyCount { date: "2025-02-12".into(), count: 2, cumulative: 3 },
            ]
        );
    }

    #[test]
    fn escapes_values() {
        let html = render(&[record("Panel <A> & \"B\" O'Hara", "2025-02-11")]).unwrap();
        assert!(html.contains("Panel &lt;A&gt; &amp; &quot;B&quot; O&apos;Hara"));
        assert!(!html.contains("Panel <A>"));
        assert!(html.contains("<th>committee</th>"));
        assert!(html.contains("<td>2025-03-04</td>"));
    }

    #[test]
    fn empty_store_renders() {
        let html = render(&[]).unwrap();
        assert!(html.contains(TITLE));
        assert!(html.contains("meetingsTable"));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        write_report(&[record("A", "2025-02-11")], &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
