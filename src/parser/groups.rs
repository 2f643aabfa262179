use super::elements::InlineElement;

/// `T` attribute value the Federal Register uses for bold field labels.
pub const LABEL_MARKER: &str = "03";

/// Raw labeled values belonging to one announced meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldGroup {
    pub committee: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub agenda: Option<String>,
    pub meeting_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Committee,
    Field(Field),
}

/// Labels that fill a slot of the open group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Time,
    Agenda,
    MeetingFormat,
}

// Checked in order; the first phrase contained in the label text wins.
const LABELS: &[(&str, Label)] = &[
    ("Name of Committee", Label::Committee),
    ("Date:", Label::Field(Field::Date)),
    ("Time:", Label::Field(Field::Time)),
    ("Agenda:", Label::Field(Field::Agenda)),
    ("Meeting Format:", Label::Field(Field::MeetingFormat)),
];

fn classify_label(text: &str) -> Option<Label> {
    LABELS
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, label)| *label)
}

impl FieldGroup {
    fn opened_by(committee: &str) -> Self {
        FieldGroup {
            committee: committee.to_string(),
            ..Default::default()
        }
    }

    fn with_field(mut self, field: Field, value: &str) -> Self {
        let slot = match field {
            Field::Date => &mut self.date,
            Field::Time => &mut self.time,
            Field::Agenda => &mut self.agenda,
            Field::MeetingFormat => &mut self.meeting_format,
        };
        *slot = Some(value.to_string());
        self
    }
}

/// Fold a flat element stream into one field group per committee marker.
///
/// A group runs from its "Name of Committee" label to the next one (or the end
/// of the document). Labels seen before the first committee marker have no
/// group to land in and are dropped; a label repeated within a group keeps its
/// last value.
pub fn group_fields(elements: &[InlineElement]) -> Vec<FieldGroup> {
    let (mut groups, open) = elements
        .iter()
        .filter(|el| el.marker.as_deref() == Some(LABEL_MARKER))
        .fold(
            (Vec::<FieldGroup>::new(), None::<FieldGroup>),
            |(mut groups, open), el| match classify_label(&el.text) {
                Some(Label::Committee) => {
                    groups.extend(open);
                    (groups, Some(FieldGroup::opened_by(&el.tail)))
                }
                Some(Label::Field(field)) => (groups, open.map(|g| g.with_field(field, &el.tail))),
                None => (groups, open),
            },
        );
    groups.extend(open);
    groups
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str, tail: &str) -> InlineElement {
        InlineElement {
            marker: Some(LABEL_MARKER.into()),
            text: text.into(),
            tail: tail.into(),
        }
    }

    #[test]
    fn two_committees_split_fields() {
        let els = vec![
            label("Name of Committee:", "Panel A."),
            label("Date:", "March 4, 2025."),
            label("Time:", "9:00 a.m. to 5:00 p.m."),
            label("Name of Committee:", "Panel B."),
            label("Agenda:", "To review grant applications."),
            label("Meeting Format:", "Virtual Meeting."),
        ];
        let groups = group_fields(&els);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].committee, "Panel A.");
        assert_eq!(groups[0].date.as_deref(), Some("March 4, 2025."));
        assert_eq!(groups[0].time.as_deref(), Some("9:00 a.m. to 5:00 p.m."));
        assert!(groups[0].agenda.is_none());
        assert_eq!(groups[1].committee, "Panel B.");
        assert!(groups[1].date.is_none());
        assert_eq!(groups[1].meeting_format.as_deref(), Some("Virtual Meeting."));
    }

    #[test]
    fn no_committee_marker_yields_nothing() {
        let els = vec![
            label("Date:", "March 4, 2025."),
            label("Time:", "9:00 a.m."),
        ];
        assert!(group_fields(&els).is_empty());
    }

    #[test]
    fn repeated_label_keeps_last() {
        let els = vec![
            label("Name of Committee:", "Panel A."),
            label("Date:", "March 4, 2025."),
            label("Date:", "March 5, 2025."),
        ];
        let groups = group_fields(&els);
        assert_eq!(groups[0].date.as_deref(), Some("March 5, 2025."));
    }

    #[test]
    fn other_markers_and_unknown_labels_ignored() {
        let els = vec![
            label("Name of Committee:", "Panel A."),
            InlineElement {
                marker: Some("04".into()),
                text: "Date:".into(),
                tail: "ignored".into(),
            },
            InlineElement {
                marker: None,
                text: "Time:".into(),
                tail: "ignored".into(),
            },
            label("Contact Person:", "Jane Doe, Ph.D."),
            label("Place:", "National Institutes of Health"),
        ];
        let groups = group_fields(&els);
        assert_eq!(
            groups,
            vec![FieldGroup {
                committee: "Panel A.".into(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn labels_classify_by_phrase() {
        assert_eq!(classify_label("Name of Committee:"), Some(Label::Committee));
        assert_eq!(classify_label("Meeting Format:"), Some(Label::Field(Field::MeetingFormat)));
        assert_eq!(classify_label("Contact Person:"), None);
    }

    #[test]
    fn empty_committee_still_opens_group() {
        let els = vec![label("Name of Committee:", ""), label("Date:", "May 1, 2025.")];
        let groups = group_fields(&els);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].committee, "");
    }
}
