//! Confirmation view model
//! Built from the record taken out of the handoff slot.

use chrono::Local;

use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRow {
    pub label: &'static str,
    pub value: String,
}

/// (record key, label, shown only when present)
const DETAIL_ROWS: &[(&str, &str, bool)] = &[
    ("email", "Email", false),
    ("phone", "Phone", true),
    ("travelDates", "Travel Dates", true),
    ("groupSize", "Group Size", true),
    ("subject", "Subject", false),
    ("interests", "Interests", true),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub rows: Vec<ConfirmationRow>,
}

impl Confirmation {
    pub fn from_record(record: &SubmissionRecord) -> Self {
        let mut rows = Vec::with_capacity(DETAIL_ROWS.len() + 2);

        let contact = [record.get("firstName"), record.get("lastName")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        rows.push(ConfirmationRow { label: "Contact", value: contact });

        for &(key, label, optional) in DETAIL_ROWS {
            match record.get(key) {
                Some(value) => rows.push(ConfirmationRow { label, value: value.to_string() }),
                None if !optional => rows.push(ConfirmationRow { label, value: String::new() }),
                None => {}
            }
        }

        let submitted = record.submitted_at.with_timezone(&Local).format("%Y-%m-%d").to_string();
        rows.push(ConfirmationRow { label: "Submitted", value: submitted });

        Self { rows }
    }

    #[cfg(test)]
    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows.iter().find(|r| r.label == label).map(|r| r.value.as_str())
    }

    /// Plain `Label: value` lines for the CLI
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|r| format!("{}: {}", r.label, r.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
