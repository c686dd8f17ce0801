//! Terminal-independent render models built from backend payloads.

use crate::{
    api::types::{CatalogEntry, JobResults, OutputFiles, PreviewResponse, ResultsSummary},
    rows::{NormalizedRow, PreviewRow},
};

/// Label of the leading empty catalog entry.
pub const CATALOG_PLACEHOLDER: &str = "Select a sample file...";
/// Label of the single entry shown when the catalog cannot be loaded.
pub const CATALOG_ERROR: &str = "Error loading sample files";

/// Column headers of the raw preview table.
pub const PREVIEW_HEADER: [&str; 7] = [
    "Patient Name",
    "Date of Service",
    "Facility",
    "Type of Care",
    "CPT",
    "DX (Assessment)",
    "Provider",
];

/// Column headers of the processed results table.
pub const RESULTS_HEADER: [&str; 7] = [
    "Patient Name",
    "Date of Service",
    "Facility",
    "Type of Care",
    "CPT",
    "Billed",
    "Reason",
];

/// Visual emphasis of a card or row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Success,
    Error,
}

/// One entry of the catalog list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogOption {
    /// Catalog identifier sent to the backend; empty for placeholders.
    pub value: String,
    pub label: String,
    pub enabled: bool,
}

/// The whole catalog list, either fully populated or the error placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogView {
    pub options: Vec<CatalogOption>,
}

impl CatalogView {
    /// Placeholder followed by one option per entry, in backend order.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut options = Vec::with_capacity(entries.len() + 1);
        options.push(CatalogOption {
            value: String::new(),
            label: CATALOG_PLACEHOLDER.into(),
            enabled: true,
        });
        options.extend(entries.iter().map(|e| CatalogOption {
            value: e.filename.clone(),
            label: e.description.clone(),
            enabled: true,
        }));
        Self { options }
    }

    /// Single disabled entry.
    pub fn failed() -> Self {
        Self {
            options: vec![CatalogOption {
                value: String::new(),
                label: CATALOG_ERROR.into(),
                enabled: false,
            }],
        }
    }

    /// Selection value at `idx`, empty when out of range or disabled.
    pub fn value_at(&self, idx: usize) -> &str {
        match self.options.get(idx) {
            Some(o) if o.enabled => &o.value,
            _ => "",
        }
    }
}

impl Default for CatalogView {
    /// Before the first load the list only holds the placeholder.
    fn default() -> Self {
        Self::from_entries(&[])
    }
}

/// A rendered table row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub tone: Tone,
}

/// Raw preview of a catalog file.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewView {
    pub sample_name: String,
    pub total_rows: u64,
    pub showing_rows: u64,
    pub rows: Vec<TableRow>,
}

impl PreviewView {
    pub fn new(sample_name: &str, resp: &PreviewResponse) -> Self {
        let rows: Vec<TableRow> = visible(&resp.preview_data, resp.showing_rows)
            .iter()
            .map(preview_row)
            .collect();
        Self {
            sample_name: sample_name.to_string(),
            total_rows: resp.total_rows,
            showing_rows: resp.showing_rows.unwrap_or(rows.len() as u64),
            rows,
        }
    }

    /// "Total vs shown" line above the table.
    pub fn summary_line(&self) -> String {
        format!(
            "Total Encounters: {} | Showing: {} rows",
            self.total_rows, self.showing_rows
        )
    }
}

/// One of the four headline numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

/// Processed results of one job.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsView {
    pub cards: [StatCard; 4],
    /// Added, updated, removed.
    pub master_missing: [(&'static str, String); 3],
    pub rows: Vec<TableRow>,
    pub footer: String,
    pub output_files: OutputFiles,
    /// Name of the processed input, when the backend reports it.
    pub input_file: String,
    pub execution_date: String,
    pub timestamp: Option<String>,
}

impl ResultsView {
    pub fn new(results: &JobResults) -> Self {
        let s = &results.summary;
        let rows: Vec<TableRow> = visible(&results.preview_data, results.showing_rows)
            .iter()
            .map(result_row)
            .collect();
        let footer = if rows.is_empty() {
            "No preview data available".to_string()
        } else {
            format!("Showing {} of {} encounters", rows.len(), s.total_encounters)
        };
        Self {
            cards: stat_cards(s),
            master_missing: [
                ("Added", s.master_missing_added.to_string()),
                ("Updated", s.master_missing_updated.to_string()),
                ("Removed", s.master_missing_removed.to_string()),
            ],
            rows,
            footer,
            output_files: results.output_files.clone(),
            input_file: s.input_file.clone(),
            execution_date: s.execution_date.clone(),
            timestamp: results.timestamp.clone(),
        }
    }
}

fn stat_cards(s: &ResultsSummary) -> [StatCard; 4] {
    [
        StatCard {
            label: "Total Encounters",
            value: s.total_encounters.to_string(),
            tone: Tone::Neutral,
        },
        StatCard {
            label: "Billed Successfully",
            value: s.billed_count.to_string(),
            tone: Tone::Success,
        },
        StatCard {
            label: "Not Billed",
            value: s.not_billed_count.to_string(),
            tone: Tone::Error,
        },
        StatCard {
            label: "Success Rate",
            value: format!("{:.1}%", s.success_rate),
            tone: Tone::Neutral,
        },
    ]
}

/// Rows to show: all returned rows, capped by the declared count when there is one.
fn visible(rows: &[PreviewRow], declared: Option<u64>) -> &[PreviewRow] {
    let cap = declared
        .map(|d| usize::try_from(d).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    &rows[..rows.len().min(cap)]
}

fn preview_row(row: &PreviewRow) -> TableRow {
    let n = NormalizedRow::from(row);
    TableRow {
        cells: vec![
            n.patient_name,
            n.date_of_service,
            n.facility,
            n.type_of_care,
            n.cpt,
            n.diagnosis,
            n.provider,
        ],
        tone: Tone::Neutral,
    }
}

fn result_row(row: &PreviewRow) -> TableRow {
    let n = NormalizedRow::from(row);
    let tone = if n.billed { Tone::Success } else { Tone::Error };
    TableRow {
        cells: vec![
            n.patient_name,
            n.date_of_service,
            n.facility,
            n.type_of_care,
            n.cpt,
            n.billed_text,
            n.not_billed_reason.unwrap_or_else(|| "-".into()),
        ],
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<PreviewRow> {
        (0..n)
            .map(|i| {
                serde_json::from_value(json!({
                    "Patient Name": format!("Patient {i}"),
                    "Billed": if i % 2 == 0 { "Yes" } else { "No" },
                }))
                .unwrap()
            })
            .collect()
    }

    fn results(summary: ResultsSummary, preview_data: Vec<PreviewRow>) -> JobResults {
        JobResults {
            summary,
            preview_data,
            output_files: OutputFiles::default(),
            showing_rows: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_catalog_placeholder_then_entries() {
        let entries = vec![
            CatalogEntry {
                filename: "sample_b.xlsx".into(),
                description: "B".into(),
            },
            CatalogEntry {
                filename: "sample_a.xlsx".into(),
                description: "A".into(),
            },
        ];
        let v = CatalogView::from_entries(&entries);
        assert_eq!(v.options.len(), 3);
        assert_eq!(v.options[0].value, "");
        assert_eq!(v.options[0].label, CATALOG_PLACEHOLDER);
        assert_eq!(v.value_at(1), "sample_b.xlsx");
        assert_eq!(v.options[2].label, "A");
        assert_eq!(v.value_at(9), "");
    }

    #[test]
    fn test_catalog_failed_is_single_disabled_entry() {
        let v = CatalogView::failed();
        assert_eq!(v.options.len(), 1);
        assert!(!v.options[0].enabled);
        assert_eq!(v.options[0].label, CATALOG_ERROR);
        assert_eq!(v.value_at(0), "");
    }

    #[test]
    fn test_scenario_stat_cards() {
        // Preset "sample_q1.xlsx" processed as job-42.
        let s = ResultsSummary {
            total_encounters: 100,
            billed_count: 80,
            not_billed_count: 20,
            success_rate: 80.0,
            master_missing_added: 3,
            master_missing_updated: 1,
            master_missing_removed: 0,
            ..Default::default()
        };
        let v = ResultsView::new(&results(s, vec![]));
        let values: Vec<_> = v.cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, ["100", "80", "20", "80.0%"]);
        assert_eq!(v.cards[1].tone, Tone::Success);
        assert_eq!(v.cards[2].tone, Tone::Error);
        let mm: Vec<_> = v.master_missing.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(mm, ["3", "1", "0"]);
        assert_eq!(v.footer, "No preview data available");
    }

    #[test]
    fn test_success_rate_one_decimal() {
        let s = ResultsSummary {
            success_rate: 66.666,
            ..Default::default()
        };
        assert_eq!(ResultsView::new(&results(s, vec![])).cards[3].value, "66.7%");
    }

    #[test]
    fn test_result_rows_tone_and_reason_placeholder() {
        let s = ResultsSummary {
            total_encounters: 150,
            ..Default::default()
        };
        let v = ResultsView::new(&results(s, rows(2)));
        assert_eq!(v.rows[0].tone, Tone::Success);
        assert_eq!(v.rows[1].tone, Tone::Error);
        assert_eq!(v.rows[1].cells[6], "-");
        assert_eq!(v.footer, "Showing 2 of 150 encounters");
    }

    #[test]
    fn test_rendered_count_is_min_of_returned_and_declared() {
        let s = ResultsSummary {
            total_encounters: 40,
            ..Default::default()
        };
        for (returned, declared, expected) in [(20, Some(5), 5), (3, Some(20), 3), (7, None, 7)] {
            let mut r = results(s.clone(), rows(returned));
            r.showing_rows = declared;
            let v = ResultsView::new(&r);
            assert_eq!(v.rows.len(), expected);
            assert_eq!(v.footer, format!("Showing {expected} of 40 encounters"));
        }
    }

    #[test]
    fn test_preview_uses_alias_and_caps_rows() {
        let resp = PreviewResponse {
            success: true,
            total_rows: 25,
            showing_rows: Some(1),
            preview_data: vec![
                serde_json::from_value(json!({"Patient Name": "Doe", "Assestment": "I10"})).unwrap(),
                serde_json::from_value(json!({"Patient Name": "Roe"})).unwrap(),
            ],
            error: None,
        };
        let v = PreviewView::new("sample_mixed.xlsx", &resp);
        assert_eq!(v.rows.len(), 1);
        assert_eq!(v.rows[0].cells[5], "I10");
        assert_eq!(v.summary_line(), "Total Encounters: 25 | Showing: 1 rows");
    }

    #[test]
    fn test_preview_without_declared_count_shows_all_rows() {
        let resp = PreviewResponse {
            success: true,
            total_rows: 3,
            showing_rows: None,
            preview_data: rows(3),
            error: None,
        };
        let v = PreviewView::new("sample_mixed.xlsx", &resp);
        assert_eq!(v.rows.len(), 3);
        assert_eq!(v.summary_line(), "Total Encounters: 3 | Showing: 3 rows");
    }
}
