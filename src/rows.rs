//! Encounter rows as returned by the backend, and their normalization.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// One spreadsheet row keyed by its header text.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PreviewRow(HashMap<String, Value>);

impl PreviewRow {
    /// Raw cell text under one header, `None` when absent or empty.
    fn cell(&self, header: &str) -> Option<String> {
        let text = match self.0.get(header)? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        if text.is_empty() { None } else { Some(text) }
    }

    /// Field value following the field's key precedence; empty when none match.
    pub fn get(&self, field: Field) -> String {
        field
            .keys()
            .iter()
            .find_map(|k| self.cell(k))
            .unwrap_or_default()
    }
}

/// Logical columns the client knows how to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    PatientName,
    DateOfService,
    Facility,
    TypeOfCare,
    Cpt,
    /// Spelled "Assessment" by current files and "Assestment" by older ones.
    Diagnosis,
    Provider,
    Billed,
    NotBilledReason,
}

impl Field {
    /// Header names in precedence order.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Field::PatientName => &["Patient Name"],
            Field::DateOfService => &["Date of Service"],
            Field::Facility => &["Facility"],
            Field::TypeOfCare => &["Type of Care"],
            Field::Cpt => &["CPT"],
            Field::Diagnosis => &["Assessment", "Assestment"],
            Field::Provider => &["Servicing Provider"],
            Field::Billed => &["Billed"],
            Field::NotBilledReason => &["Reason for not billed"],
        }
    }
}

/// A row after alias resolution, with every field present (possibly empty).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedRow {
    pub patient_name: String,
    pub date_of_service: String,
    pub facility: String,
    pub type_of_care: String,
    pub cpt: String,
    pub diagnosis: String,
    pub provider: String,
    /// Raw billed text as sent ("Yes" / "No").
    pub billed_text: String,
    pub billed: bool,
    pub not_billed_reason: Option<String>,
}

impl From<&PreviewRow> for NormalizedRow {
    fn from(row: &PreviewRow) -> Self {
        let billed_text = row.get(Field::Billed);
        let reason = row.get(Field::NotBilledReason);
        Self {
            patient_name: row.get(Field::PatientName),
            date_of_service: row.get(Field::DateOfService),
            facility: row.get(Field::Facility),
            type_of_care: row.get(Field::TypeOfCare),
            cpt: row.get(Field::Cpt),
            diagnosis: row.get(Field::Diagnosis),
            provider: row.get(Field::Provider),
            billed: billed_text == "Yes",
            billed_text,
            not_billed_reason: if reason.is_empty() { None } else { Some(reason) },
        }
    }
}
