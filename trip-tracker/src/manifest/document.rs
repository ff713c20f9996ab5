//! Tabulated manifest documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::IngestionStatus;

use super::error::ExtractError;

/// Row highlight used by ship agents to flag edits to an earlier manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowMarker {
    #[default]
    None,
    /// Row is a cancellation.
    Red,
    /// Row changes an earlier booking.
    Yellow,
}

impl RowMarker {
    pub fn ingestion(self) -> IngestionStatus {
        match self {
            RowMarker::None => IngestionStatus::Add,
            RowMarker::Red => IngestionStatus::Cancel,
            RowMarker::Yellow => IngestionStatus::Change,
        }
    }
}

/// A purchase-order cell, which may have been typed as a number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoCell {
    Number(u64),
    Text(String),
}

impl PoCell {
    /// The PO number, or `None` if the cell holds something else.
    pub fn value(&self) -> Option<u64> {
        match self {
            PoCell::Number(n) => Some(*n),
            PoCell::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One passenger row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestRow {
    pub marker: RowMarker,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub flight: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub pickup_location: Option<String>,
    pub destination: Option<String>,
    /// Hotel column, used when the pickup or destination says "hotel".
    pub hotel: Option<String>,
    pub immigration: Option<String>,
    pub organization: Option<String>,
    pub remarks: Option<String>,
    pub po: Option<PoCell>,
}

/// One worksheet: a ship's passengers at one harbour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSheet {
    pub name: String,
    pub ship: String,
    #[serde(default)]
    pub harbour: Option<String>,
    #[serde(default)]
    pub rows: Vec<ManifestRow>,
}

/// A whole uploaded manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub sheets: Vec<ManifestSheet>,
}

impl ManifestDocument {
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(json).map_err(|e| ExtractError::Document {
            message: e.to_string(),
        })
    }

    /// Read a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ExtractError::Document {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_map_to_ingestion_status() {
        assert_eq!(RowMarker::None.ingestion(), IngestionStatus::Add);
        assert_eq!(RowMarker::Red.ingestion(), IngestionStatus::Cancel);
        assert_eq!(RowMarker::Yellow.ingestion(), IngestionStatus::Change);
    }

    #[test]
    fn po_cell_accepts_number_or_text() {
        assert_eq!(PoCell::Number(42).value(), Some(42));
        assert_eq!(PoCell::Text(" 42 ".into()).value(), Some(42));
        assert_eq!(PoCell::Text("n/a".into()).value(), None);
    }

    #[test]
    fn parse_document() {
        let doc = ManifestDocument::from_json(
            r#"{
                "sheets": [{
                    "name": "Crew",
                    "ship": "Aurora",
                    "harbour": "Stavanger",
                    "rows": [
                        {"first_name": "Alice", "surname": "Smith", "date": "2024-06-01", "time": "09:00", "po": 17},
                        {"marker": "red", "first_name": "Bob", "surname": "Lee", "po": "18"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let sheet = &doc.sheets[0];
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].marker, RowMarker::None);
        assert_eq!(sheet.rows[0].po, Some(PoCell::Number(17)));
        assert_eq!(sheet.rows[1].marker, RowMarker::Red);
        assert_eq!(sheet.rows[1].po, Some(PoCell::Text("18".into())));
    }

    #[test]
    fn invalid_document_is_an_error() {
        let err = ManifestDocument::from_json("{\"sheets\": 3}").unwrap_err();
        assert!(matches!(err, ExtractError::Document { .. }));
    }
}
