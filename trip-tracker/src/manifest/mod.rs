//! Manifest documents and passenger record extraction.
//!
//! Spreadsheet decoding happens upstream; this module works on the
//! tabulated form of a manifest (one [`ManifestSheet`] per worksheet) and
//! turns its rows into passenger records ready for reconciliation.

mod document;
mod error;
mod extract;

pub use document::{ManifestDocument, ManifestRow, ManifestSheet, PoCell, RowMarker};
pub use error::ExtractError;
pub use extract::{Extraction, SheetContext, extract_document, extract_row};
