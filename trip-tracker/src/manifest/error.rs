//! Manifest extraction error types.

use crate::store::StoreError;

/// Errors that stop a sheet or a whole document from being read.
///
/// Problems with a single row are never errors; they are recorded on the
/// extracted passenger instead.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The sheet still carries the template's placeholder ship name
    #[error("missing name of the ship")]
    MissingShipName,

    /// The sheet names no harbour
    #[error("harbour could not be found on sheet {sheet}")]
    MissingHarbour { sheet: String },

    /// The ship is registered to a different organizer company
    #[error("ship {ship} belongs to another organizer company")]
    ForeignShip { ship: String },

    /// The document is not a valid manifest
    #[error("invalid manifest document: {message}")]
    Document { message: String },

    /// Looking up or registering reference data failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
