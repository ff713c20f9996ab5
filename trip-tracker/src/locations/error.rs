//! Location resolution error types.

/// Errors that can occur when resolving a place name.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    /// The place name was blank
    #[error("place name is empty")]
    EmptyName,

    /// The places file could not be read or parsed
    #[error("places file error: {message}")]
    Places { message: String },
}
