//! Error types for the tower viewer core

use thiserror::Error;

/// A geometry payload that cannot be turned into a [`GeometryModel`].
///
/// Building is all-or-nothing: when any of these is returned, no part of the
/// payload has been applied.
///
/// [`GeometryModel`]: crate::geometry::GeometryModel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Geometry payload must be a JSON object")]
    NotAnObject,

    #[error("Geometry payload has no coordinates")]
    MissingCoordinates,

    #[error("Geometry payload has no elements")]
    MissingElements,

    #[error("Section count mismatch: {coordinates} coordinate sections vs {elements} element sections")]
    SectionCountMismatch { coordinates: usize, elements: usize },

    #[error("Section entry {0} is not an object")]
    MalformedSection(usize),

    #[error("Section entry {position} has an invalid section index")]
    InvalidSectionIndex { position: usize },

    #[error("Section entry {position}: coordinates belong to section {coordinates} but elements to section {elements}")]
    SectionIndexMismatch {
        position: usize,
        coordinates: u32,
        elements: u32,
    },

    #[error("Section {0} appears more than once")]
    DuplicateSection(u32),

    #[error("Section {section}: node '{key}' is not a numeric 2- or 3-tuple")]
    InvalidPosition { section: u32, key: String },

    #[error("Section {section}: element {index} is malformed ({reason})")]
    MalformedElement {
        section: u32,
        index: usize,
        reason: String,
    },

    #[error("Section {section}: element {index} references a position that is not in the coordinate set")]
    UnresolvedEndpoint { section: u32, index: usize },
}

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid geometry: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The calculator rejected the request; the message is shown as-is.
    #[error("{0}")]
    Domain(String),

    #[error("A recalculation is already in progress")]
    Busy,

    #[error("Response discarded: the view was invalidated while the request was in flight")]
    Stale,

    #[error("No geometry loaded")]
    NoGeometry,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        ViewerError::Transport(err.to_string())
    }
}

/// Result type for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;
