//! Error types for Horizon Grid.

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the store and gesture layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `resume_filter_on_update` was called more often than `suspend_filter_on_update`.
    #[error("No matching suspend_filter_on_update call")]
    UnbalancedResume,

    /// Drag data was requested from an aborted drag.
    #[error("Data is not available on aborted drag")]
    DragAborted,

    /// Drag data was requested before the drag completed.
    #[error("Data is not available until drag completion")]
    DragIncomplete,

    /// The operation referenced a record the store does not hold.
    #[error("Record '{id}' is not part of this store")]
    UnknownRecord { id: String },

    /// A grouping operation was requested on an ungrouped store.
    #[error("Store is not grouped")]
    NotGrouped,

    /// A tree operation was requested on a flat store.
    #[error("Store is not a tree store")]
    NotATree,

    /// A `matches` filter was given an invalid regular expression.
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Record data could not be interpreted.
    #[error("Invalid record data: {message}")]
    InvalidData { message: String },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an unknown-record error.
    pub fn unknown_record(id: impl std::fmt::Display) -> Self {
        Self::UnknownRecord { id: id.to_string() }
    }

    /// Create an invalid-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
