use thiserror::Error;

/// Every import failure leaves the current roster exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("Could not detect header row. Columns should include 'Contestant' or 'Name' and 'Hour 1'")]
    HeaderNotFound,

    #[error("No valid data rows found")]
    NoValidRows,

    #[error("Failed to analyze image: {0}")]
    ExtractionFailed(String),

    #[error("Could not interpret the image data")]
    MalformedResult,

    #[error("Failed to read source: {0}")]
    SourceUnreadable(String),
}
