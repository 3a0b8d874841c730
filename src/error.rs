//! Error Types and Handling
//!
//! Error types for the cohort clustering engine, with structured error codes
//! for programmatic handling and descriptive messages for the dashboard.
//!
//! # Error Categories
//!
//! Errors are organized into categories with numeric codes:
//!
//! | Range | Category | Examples |
//! |-------|----------|----------|
//! | 1xxx | I/O errors | Read, Write |
//! | 2xxx | Serialization | Serialize, Deserialize |
//! | 3xxx | Input | InsufficientData, InvalidConfig |
//! | 4xxx | Backend | ProcessFailed, ServiceFailed |
//! | 5xxx | Persistence | PersistenceFailed |
//!
//! # Example
//!
//! ```rust
//! use cohort::error::{CohortError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CohortError::InsufficientData { needed: 3, got: 2 })
//! }
//!
//! fn handle_error(err: CohortError) {
//!     let code = err.error_code();
//!     println!("Error code: {:?} ({})", code, code.code());
//! }
//! ```

use thiserror::Error;

/// Error code categories for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Failed to read from disk
    IoRead = 1001,
    /// Failed to write to disk
    IoWrite = 1002,

    /// Failed to serialize data (e.g., JSON encoding)
    SerializationFailed = 2001,
    /// Failed to deserialize data (e.g., corrupt JSON)
    DeserializationFailed = 2002,

    /// Fewer learners than requested clusters
    InsufficientData = 3001,
    /// Configuration value is invalid
    InvalidConfig = 3002,

    /// External clustering process failed
    ProcessFailed = 4001,
    /// Remote clustering service failed
    ServiceFailed = 4002,

    /// Transactional write to the result store failed
    PersistenceFailed = 5001,
}

impl ErrorCode {
    /// Get the numeric error code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a brief description of the error category
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::IoRead | ErrorCode::IoWrite => "I/O",
            ErrorCode::SerializationFailed | ErrorCode::DeserializationFailed => "Serialization",
            ErrorCode::InsufficientData | ErrorCode::InvalidConfig => "Input",
            ErrorCode::ProcessFailed | ErrorCode::ServiceFailed => "Backend",
            ErrorCode::PersistenceFailed => "Persistence",
        }
    }
}

/// Error types for cohort clustering operations
#[must_use]
#[derive(Error, Debug)]
pub enum CohortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Need at least {needed} learners for clustering, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("External clustering process failed: {0}")]
    Process(String),

    #[error("Clustering service failed: {0}")]
    Service(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl CohortError {
    /// Get the error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CohortError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorCode::IoRead,
            CohortError::Io(_) => ErrorCode::IoWrite,
            CohortError::Serialization(e) if e.is_data() || e.is_syntax() || e.is_eof() => {
                ErrorCode::DeserializationFailed
            }
            CohortError::Serialization(_) => ErrorCode::SerializationFailed,
            CohortError::InsufficientData { .. } => ErrorCode::InsufficientData,
            CohortError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            CohortError::Process(_) => ErrorCode::ProcessFailed,
            CohortError::Service(_) => ErrorCode::ServiceFailed,
            CohortError::Persistence(_) => ErrorCode::PersistenceFailed,
        }
    }

    /// Check if the error is retryable without caller-side changes.
    ///
    /// Transport-level failures may succeed on retry; input and
    /// configuration errors never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CohortError::Process(_) | CohortError::Service(_) | CohortError::Io(_)
        )
    }
}

/// Result type alias for cohort operations
pub type Result<T> = std::result::Result<T, CohortError>;
