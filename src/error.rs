//! Error types for the Q/A synthesis pipeline.
//!
//! This module provides a comprehensive error hierarchy using `thiserror` for
//! chunking, providers, dispatch, coverage analysis, persistence, and I/O.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking-related errors (text processing).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Provider errors (LLM or embedding backends).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Task dispatch and collection errors.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Coverage analysis errors.
    #[error("coverage error: {0}")]
    Coverage(#[from] CoverageError),

    /// Persistence errors (artifact or vector-store writes).
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Chunking-specific errors for text processing.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid UTF-8 encountered at specific byte offset.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Chunk size exceeds maximum allowed.
    #[error("chunk size {size} exceeds maximum {max}")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// `min_tokens` exceeds `max_tokens`.
    #[error("min_tokens {min} must be less than max_tokens {max}")]
    BoundsInverted {
        /// Minimum token count.
        min: usize,
        /// Maximum token count.
        max: usize,
    },
}

/// Provider-specific errors (LLM or embedding backends).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request to the provider timed out.
    #[error("provider call timed out after {secs}s")]
    Timeout {
        /// Timeout that was exceeded, in seconds.
        secs: u64,
    },

    /// The provider returned a rate-limit or transient network error.
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// The provider's response did not validate against the expected schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Neither structured nor text generation yielded any usable pair.
    #[error("no usable output from provider")]
    EmptyOutput,

    /// An unknown or unconfigured provider tag was requested.
    #[error("unknown provider: {0}")]
    Unknown(String),

    /// Missing required environment configuration (e.g., an API key).
    #[error("missing provider configuration: {0}")]
    MissingConfig(String),
}

/// Dispatch and collection errors.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The broker could not be reached.
    #[error("broker unreachable: {0}")]
    BrokerUnreachable(String),

    /// Fewer workers are available than the configured worker count.
    #[error("too few workers: requested {requested}, available {available}")]
    TooFewWorkers {
        /// Requested worker count.
        requested: usize,
        /// Available worker count.
        available: usize,
    },

    /// A result record could not be read or decoded from the result store.
    #[error("result store read failed for task {task_id}: {reason}")]
    ResultReadFailed {
        /// Task id whose result could not be read.
        task_id: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Coverage analysis errors.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// The chunk and embedding vector counts did not match.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector dimensionality.
        expected: usize,
        /// Actual vector dimensionality.
        actual: usize,
    },
}

/// Persistence errors (artifact writes and vector-store ingestion).
#[derive(Error, Debug)]
pub enum PersistError {
    /// Failed to write an output artifact.
    #[error("failed to write artifact {path}: {reason}")]
    ArtifactWriteFailed {
        /// Path of the artifact.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The vector store rejected a write after retries.
    #[error("vector store write failed: {0}")]
    VectorStoreWriteFailed(String),

    /// CSV encoding or decoding error.
    #[error("CSV error: {0}")]
    Csv(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Unrecognized input file format.
    #[error("unrecognized input format: {path}")]
    UnrecognizedFormat {
        /// Path whose format could not be determined.
        path: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutually exclusive arguments were both supplied (or neither).
    #[error("exactly one of dataset tag or input file is required")]
    ExclusiveArgsViolated,

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// User cancelled operation.
    #[error("operation cancelled by user")]
    Cancelled,
}

// Implement From traits for standard library and third-party errors.

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<csv::Error> for PersistError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<csv::Error> for IoError {
    fn from(err: csv::Error) -> Self {
        Self::Generic(err.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Generic(err.to_string())
    }
}

impl From<reqwest::Error> for PersistError {
    fn from(err: reqwest::Error) -> Self {
        Self::VectorStoreWriteFailed(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { secs: 0 }
        } else {
            Self::Transient(err.to_string())
        }
    }
}
