//! Error taxonomy shared by every stage of the job.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Source table cannot be resolved or read
    E001SourceUnavailable,
    /// E002: Timestamp value cannot be interpreted
    E002MalformedTimestamp,
    /// E003: Destination write failed
    E003DestinationWriteFailure,
    /// E004: Required column missing or of the wrong type
    E004SchemaMismatch,
    /// E005: Configuration missing or invalid
    E005InvalidConfig,
    /// E006: Arrow or Parquet kernel failure
    E006ComputeFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001SourceUnavailable => "E001",
            Self::E002MalformedTimestamp => "E002",
            Self::E003DestinationWriteFailure => "E003",
            Self::E004SchemaMismatch => "E004",
            Self::E005InvalidConfig => "E005",
            Self::E006ComputeFailure => "E006",
        }
    }
}

/// Errors that abort a job run. None of them are recovered locally.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("[{code}] Source table '{table}' unavailable: {reason}")]
    SourceUnavailable {
        code: &'static str,
        table: String,
        reason: String,
    },

    #[error("[{code}] Malformed timestamp in column '{column}' at row {row}: {value:?}")]
    MalformedTimestamp {
        code: &'static str,
        column: String,
        row: usize,
        value: String,
    },

    #[error("[{code}] Write to '{location}' failed: {reason}")]
    DestinationWriteFailure {
        code: &'static str,
        location: String,
        reason: String,
    },

    #[error("[{code}] Schema mismatch: {message}")]
    SchemaMismatch { code: &'static str, message: String },

    #[error("[{code}] Invalid configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    #[error("[{code}] Arrow compute failed: {0}", code = ErrorCode::E006ComputeFailure.as_str())]
    Arrow(#[from] ArrowError),

    #[error("[{code}] Parquet encoding failed: {0}", code = ErrorCode::E006ComputeFailure.as_str())]
    Parquet(#[from] ParquetError),
}

impl EtlError {
    pub fn source_unavailable(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            code: ErrorCode::E001SourceUnavailable.as_str(),
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_timestamp(column: impl Into<String>, row: usize, value: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            code: ErrorCode::E002MalformedTimestamp.as_str(),
            column: column.into(),
            row,
            value: value.into(),
        }
    }

    pub fn destination_write_failure(
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DestinationWriteFailure {
            code: ErrorCode::E003DestinationWriteFailure.as_str(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            code: ErrorCode::E004SchemaMismatch.as_str(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E005InvalidConfig.as_str(),
            message: message.into(),
        }
    }

    /// Error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SourceUnavailable { .. } => ErrorCode::E001SourceUnavailable,
            Self::MalformedTimestamp { .. } => ErrorCode::E002MalformedTimestamp,
            Self::DestinationWriteFailure { .. } => ErrorCode::E003DestinationWriteFailure,
            Self::SchemaMismatch { .. } => ErrorCode::E004SchemaMismatch,
            Self::InvalidConfig { .. } => ErrorCode::E005InvalidConfig,
            Self::Arrow(_) | Self::Parquet(_) => ErrorCode::E006ComputeFailure,
        }
    }
}

/// Result type alias for EtlError
pub type Result<T> = std::result::Result<T, EtlError>;
