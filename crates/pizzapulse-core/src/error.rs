//! Shared error type across pizzapulse crates.

use thiserror::Error;

/// Stable error codes (used in log fields and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration rejected at startup.
    InvalidConfig,
    /// A system probe failed to produce a reading.
    ProbeFailed,
    /// A system probe did not answer in time.
    ProbeTimeout,
    /// A metric push failed at the transport level.
    ExportFailed,
    /// The sink answered a push with a non-success status.
    ExportRejected,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::ProbeFailed => "PROBE_FAILED",
            ErrorCode::ProbeTimeout => "PROBE_TIMEOUT",
            ErrorCode::ExportFailed => "EXPORT_FAILED",
            ErrorCode::ExportRejected => "EXPORT_REJECTED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("probe {probe} failed: {reason}")]
    Probe { probe: &'static str, reason: String },
    #[error("probe {0} timed out")]
    ProbeTimeout(&'static str),
    #[error("push failed: {0}")]
    Export(String),
    #[error("push rejected with status {0}")]
    ExportStatus(u16),
    #[error("internal: {0}")]
    Internal(String),
}

impl PulseError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PulseError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            PulseError::Probe { .. } => ErrorCode::ProbeFailed,
            PulseError::ProbeTimeout(_) => ErrorCode::ProbeTimeout,
            PulseError::Export(_) => ErrorCode::ExportFailed,
            PulseError::ExportStatus(_) => ErrorCode::ExportRejected,
            PulseError::Internal(_) => ErrorCode::Internal,
        }
    }
}
