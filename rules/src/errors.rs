//! Rules engine error types
//!
//! Three categories, each mapped by the API layer to a user-facing status:
//! - validation: the caller asked for something invalid (`InvalidRange`, `OverlappingRequest`)
//! - conflict: the request clashes with existing state (`AlreadyActive`)
//! - system: the store failed; surfaced generically, logged with context

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{PermissionId, ResidentId};

/// Error category for structured logging and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    System,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::System => "SYSTEM",
        }
    }
}

/// Generic text shown to residents when the store fails.
pub const SYSTEM_ERROR_MESSAGE: &str = "Something went wrong, please try again later.";

/// Failure reported by a [`PersistenceGateway`](crate::gateway::PersistenceGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A uniqueness rule rejected the write at commit time.
    #[error("write conflict: {message}")]
    Conflict { message: String },
}

impl GatewayError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Conflict { .. } => "WRITE_CONFLICT",
        }
    }
}

/// Why a permission candidate was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionRejection {
    #[error("end date {end_date} is before start date {start_date}")]
    InvalidRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("overlaps pending request {conflicting} ({start_date} to {end_date})")]
    OverlappingRequest {
        conflicting: PermissionId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl PermissionRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::OverlappingRequest { .. } => "OVERLAPPING_REQUEST",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "End date cannot be before the start date.",
            Self::OverlappingRequest { .. } => {
                "You already have a pending request covering some of these dates."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("permission rejected: {0}")]
    Rejected(#[from] PermissionRejection),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl PermissionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected(_) => ErrorCategory::Validation,
            Self::Gateway(_) => ErrorCategory::System,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.code(),
            Self::Gateway(err) => err.code(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.user_message(),
            Self::Gateway(_) => SYSTEM_ERROR_MESSAGE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClearanceError {
    #[error("resident {resident_id} already has an open clearance request")]
    AlreadyActive { resident_id: ResidentId },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ClearanceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlreadyActive { .. } => ErrorCategory::Conflict,
            Self::Gateway(_) => ErrorCategory::System,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyActive { .. } => "ALREADY_ACTIVE",
            Self::Gateway(err) => err.code(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AlreadyActive { .. } => "A clearance request is already in progress.",
            Self::Gateway(_) => SYSTEM_ERROR_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_errors_hide_detail_from_users() {
        let err = PermissionError::from(GatewayError::storage("disk I/O error at page 42"));
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(err.user_message(), SYSTEM_ERROR_MESSAGE);
        assert!(err.to_string().contains("page 42"));
    }

    #[test]
    fn rejection_codes_are_stable() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let err = PermissionError::from(PermissionRejection::InvalidRange {
            start_date: start,
            end_date: end,
        });
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.code(), "INVALID_RANGE");

        let err = ClearanceError::AlreadyActive {
            resident_id: ResidentId(9),
        };
        assert_eq!(err.category().as_str(), "CONFLICT");
        assert_eq!(err.code(), "ALREADY_ACTIVE");
    }
}
