//! Error types for the collection engine.

use netfacts_common::{CollectorType, EntryId, PlanId, ReportId};
use netfacts_driver::DriverError;
use netfacts_inventory::InventoryError;
use thiserror::Error;

/// Maximum length of an error message stored on a report entry.
pub const MAX_ENTRY_ERROR_LEN: usize = 1000;

/// Result type alias for engine operations.
pub type FactsResult<T> = Result<T, FactsError>;

/// Errors raised by collection and reconciliation.
#[derive(Debug, Clone, Error)]
pub enum FactsError {
    /// Inventory lookup or write failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Device driver failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// No vendor implementation exists for the plan's driver.
    #[error("{operation} is not implemented for driver '{driver}'. Supported drivers: {supported:?}")]
    NotSupported {
        /// Collector or method name.
        operation: String,
        /// Driver named by the plan.
        driver: String,
        /// Drivers that do implement the operation.
        supported: Vec<String>,
    },

    /// No apply handler is registered for the entry's collector type.
    #[error("No apply handler for collector type '{0}'")]
    NoApplyHandler(CollectorType),

    /// The plan already has a run in progress.
    #[error("Cannot initiate collection job; Collector already working.")]
    AlreadyWorking(PlanId),

    #[error("Collection plan {0} not found")]
    PlanNotFound(PlanId),

    #[error("Report {0} not found")]
    ReportNotFound(ReportId),

    /// An entry's value bag lacks data the apply handler needs.
    #[error("{message}")]
    InvalidEntry {
        /// Entry being applied, if known.
        entry: Option<EntryId>,
        /// Error message.
        message: String,
    },

    /// The plan definition is rejected.
    #[error("Invalid collection plan: {0}")]
    InvalidPlan(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FactsError {
    /// Creates an invalid entry error.
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            entry: None,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error means the device could not be talked to.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, FactsError::Driver(e) if e.is_connection_failure())
    }

    /// Returns true if the plan's driver lacks the requested operation.
    pub fn is_not_supported(&self) -> bool {
        matches!(
            self,
            FactsError::NotSupported { .. } | FactsError::Driver(DriverError::NotSupported { .. })
        )
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FactsError::Inventory(e) => e.is_retryable(),
            FactsError::Driver(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Message stored on a failed entry, cut to [`MAX_ENTRY_ERROR_LEN`]
    /// characters.
    pub fn entry_message(&self) -> String {
        self.to_string().chars().take(MAX_ENTRY_ERROR_LEN).collect()
    }
}
