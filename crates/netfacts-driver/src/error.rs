//! Error types for device drivers.

use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised while talking to a device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The device could not be reached or the session dropped.
    #[error("Cannot connect to {host}: {message}")]
    Connection {
        /// Address or name of the device.
        host: String,
        /// Error message.
        message: String,
    },

    /// The device did not answer within the allowed time.
    #[error("Timed out after {seconds}s talking to {host}")]
    Timeout {
        /// Address or name of the device.
        host: String,
        /// Elapsed budget in seconds.
        seconds: u64,
    },

    /// The driver does not implement the requested operation.
    #[error("{operation} is not supported by driver '{driver}'")]
    NotSupported {
        /// Getter or operation name.
        operation: String,
        /// Driver name.
        driver: String,
    },

    /// No driver is registered under this name.
    #[error("Unknown driver '{name}'")]
    UnknownDriver {
        /// Requested driver name.
        name: String,
    },

    /// The device answered with data that does not fit the getter's shape.
    #[error("Malformed {getter} output: {message}")]
    Malformed {
        /// Getter that produced the data.
        getter: String,
        /// Error message.
        message: String,
    },

    /// A CLI command failed on the device.
    #[error("Command '{command}' failed: {message}")]
    Command {
        /// Command line sent to the device.
        command: String,
        /// Error message.
        message: String,
    },
}

impl DriverError {
    /// Creates a connection error.
    pub fn connection(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Creates a not supported error.
    pub fn not_supported(operation: impl Into<String>, driver: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
            driver: driver.into(),
        }
    }

    /// Creates a malformed data error.
    pub fn malformed(getter: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            getter: getter.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if the device itself could not be talked to.
    ///
    /// Callers isolate these per device: the device is skipped and the run
    /// goes on.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            DriverError::Connection { .. } | DriverError::Timeout { .. }
        )
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        self.is_connection_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = DriverError::not_supported("get_arp_table(vrf)", "junos");
        assert_eq!(
            err.to_string(),
            "get_arp_table(vrf) is not supported by driver 'junos'"
        );
    }

    #[test]
    fn test_connection_failure_classification() {
        assert!(DriverError::connection("10.0.0.1", "refused").is_connection_failure());
        assert!(DriverError::Timeout {
            host: "10.0.0.1".to_string(),
            seconds: 30
        }
        .is_connection_failure());
        assert!(!DriverError::malformed("get_facts", "bad").is_connection_failure());
    }
}
