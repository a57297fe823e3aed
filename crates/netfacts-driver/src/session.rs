//! Raw transport to a device.

use async_trait::async_trait;
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

use crate::error::DriverResult;
use crate::tables::Getter;

/// Parameters for opening a session to one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectParams {
    /// Device name in the inventory.
    pub device: String,
    /// Management address.
    pub hostname: String,
    pub username: String,
    pub password: String,
    /// Driver specific options, passed through untouched.
    pub optional_args: serde_json::Map<String, serde_json::Value>,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

/// A live session with one device.
///
/// A session returns getter output as loosely typed JSON. Drivers turn that
/// into the typed tables and apply vendor quirks on top.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Runs a getter. `vrf` narrows getters that support it.
    async fn fetch(
        &self,
        getter: Getter,
        vrf: Option<String>,
    ) -> DriverResult<serde_json::Value>;

    /// Runs CLI commands, returning output keyed by command.
    async fn cli(&self, commands: Vec<String>) -> DriverResult<BTreeMap<String, String>>;

    /// Closes the session. Closing twice is a no-op.
    async fn close(&self) -> DriverResult<()>;
}

/// Opens sessions to devices.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, params: &ConnectParams) -> DriverResult<Box<dyn DeviceSession>>;
}
