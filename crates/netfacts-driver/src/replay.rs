//! Sessions replayed from capture files.
//!
//! A capture is a JSON document per device holding the raw output of each
//! getter and CLI command:
//!
//! ```json
//! {
//!   "getters": { "get_facts": { "serial_number": "ABC123" } },
//!   "cli": { "show ospf neighbor": "..." }
//! }
//! ```
//!
//! Captures are looked up as `<dir>/<device>.json`, then
//! `<dir>/<hostname>.json`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument};

use crate::error::{DriverError, DriverResult};
use crate::session::{ConnectParams, Connector, DeviceSession};
use crate::tables::Getter;

/// Recorded device output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capture {
    pub getters: BTreeMap<String, serde_json::Value>,
    pub cli: BTreeMap<String, String>,
    /// Makes the device refuse connections.
    pub unreachable: bool,
}

/// Session answering from a [`Capture`].
#[derive(Debug)]
pub struct ReplaySession {
    device: String,
    capture: Capture,
    closed: AtomicBool,
}

impl ReplaySession {
    pub fn new(device: impl Into<String>, capture: Capture) -> Self {
        Self {
            device: device.into(),
            capture,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.is_closed() {
            return Err(DriverError::connection(&self.device, "session closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceSession for ReplaySession {
    async fn fetch(
        &self,
        getter: Getter,
        vrf: Option<String>,
    ) -> DriverResult<serde_json::Value> {
        self.ensure_open()?;
        let key = match vrf {
            Some(vrf) => format!("{}@{}", getter.as_str(), vrf),
            None => getter.as_str().to_string(),
        };
        self.capture
            .getters
            .get(&key)
            .cloned()
            .ok_or_else(|| DriverError::not_supported(key, "replay"))
    }

    async fn cli(&self, commands: Vec<String>) -> DriverResult<BTreeMap<String, String>> {
        self.ensure_open()?;
        let mut output = BTreeMap::new();
        for command in commands {
            let text = self
                .capture
                .cli
                .get(&command)
                .cloned()
                .ok_or_else(|| DriverError::Command {
                    command: command.clone(),
                    message: "no recorded output".to_string(),
                })?;
            output.insert(command, text);
        }
        Ok(output)
    }

    async fn close(&self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Opens [`ReplaySession`]s from a directory of captures.
#[derive(Debug, Clone)]
pub struct ReplayConnector {
    dir: PathBuf,
}

impl ReplayConnector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_capture(&self, params: &ConnectParams) -> DriverResult<Capture> {
        for stem in [&params.device, &params.hostname] {
            if stem.is_empty() {
                continue;
            }
            let path = self.dir.join(format!("{}.json", stem));
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    debug!(path = %path.display(), "Loaded capture");
                    return serde_json::from_str(&text)
                        .map_err(|e| DriverError::malformed("capture", e));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(DriverError::connection(&params.hostname, e.to_string())),
            }
        }
        Err(DriverError::connection(
            &params.hostname,
            format!("no capture for {} in {}", params.device, self.dir.display()),
        ))
    }
}

#[async_trait]
impl Connector for ReplayConnector {
    #[instrument(skip(self, params), fields(device = %params.device))]
    async fn open(&self, params: &ConnectParams) -> DriverResult<Box<dyn DeviceSession>> {
        let capture = self.read_capture(params).await?;
        if capture.unreachable {
            return Err(DriverError::connection(
                &params.hostname,
                "connection refused",
            ));
        }
        Ok(Box::new(ReplaySession::new(&params.device, capture)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(device: &str) -> ConnectParams {
        ConnectParams {
            device: device.to_string(),
            hostname: "192.0.2.10".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_replay_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("edge1.json"),
            json!({
                "getters": {"get_facts": {"serial_number": "ABC123"}},
                "cli": {"show evpn mac-table": "empty"}
            })
            .to_string(),
        )
        .unwrap();

        let connector = ReplayConnector::new(dir.path());
        let session = connector.open(&params("edge1")).await.unwrap();

        let facts = session.fetch(Getter::Facts, None).await.unwrap();
        assert_eq!(facts["serial_number"], "ABC123");

        let output = session
            .cli(vec!["show evpn mac-table".to_string()])
            .await
            .unwrap();
        assert_eq!(output["show evpn mac-table"], "empty");

        let err = session.fetch(Getter::ArpTable, None).await.unwrap_err();
        assert!(matches!(err, DriverError::NotSupported { .. }));
    }

    #[tokio::test]
    async fn test_missing_capture_is_a_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let connector = ReplayConnector::new(dir.path());
        let err = connector.open(&params("edge2")).await.err().unwrap();
        assert!(err.is_connection_failure());
    }

    #[tokio::test]
    async fn test_unreachable_capture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("192.0.2.10.json"), r#"{"unreachable": true}"#).unwrap();
        let connector = ReplayConnector::new(dir.path());
        let err = connector.open(&params("edge3")).await.err().unwrap();
        assert!(err.is_connection_failure());
    }

    #[tokio::test]
    async fn test_closed_session_refuses_calls() {
        let session = ReplaySession::new("edge1", Capture::default());
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert!(session.fetch(Getter::Facts, None).await.is_err());
    }
}
