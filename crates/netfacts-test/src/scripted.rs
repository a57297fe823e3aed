//! Canned device sessions.

use async_trait::async_trait;
use netfacts_driver::{
    Capture, ConnectParams, Connector, DeviceSession, DriverError, DriverResult, Getter,
    ReplaySession,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What one device answers.
#[derive(Debug, Clone, Default)]
pub struct DeviceScript {
    capture: Capture,
    connect_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
}

impl DeviceScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned for `getter`.
    pub fn getter(mut self, getter: Getter, output: serde_json::Value) -> Self {
        self.capture
            .getters
            .insert(getter.as_str().to_string(), output);
        self
    }

    /// Output returned for a CLI command.
    pub fn cli(mut self, command: &str, output: &str) -> Self {
        self.capture
            .cli
            .insert(command.to_string(), output.to_string());
        self
    }

    /// The device refuses connections.
    pub fn unreachable(mut self) -> Self {
        self.capture.unreachable = true;
        self
    }

    /// Opening the session takes this long.
    pub fn slow_connect(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Every getter takes this long.
    pub fn slow_fetch(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }
}

/// Serves [`DeviceScript`]s by device name and counts session lifecycle
/// events so tests can check that every opened session was closed.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    scripts: HashMap<String, DeviceScript>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, name: &str, script: DeviceScript) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, params: &ConnectParams) -> DriverResult<Box<dyn DeviceSession>> {
        let script = self.scripts.get(&params.device).ok_or_else(|| {
            DriverError::connection(&params.hostname, "no route to host")
        })?;

        if let Some(delay) = script.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if script.capture.unreachable {
            return Err(DriverError::connection(&params.hostname, "connection refused"));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            inner: ReplaySession::new(&params.device, script.capture.clone()),
            fetch_delay: script.fetch_delay,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct ScriptedSession {
    inner: ReplaySession,
    fetch_delay: Option<Duration>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl DeviceSession for ScriptedSession {
    async fn fetch(
        &self,
        getter: Getter,
        vrf: Option<String>,
    ) -> DriverResult<serde_json::Value> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.fetch(getter, vrf).await
    }

    async fn cli(&self, commands: Vec<String>) -> DriverResult<BTreeMap<String, String>> {
        self.inner.cli(commands).await
    }

    async fn close(&self) -> DriverResult<()> {
        if !self.inner.is_closed() {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(device: &str) -> ConnectParams {
        ConnectParams {
            device: device.to_string(),
            hostname: "192.0.2.10".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_scripted_session_lifecycle() {
        let connector = ScriptedConnector::new().device(
            "edge1",
            DeviceScript::new().getter(Getter::Facts, json!({"serial_number": "ABC"})),
        );

        let session = connector.open(&params("edge1")).await.unwrap();
        let facts = session.fetch(Getter::Facts, None).await.unwrap();
        assert_eq!(facts["serial_number"], "ABC");

        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_unreachable_devices() {
        let connector =
            ScriptedConnector::new().device("edge2", DeviceScript::new().unreachable());

        let err = connector.open(&params("edge1")).await.err().unwrap();
        assert!(err.is_connection_failure());
        let err = connector.open(&params("edge2")).await.err().unwrap();
        assert!(err.is_connection_failure());
        assert_eq!(connector.opened(), 0);
    }
}
