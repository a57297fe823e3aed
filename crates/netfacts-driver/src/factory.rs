//! Driver lookup and connection.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::driver::{GenericDriver, NetworkDriver};
use crate::error::{DriverError, DriverResult};
use crate::junos::{EnhancedJunosDriver, ENHANCED_JUNOS};
use crate::session::{ConnectParams, Connector, DeviceSession};

/// Namespace the enhanced drivers are registered under.
pub const ENHANCED_NAMESPACE: &str = "netfacts";

/// Builds a driver around an open session.
pub type DriverConstructor = fn(Box<dyn DeviceSession>) -> Box<dyn NetworkDriver>;

/// Driver names usable without an enhanced implementation.
pub const GENERIC_DRIVERS: &[&str] = &["eos", "ios", "iosxr", "junos", "nxos", "nxos_ssh"];

/// Result of resolving a driver name.
#[derive(Clone, Copy)]
pub struct ResolvedDriver {
    name: &'static str,
    enhanced: Option<DriverConstructor>,
}

impl ResolvedDriver {
    /// Canonical name of the resolved driver.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced.is_some()
    }
}

impl std::fmt::Debug for ResolvedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedDriver")
            .field("name", &self.name)
            .field("enhanced", &self.is_enhanced())
            .finish()
    }
}

fn enhanced_junos(session: Box<dyn DeviceSession>) -> Box<dyn NetworkDriver> {
    Box::new(EnhancedJunosDriver::new(session))
}

/// Maps driver names to implementations and opens connections.
///
/// A name is first looked up as `netfacts.<name>` among the enhanced drivers
/// and only then among the generic ones.
pub struct DriverFactory {
    connector: Arc<dyn Connector>,
    enhanced: HashMap<&'static str, (&'static str, DriverConstructor)>,
    generic: BTreeSet<&'static str>,
}

impl DriverFactory {
    /// Creates a factory with the built-in drivers registered.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        let mut factory = Self {
            connector,
            enhanced: HashMap::new(),
            generic: GENERIC_DRIVERS.iter().copied().collect(),
        };
        factory.register_enhanced("junos", ENHANCED_JUNOS, enhanced_junos);
        factory
    }

    /// Registers an enhanced driver for `base` under `qualified`.
    pub fn register_enhanced(
        &mut self,
        base: &'static str,
        qualified: &'static str,
        constructor: DriverConstructor,
    ) {
        self.enhanced.insert(base, (qualified, constructor));
        self.enhanced.insert(qualified, (qualified, constructor));
    }

    pub fn register_generic(&mut self, name: &'static str) {
        self.generic.insert(name);
    }

    /// Resolves a driver name, preferring the enhanced namespace.
    pub fn resolve(&self, name: &str) -> DriverResult<ResolvedDriver> {
        let qualified = format!("{}.{}", ENHANCED_NAMESPACE, name);
        let enhanced = self
            .enhanced
            .get(qualified.as_str())
            .or_else(|| self.enhanced.get(name));
        if let Some((canonical, constructor)) = enhanced {
            return Ok(ResolvedDriver {
                name: *canonical,
                enhanced: Some(*constructor),
            });
        }

        self.generic
            .get(name)
            .map(|canonical| ResolvedDriver {
                name: *canonical,
                enhanced: None,
            })
            .ok_or_else(|| DriverError::UnknownDriver {
                name: name.to_string(),
            })
    }

    /// Opens a session and wraps it in the resolved driver.
    pub async fn connect(
        &self,
        driver: ResolvedDriver,
        params: &ConnectParams,
    ) -> DriverResult<Box<dyn NetworkDriver>> {
        debug!(
            driver = driver.name,
            device = %params.device,
            host = %params.hostname,
            "Opening device session"
        );
        let session = self.connector.open(params).await?;
        info!(driver = driver.name, device = %params.device, "Connected");

        Ok(match driver.enhanced {
            Some(constructor) => constructor(session),
            None => Box::new(GenericDriver::new(driver.name, session)),
        })
    }
}
