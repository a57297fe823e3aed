//! Junos driver with address and MAC normalization.

use async_trait::async_trait;
use netfacts_types::{IpAddress, MacAddress};
use tracing::debug;

use crate::driver::{decode, NetworkDriver};
use crate::error::{DriverError, DriverResult};
use crate::session::DeviceSession;
use crate::tables::{Getter, IpNeighbor, RawNeighbor};

/// Name under which the enhanced driver is registered.
pub const ENHANCED_JUNOS: &str = "netfacts.junos";

/// Junos driver that cleans up the neighbor tables.
///
/// Compared to the generic getters it:
/// - strips the `%zone` suffix from link-local addresses,
/// - accepts MACs in any common notation,
/// - treats an NDP MAC of `none` as incomplete.
pub struct EnhancedJunosDriver {
    session: Box<dyn DeviceSession>,
}

impl EnhancedJunosDriver {
    pub fn new(session: Box<dyn DeviceSession>) -> Self {
        Self { session }
    }

    fn normalize(getter: Getter, raw: RawNeighbor) -> DriverResult<IpNeighbor> {
        let ip = IpAddress::parse_scoped(&raw.ip)
            .map_err(|e| DriverError::malformed(getter.as_str(), e))?;
        let mac = match raw.mac.trim() {
            "" | "none" => None,
            s => Some(
                s.parse::<MacAddress>()
                    .map_err(|e| DriverError::malformed(getter.as_str(), e))?,
            ),
        };
        Ok(IpNeighbor {
            interface: raw.interface,
            mac,
            ip,
            age: raw.age,
            state: raw.state,
        })
    }

    async fn neighbors(&self, getter: Getter) -> DriverResult<Vec<IpNeighbor>> {
        let value = self.session.fetch(getter, None).await?;
        let rows: Vec<RawNeighbor> = decode(getter, value)?;
        debug!(getter = %getter, rows = rows.len(), "Normalizing neighbor table");
        rows.into_iter()
            .map(|r| Self::normalize(getter, r))
            .collect()
    }
}

#[async_trait]
impl NetworkDriver for EnhancedJunosDriver {
    fn name(&self) -> &str {
        ENHANCED_JUNOS
    }

    fn session(&self) -> &dyn DeviceSession {
        self.session.as_ref()
    }

    async fn get_arp_table(&self, vrf: Option<&str>) -> DriverResult<Vec<IpNeighbor>> {
        if vrf.is_some_and(|v| !v.is_empty()) {
            return Err(DriverError::not_supported(
                "get_arp_table with a VRF",
                ENHANCED_JUNOS,
            ));
        }
        self.neighbors(Getter::ArpTable).await
    }

    async fn get_ipv6_neighbors_table(&self) -> DriverResult<Vec<IpNeighbor>> {
        self.neighbors(Getter::Ipv6NeighborsTable).await
    }
}
