//! The capability interface collectors are written against.

use async_trait::async_trait;
use netfacts_types::{IpAddress, MacAddress};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::session::DeviceSession;
use crate::tables::{
    BgpTable, DeviceFacts, Getter, InterfaceIpTable, InterfaceTable, IpNeighbor, LldpTable,
    MacTableEntry, NetworkInstanceTable, RawNeighbor,
};

/// Decodes a getter's JSON output into its typed table.
pub(crate) fn decode<T: DeserializeOwned>(
    getter: Getter,
    value: serde_json::Value,
) -> DriverResult<T> {
    serde_json::from_value(value).map_err(|e| DriverError::malformed(getter.as_str(), e))
}

/// Strict neighbor normalization: plain addresses and well-formed MACs only.
pub(crate) fn strict_neighbor(getter: Getter, raw: RawNeighbor) -> DriverResult<IpNeighbor> {
    let ip: IpAddress = raw
        .ip
        .parse()
        .map_err(|e| DriverError::malformed(getter.as_str(), e))?;
    let mac = match raw.mac.trim() {
        "" => None,
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

/// A connected device, seen through vendor-neutral getters.
///
/// Every getter has a default that decodes the session's JSON output. Vendor
/// drivers override the ones that need normalization.
#[async_trait]
pub trait NetworkDriver: Send + Sync {
    /// Registered driver name, e.g. `junos`.
    fn name(&self) -> &str;

    /// Underlying transport.
    fn session(&self) -> &dyn DeviceSession;

    async fn get_arp_table(&self, vrf: Option<&str>) -> DriverResult<Vec<IpNeighbor>> {
        let value = self
            .session()
            .fetch(Getter::ArpTable, vrf.map(str::to_string))
            .await?;
        let rows: Vec<RawNeighbor> = decode(Getter::ArpTable, value)?;
        rows.into_iter()
            .map(|r| strict_neighbor(Getter::ArpTable, r))
            .collect()
    }

    async fn get_ipv6_neighbors_table(&self) -> DriverResult<Vec<IpNeighbor>> {
        let value = self
            .session()
            .fetch(Getter::Ipv6NeighborsTable, None)
            .await?;
        let rows: Vec<RawNeighbor> = decode(Getter::Ipv6NeighborsTable, value)?;
        rows.into_iter()
            .map(|r| strict_neighbor(Getter::Ipv6NeighborsTable, r))
            .collect()
    }

    async fn get_facts(&self) -> DriverResult<DeviceFacts> {
        let value = self.session().fetch(Getter::Facts, None).await?;
        decode(Getter::Facts, value)
    }

    async fn get_interfaces(&self) -> DriverResult<InterfaceTable> {
        let value = self.session().fetch(Getter::Interfaces, None).await?;
        decode(Getter::Interfaces, value)
    }

    async fn get_interfaces_ip(&self) -> DriverResult<InterfaceIpTable> {
        let value = self.session().fetch(Getter::InterfacesIp, None).await?;
        decode(Getter::InterfacesIp, value)
    }

    async fn get_network_instances(&self) -> DriverResult<NetworkInstanceTable> {
        let value = self.session().fetch(Getter::NetworkInstances, None).await?;
        decode(Getter::NetworkInstances, value)
    }

    async fn get_lldp_neighbors_detail(&self) -> DriverResult<LldpTable> {
        let value = self
            .session()
            .fetch(Getter::LldpNeighborsDetail, None)
            .await?;
        decode(Getter::LldpNeighborsDetail, value)
    }

    async fn get_mac_address_table(&self) -> DriverResult<Vec<MacTableEntry>> {
        let value = self.session().fetch(Getter::MacAddressTable, None).await?;
        decode(Getter::MacAddressTable, value)
    }

    async fn get_bgp_neighbors_detail(&self) -> DriverResult<BgpTable> {
        let value = self
            .session()
            .fetch(Getter::BgpNeighborsDetail, None)
            .await?;
        decode(Getter::BgpNeighborsDetail, value)
    }

    /// Runs CLI commands, returning output keyed by command.
    async fn cli(&self, commands: &[&str]) -> DriverResult<BTreeMap<String, String>> {
        self.session()
            .cli(commands.iter().map(|c| c.to_string()).collect())
            .await
    }

    async fn close(&self) -> DriverResult<()> {
        debug!(driver = self.name(), "Closing device session");
        self.session().close().await
    }
}

/// Driver that uses every getter as is.
pub struct GenericDriver {
    name: String,
    session: Box<dyn DeviceSession>,
}

impl GenericDriver {
    pub fn new(name: impl Into<String>, session: Box<dyn DeviceSession>) -> Self {
        Self {
            name: name.into(),
            session,
        }
    }
}

#[async_trait]
impl NetworkDriver for GenericDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn session(&self) -> &dyn DeviceSession {
        self.session.as_ref()
    }
}
