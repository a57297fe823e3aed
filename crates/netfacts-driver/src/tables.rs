//! Typed shapes of the driver getters.
//!
//! Field names follow the de-facto vendor-neutral getter format, so capture
//! files taken from real devices deserialize unchanged.

use netfacts_types::{IpAddress, MacAddress};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Getters a device session can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Getter {
    ArpTable,
    Ipv6NeighborsTable,
    Facts,
    Interfaces,
    InterfacesIp,
    NetworkInstances,
    LldpNeighborsDetail,
    MacAddressTable,
    BgpNeighborsDetail,
}

impl Getter {
    pub const ALL: &'static [Getter] = &[
        Getter::ArpTable,
        Getter::Ipv6NeighborsTable,
        Getter::Facts,
        Getter::Interfaces,
        Getter::InterfacesIp,
        Getter::NetworkInstances,
        Getter::LldpNeighborsDetail,
        Getter::MacAddressTable,
        Getter::BgpNeighborsDetail,
    ];

    /// Returns the getter's method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Getter::ArpTable => "get_arp_table",
            Getter::Ipv6NeighborsTable => "get_ipv6_neighbors_table",
            Getter::Facts => "get_facts",
            Getter::Interfaces => "get_interfaces",
            Getter::InterfacesIp => "get_interfaces_ip",
            Getter::NetworkInstances => "get_network_instances",
            Getter::LldpNeighborsDetail => "get_lldp_neighbors_detail",
            Getter::MacAddressTable => "get_mac_address_table",
            Getter::BgpNeighborsDetail => "get_bgp_neighbors_detail",
        }
    }
}

impl std::fmt::Display for Getter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the ARP or IPv6 neighbor table as the device reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNeighbor {
    pub interface: String,
    #[serde(default)]
    pub mac: String,
    pub ip: String,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
}

/// A normalized ARP/NDP row.
#[derive(Debug, Clone, PartialEq)]
pub struct IpNeighbor {
    pub interface: String,
    /// `None` for incomplete entries.
    pub mac: Option<MacAddress>,
    pub ip: IpAddress,
    pub age: Option<f64>,
    pub state: Option<String>,
}

impl IpNeighbor {
    pub fn is_unreachable(&self) -> bool {
        self.state.as_deref() == Some("unreachable")
    }
}

/// Output of `get_facts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFacts {
    pub hostname: String,
    pub fqdn: String,
    pub vendor: String,
    pub model: String,
    pub serial_number: String,
    pub os_version: String,
    pub uptime: Option<f64>,
    pub interface_list: Vec<String>,
}

/// One interface of `get_interfaces`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceDetail {
    pub is_up: Option<bool>,
    pub is_enabled: Option<bool>,
    pub description: String,
    #[serde(deserialize_with = "optional_mac")]
    pub mac_address: Option<MacAddress>,
    pub speed: Option<f64>,
    pub mtu: Option<u32>,
    pub last_flapped: Option<f64>,
}

/// Interface name to details.
pub type InterfaceTable = BTreeMap<String, InterfaceDetail>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetail {
    pub prefix_length: Option<u8>,
}

/// Addresses configured on one interface, keyed by address text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceAddresses {
    pub ipv4: BTreeMap<String, AddressDetail>,
    pub ipv6: BTreeMap<String, AddressDetail>,
}

impl InterfaceAddresses {
    /// Iterates over both families.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AddressDetail)> {
        self.ipv4.iter().chain(self.ipv6.iter())
    }
}

/// Output of `get_interfaces_ip`.
pub type InterfaceIpTable = BTreeMap<String, InterfaceAddresses>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInstanceState {
    pub route_distinguisher: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInstanceInterfaces {
    pub interface: BTreeMap<String, serde_json::Value>,
}

/// One routing instance of `get_network_instances`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInstance {
    pub name: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub state: NetworkInstanceState,
    pub interfaces: NetworkInstanceInterfaces,
}

/// Output of `get_network_instances`.
pub type NetworkInstanceTable = BTreeMap<String, NetworkInstance>;

/// One neighbor of `get_lldp_neighbors_detail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LldpNeighbor {
    pub parent_interface: String,
    pub remote_port: String,
    pub remote_port_description: String,
    pub remote_chassis_id: String,
    pub remote_system_name: String,
    pub remote_system_description: String,
}

/// Local interface name to neighbors.
pub type LldpTable = BTreeMap<String, Vec<LldpNeighbor>>;

/// One row of `get_mac_address_table`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacTableEntry {
    #[serde(deserialize_with = "optional_mac")]
    pub mac: Option<MacAddress>,
    pub interface: String,
    pub vlan: Option<u32>,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub active: bool,
    pub moves: Option<u32>,
    pub last_move: Option<f64>,
}

/// One peer of `get_bgp_neighbors_detail`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgpPeer {
    pub up: bool,
    pub remote_address: String,
    pub local_as: Option<u32>,
    pub remote_as: Option<u32>,
    pub router_id: String,
    pub connection_state: String,
    pub description: String,
}

/// VRF name, then remote AS, then peers.
pub type BgpTable = BTreeMap<String, BTreeMap<u32, Vec<BgpPeer>>>;

/// Accepts `""`, `"none"` and null as "no MAC".
fn optional_mac<'de, D>(deserializer: D) -> Result<Option<MacAddress>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("none") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
