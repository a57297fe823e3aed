//! Inventory objects as seen by the collection engine.
//!
//! These mirror the subset of the host application's data model the engine
//! reads and writes. Relations are held as typed ids.

use chrono::{DateTime, Utc};
use netfacts_common::{
    AbsoluteUrl, AsnId, CableId, CollectorType, DeviceId, InterfaceId, IpAddressId, MacAddressId,
    ObjectRef, PrefixId, RirId, SiteId, VrfId,
};
use netfacts_types::{IpAddress, IpPrefix, MacAddress, MacPrefix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub site: SiteId,
    #[serde(default = "default_device_status")]
    pub status: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub tenant_group: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub serial: String,
    /// Management address used to reach the device.
    #[serde(default)]
    pub primary_ip: Option<IpPrefix>,
}

fn default_device_status() -> String {
    "active".to_string()
}

impl Device {
    /// Returns the management address without its prefix length.
    pub fn primary_address(&self) -> Option<IpAddress> {
        self.primary_ip.map(|p| *p.address())
    }
}

impl AbsoluteUrl for Device {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn absolute_url(&self) -> String {
        format!("/dcim/devices/{}/", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    pub device: DeviceId,
    pub name: String,
    /// Cable attached to this interface, if any.
    #[serde(default)]
    pub cable: Option<CableId>,
}

impl AbsoluteUrl for Interface {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn absolute_url(&self) -> String {
        format!("/dcim/interfaces/{}/", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vrf {
    pub id: VrfId,
    pub name: String,
    #[serde(default)]
    pub rd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefix {
    pub id: PrefixId,
    pub prefix: IpPrefix,
    #[serde(default)]
    pub vrf: Option<VrfId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressRecord {
    pub id: IpAddressId,
    pub address: IpPrefix,
    #[serde(default)]
    pub vrf: Option<VrfId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl AbsoluteUrl for IpAddressRecord {
    fn display_name(&self) -> String {
        self.address.to_string()
    }

    fn absolute_url(&self) -> String {
        format!("/ipam/ip-addresses/{}/", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddressRecord {
    pub id: MacAddressId,
    pub address: MacAddress,
    /// Vendor prefix this address was matched to.
    #[serde(default)]
    pub vendor: Option<MacPrefix>,
    /// Interfaces the address was seen behind.
    #[serde(default)]
    pub interfaces: BTreeSet<InterfaceId>,
    #[serde(default)]
    pub ip_addresses: BTreeSet<IpAddressId>,
    /// The interface that owns this address (interface MAC collection).
    #[serde(default)]
    pub device_interface: Option<InterfaceId>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub discovery_method: Option<CollectorType>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl AbsoluteUrl for MacAddressRecord {
    fn display_name(&self) -> String {
        self.address.to_string()
    }

    fn absolute_url(&self) -> String {
        format!("/plugins/facts/mac-addresses/{}/", self.id)
    }
}

/// Vendor registration for an OUI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacVendor {
    pub prefix: MacPrefix,
    pub vendor_name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableStatus {
    Connected,
    Planned,
    Decommissioning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    pub id: CableId,
    pub a_termination: InterfaceId,
    pub b_termination: InterfaceId,
    pub status: CableStatus,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Cable {
    /// Returns true if the cable terminates on `iface` at either end.
    pub fn terminates_on(&self, iface: InterfaceId) -> bool {
        self.a_termination == iface || self.b_termination == iface
    }
}

impl AbsoluteUrl for Cable {
    fn display_name(&self) -> String {
        format!("#{}", self.id)
    }

    fn absolute_url(&self) -> String {
        format!("/dcim/cables/{}/", self.id)
    }
}

/// Regional internet registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rir {
    pub id: RirId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asn {
    pub id: AsnId,
    pub asn: u32,
    pub rir: RirId,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Append-only note attached to an inventory object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: u64,
    pub object: ObjectRef,
    pub created: DateTime<Utc>,
    pub comments: String,
}
