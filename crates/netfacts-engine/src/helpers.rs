//! Network-instance and interface address resolution against the inventory.

use netfacts_driver::{InterfaceIpTable, NetworkInstanceTable};
use netfacts_inventory::{InventoryStore, Vrf};
use netfacts_types::{IpAddress, IpPrefix};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::FactsResult;

/// Instance type whose name is looked up as an inventory VRF.
pub const L3VRF: &str = "L3VRF";

/// Prefix length assumed when a device omits it.
pub const DEFAULT_PREFIX_LENGTH: u8 = 32;

/// A routing instance as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInstanceInfo {
    pub name: String,
    pub instance_type: String,
    pub route_distinguisher: Option<String>,
    pub interfaces: Vec<String>,
}

/// Flattens the driver's network-instance table.
pub fn parse_network_instances(table: &NetworkInstanceTable) -> Vec<NetworkInstanceInfo> {
    table
        .iter()
        .map(|(key, instance)| {
            let name = if instance.name.is_empty() {
                key.clone()
            } else {
                instance.name.clone()
            };
            let rd = instance.state.route_distinguisher.trim();
            NetworkInstanceInfo {
                name,
                instance_type: instance.instance_type.clone(),
                route_distinguisher: (!rd.is_empty()).then(|| rd.to_string()),
                interfaces: instance.interfaces.interface.keys().cloned().collect(),
            }
        })
        .collect()
}

/// How an instance maps onto inventory VRFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VrfResolution {
    /// Not a VRF instance; addresses live in the global table.
    Global,
    /// An inventory VRF with the instance's name exists.
    Resolved(Vrf),
    /// A VRF instance whose name is unknown to the inventory.
    Unresolved(String),
}

impl VrfResolution {
    /// The resolved VRF, if any. `Unresolved` yields `None` as well.
    pub fn vrf(&self) -> Option<&Vrf> {
        match self {
            VrfResolution::Resolved(vrf) => Some(vrf),
            _ => None,
        }
    }
}

/// A network instance together with its inventory VRF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub info: NetworkInstanceInfo,
    pub vrf: VrfResolution,
}

/// Looks up the inventory VRF of every `L3VRF` instance.
pub async fn resolve_network_instances(
    instances: Vec<NetworkInstanceInfo>,
    inventory: &dyn InventoryStore,
) -> FactsResult<Vec<ResolvedInstance>> {
    let mut cache: HashMap<String, Option<Vrf>> = HashMap::new();
    let mut resolved = Vec::with_capacity(instances.len());

    for info in instances {
        let vrf = if info.instance_type == L3VRF {
            let found = match cache.get(&info.name) {
                Some(hit) => hit.clone(),
                None => {
                    let vrf = inventory.vrf_by_name(&info.name).await?;
                    cache.insert(info.name.clone(), vrf.clone());
                    vrf
                }
            };
            match found {
                Some(vrf) => VrfResolution::Resolved(vrf),
                None => {
                    debug!(instance = %info.name, "No inventory VRF for routing instance");
                    VrfResolution::Unresolved(info.name.clone())
                }
            }
        } else {
            VrfResolution::Global
        };
        resolved.push(ResolvedInstance { info, vrf });
    }

    Ok(resolved)
}

/// Indexes resolved instances by member interface.
pub fn network_instances_by_interface(
    instances: &[ResolvedInstance],
) -> HashMap<String, ResolvedInstance> {
    instances
        .iter()
        .flat_map(|instance| {
            instance
                .info
                .interfaces
                .iter()
                .map(move |iface| (iface.clone(), instance.clone()))
        })
        .collect()
}

/// One address configured on a device interface, resolved against the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface address with its prefix length.
    pub address: IpPrefix,
    pub vrf: VrfResolution,
    /// Name of the routing instance the interface belongs to.
    pub instance_name: Option<String>,
    /// True if an inventory prefix equal to or containing the address exists.
    pub has_prefix: bool,
    /// True if the address itself is already in the inventory.
    pub ip_exists: bool,
}

/// Resolves the addresses of every interface, keyed by interface name.
pub async fn resolve_interfaces_ip(
    table: &InterfaceIpTable,
    instances: &HashMap<String, ResolvedInstance>,
    inventory: &dyn InventoryStore,
) -> FactsResult<BTreeMap<String, Vec<InterfaceAddress>>> {
    let mut resolved = BTreeMap::new();

    for (interface, families) in table {
        let instance = instances.get(interface);
        let vrf = instance.map_or(VrfResolution::Global, |i| i.vrf.clone());
        let mut addresses = Vec::new();

        for (raw, detail) in families.iter() {
            let ip = match IpAddress::parse_scoped(raw) {
                Ok(ip) => ip,
                Err(e) => {
                    warn!(interface = %interface, address = %raw, error = %e, "Ignoring unparsable interface address");
                    continue;
                }
            };
            let len = detail.prefix_length.unwrap_or(DEFAULT_PREFIX_LENGTH);
            let address = match IpPrefix::new(ip, len) {
                Ok(address) => address,
                Err(e) => {
                    warn!(interface = %interface, address = %raw, error = %e, "Ignoring invalid prefix length");
                    continue;
                }
            };

            let (has_prefix, ip_exists) = match &vrf {
                VrfResolution::Unresolved(_) => (false, false),
                other => {
                    let vrf_id = other.vrf().map(|v| v.id);
                    let prefixes = inventory.prefixes_covering(&address, vrf_id).await?;
                    let existing = inventory.find_ip(&address, vrf_id).await?;
                    (!prefixes.is_empty(), existing.is_some())
                }
            };

            addresses.push(InterfaceAddress {
                address,
                vrf: vrf.clone(),
                instance_name: instance.map(|i| i.info.name.clone()),
                has_prefix,
                ip_exists,
            });
        }

        resolved.insert(interface.clone(), addresses);
    }

    Ok(resolved)
}
