//! Inventory fixtures
//!
//! Every object gets an id from the inventory's own allocator, so ids never
//! clash with objects the engine creates later.

use netfacts_common::{CableId, DeviceId, InterfaceId, PrefixId, RirId, SiteId, VrfId};
use netfacts_inventory::{
    Cable, CableStatus, Device, Interface, MemoryInventory, Prefix, Rir, Site, Vrf,
};
use netfacts_types::IpPrefix;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Seeds a [`MemoryInventory`] for a test.
#[derive(Debug)]
pub struct InventoryBuilder {
    inventory: MemoryInventory,
}

impl Default for InventoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryBuilder {
    pub fn new() -> Self {
        Self {
            inventory: MemoryInventory::new(),
        }
    }

    fn next<T>(&self, wrap: impl FnOnce(u64) -> T) -> T {
        wrap(self.inventory.allocate_id())
    }

    pub fn site(&self, name: &str) -> SiteId {
        let id = self.next(SiteId);
        self.inventory.insert_site(Site {
            id,
            name: name.to_string(),
            region: None,
            group: None,
        });
        id
    }

    /// Adds an active device. `primary_ip` is a prefix such as `10.0.0.1/32`.
    pub fn device(&self, name: &str, site: SiteId, primary_ip: Option<&str>) -> Device {
        self.device_with(name, site, primary_ip, |_| {})
    }

    /// Same as [`InventoryBuilder::device`], letting `customize` set any
    /// other attribute first.
    pub fn device_with(
        &self,
        name: &str,
        site: SiteId,
        primary_ip: Option<&str>,
        customize: impl FnOnce(&mut Device),
    ) -> Device {
        let mut device = Device {
            id: self.next(DeviceId),
            name: name.to_string(),
            site,
            status: "active".to_string(),
            role: None,
            device_type: None,
            platform: None,
            location: None,
            tenant: None,
            tenant_group: None,
            tags: BTreeSet::new(),
            serial: String::new(),
            primary_ip: primary_ip.map(parse_prefix),
        };
        customize(&mut device);
        self.inventory.insert_device(device.clone());
        device
    }

    pub fn interface(&self, device: DeviceId, name: &str) -> InterfaceId {
        let id = self.next(InterfaceId);
        self.inventory.insert_interface(Interface {
            id,
            device,
            name: name.to_string(),
            cable: None,
        });
        id
    }

    pub fn interfaces(&self, device: DeviceId, names: &[&str]) -> Vec<InterfaceId> {
        names.iter().map(|n| self.interface(device, n)).collect()
    }

    pub fn vrf(&self, name: &str) -> VrfId {
        let id = self.next(VrfId);
        self.inventory.insert_vrf(Vrf {
            id,
            name: name.to_string(),
            rd: None,
        });
        id
    }

    pub fn prefix(&self, prefix: &str, vrf: Option<VrfId>) -> PrefixId {
        let id = self.next(PrefixId);
        self.inventory.insert_prefix(Prefix {
            id,
            prefix: parse_prefix(prefix),
            vrf,
        });
        id
    }

    pub fn rir(&self, name: &str) -> RirId {
        let id = self.next(RirId);
        self.inventory.insert_rir(Rir {
            id,
            name: name.to_string(),
        });
        id
    }

    /// Connects two existing interfaces.
    pub fn cable(&self, a: InterfaceId, b: InterfaceId) -> CableId {
        let id = self.next(CableId);
        self.inventory.insert_cable(Cable {
            id,
            a_termination: a,
            b_termination: b,
            status: CableStatus::Connected,
            tags: BTreeSet::new(),
        });
        id
    }

    pub fn build(self) -> Arc<MemoryInventory> {
        Arc::new(self.inventory)
    }
}

fn parse_prefix(text: &str) -> IpPrefix {
    text.parse()
        .unwrap_or_else(|e| panic!("bad prefix fixture {text:?}: {e}"))
}

/// Two devices in one site with a management address each, `edge1` and
/// `edge2`, each with interfaces `xe-0/0/0` and `xe-0/0/1`.
pub fn two_device_site() -> (InventoryBuilder, Device, Device) {
    let builder = InventoryBuilder::new();
    let site = builder.site("dc1");
    let edge1 = builder.device("edge1", site, Some("10.0.0.1/32"));
    let edge2 = builder.device("edge2", site, Some("10.0.0.2/32"));
    builder.interfaces(edge1.id, &["xe-0/0/0", "xe-0/0/1"]);
    builder.interfaces(edge2.id, &["xe-0/0/0", "xe-0/0/1"]);
    (builder, edge1, edge2)
}
