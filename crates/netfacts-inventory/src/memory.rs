//! In-memory inventory backed by `DashMap` tables.
//!
//! Used by tests, by the CLI (loaded from a JSON snapshot) and as a reference
//! for what a host-backed store has to guarantee. Natural-key indexes make
//! every get-or-create atomic per key.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use netfacts_common::{
    AsnId, CableId, DeviceId, InterfaceId, IpAddressId, MacAddressId, ObjectRef, PrefixId, RirId,
    SiteId, VrfId,
};
use netfacts_types::{IpPrefix, MacAddress, MacPrefix};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};

use crate::error::{InventoryError, InventoryResult};
use crate::model::{
    Asn, Cable, CableStatus, Device, Interface, IpAddressRecord, JournalEntry, MacAddressRecord,
    MacVendor, Prefix, Rir, Site, Vrf,
};
use crate::store::{Creation, InventoryStore, MacUpdate};

/// Serializable dump of a [`MemoryInventory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySnapshot {
    pub sites: Vec<Site>,
    pub devices: Vec<Device>,
    pub interfaces: Vec<Interface>,
    pub vrfs: Vec<Vrf>,
    pub prefixes: Vec<Prefix>,
    pub rirs: Vec<Rir>,
    pub ip_addresses: Vec<IpAddressRecord>,
    pub mac_addresses: Vec<MacAddressRecord>,
    pub vendors: Vec<MacVendor>,
    pub cables: Vec<Cable>,
    pub asns: Vec<Asn>,
    pub journal: Vec<JournalEntry>,
}

/// Inventory held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    next_id: AtomicU64,
    sites: DashMap<SiteId, Site>,
    devices: DashMap<DeviceId, Device>,
    interfaces: DashMap<InterfaceId, Interface>,
    vrfs: DashMap<VrfId, Vrf>,
    prefixes: DashMap<PrefixId, Prefix>,
    rirs: DashMap<RirId, Rir>,
    ip_addresses: DashMap<IpAddressId, IpAddressRecord>,
    ip_index: DashMap<(IpPrefix, Option<VrfId>), IpAddressId>,
    mac_addresses: DashMap<MacAddressId, MacAddressRecord>,
    mac_index: DashMap<MacAddress, MacAddressId>,
    vendors: DashMap<MacPrefix, MacVendor>,
    cables: DashMap<CableId, Cable>,
    asns: DashMap<AsnId, Asn>,
    asn_index: DashMap<u32, AsnId>,
    /// Serializes cable creation, which touches two interfaces at once.
    cable_lock: Mutex<()>,
    journal: Mutex<Vec<JournalEntry>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Builds an inventory from a snapshot; new ids continue after the
    /// highest id found in it.
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Self {
        let inv = Self::new();
        let mut max_id = 0u64;

        for site in snapshot.sites {
            max_id = max_id.max(site.id.get());
            inv.sites.insert(site.id, site);
        }
        for device in snapshot.devices {
            max_id = max_id.max(device.id.get());
            inv.devices.insert(device.id, device);
        }
        for iface in snapshot.interfaces {
            max_id = max_id.max(iface.id.get());
            inv.interfaces.insert(iface.id, iface);
        }
        for vrf in snapshot.vrfs {
            max_id = max_id.max(vrf.id.get());
            inv.vrfs.insert(vrf.id, vrf);
        }
        for prefix in snapshot.prefixes {
            max_id = max_id.max(prefix.id.get());
            inv.prefixes.insert(prefix.id, prefix);
        }
        for rir in snapshot.rirs {
            max_id = max_id.max(rir.id.get());
            inv.rirs.insert(rir.id, rir);
        }
        for ip in snapshot.ip_addresses {
            max_id = max_id.max(ip.id.get());
            inv.ip_index.insert((ip.address, ip.vrf), ip.id);
            inv.ip_addresses.insert(ip.id, ip);
        }
        for mac in snapshot.mac_addresses {
            max_id = max_id.max(mac.id.get());
            inv.mac_index.insert(mac.address, mac.id);
            inv.mac_addresses.insert(mac.id, mac);
        }
        for vendor in snapshot.vendors {
            inv.vendors.insert(vendor.prefix, vendor);
        }
        for cable in snapshot.cables {
            max_id = max_id.max(cable.id.get());
            inv.cables.insert(cable.id, cable);
        }
        for asn in snapshot.asns {
            max_id = max_id.max(asn.id.get());
            inv.asn_index.insert(asn.asn, asn.id);
            inv.asns.insert(asn.id, asn);
        }
        for entry in snapshot.journal {
            max_id = max_id.max(entry.id);
            inv.journal.lock().push(entry);
        }

        inv.next_id.store(max_id + 1, Ordering::SeqCst);
        inv
    }

    /// Dumps the current contents, each table ordered by id.
    pub fn snapshot(&self) -> InventorySnapshot {
        fn sorted<K, V: Clone>(map: &DashMap<K, V>, key: impl Fn(&V) -> u64) -> Vec<V>
        where
            K: Eq + std::hash::Hash,
        {
            let mut values: Vec<V> = map.iter().map(|r| r.value().clone()).collect();
            values.sort_by_key(|v| key(v));
            values
        }

        let mut vendors: Vec<MacVendor> = self.vendors.iter().map(|r| r.value().clone()).collect();
        vendors.sort_by_key(|v| v.prefix);

        InventorySnapshot {
            sites: sorted(&self.sites, |s| s.id.get()),
            devices: sorted(&self.devices, |d| d.id.get()),
            interfaces: sorted(&self.interfaces, |i| i.id.get()),
            vrfs: sorted(&self.vrfs, |v| v.id.get()),
            prefixes: sorted(&self.prefixes, |p| p.id.get()),
            rirs: sorted(&self.rirs, |r| r.id.get()),
            ip_addresses: sorted(&self.ip_addresses, |i| i.id.get()),
            mac_addresses: sorted(&self.mac_addresses, |m| m.id.get()),
            vendors,
            cables: sorted(&self.cables, |c| c.id.get()),
            asns: sorted(&self.asns, |a| a.id.get()),
            journal: self.journal.lock().clone(),
        }
    }

    /// Reserves a fresh id, unique across all tables.
    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert_site(&self, site: Site) {
        self.sites.insert(site.id, site);
    }

    pub fn insert_device(&self, device: Device) {
        self.devices.insert(device.id, device);
    }

    pub fn insert_interface(&self, iface: Interface) {
        self.interfaces.insert(iface.id, iface);
    }

    pub fn insert_vrf(&self, vrf: Vrf) {
        self.vrfs.insert(vrf.id, vrf);
    }

    pub fn insert_prefix(&self, prefix: Prefix) {
        self.prefixes.insert(prefix.id, prefix);
    }

    pub fn insert_rir(&self, rir: Rir) {
        self.rirs.insert(rir.id, rir);
    }

    pub fn insert_cable(&self, cable: Cable) {
        for end in [cable.a_termination, cable.b_termination] {
            if let Some(mut iface) = self.interfaces.get_mut(&end) {
                iface.cable = Some(cable.id);
            }
        }
        self.cables.insert(cable.id, cable);
    }

    pub fn interface_by_id(&self, id: InterfaceId) -> Option<Interface> {
        self.interfaces.get(&id).map(|r| r.value().clone())
    }

    pub fn mac_addresses(&self) -> Vec<MacAddressRecord> {
        self.snapshot().mac_addresses
    }

    pub fn ip_addresses(&self) -> Vec<IpAddressRecord> {
        self.snapshot().ip_addresses
    }

    pub fn cables(&self) -> Vec<Cable> {
        self.snapshot().cables
    }

    pub fn asns(&self) -> Vec<Asn> {
        self.snapshot().asns
    }

    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.journal.lock().clone()
    }

    fn vendor_prefix(&self, address: &MacAddress) -> Option<MacPrefix> {
        self.vendors.get(&address.oui()).map(|v| v.prefix)
    }
}

#[async_trait]
impl InventoryStore for MemoryInventory {
    async fn devices(&self) -> InventoryResult<Vec<Device>> {
        Ok(self.devices.iter().map(|r| r.value().clone()).collect())
    }

    async fn device(&self, id: DeviceId) -> InventoryResult<Option<Device>> {
        Ok(self.devices.get(&id).map(|r| r.value().clone()))
    }

    async fn device_by_name(&self, name: &str) -> InventoryResult<Option<Device>> {
        Ok(self
            .devices
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value().clone()))
    }

    async fn site(&self, id: SiteId) -> InventoryResult<Option<Site>> {
        Ok(self.sites.get(&id).map(|r| r.value().clone()))
    }

    async fn interface(&self, device: DeviceId, name: &str) -> InventoryResult<Option<Interface>> {
        Ok(self
            .interfaces
            .iter()
            .find(|r| r.device == device && r.name == name)
            .map(|r| r.value().clone()))
    }

    async fn update_device_serial(&self, id: DeviceId, serial: &str) -> InventoryResult<()> {
        let mut device = self
            .devices
            .get_mut(&id)
            .ok_or_else(|| InventoryError::not_found("device", id))?;
        device.serial = serial.to_string();
        Ok(())
    }

    async fn vrf_by_name(&self, name: &str) -> InventoryResult<Option<Vrf>> {
        Ok(self
            .vrfs
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value().clone()))
    }

    async fn vrf(&self, id: VrfId) -> InventoryResult<Option<Vrf>> {
        Ok(self.vrfs.get(&id).map(|r| r.value().clone()))
    }

    async fn prefixes_covering(
        &self,
        prefix: &IpPrefix,
        vrf: Option<VrfId>,
    ) -> InventoryResult<Vec<Prefix>> {
        let mut found: Vec<Prefix> = self
            .prefixes
            .iter()
            .filter(|r| r.prefix.covers(prefix))
            .filter(|r| vrf.is_none() || r.vrf == vrf)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|p| std::cmp::Reverse(p.prefix.prefix_len()));
        Ok(found)
    }

    async fn find_ip(
        &self,
        address: &IpPrefix,
        vrf: Option<VrfId>,
    ) -> InventoryResult<Option<IpAddressRecord>> {
        let Some(id) = self.ip_index.get(&(*address, vrf)).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.ip_addresses.get(&id).map(|r| r.value().clone()))
    }

    #[instrument(skip(self, creation))]
    async fn get_or_create_ip(
        &self,
        address: IpPrefix,
        vrf: Option<VrfId>,
        creation: Creation,
    ) -> InventoryResult<(IpAddressRecord, bool)> {
        let id = match self.ip_index.entry((address, vrf)) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let id = IpAddressId(self.allocate_id());
                let record = IpAddressRecord {
                    id,
                    address,
                    vrf,
                    description: creation.description,
                    tags: creation.tags.into_iter().collect(),
                };
                self.ip_addresses.insert(id, record.clone());
                slot.insert(id);
                info!(address = %address, id = %id, "Created IP address");
                return Ok((record, true));
            }
        };

        let record = self
            .ip_addresses
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| InventoryError::backend(format!("dangling IP index entry {}", id)))?;
        Ok((record, false))
    }

    async fn rir_by_name(&self, name: &str) -> InventoryResult<Option<Rir>> {
        Ok(self
            .rirs
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value().clone()))
    }

    #[instrument(skip(self, creation))]
    async fn get_or_create_asn(
        &self,
        asn: u32,
        rir: RirId,
        creation: Creation,
    ) -> InventoryResult<(Asn, bool)> {
        if !self.rirs.contains_key(&rir) {
            return Err(InventoryError::not_found("rir", rir));
        }

        let id = match self.asn_index.entry(asn) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let id = AsnId(self.allocate_id());
                let record = Asn {
                    id,
                    asn,
                    rir,
                    tags: creation.tags.into_iter().collect(),
                };
                self.asns.insert(id, record.clone());
                slot.insert(id);
                info!(asn, id = %id, "Created ASN");
                return Ok((record, true));
            }
        };

        let record = self
            .asns
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| InventoryError::backend(format!("dangling ASN index entry {}", id)))?;
        Ok((record, false))
    }

    async fn find_mac(&self, address: &MacAddress) -> InventoryResult<Option<MacAddressRecord>> {
        let Some(id) = self.mac_index.get(address).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.mac_addresses.get(&id).map(|r| r.value().clone()))
    }

    #[instrument(skip(self, creation))]
    async fn get_or_create_mac(
        &self,
        address: MacAddress,
        creation: Creation,
    ) -> InventoryResult<(MacAddressRecord, bool)> {
        let id = match self.mac_index.entry(address) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let id = MacAddressId(self.allocate_id());
                let record = MacAddressRecord {
                    id,
                    address,
                    vendor: self.vendor_prefix(&address),
                    interfaces: Default::default(),
                    ip_addresses: Default::default(),
                    device_interface: None,
                    last_seen: None,
                    discovery_method: None,
                    tags: creation.tags.into_iter().collect(),
                };
                self.mac_addresses.insert(id, record.clone());
                slot.insert(id);
                info!(mac = %address, id = %id, "Created MAC address");
                return Ok((record, true));
            }
        };

        let record = self
            .mac_addresses
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| InventoryError::backend(format!("dangling MAC index entry {}", id)))?;
        Ok((record, false))
    }

    async fn update_mac(
        &self,
        id: MacAddressId,
        update: MacUpdate,
    ) -> InventoryResult<MacAddressRecord> {
        let mut record = self
            .mac_addresses
            .get_mut(&id)
            .ok_or_else(|| InventoryError::not_found("mac_address", id))?;

        if let Some(seen) = update.last_seen {
            record.last_seen = Some(seen);
        }
        if let Some(method) = update.discovery_method {
            record.discovery_method = Some(method);
        }
        if let Some(owner) = update.device_interface {
            record.device_interface = Some(owner);
        }
        if let Some(iface) = update.add_interface {
            record.interfaces.insert(iface);
        }
        if let Some(ip) = update.add_ip_address {
            record.ip_addresses.insert(ip);
        }
        debug!(mac = %record.address, "Updated MAC address");
        Ok(record.clone())
    }

    async fn register_vendor(&self, vendor: MacVendor) -> InventoryResult<bool> {
        let prefix = vendor.prefix;
        let created = match self.vendors.entry(prefix) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(vendor);
                true
            }
        };

        if created {
            for mut mac in self.mac_addresses.iter_mut() {
                if mac.vendor.is_none() && prefix.contains(&mac.address) {
                    mac.vendor = Some(prefix);
                }
            }
        }
        Ok(created)
    }

    async fn vendor_for(&self, address: &MacAddress) -> InventoryResult<Option<MacVendor>> {
        Ok(self.vendors.get(&address.oui()).map(|r| r.value().clone()))
    }

    #[instrument(skip(self, creation))]
    async fn create_cable(
        &self,
        a: InterfaceId,
        b: InterfaceId,
        creation: Creation,
    ) -> InventoryResult<Cable> {
        let _guard = self.cable_lock.lock();

        for end in [a, b] {
            let iface = self
                .interfaces
                .get(&end)
                .ok_or_else(|| InventoryError::not_found("interface", end))?;
            if iface.cable.is_some() {
                return Err(InventoryError::conflict(format!(
                    "Interface {} already has a cable",
                    iface.name
                )));
            }
        }

        let cable = Cable {
            id: CableId(self.allocate_id()),
            a_termination: a,
            b_termination: b,
            status: CableStatus::Connected,
            tags: creation.tags.into_iter().collect(),
        };
        self.insert_cable(cable.clone());
        info!(cable = %cable.id, a = %a, b = %b, "Created cable");
        Ok(cable)
    }

    async fn add_journal_entry(
        &self,
        object: ObjectRef,
        comments: String,
    ) -> InventoryResult<JournalEntry> {
        let entry = JournalEntry {
            id: self.allocate_id(),
            object,
            created: Utc::now(),
            comments,
        };
        self.journal.lock().push(entry.clone());
        Ok(entry)
    }

    async fn journal(&self, object: ObjectRef) -> InventoryResult<Vec<JournalEntry>> {
        Ok(self
            .journal
            .lock()
            .iter()
            .filter(|e| e.object == object)
            .cloned()
            .collect())
    }
}
