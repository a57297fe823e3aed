//! The inventory contract the engine is written against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netfacts_common::{
    CollectorType, DeviceId, InterfaceId, IpAddressId, MacAddressId, ObjectRef, RirId, SiteId,
    VrfId,
};
use netfacts_types::{IpPrefix, MacAddress};

use crate::error::InventoryResult;
use crate::filter::DeviceFilter;
use crate::model::{
    Asn, Cable, Device, Interface, IpAddressRecord, JournalEntry, MacAddressRecord, MacVendor,
    Prefix, Rir, Site, Vrf,
};

/// Field changes applied to an existing MAC address record.
///
/// `None` leaves the field untouched; the `add_*` fields extend the
/// many-to-many sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacUpdate {
    pub last_seen: Option<DateTime<Utc>>,
    pub discovery_method: Option<CollectorType>,
    pub device_interface: Option<InterfaceId>,
    pub add_interface: Option<InterfaceId>,
    pub add_ip_address: Option<IpAddressId>,
}

impl MacUpdate {
    /// Stamps last-seen and the discovery method.
    pub fn seen(now: DateTime<Utc>, method: CollectorType) -> Self {
        Self {
            last_seen: Some(now),
            discovery_method: Some(method),
            ..Self::default()
        }
    }
}

/// Attributes given to an object when a get-or-create call creates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Creation {
    pub description: String,
    pub tags: Vec<String>,
}

impl Creation {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            tags: vec![tag.into()],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Read and write access to the system-of-record inventory.
///
/// Creation goes through `get_or_create_*` calls keyed on the natural key of
/// each object (MAC address, address+VRF, ASN number). Implementations must
/// make these atomic so concurrent runs never produce duplicates. The bool in
/// the returned tuple is true when the call created the object.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // --- devices and topology ---

    async fn devices(&self) -> InventoryResult<Vec<Device>>;

    async fn device(&self, id: DeviceId) -> InventoryResult<Option<Device>>;

    async fn device_by_name(&self, name: &str) -> InventoryResult<Option<Device>>;

    async fn site(&self, id: SiteId) -> InventoryResult<Option<Site>>;

    /// Looks up an interface of `device` by name.
    async fn interface(&self, device: DeviceId, name: &str) -> InventoryResult<Option<Interface>>;

    async fn update_device_serial(&self, id: DeviceId, serial: &str) -> InventoryResult<()>;

    /// Resolves the devices matched by `filter`, ordered by name.
    async fn select_devices(&self, filter: &DeviceFilter) -> InventoryResult<Vec<Device>> {
        let mut selected = Vec::new();
        for device in self.devices().await? {
            let site = self.site(device.site).await?;
            if filter.matches(&device, site.as_ref()) {
                selected.push(device);
            }
        }
        selected.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(selected)
    }

    // --- IPAM ---

    async fn vrf_by_name(&self, name: &str) -> InventoryResult<Option<Vrf>>;

    async fn vrf(&self, id: VrfId) -> InventoryResult<Option<Vrf>>;

    /// Returns prefixes equal to or containing `prefix`. When `vrf` is given
    /// only prefixes of that VRF are returned.
    async fn prefixes_covering(
        &self,
        prefix: &IpPrefix,
        vrf: Option<VrfId>,
    ) -> InventoryResult<Vec<Prefix>>;

    async fn find_ip(
        &self,
        address: &IpPrefix,
        vrf: Option<VrfId>,
    ) -> InventoryResult<Option<IpAddressRecord>>;

    async fn get_or_create_ip(
        &self,
        address: IpPrefix,
        vrf: Option<VrfId>,
        creation: Creation,
    ) -> InventoryResult<(IpAddressRecord, bool)>;

    async fn rir_by_name(&self, name: &str) -> InventoryResult<Option<Rir>>;

    async fn get_or_create_asn(
        &self,
        asn: u32,
        rir: RirId,
        creation: Creation,
    ) -> InventoryResult<(Asn, bool)>;

    // --- MAC addresses ---

    async fn find_mac(&self, address: &MacAddress) -> InventoryResult<Option<MacAddressRecord>>;

    async fn get_or_create_mac(
        &self,
        address: MacAddress,
        creation: Creation,
    ) -> InventoryResult<(MacAddressRecord, bool)>;

    async fn update_mac(
        &self,
        id: MacAddressId,
        update: MacUpdate,
    ) -> InventoryResult<MacAddressRecord>;

    /// Registers a vendor prefix. Returns true if it was not known before.
    async fn register_vendor(&self, vendor: MacVendor) -> InventoryResult<bool>;

    async fn vendor_for(&self, address: &MacAddress) -> InventoryResult<Option<MacVendor>>;

    // --- cabling ---

    /// Connects two interfaces.
    ///
    /// Fails with a conflict if either interface already has a cable.
    async fn create_cable(
        &self,
        a: InterfaceId,
        b: InterfaceId,
        creation: Creation,
    ) -> InventoryResult<Cable>;

    // --- journal ---

    async fn add_journal_entry(
        &self,
        object: ObjectRef,
        comments: String,
    ) -> InventoryResult<JournalEntry>;

    async fn journal(&self, object: ObjectRef) -> InventoryResult<Vec<JournalEntry>>;
}
