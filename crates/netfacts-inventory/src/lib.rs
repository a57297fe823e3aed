//! Inventory access for the netfacts collection engine.
//!
//! The engine never talks to the system of record directly. It goes through
//! [`InventoryStore`], which exposes lookups by natural key and atomic
//! get-or-create operations. [`MemoryInventory`] is the in-process
//! implementation used by the CLI and the test suites.

pub mod error;
pub mod filter;
pub mod memory;
pub mod model;
pub mod store;
pub mod vendor;

pub use error::{InventoryError, InventoryResult};
pub use filter::DeviceFilter;
pub use memory::{InventorySnapshot, MemoryInventory};
pub use model::{
    Asn, Cable, CableStatus, Device, Interface, IpAddressRecord, JournalEntry, MacAddressRecord,
    MacVendor, Prefix, Rir, Site, Vrf,
};
pub use store::{Creation, InventoryStore, MacUpdate};
pub use vendor::parse_oui_registry;
