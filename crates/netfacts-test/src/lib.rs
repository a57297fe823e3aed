//! Test infrastructure for the netfacts crates
//!
//! Provides:
//! - [`InventoryBuilder`] for seeding a [`MemoryInventory`](netfacts_inventory::MemoryInventory)
//! - [`ScriptedConnector`] for serving canned device output to a driver
//!   factory, with unreachable and slow devices

pub mod fixtures;
mod scripted;

pub use fixtures::*;
pub use scripted::{DeviceScript, ScriptedConnector};
