//! Device driver abstraction for netfacts.
//!
//! Collectors talk to devices through [`NetworkDriver`], a set of
//! vendor-neutral getters returning typed tables. A driver sits on top of a
//! [`DeviceSession`], the raw transport, which is opened by a [`Connector`].
//! [`DriverFactory`] resolves driver names and prefers the enhanced
//! implementations over the generic ones.

pub mod driver;
pub mod error;
pub mod factory;
pub mod junos;
pub mod replay;
pub mod session;
pub mod tables;

pub use driver::{GenericDriver, NetworkDriver};
pub use error::{DriverError, DriverResult};
pub use factory::{DriverFactory, ResolvedDriver, ENHANCED_NAMESPACE, GENERIC_DRIVERS};
pub use junos::{EnhancedJunosDriver, ENHANCED_JUNOS};
pub use replay::{Capture, ReplayConnector, ReplaySession};
pub use session::{ConnectParams, Connector, DeviceSession};
pub use tables::{
    AddressDetail, BgpPeer, BgpTable, DeviceFacts, Getter, InterfaceAddresses, InterfaceDetail,
    InterfaceIpTable, InterfaceTable, IpNeighbor, LldpNeighbor, LldpTable, MacTableEntry,
    NetworkInstance, NetworkInstanceTable, RawNeighbor,
};
