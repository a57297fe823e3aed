//! Address types shared by the netfacts crates.
//!
//! Device drivers report addresses in many notations (`0:1c:73:aa:0:1`,
//! `001c.73aa.0001`, `fe80::1%ae0.0`, ...). Everything that crosses a crate
//! boundary is normalized into one of these types first:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC address
//! - [`MacPrefix`]: 24-bit organizationally unique identifier (OUI)
//! - [`IpAddress`]: IPv4 or IPv6 address
//! - [`IpPrefix`]: an address together with its prefix length (`10.0.0.5/24`)

mod ip;
mod mac;

pub use ip::{IpAddress, IpPrefix};
pub use mac::{MacAddress, MacPrefix};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid MAC prefix format: {0}")]
    InvalidMacPrefix(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),
}
