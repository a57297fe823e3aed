//! IP address and prefix types with safe parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IPv4 or IPv6 address.
///
/// Parsing is canonicalizing: `2001:0dB8:0000::0001` and `2001:db8::1` are the
/// same value and both display as `2001:db8::1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpAddress(IpAddr);

impl IpAddress {
    /// Parses an address that may carry a zone suffix (`fe80::1%ae0.0`).
    ///
    /// The zone is discarded.
    pub fn parse_scoped(s: &str) -> Result<Self, ParseError> {
        let addr = s.trim();
        let addr = addr.split_once('%').map_or(addr, |(a, _)| a);
        addr.parse()
    }

    /// Returns the underlying standard library address.
    pub const fn inner(&self) -> IpAddr {
        self.0
    }

    /// Returns true if this is an IPv4 address.
    pub const fn is_ipv4(&self) -> bool {
        matches!(self.0, IpAddr::V4(_))
    }

    /// Returns true if this is an IPv6 address.
    pub const fn is_ipv6(&self) -> bool {
        matches!(self.0, IpAddr::V6(_))
    }

    /// Returns the length of a host route for this family (32 or 128).
    pub const fn max_prefix_len(&self) -> u8 {
        match self.0 {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IpAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(IpAddress)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl TryFrom<String> for IpAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpAddress> for String {
    fn from(addr: IpAddress) -> String {
        addr.to_string()
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        IpAddress(addr)
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> Self {
        IpAddress(IpAddr::V4(addr))
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddress(IpAddr::V6(addr))
    }
}

/// An address with a prefix length, in CIDR notation (`10.0.0.5/24`).
///
/// The host bits are kept, so this models an interface address as much as a
/// network. [`IpPrefix::network`] returns the masked form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    address: IpAddress,
    prefix_len: u8,
}

impl IpPrefix {
    /// Creates a new IP prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address type
    /// (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddress, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = address.max_prefix_len();
        if prefix_len > max_len {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for {}",
                prefix_len, max_len, address
            )));
        }

        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    /// Returns the host route for `address` (/32 for IPv4, /128 for IPv6).
    pub const fn host(address: IpAddress) -> Self {
        IpPrefix {
            prefix_len: address.max_prefix_len(),
            address,
        }
    }

    /// Returns the address part.
    pub const fn address(&self) -> &IpAddress {
        &self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if this is an IPv4 prefix.
    pub const fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }

    /// Returns true if this is a host route (/32 for IPv4, /128 for IPv6).
    pub const fn is_host_route(&self) -> bool {
        self.prefix_len == self.address.max_prefix_len()
    }

    /// Returns the prefix with all host bits cleared.
    pub fn network(&self) -> IpPrefix {
        let address = match self.address.inner() {
            IpAddr::V4(v4) => {
                IpAddress::from(Ipv4Addr::from(u32::from(v4) & v4_mask(self.prefix_len)))
            }
            IpAddr::V6(v6) => {
                IpAddress::from(Ipv6Addr::from(u128::from(v6) & v6_mask(self.prefix_len)))
            }
        };
        IpPrefix {
            address,
            prefix_len: self.prefix_len,
        }
    }

    /// Returns true if `addr` falls inside this prefix's network.
    ///
    /// Addresses of the other family never match.
    pub fn contains(&self, addr: &IpAddress) -> bool {
        match (self.address.inner(), addr.inner()) {
            (IpAddr::V4(net), IpAddr::V4(host)) => {
                let mask = v4_mask(self.prefix_len);
                u32::from(net) & mask == u32::from(host) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(host)) => {
                let mask = v6_mask(self.prefix_len);
                u128::from(net) & mask == u128::from(host) & mask
            }
            _ => false,
        }
    }

    /// Returns true if `other` is equal to or nested inside this prefix.
    pub fn covers(&self, other: &IpPrefix) -> bool {
        self.prefix_len <= other.prefix_len && self.contains(other.address())
    }
}

fn v4_mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(len))
    }
}

fn v6_mask(len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(len))
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .trim()
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddress = addr_str.parse()?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpPrefix::new(address, prefix_len)
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> String {
        prefix.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_ipv6() {
        let addr: IpAddress = "2001:0dB8:85a3:0000:0000:8A2e:0370:7334".parse().unwrap();
        assert_eq!(addr.to_string(), "2001:db8:85a3::8a2e:370:7334");
    }

    #[test]
    fn test_parse_scoped() {
        let addr = IpAddress::parse_scoped("fe80::1%ae0.0").unwrap();
        assert_eq!(addr.to_string(), "fe80::1");
        assert!(addr.is_ipv6());

        let plain = IpAddress::parse_scoped("10.0.0.1").unwrap();
        assert!(plain.is_ipv4());

        assert!(IpAddress::parse_scoped("%ae0").is_err());
    }

    #[test]
    fn test_host_route() {
        let v4 = IpPrefix::host("192.0.2.1".parse().unwrap());
        assert_eq!(v4.to_string(), "192.0.2.1/32");
        assert!(v4.is_host_route());

        let v6 = IpPrefix::host("2001:db8::1".parse().unwrap());
        assert_eq!(v6.to_string(), "2001:db8::1/128");
        assert!(v6.is_host_route());
    }

    #[test]
    fn test_contains() {
        let iface: IpPrefix = "10.0.0.1/24".parse().unwrap();
        assert!(iface.contains(&"10.0.0.200".parse().unwrap()));
        assert!(!iface.contains(&"10.0.1.1".parse().unwrap()));
        assert!(!iface.contains(&"2001:db8::1".parse().unwrap()));

        let v6: IpPrefix = "2001:db8::1/64".parse().unwrap();
        assert!(v6.contains(&"2001:db8::ffff".parse().unwrap()));

        let all: IpPrefix = "0.0.0.0/0".parse().unwrap();
        assert!(all.contains(&"198.51.100.7".parse().unwrap()));
    }

    #[test]
    fn test_network_and_covers() {
        let iface: IpPrefix = "10.0.0.77/24".parse().unwrap();
        assert_eq!(iface.network().to_string(), "10.0.0.0/24");

        let parent: IpPrefix = "10.0.0.0/16".parse().unwrap();
        assert!(parent.covers(&iface));
        assert!(!iface.covers(&parent));
    }

    #[test]
    fn test_invalid_prefix() {
        assert!("10.0.0.0/33".parse::<IpPrefix>().is_err());
        assert!("2001:db8::/129".parse::<IpPrefix>().is_err());
        assert!("10.0.0.0".parse::<IpPrefix>().is_err());
        assert!("10.0.0.0/x".parse::<IpPrefix>().is_err());
    }
}
