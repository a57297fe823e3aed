//! MAC address and OUI types with lenient parsing and canonical formatting.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Parsing accepts the notations seen in device output:
///
/// ```
/// use netfacts_types::MacAddress;
///
/// let a: MacAddress = "00:1c:73:aa:00:01".parse().unwrap();
/// let b: MacAddress = "00-1C-73-AA-00-01".parse().unwrap();
/// let c: MacAddress = "001c.73aa.0001".parse().unwrap();
/// let d: MacAddress = "0:1c:73:aa:0:1".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a, c);
/// assert_eq!(a, d);
/// assert_eq!(a.to_string(), "00:1C:73:AA:00:01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The zero/null MAC address (00:00:00:00:00:00).
    pub const ZERO: MacAddress = MacAddress([0, 0, 0, 0, 0, 0]);

    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns the vendor prefix (first 24 bits) of this address.
    pub const fn oui(&self) -> MacPrefix {
        MacPrefix([self.0[0], self.0[1], self.0[2]])
    }

    /// Returns true if this is a multicast address.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true if this is a locally administered address.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_hex_groups::<6>(s.trim())
            .ok_or_else(|| ParseError::InvalidMacAddress(s.to_string()))?;
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// A 24-bit organizationally unique identifier.
///
/// Formats as `AA:BB:CC`. Parses `AA:BB:CC`, `AA-BB-CC` and `AABBCC`, which
/// is the form used by the IEEE registry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacPrefix([u8; 3]);

impl MacPrefix {
    /// Creates a prefix from raw bytes.
    pub const fn new(bytes: [u8; 3]) -> Self {
        MacPrefix(bytes)
    }

    /// Returns true if `mac` belongs to this prefix.
    pub fn contains(&self, mac: &MacAddress) -> bool {
        mac.oui() == *self
    }
}

impl fmt::Display for MacPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for MacPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_groups::<3>(s.trim())
            .map(MacPrefix)
            .ok_or_else(|| ParseError::InvalidMacPrefix(s.to_string()))
    }
}

impl TryFrom<String> for MacPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacPrefix> for String {
    fn from(prefix: MacPrefix) -> String {
        prefix.to_string()
    }
}

/// Parses `N` bytes written as colon/hyphen separated octets, dotted
/// 16-bit groups, or a bare run of hex digits.
fn parse_hex_groups<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut bytes = [0u8; N];

    if s.contains(':') || s.contains('-') {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != N {
            return None;
        }
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return None;
            }
            bytes[i] = u8::from_str_radix(part, 16).ok()?;
        }
        return Some(bytes);
    }

    let digits: String = if s.contains('.') {
        let groups: Vec<&str> = s.split('.').collect();
        if groups.iter().any(|g| g.len() != 4) {
            return None;
        }
        groups.concat()
    } else {
        s.to_string()
    };

    if digits.len() != N * 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(bytes)
}
