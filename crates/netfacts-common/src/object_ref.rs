//! Typed reference from an entry to an inventory object.

use crate::ids::{AsnId, CableId, DeviceId, InterfaceId, IpAddressId, MacAddressId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The inventory object an entry matched at detection time or produced when
/// it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ObjectRef {
    Device(DeviceId),
    Interface(InterfaceId),
    MacAddress(MacAddressId),
    IpAddress(IpAddressId),
    Cable(CableId),
    Asn(AsnId),
}

impl ObjectRef {
    /// Returns the table name of the referenced object.
    pub const fn kind(&self) -> &'static str {
        match self {
            ObjectRef::Device(_) => "device",
            ObjectRef::Interface(_) => "interface",
            ObjectRef::MacAddress(_) => "mac_address",
            ObjectRef::IpAddress(_) => "ip_address",
            ObjectRef::Cable(_) => "cable",
            ObjectRef::Asn(_) => "asn",
        }
    }

    /// Returns the raw id of the referenced object.
    pub const fn id(&self) -> u64 {
        match self {
            ObjectRef::Device(id) => id.0,
            ObjectRef::Interface(id) => id.0,
            ObjectRef::MacAddress(id) => id.0,
            ObjectRef::IpAddress(id) => id.0,
            ObjectRef::Cable(id) => id.0,
            ObjectRef::Asn(id) => id.0,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

impl From<DeviceId> for ObjectRef {
    fn from(id: DeviceId) -> Self {
        ObjectRef::Device(id)
    }
}

impl From<InterfaceId> for ObjectRef {
    fn from(id: InterfaceId) -> Self {
        ObjectRef::Interface(id)
    }
}

impl From<MacAddressId> for ObjectRef {
    fn from(id: MacAddressId) -> Self {
        ObjectRef::MacAddress(id)
    }
}

impl From<IpAddressId> for ObjectRef {
    fn from(id: IpAddressId) -> Self {
        ObjectRef::IpAddress(id)
    }
}

impl From<CableId> for ObjectRef {
    fn from(id: CableId) -> Self {
        ObjectRef::Cable(id)
    }
}

impl From<AsnId> for ObjectRef {
    fn from(id: AsnId) -> Self {
        ObjectRef::Asn(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialized_shape() {
        let obj = ObjectRef::from(MacAddressId(7));
        let json = serde_json::to_value(obj).unwrap();
        assert_eq!(json, serde_json::json!({"type": "mac_address", "id": 7}));

        let back: ObjectRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectRef::Cable(CableId(3)).to_string(), "cable:3");
        assert_eq!(ObjectRef::Device(DeviceId(1)).kind(), "device");
    }
}
