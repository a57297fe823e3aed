//! Typed row identifiers.
//!
//! Each table gets its own id type so a device id can never be passed where
//! an interface id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl $name {
                /// Returns the raw numeric id.
                pub const fn get(&self) -> u64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    $name(raw)
                }
            }
        )+
    };
}

id_type! {
    /// Collection plan.
    PlanId,
    /// Facts report (one per run).
    ReportId,
    /// Facts report entry.
    EntryId,
    DeviceId,
    InterfaceId,
    SiteId,
    VrfId,
    PrefixId,
    MacAddressId,
    IpAddressId,
    CableId,
    AsnId,
    /// Regional internet registry.
    RirId,
}
