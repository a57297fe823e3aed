//! Closed value sets used by plans, reports and entries.
//!
//! Every set serializes to the same lowercase keys the host application
//! stores, and parses back from them with [`FromStr`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a string does not name a member of a choice set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! choice_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            /// All members, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Returns the stored key for this member.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(UnknownChoice { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

pub(crate) use choice_set;

choice_set! {
    /// The kind of facts a collection plan gathers.
    pub enum CollectorType as "collector type" {
        Arp => "arp",
        Ndp => "ndp",
        Inventory => "inventory",
        Interfaces => "interfaces",
        EthernetSwitching => "ethernet_switching",
        L2Circuits => "l2_circuits",
        Evpn => "evpn",
        Bgp => "bgp",
        Ospf => "ospf",
        Lldp => "lldp",
    }
}

impl CollectorType {
    /// Human readable name, used in log lines and journal notes.
    pub const fn label(&self) -> &'static str {
        match self {
            CollectorType::Arp => "ARP",
            CollectorType::Ndp => "IPv6 Neighbor Discovery",
            CollectorType::Inventory => "Inventory",
            CollectorType::Interfaces => "Interfaces",
            CollectorType::EthernetSwitching => "Ethernet Switching Tables",
            CollectorType::L2Circuits => "L2 Circuits",
            CollectorType::Evpn => "EVPN",
            CollectorType::Bgp => "BGP",
            CollectorType::Ospf => "OSPF",
            CollectorType::Lldp => "LLDP",
        }
    }

    /// Returns true for collectors that parse vendor CLI output and therefore
    /// need a per-vendor implementation.
    pub const fn is_vendor_specific(&self) -> bool {
        matches!(
            self,
            CollectorType::L2Circuits | CollectorType::Evpn | CollectorType::Ospf
        )
    }
}

choice_set! {
    /// Job queue class a plan is enqueued on.
    pub enum Priority as "priority" {
        High => "high",
        Default => "default",
        Low => "low",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Default
    }
}

choice_set! {
    /// Lifecycle status of a collection plan.
    pub enum PlanStatus as "plan status" {
        New => "new",
        Queued => "queued",
        Working => "working",
        Completed => "completed",
        Scheduled => "scheduled",
        Failed => "failed",
        /// The plan claims to be working but no run is active.
        Stalled => "stalled",
    }
}

impl Default for PlanStatus {
    fn default() -> Self {
        PlanStatus::New
    }
}

choice_set! {
    /// Aggregate status of one collection run.
    pub enum ReportStatus as "report status" {
        Pending => "pending",
        Completed => "completed",
        Partial => "partial",
        Applied => "applied",
        Failed => "failed",
    }
}

impl ReportStatus {
    /// Returns true once no entry of the report is waiting for review.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ReportStatus::Completed | ReportStatus::Applied | ReportStatus::Failed
        )
    }
}

choice_set! {
    /// What a detected fact means relative to the inventory.
    pub enum EntryAction as "entry action" {
        New => "new",
        Changed => "changed",
        Confirmed => "confirmed",
        Stale => "stale",
    }
}

choice_set! {
    /// Review status of a single entry.
    ///
    /// Only `Pending` is mutable; the other members are terminal.
    pub enum EntryStatus as "entry status" {
        Pending => "pending",
        Applied => "applied",
        Skipped => "skipped",
        Failed => "failed",
    }
}

impl EntryStatus {
    /// Returns true if the entry can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryStatus::Pending)
    }
}

choice_set! {
    /// Which half of a neighbor hit an entry stands for.
    ///
    /// ARP and NDP record two entries per hit that share one value bag; the
    /// kind tells the applier which object to create.
    pub enum FactKind as "fact kind" {
        MacDiscovery => "mac_discovery",
        IpDiscovery => "ip_discovery",
        Generic => "generic",
    }
}

impl Default for FactKind {
    fn default() -> Self {
        FactKind::Generic
    }
}
