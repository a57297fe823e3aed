//! Shared vocabulary for the netfacts crates.
//!
//! - [`choices`]: the closed value sets (collector types, plan/report/entry
//!   statuses, entry actions, fact kinds, priorities)
//! - [`ids`]: typed identifiers for plans, reports, entries and inventory rows
//! - [`ObjectRef`]: reference from a report entry to the inventory object it
//!   resolved to
//! - [`FactValues`]: the detected/current value bag stored on entries
//! - [`RunLog`]: the user-facing log accumulated during one collection run
//! - [`markdown`]: link helpers used when writing log lines and journal notes

pub mod choices;
pub mod ids;
pub mod markdown;
mod object_ref;
mod run_log;
pub mod values;

pub use choices::{
    CollectorType, EntryAction, EntryStatus, FactKind, PlanStatus, Priority, ReportStatus,
    UnknownChoice,
};
pub use ids::{
    AsnId, CableId, DeviceId, EntryId, InterfaceId, IpAddressId, MacAddressId, PlanId, PrefixId,
    ReportId, RirId, SiteId, VrfId,
};
pub use markdown::{link_markdown, AbsoluteUrl};
pub use object_ref::ObjectRef;
pub use run_log::{LogLevel, LogLine, RunLog};
pub use values::{FactValues, ValuesExt};

pub use serde_json;
