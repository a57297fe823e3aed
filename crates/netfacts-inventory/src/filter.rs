//! Device selection for collection plans.

use netfacts_common::DeviceId;
use serde::{Deserialize, Serialize};

use crate::model::{Device, Site};

/// Multi-criteria device filter.
///
/// Every non-empty criterion must match (AND); within one criterion any
/// listed value matches (OR). An empty filter selects every device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFilter {
    pub devices: Vec<DeviceId>,
    pub device_status: Vec<String>,
    pub regions: Vec<String>,
    pub site_groups: Vec<String>,
    pub sites: Vec<String>,
    pub locations: Vec<String>,
    pub device_types: Vec<String>,
    pub roles: Vec<String>,
    pub platforms: Vec<String>,
    pub tenant_groups: Vec<String>,
    pub tenants: Vec<String>,
    pub tags: Vec<String>,
}

fn any_of(allowed: &[String], value: Option<&str>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.iter().any(|a| a == v))
}

impl DeviceFilter {
    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == DeviceFilter::default()
    }

    /// Returns true if `device` (located at `site`) passes every criterion.
    pub fn matches(&self, device: &Device, site: Option<&Site>) -> bool {
        (self.devices.is_empty() || self.devices.contains(&device.id))
            && any_of(&self.device_status, Some(&device.status))
            && any_of(&self.regions, site.and_then(|s| s.region.as_deref()))
            && any_of(&self.site_groups, site.and_then(|s| s.group.as_deref()))
            && any_of(&self.sites, site.map(|s| s.name.as_str()))
            && any_of(&self.locations, device.location.as_deref())
            && any_of(&self.device_types, device.device_type.as_deref())
            && any_of(&self.roles, device.role.as_deref())
            && any_of(&self.platforms, device.platform.as_deref())
            && any_of(&self.tenant_groups, device.tenant_group.as_deref())
            && any_of(&self.tenants, device.tenant.as_deref())
            && (self.tags.is_empty() || self.tags.iter().any(|t| device.tags.contains(t)))
    }
}
