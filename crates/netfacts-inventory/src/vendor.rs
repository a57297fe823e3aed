//! IEEE OUI registry parsing.

use netfacts_types::MacPrefix;
use tracing::debug;

use crate::model::MacVendor;

const BASE16_MARKER: &str = "(base 16)";

/// Parses the IEEE `oui.txt` registry format.
///
/// Only the `(base 16)` lines are used:
///
/// ```text
/// 001C73     (base 16)		Arista Networks
/// ```
///
/// Lines with an unparseable prefix are skipped.
pub fn parse_oui_registry(text: &str) -> Vec<MacVendor> {
    let mut vendors = Vec::new();

    for line in text.lines() {
        let Some((prefix, name)) = line.split_once(BASE16_MARKER) else {
            continue;
        };
        let name = name.trim();
        match prefix.trim().parse::<MacPrefix>() {
            Ok(prefix) if !name.is_empty() => vendors.push(MacVendor {
                prefix,
                vendor_name: name.to_string(),
                manufacturer: None,
            }),
            Ok(_) => {}
            Err(e) => debug!(line = %line, error = %e, "Skipping OUI line"),
        }
    }

    vendors
}
