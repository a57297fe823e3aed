//! Markdown link helpers for run log lines and journal notes.

/// Objects that have a page in the host application.
pub trait AbsoluteUrl {
    /// Text shown for the object.
    fn display_name(&self) -> String;

    /// Path of the object's page, e.g. `/dcim/devices/12/`.
    fn absolute_url(&self) -> String;

    /// Returns `[name](url)`, optionally in code and/or bold.
    fn markdown(&self, code: bool, bold: bool) -> String {
        link_markdown(&self.display_name(), &self.absolute_url(), code, bold)
    }
}

/// Formats a markdown link.
///
/// ```
/// use netfacts_common::link_markdown;
///
/// assert_eq!(link_markdown("edge1", "/dcim/devices/1/", false, true), "**[edge1](/dcim/devices/1/)**");
/// assert_eq!(link_markdown("xe-0/0/0", "/dcim/interfaces/4/", true, false), "[`xe-0/0/0`](/dcim/interfaces/4/)");
/// ```
pub fn link_markdown(text: &str, url: &str, code: bool, bold: bool) -> String {
    let text = if code {
        format!("`{}`", text)
    } else {
        text.to_string()
    };
    let link = format!("[{}]({})", text, url);
    if bold {
        format!("**{}**", link)
    } else {
        link
    }
}
