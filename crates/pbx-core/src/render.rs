//! PJSIP stanza rendering
//!
//! Each extension becomes three stanzas sharing the extension number as
//! their name: an endpoint, its userpass auth, and its address-of-record.
//! [`crate::ConfigFileProbe`] parses the same layout back.

use std::fmt::Write;

use crate::model::ExtensionRecord;
use crate::traits::{ConfigRenderer, DEFAULT_LABEL_PREFIX, section_label};

/// Renders extension records as PJSIP endpoint/auth/aor stanzas.
#[derive(Debug, Clone)]
pub struct PjsipRenderer {
    label_prefix: String,
}

impl PjsipRenderer {
    pub fn new(label_prefix: impl Into<String>) -> Self {
        Self {
            label_prefix: label_prefix.into(),
        }
    }

    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }
}

impl Default for PjsipRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_PREFIX)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

impl ConfigRenderer for PjsipRenderer {
    fn render_section(&self, record: &ExtensionRecord) -> String {
        let n = &record.number;
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "[{n}]");
        let _ = writeln!(out, "type=endpoint");
        let _ = writeln!(out, "context={}", record.context);
        let _ = writeln!(out, "disallow=all");
        let _ = writeln!(out, "allow={}", record.codecs.join(","));
        let _ = writeln!(out, "transport={}", record.transport);
        let _ = writeln!(out, "auth={n}");
        let _ = writeln!(out, "aors={n}");
        let _ = writeln!(out, "direct_media={}", yes_no(record.direct_media));
        if !record.display_name.is_empty() {
            let _ = writeln!(out, "callerid=\"{}\" <{n}>", record.display_name);
        }
        out.push('\n');

        let _ = writeln!(out, "[{n}]");
        let _ = writeln!(out, "type=auth");
        let _ = writeln!(out, "auth_type=userpass");
        let _ = writeln!(out, "username={n}");
        let _ = writeln!(out, "password={}", record.secret.expose());
        out.push('\n');

        let _ = writeln!(out, "[{n}]");
        let _ = writeln!(out, "type=aor");
        let _ = writeln!(out, "max_contacts={}", record.max_contacts);
        let _ = write!(out, "qualify_frequency={}", record.qualify_frequency);
        out
    }

    fn section_label(&self, number: &str) -> String {
        section_label(&self.label_prefix, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_section() {
        let mut record = ExtensionRecord::new("101");
        record.display_name = "Alice".into();
        record.secret = "s3cret".into();
        record.codecs = vec!["ulaw".into(), "alaw".into()];

        let expected = "\
[101]
type=endpoint
context=from-internal
disallow=all
allow=ulaw,alaw
transport=transport-udp
auth=101
aors=101
direct_media=no
callerid=\"Alice\" <101>

[101]
type=auth
auth_type=userpass
username=101
password=s3cret

[101]
type=aor
max_contacts=1
qualify_frequency=60";

        assert_eq!(PjsipRenderer::default().render_section(&record), expected);
    }

    #[test]
    fn test_no_callerid_without_name() {
        let mut record = ExtensionRecord::new("102");
        record.display_name.clear();
        let body = PjsipRenderer::default().render_section(&record);
        assert!(!body.contains("callerid"));
    }

    #[test]
    fn test_custom_label_prefix() {
        let renderer = PjsipRenderer::new("Ext");
        assert_eq!(renderer.section_label("101"), "Ext 101");
        assert_eq!(PjsipRenderer::default().section_label("101"), "Extension 101");
    }
}
