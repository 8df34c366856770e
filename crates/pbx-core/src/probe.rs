//! Runtime probe backed by the generated configuration file
//!
//! The server loads whatever active extension sections the file holds, so
//! parsing those sections yields what the runtime reports once reloaded.
//! Registration state cannot be read from a file; callers that know it
//! supply it through [`ConfigFileProbe::with_registered`].

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use pbx_sections::{ConfigSectionStore, Section};
use regex::Regex;

use crate::error::Result;
use crate::model::{RuntimeSnapshot, Secret};
use crate::traits::{DEFAULT_LABEL_PREFIX, RuntimeProbe};

/// `<prefix> <number>`
static NUMBERED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?) ([0-9]+)$").unwrap());

/// `"Name" <number>` or `Name <number>`
static CALLERID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"?([^"<]*?)"?\s*<[^>]*>\s*$"#).unwrap());

/// Reads runtime state from the active extension sections of a config file.
pub struct ConfigFileProbe {
    sections: Arc<ConfigSectionStore>,
    label_prefix: String,
    registered: HashSet<String>,
}

impl ConfigFileProbe {
    pub fn new(sections: Arc<ConfigSectionStore>) -> Self {
        Self {
            sections,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            registered: HashSet::new(),
        }
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Numbers whose devices are currently registered.
    pub fn with_registered<I, S>(mut self, numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered = numbers.into_iter().map(Into::into).collect();
        self
    }

    fn extension_number<'a>(&self, section: &'a Section) -> Option<&'a str> {
        let captures = NUMBERED_LABEL.captures(&section.label)?;
        if captures.get(1)?.as_str() != self.label_prefix {
            return None;
        }
        Some(captures.get(2)?.as_str())
    }
}

impl RuntimeProbe for ConfigFileProbe {
    fn snapshot(&self) -> Result<Vec<RuntimeSnapshot>> {
        let syntax = self.sections.syntax();
        let snapshots = self
            .sections
            .sections()?
            .iter()
            .filter(|section| section.is_active())
            .filter_map(|section| {
                let number = self.extension_number(section)?;
                let mut snapshot = parse_stanzas(number, &section.body, syntax.comment_prefix());
                snapshot.registered = self.registered.contains(number);
                Some(snapshot)
            })
            .collect();
        Ok(snapshots)
    }
}

#[derive(Default)]
struct Stanza {
    name: String,
    kind: Option<String>,
    entries: Vec<(String, String)>,
}

/// Parse the PJSIP stanzas of one extension section into a snapshot.
///
/// Only stanzas named after `number` contribute. Fields the body does not
/// set stay unreported.
pub fn parse_stanzas(number: &str, body: &str, comment_prefix: &str) -> RuntimeSnapshot {
    let mut snapshot = RuntimeSnapshot::new(number);

    for stanza in split_stanzas(body, comment_prefix) {
        if stanza.name != number {
            tracing::debug!(number, stanza = %stanza.name, "Skipping foreign stanza");
            continue;
        }
        match stanza.kind.as_deref() {
            Some("endpoint") => apply_endpoint(&mut snapshot, &stanza),
            Some("auth") => {
                if let Some(password) = stanza.value("password") {
                    snapshot.secret = Some(Secret::new(password));
                }
            }
            Some("aor") => {
                snapshot.max_contacts = stanza.number("max_contacts");
                snapshot.qualify_frequency = stanza.number("qualify_frequency");
            }
            _ => {}
        }
    }
    snapshot
}

impl Stanza {
    /// Last value set for `key`.
    fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn number(&self, key: &str) -> Option<u32> {
        let raw = self.value(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(stanza = %self.name, key, value = raw, "Ignoring non-numeric value");
                None
            }
        }
    }
}

fn split_stanzas(body: &str, comment_prefix: &str) -> Vec<Stanza> {
    let mut stanzas = Vec::new();
    let mut current: Option<Stanza> = None;

    for line in body.lines() {
        let line = strip_comment(line, comment_prefix).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            if let Some(done) = current.take() {
                stanzas.push(done);
            }
            let name = rest.split(']').next().unwrap_or_default().trim();
            current = Some(Stanza {
                name: name.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(stanza) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        // `key => value` is accepted as well as `key = value`.
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim_start_matches('>').trim().to_string();
        if key == "type" {
            stanza.kind = Some(value.to_ascii_lowercase());
        } else {
            stanza.entries.push((key, value));
        }
    }

    stanzas.extend(current);
    stanzas
}

fn strip_comment<'a>(line: &'a str, comment_prefix: &str) -> &'a str {
    if line.trim_start().starts_with(comment_prefix) {
        return "";
    }
    match line.find(';') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn apply_endpoint(snapshot: &mut RuntimeSnapshot, stanza: &Stanza) {
    let mut codecs: Option<Vec<String>> = None;

    for (key, value) in &stanza.entries {
        match key.as_str() {
            "context" => snapshot.context = Some(value.clone()),
            "transport" => snapshot.transport = Some(value.clone()),
            "direct_media" => snapshot.direct_media = parse_bool(value),
            "callerid" => {
                snapshot.display_name = CALLERID
                    .captures(value)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim().to_string())
                    .or_else(|| Some(value.clone()));
            }
            "disallow" if value.eq_ignore_ascii_case("all") => codecs = Some(Vec::new()),
            "allow" => {
                let list = codecs.get_or_insert_with(Vec::new);
                for codec in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                    if !list.iter().any(|existing| existing == codec) {
                        list.push(codec.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    if codecs.is_some() {
        snapshot.codecs = codecs;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" | "y" => Some(true),
        "no" | "false" | "off" | "0" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtensionRecord;
    use crate::render::PjsipRenderer;
    use crate::traits::ConfigRenderer;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_rendered_section() {
        let mut record = ExtensionRecord::new("101");
        record.display_name = "Alice".into();
        record.secret = "pw".into();
        record.codecs = vec!["g722".into(), "ulaw".into()];
        record.direct_media = true;
        record.max_contacts = 3;
        record.qualify_frequency = 0;

        let body = PjsipRenderer::default().render_section(&record);
        let snapshot = parse_stanzas("101", &body, ";");

        assert_eq!(snapshot, RuntimeSnapshot::from_record(&record));
    }

    #[test]
    fn test_hand_written_section() {
        let body = "\
[101] ; edited by hand
type = endpoint
context = sales
disallow = all
allow = ulaw
allow = alaw,ulaw
;transport=transport-tcp
[101]
type=aor
max_contacts=many
";
        let snapshot = parse_stanzas("101", body, ";");

        assert_eq!(snapshot.context.as_deref(), Some("sales"));
        assert_eq!(
            snapshot.codecs,
            Some(vec!["ulaw".to_string(), "alaw".to_string()])
        );
        assert_eq!(snapshot.transport, None);
        assert_eq!(snapshot.max_contacts, None);
        assert_eq!(snapshot.secret, None);
    }

    #[test]
    fn test_foreign_stanza_ignored() {
        let body = "[other]\ntype=endpoint\ncontext=x\n";
        assert_eq!(parse_stanzas("101", body, ";").context, None);
    }

    #[rstest]
    #[case("\"Alice Smith\" <101>", "Alice Smith")]
    #[case("Bob <102>", "Bob")]
    #[case("plain", "plain")]
    fn test_callerid(#[case] raw: &str, #[case] name: &str) {
        let body = format!("[101]\ntype=endpoint\ncallerid={raw}\n");
        let snapshot = parse_stanzas("101", &body, ";");
        assert_eq!(snapshot.display_name.as_deref(), Some(name));
    }

    #[rstest]
    #[case("yes", Some(true))]
    #[case("No", Some(false))]
    #[case("maybe", None)]
    fn test_parse_bool(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(raw), expected);
    }
}
