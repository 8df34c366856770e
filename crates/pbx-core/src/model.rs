//! Extension records, runtime snapshots and the fields compared between them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_context() -> String {
    "from-internal".to_string()
}

fn default_transport() -> String {
    "transport-udp".to_string()
}

fn default_codecs() -> Vec<String> {
    vec!["ulaw".to_string()]
}

fn default_max_contacts() -> u32 {
    1
}

fn default_qualify_frequency() -> u32 {
    60
}

fn default_enabled() -> bool {
    true
}

/// A credential that never shows up in logs or debug output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The cleartext value, for rendering into the server configuration.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An extension as the administrator declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Dialable number, digits only; the record's identity.
    pub number: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub secret: Secret,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Codecs in order of preference.
    #[serde(default = "default_codecs")]
    pub codecs: Vec<String>,
    #[serde(default)]
    pub direct_media: bool,
    #[serde(default = "default_max_contacts")]
    pub max_contacts: u32,
    /// Seconds between qualify requests; 0 disables qualifying.
    #[serde(default = "default_qualify_frequency")]
    pub qualify_frequency: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ExtensionRecord {
    /// A record with default settings for `number`.
    pub fn new(number: impl Into<String>) -> Self {
        let number = number.into();
        Self {
            display_name: number.clone(),
            number,
            secret: Secret::default(),
            context: default_context(),
            transport: default_transport(),
            codecs: default_codecs(),
            direct_media: false,
            max_contacts: default_max_contacts(),
            qualify_frequency: default_qualify_frequency(),
            enabled: default_enabled(),
        }
    }

    /// Check the record can be rendered into a well-formed configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidRecord` naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(Error::invalid_record(&self.number, reason));

        if !is_valid_number(&self.number) {
            return invalid("number must be non-empty and contain only digits");
        }
        if self.display_name.contains(['"', '\n', '\r']) {
            return invalid("display name must not contain quotes or line breaks");
        }
        if !is_config_token(&self.context) {
            return invalid("context must be a non-empty token");
        }
        if !is_config_token(&self.transport) {
            return invalid("transport must be a non-empty token");
        }
        if self.codecs.is_empty() {
            return invalid("at least one codec is required");
        }
        if let Some(codec) = self.codecs.iter().find(|c| !is_config_token(c) || c.contains(',')) {
            return invalid(&format!("invalid codec {codec:?}"));
        }
        if self.max_contacts == 0 {
            return invalid("max_contacts must be positive");
        }
        if self.secret.expose().contains(['\n', '\r']) {
            return invalid("secret must not contain line breaks");
        }
        Ok(())
    }
}

/// Whether `number` is a non-empty string of ASCII digits.
pub fn is_valid_number(number: &str) -> bool {
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

fn is_config_token(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | ';' | '=' | '"'))
}

/// Order extension numbers the way people read them: `99` before `100`.
///
/// Digit strings compare by numeric value (then by their text, so `0101`
/// and `101` stay distinct); anything else sorts after them lexically.
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (is_valid_number(a), is_valid_number(b)) {
        (true, true) => {
            let sa = a.trim_start_matches('0');
            let sb = b.trim_start_matches('0');
            sa.len()
                .cmp(&sb.len())
                .then_with(|| sa.cmp(sb))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// Map key ordering extension numbers with [`compare_numbers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberKey(pub String);

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numbers(&self.0, &other.0)
    }
}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What the telephony server currently reports for one extension.
///
/// A `None` field is one the runtime does not report; it takes no part in
/// comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    pub number: String,
    pub registered: bool,
    pub display_name: Option<String>,
    /// Carried so a pull does not lose credentials. Never compared.
    pub secret: Option<Secret>,
    pub context: Option<String>,
    pub transport: Option<String>,
    pub codecs: Option<Vec<String>>,
    pub direct_media: Option<bool>,
    pub max_contacts: Option<u32>,
    pub qualify_frequency: Option<u32>,
}

impl RuntimeSnapshot {
    /// A snapshot for `number` that reports no fields.
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Default::default()
        }
    }

    /// The snapshot a runtime would report after loading `record`.
    pub fn from_record(record: &ExtensionRecord) -> Self {
        Self {
            number: record.number.clone(),
            registered: false,
            display_name: Some(record.display_name.clone()),
            secret: Some(record.secret.clone()),
            context: Some(record.context.clone()),
            transport: Some(record.transport.clone()),
            codecs: Some(record.codecs.clone()),
            direct_media: Some(record.direct_media),
            max_contacts: Some(record.max_contacts),
            qualify_frequency: Some(record.qualify_frequency),
        }
    }
}

/// A field that can disagree between declared and runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftField {
    Context,
    Transport,
    Codecs,
    DirectMedia,
    MaxContacts,
    QualifyFrequency,
    /// The record is disabled but the runtime still has it active.
    Enabled,
}

impl DriftField {
    /// The mutable configuration fields, in reporting order.
    pub const COMPARABLE: [DriftField; 6] = [
        DriftField::Context,
        DriftField::Transport,
        DriftField::Codecs,
        DriftField::DirectMedia,
        DriftField::MaxContacts,
        DriftField::QualifyFrequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftField::Context => "context",
            DriftField::Transport => "transport",
            DriftField::Codecs => "codecs",
            DriftField::DirectMedia => "direct_media",
            DriftField::MaxContacts => "max_contacts",
            DriftField::QualifyFrequency => "qualify_frequency",
            DriftField::Enabled => "enabled",
        }
    }

    /// Whether `runtime` reports a value for this field that differs from
    /// `record`. Unreported fields never differ.
    pub fn differs(&self, record: &ExtensionRecord, runtime: &RuntimeSnapshot) -> bool {
        fn ne<T: PartialEq + ?Sized>(runtime: Option<&T>, declared: &T) -> bool {
            runtime.is_some_and(|value| value != declared)
        }

        match self {
            DriftField::Context => ne(runtime.context.as_deref(), record.context.as_str()),
            DriftField::Transport => ne(runtime.transport.as_deref(), record.transport.as_str()),
            DriftField::Codecs => ne(runtime.codecs.as_deref(), record.codecs.as_slice()),
            DriftField::DirectMedia => ne(runtime.direct_media.as_ref(), &record.direct_media),
            DriftField::MaxContacts => ne(runtime.max_contacts.as_ref(), &record.max_contacts),
            DriftField::QualifyFrequency => {
                ne(runtime.qualify_frequency.as_ref(), &record.qualify_frequency)
            }
            DriftField::Enabled => !record.enabled,
        }
    }
}

impl fmt::Display for DriftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
