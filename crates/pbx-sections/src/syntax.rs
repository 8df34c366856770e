//! Marker and comment conventions of the generated configuration file.

use crate::error::{Error, Result};

/// Comment prefix used by Asterisk configuration files.
pub const DEFAULT_COMMENT_PREFIX: &str = ";";

const BEGIN_KEYWORD: &str = "BEGIN";
const END_KEYWORD: &str = "END";

/// A recognised marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    Begin(&'a str),
    End(&'a str),
}

impl<'a> Marker<'a> {
    pub fn label(&self) -> &'a str {
        match self {
            Marker::Begin(label) | Marker::End(label) => label,
        }
    }
}

/// How sections are delimited and deactivated in a file.
///
/// Markers are whole lines of the form `; BEGIN Extension 101` and
/// `; END Extension 101`, so the telephony server reads them as comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSyntax {
    comment_prefix: String,
}

impl Default for SectionSyntax {
    fn default() -> Self {
        Self {
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
        }
    }
}

impl SectionSyntax {
    /// Syntax with a custom comment prefix (e.g. `#`).
    ///
    /// An empty prefix falls back to the default.
    pub fn new(comment_prefix: impl Into<String>) -> Self {
        let comment_prefix = comment_prefix.into();
        if comment_prefix.trim().is_empty() {
            return Self::default();
        }
        Self { comment_prefix }
    }

    pub fn comment_prefix(&self) -> &str {
        &self.comment_prefix
    }

    pub fn begin_marker(&self, label: &str) -> String {
        format!("{} {} {}", self.comment_prefix, BEGIN_KEYWORD, label)
    }

    pub fn end_marker(&self, label: &str) -> String {
        format!("{} {} {}", self.comment_prefix, END_KEYWORD, label)
    }

    /// Recognise a marker line. Surrounding whitespace and a trailing `\r`
    /// are tolerated.
    pub fn parse_marker<'a>(&self, line: &'a str) -> Option<Marker<'a>> {
        let rest = line.trim().strip_prefix(self.comment_prefix.as_str())?;
        let rest = rest.trim_start();

        let (keyword, label) = rest.split_once(char::is_whitespace)?;
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        match keyword {
            BEGIN_KEYWORD => Some(Marker::Begin(label)),
            END_KEYWORD => Some(Marker::End(label)),
            _ => None,
        }
    }

    /// Prefix a line so the server ignores it.
    pub fn comment_line(&self, line: &str) -> String {
        format!("{}{}", self.comment_prefix, line)
    }

    /// Strip exactly one comment prefix, the inverse of [`Self::comment_line`].
    pub fn uncomment_line<'a>(&self, line: &'a str) -> &'a str {
        line.strip_prefix(self.comment_prefix.as_str())
            .unwrap_or(line)
    }

    pub fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with(self.comment_prefix.as_str())
    }

    /// Labels are single-line, non-empty and carry no surrounding whitespace,
    /// so they survive a write/parse cycle unchanged.
    pub fn validate_label(&self, label: &str) -> Result<()> {
        if label.is_empty() || label.trim() != label || label.contains(['\n', '\r']) {
            return Err(Error::InvalidLabel {
                label: label.to_string(),
            });
        }
        Ok(())
    }

    /// A body must not contain marker lines, or it would split its own
    /// section. Lines that only become markers once commented out are
    /// rejected too.
    pub fn validate_body(&self, label: &str, body: &str) -> Result<()> {
        let offending = body.lines().find(|line| {
            self.parse_marker(line).is_some()
                || self.parse_marker(&self.comment_line(line)).is_some()
        });
        if let Some(line) = offending {
            return Err(Error::InvalidBody {
                label: label.to_string(),
                reason: format!("line {line:?} is or would become a marker"),
            });
        }
        Ok(())
    }
}
