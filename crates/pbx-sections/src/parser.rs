//! Section parsing for marker-delimited configuration files.
//!
//! Parses labelled sections with the format:
//! ```text
//! ; BEGIN Extension 101
//! [101]
//! type=endpoint
//! ; END Extension 101
//! ```

use std::ops::Range;

use crate::syntax::{Marker, SectionSyntax};

/// Whether the server currently reads a section's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// At least one non-blank body line is live configuration.
    Active,
    /// Every non-blank body line carries the comment prefix.
    Commented,
}

/// A parsed section with its label, body, and position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The label from the marker lines.
    pub label: String,
    /// The text between the markers, without the final line break.
    pub body: String,
    pub state: SectionState,
    /// The 1-based line number of the opening marker.
    pub start_line: usize,
    /// The 1-based line number of the closing marker.
    pub end_line: usize,
    /// Byte range covering both markers, including the closing marker's
    /// line break when there is one.
    pub span: Range<usize>,
    /// Byte range of the body lines with their own line breaks.
    pub body_span: Range<usize>,
}

impl Section {
    pub fn is_active(&self) -> bool {
        self.state == SectionState::Active
    }
}

struct OpenSection<'a> {
    label: &'a str,
    start: usize,
    start_line: usize,
    body_start: usize,
}

/// Parses all well-formed sections from the given content, in order of
/// appearance.
///
/// An opening marker without a matching closing marker is ignored, as is a
/// closing marker with no open section. A second opening marker inside an
/// open section abandons the first one.
pub fn parse_sections(content: &str, syntax: &SectionSyntax) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut open: Option<OpenSection<'_>> = None;
    let mut offset = 0;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();
        let line_no = index + 1;

        match syntax.parse_marker(line) {
            Some(Marker::Begin(label)) => {
                if let Some(abandoned) = open.take() {
                    tracing::warn!(
                        label = abandoned.label,
                        line = abandoned.start_line,
                        "Unterminated section marker ignored"
                    );
                }
                open = Some(OpenSection {
                    label,
                    start: line_start,
                    start_line: line_no,
                    body_start: offset,
                });
            }
            Some(Marker::End(label)) => match open.take() {
                Some(current) if current.label == label => {
                    let body = strip_final_newline(&content[current.body_start..line_start]);
                    sections.push(Section {
                        label: label.to_string(),
                        body: body.to_string(),
                        state: body_state(body, syntax),
                        start_line: current.start_line,
                        end_line: line_no,
                        span: current.start..offset,
                        body_span: current.body_start..line_start,
                    });
                }
                other => {
                    // Mismatched END: keep scanning the open section.
                    open = other;
                }
            },
            None => {}
        }
    }

    if let Some(abandoned) = open {
        tracing::warn!(
            label = abandoned.label,
            line = abandoned.start_line,
            "Unterminated section marker ignored"
        );
    }

    sections
}

/// Finds the first section with the given label.
pub fn find_section(content: &str, syntax: &SectionSyntax, label: &str) -> Option<Section> {
    parse_sections(content, syntax)
        .into_iter()
        .find(|section| section.label == label)
}

/// Checks if any section (active or commented) carries the label.
pub fn has_section(content: &str, syntax: &SectionSyntax, label: &str) -> bool {
    find_section(content, syntax, label).is_some()
}

fn strip_final_newline(text: &str) -> &str {
    text.strip_suffix('\n')
        .map(|t| t.strip_suffix('\r').unwrap_or(t))
        .unwrap_or(text)
}

fn body_state(body: &str, syntax: &SectionSyntax) -> SectionState {
    let mut saw_content = false;
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        if !syntax.is_comment(line) {
            return SectionState::Active;
        }
        saw_content = true;
    }
    if saw_content {
        SectionState::Commented
    } else {
        SectionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn syntax() -> SectionSyntax {
        SectionSyntax::default()
    }

    #[test]
    fn test_parse_sections_empty() {
        assert!(parse_sections("[global]\ntype=global\n", &syntax()).is_empty());
    }

    #[test]
    fn test_parse_single_section() {
        let content = "; BEGIN Extension 101\n[101]\ntype=aor\n; END Extension 101\n";
        let sections = parse_sections(content, &syntax());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "Extension 101");
        assert_eq!(sections[0].body, "[101]\ntype=aor");
        assert_eq!(sections[0].state, SectionState::Active);
        assert_eq!(sections[0].start_line, 1);
        assert_eq!(sections[0].end_line, 4);
        assert_eq!(sections[0].span, 0..content.len());
    }

    #[test]
    fn test_span_excludes_surrounding_text() {
        let content = "head\n; BEGIN A\nx\n; END A\ntail\n";
        let section = find_section(content, &syntax(), "A").unwrap();
        assert_eq!(&content[section.span.clone()], "; BEGIN A\nx\n; END A\n");
    }

    #[test]
    fn test_final_marker_without_newline() {
        let content = "; BEGIN A\nx\n; END A";
        let section = find_section(content, &syntax(), "A").unwrap();
        assert_eq!(section.span, 0..content.len());
        assert_eq!(section.body, "x");
    }

    #[test]
    fn test_empty_body() {
        let section = find_section("; BEGIN A\n; END A\n", &syntax(), "A").unwrap();
        assert_eq!(section.body, "");
        assert!(section.is_active());
    }

    #[test]
    fn test_commented_state() {
        let content = "; BEGIN A\n;[101]\n;\n;type=aor\n; END A\n";
        let section = find_section(content, &syntax(), "A").unwrap();
        assert_eq!(section.state, SectionState::Commented);
    }

    #[test]
    fn test_comment_lines_inside_active_body() {
        let content = "; BEGIN A\n; managed\n[101]\n; END A\n";
        assert!(find_section(content, &syntax(), "A").unwrap().is_active());
    }

    #[test]
    fn test_unterminated_section_ignored() {
        let content = "; BEGIN A\nx\n; BEGIN B\ny\n; END B\n";
        let sections = parse_sections(content, &syntax());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "B");
    }

    #[test]
    fn test_mismatched_end_is_skipped() {
        let content = "; BEGIN A\nx\n; END B\ny\n; END A\n";
        let section = find_section(content, &syntax(), "A").unwrap();
        assert_eq!(section.body, "x\n; END B\ny");
    }

    #[test]
    fn test_crlf_content() {
        let content = "; BEGIN A\r\nx\r\n; END A\r\n";
        let section = find_section(content, &syntax(), "A").unwrap();
        assert_eq!(section.body, "x");
        assert_eq!(section.span, 0..content.len());
    }

    #[test]
    fn test_has_section() {
        let content = "; BEGIN A\n; END A\n";
        assert!(has_section(content, &syntax(), "A"));
        assert!(!has_section(content, &syntax(), "B"));
    }
}
