//! Pure text edits on marker-delimited sections.
//!
//! Every function takes the whole file content and returns the new content.
//! Bytes outside the affected sections are carried over unchanged.

use crate::error::{Error, Result};
use crate::parser::{Section, SectionState, parse_sections};
use crate::syntax::SectionSyntax;

/// Formats a complete section: markers, body, trailing line break.
pub fn format_section(syntax: &SectionSyntax, label: &str, body: &str) -> String {
    let body = body.trim_end_matches(['\n', '\r']);
    if body.is_empty() {
        format!("{}\n{}\n", syntax.begin_marker(label), syntax.end_marker(label))
    } else {
        format!(
            "{}\n{}\n{}\n",
            syntax.begin_marker(label),
            body,
            syntax.end_marker(label)
        )
    }
}

/// Appends a new section, separated from existing content by one blank line.
pub fn append_section(content: &str, syntax: &SectionSyntax, label: &str, body: &str) -> String {
    let mut out = String::with_capacity(content.len() + body.len() + 64);
    out.push_str(content);
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(&format_section(syntax, label, body));
    out
}

/// Replaces the section with `label`, or appends it if absent.
///
/// The first matching section (active or commented) is replaced in place;
/// any later duplicates are removed, leaving exactly one.
///
/// # Errors
/// Returns `Error::InvalidLabel` or `Error::InvalidBody` if the label or body
/// could not be parsed back unchanged.
pub fn upsert_section(
    content: &str,
    syntax: &SectionSyntax,
    label: &str,
    body: &str,
) -> Result<String> {
    syntax.validate_label(label)?;
    syntax.validate_body(label, body)?;

    let matching = matching_sections(content, syntax, label);
    let Some(first) = matching.first() else {
        return Ok(append_section(content, syntax, label, body));
    };

    if matching.len() > 1 {
        tracing::warn!(label, count = matching.len(), "Collapsing duplicate sections");
    }

    let replacement = format_section(syntax, label, body);
    let mut out = content.to_string();
    for duplicate in matching.iter().skip(1).rev() {
        remove_span(&mut out, duplicate);
    }
    out.replace_range(first.span.clone(), &replacement);
    Ok(out)
}

/// Comments out every body line of the sections with `label`.
///
/// Sections that are already commented are left untouched, so repeated calls
/// do not stack prefixes.
///
/// # Errors
/// Returns `Error::SectionNotFound` if no section carries the label.
pub fn comment_out_section(content: &str, syntax: &SectionSyntax, label: &str) -> Result<String> {
    rewrite_bodies(content, syntax, label, SectionState::Active, |line| {
        syntax.comment_line(line)
    })
}

/// Removes one comment prefix from every body line of commented sections
/// with `label`. The exact inverse of [`comment_out_section`].
///
/// # Errors
/// Returns `Error::SectionNotFound` if no section carries the label.
pub fn restore_section(content: &str, syntax: &SectionSyntax, label: &str) -> Result<String> {
    rewrite_bodies(content, syntax, label, SectionState::Commented, |line| {
        syntax.uncomment_line(line).to_string()
    })
}

/// Removes every section with `label`, together with the blank separator
/// line in front of it. Content without the label is returned unchanged.
pub fn remove_section(content: &str, syntax: &SectionSyntax, label: &str) -> String {
    let mut out = content.to_string();
    for section in matching_sections(content, syntax, label).iter().rev() {
        remove_span(&mut out, section);
    }
    out
}

/// Appends the section only if no section with `label` exists yet.
///
/// Returns `None` when the label is already present, active or commented.
pub fn ensure_section(
    content: &str,
    syntax: &SectionSyntax,
    label: &str,
    body: &str,
) -> Result<Option<String>> {
    syntax.validate_label(label)?;
    syntax.validate_body(label, body)?;

    if matching_sections(content, syntax, label).is_empty() {
        Ok(Some(append_section(content, syntax, label, body)))
    } else {
        Ok(None)
    }
}

fn matching_sections(content: &str, syntax: &SectionSyntax, label: &str) -> Vec<Section> {
    parse_sections(content, syntax)
        .into_iter()
        .filter(|section| section.label == label)
        .collect()
}

fn rewrite_bodies(
    content: &str,
    syntax: &SectionSyntax,
    label: &str,
    from: SectionState,
    rewrite: impl Fn(&str) -> String,
) -> Result<String> {
    let matching = matching_sections(content, syntax, label);
    if matching.is_empty() {
        return Err(Error::not_found_in_content(label));
    }

    let mut out = content.to_string();
    for section in matching.iter().rev().filter(|s| s.state == from) {
        let mut body = String::with_capacity(section.body_span.len() + 16);
        for line in content[section.body_span.clone()].split_inclusive('\n') {
            let (text, ending) = split_line_ending(line);
            let rewritten = rewrite(text);
            if let Some(marker) = syntax.parse_marker(&rewritten) {
                return Err(Error::InvalidBody {
                    label: label.to_string(),
                    reason: format!("line {text:?} would become a marker for {:?}", marker.label()),
                });
            }
            body.push_str(&rewritten);
            body.push_str(ending);
        }
        out.replace_range(section.body_span.clone(), &body);
    }
    Ok(out)
}

fn split_line_ending(line: &str) -> (&str, &str) {
    let text = line.strip_suffix('\n').unwrap_or(line);
    let text = text.strip_suffix('\r').unwrap_or(text);
    (text, &line[text.len()..])
}

fn remove_span(out: &mut String, section: &Section) {
    let mut start = section.span.start;
    if out[..start].ends_with("\n\n") {
        start -= 1;
    }
    out.replace_range(start..section.span.end, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn syntax() -> SectionSyntax {
        SectionSyntax::default()
    }

    #[test]
    fn test_format_section() {
        assert_eq!(
            format_section(&syntax(), "A", "x\ny\n"),
            "; BEGIN A\nx\ny\n; END A\n"
        );
    }

    #[test]
    fn test_append_to_empty() {
        assert_eq!(
            append_section("", &syntax(), "A", "x"),
            "; BEGIN A\nx\n; END A\n"
        );
    }

    #[test]
    fn test_append_separates_with_blank_line() {
        assert_eq!(
            append_section("[global]", &syntax(), "A", "x"),
            "[global]\n\n; BEGIN A\nx\n; END A\n"
        );
        assert_eq!(
            append_section("[global]\n\n", &syntax(), "A", "x"),
            "[global]\n\n; BEGIN A\nx\n; END A\n"
        );
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let content = "head\n; BEGIN A\nold\n; END A\ntail\n";
        let result = upsert_section(content, &syntax(), "A", "new").unwrap();
        assert_eq!(result, "head\n; BEGIN A\nnew\n; END A\ntail\n");
    }

    #[test]
    fn test_upsert_collapses_duplicates() {
        let content = "; BEGIN A\none\n; END A\n\n; BEGIN B\nb\n; END B\n\n; BEGIN A\ntwo\n; END A\n";
        let result = upsert_section(content, &syntax(), "A", "new").unwrap();
        assert_eq!(result, "; BEGIN A\nnew\n; END A\n\n; BEGIN B\nb\n; END B\n");
    }

    #[test]
    fn test_upsert_rejects_marker_in_body() {
        let err = upsert_section("", &syntax(), "A", "; END A").unwrap_err();
        assert!(matches!(err, Error::InvalidBody { .. }));
    }

    #[test]
    fn test_upsert_rejects_body_that_comments_into_marker() {
        for body in ["[x]\nEND A\nfoo=bar", "BEGIN X", "  END B"] {
            let err = upsert_section("", &syntax(), "A", body).unwrap_err();
            assert!(matches!(err, Error::InvalidBody { .. }), "accepted {body:?}");
        }
    }

    #[test]
    fn test_comment_out_then_restore() {
        let content = "; BEGIN A\n[101]\n\ntype=aor\n; END A\n";
        let commented = comment_out_section(content, &syntax(), "A").unwrap();
        assert_eq!(commented, "; BEGIN A\n;[101]\n;\n;type=aor\n; END A\n");
        assert_eq!(restore_section(&commented, &syntax(), "A").unwrap(), content);
    }

    #[test]
    fn test_comment_out_keeps_line_endings() {
        let content = "; BEGIN A\r\n[101]\r\ntype=aor\r\n\r\n; END A\r\n";
        let commented = comment_out_section(content, &syntax(), "A").unwrap();
        assert_eq!(
            commented,
            "; BEGIN A\r\n;[101]\r\n;type=aor\r\n;\r\n; END A\r\n"
        );
        assert_eq!(restore_section(&commented, &syntax(), "A").unwrap(), content);
    }

    #[test]
    fn test_comment_out_refuses_to_create_marker() {
        let content = "; BEGIN A\n[x]\n END A\n; END A\n";
        let err = comment_out_section(content, &syntax(), "A").unwrap_err();
        assert!(matches!(err, Error::InvalidBody { .. }));
    }

    #[test]
    fn test_comment_out_twice_is_stable() {
        let content = "; BEGIN A\nx\n; END A\n";
        let once = comment_out_section(content, &syntax(), "A").unwrap();
        let twice = comment_out_section(&once, &syntax(), "A").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_comment_out_missing_fails() {
        let err = comment_out_section("nothing", &syntax(), "A").unwrap_err();
        assert!(matches!(err, Error::SectionNotFound { .. }));
    }

    #[test]
    fn test_remove_section_drops_separator() {
        let base = "[global]\ntype=global\n";
        let with = append_section(base, &syntax(), "A", "x");
        assert_eq!(remove_section(&with, &syntax(), "A"), base);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let content = "[global]\n";
        assert_eq!(remove_section(content, &syntax(), "A"), content);
    }

    #[test]
    fn test_ensure_section() {
        let first = ensure_section("", &syntax(), "T", "[transport-udp]").unwrap();
        let first = first.expect("section should be appended");
        assert!(ensure_section(&first, &syntax(), "T", "[transport-udp]").unwrap().is_none());

        let commented = comment_out_section(&first, &syntax(), "T").unwrap();
        assert!(ensure_section(&commented, &syntax(), "T", "other").unwrap().is_none());
    }
}
