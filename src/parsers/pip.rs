//! `requirements.txt` parser.
//!
//! Line oriented. Blank lines, comments, option lines such as `-r other.txt` and
//! interpreter paths are skipped. VCS requirements are named after the repository and
//! versioned by the ref after `@`; everything else goes through the generic
//! requirement grammar where only `==` counts as a pin.

use super::generic::{record_requirement, split_requirement};
use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::model::{Dependency, Ecosystem};
use regex::Regex;
use std::sync::LazyLock;

static VCS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^git(?:\+(?:https?|ssh|git|file))?://[^/]+/(?:[^@#]*/)?([^/@#]+?)(?:\.git)?(?:@([^#]+))?(?:#.*)?$",
    )
    .expect("static regex")
});

const EXACT_OPS: &[&str] = &["=="];

#[derive(Debug, Default, Clone, Copy)]
pub struct PipParser;

impl PipParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for PipParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::PipRequirements
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let mut out = ParseOutput::default();
        parse_requirements(input.file_name, input.content, &mut out)?;
        if include_test {
            if let Some(dev) = input.dev_content {
                let dev_name = dev_file_label(input.file_name);
                parse_requirements(&dev_name, dev, &mut out)?;
            }
        }
        Ok(out)
    }
}

/// Parse every line of a requirements document into `out`.
pub fn parse_requirements(
    file: &str,
    content: &str,
    out: &mut ParseOutput,
) -> Result<(), ParseError> {
    for (idx, raw) in content.lines().enumerate() {
        parse_requirement_line(raw, out).map_err(|()| ParseError::InvalidLine {
            file: file.to_string(),
            line: idx + 1,
            content: raw.trim().to_string(),
        })?;
    }
    Ok(())
}

/// Parse a single requirement line. `Err(())` means the line has no readable name.
pub(crate) fn parse_requirement_line(raw: &str, out: &mut ParseOutput) -> Result<(), ()> {
    let Some(line) = clean_line(raw) else {
        return Ok(());
    };

    if let Some(caps) = VCS_RE.captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let version = caps.get(2).map_or("", |m| m.as_str());
        out.push(Dependency::new(name, version, Ecosystem::Python));
        return Ok(());
    }

    let req = split_requirement(line).ok_or(())?;
    record_requirement(req, EXACT_OPS, Ecosystem::Python, out);
    Ok(())
}

/// Strip decorations from a line, returning `None` when nothing parseable remains.
fn clean_line(raw: &str) -> Option<&str> {
    let mut line = raw.trim();
    if line.is_empty() || line.starts_with('#') || line.contains("lib/python") {
        return None;
    }
    for prefix in ["-e ", "--editable "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest.trim_start();
        }
    }
    if line.starts_with('-') {
        return None;
    }
    if let Some(idx) = line.find(" #") {
        line = &line[..idx];
    }
    if let Some(idx) = line.find(';') {
        line = &line[..idx];
    }
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn dev_file_label(primary: &str) -> String {
    let dev = ManifestKind::PipRequirements
        .dev_file_name()
        .unwrap_or("requirements-dev.txt");
    match primary.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{dev}"),
        None => dev.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Issue;

    fn parse(content: &str) -> ParseOutput {
        PipParser::new()
            .parse(&ManifestInput::new("requirements.txt", content), false)
            .unwrap()
    }

    #[test]
    fn test_exact_pin_has_no_issue() {
        let out = parse("foo==1.2\n");
        assert_eq!(out.dependencies, vec![Dependency::new("foo", "1.2", Ecosystem::Python)]);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_range_is_weak() {
        let out = parse("foo>=1.2\n");
        assert_eq!(out.issues, vec![Issue::weak_version("foo", "1.2", ">=")]);
    }

    #[test]
    fn test_bare_name_is_weak_with_empty_operator() {
        let out = parse("requests\n");
        assert_eq!(out.dependencies[0].version, "");
        assert_eq!(out.issues, vec![Issue::weak_version("requests", "", "")]);
    }

    #[test]
    fn test_skipped_lines() {
        let out = parse(
            "# comment\n\n-r base.txt\n--index-url https://pypi.example\n/usr/lib/python3.6/site-packages\n",
        );
        assert!(out.dependencies.is_empty());
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_vcs_requirement() {
        let out = parse("git+https://github.com/acme/widgets.git@v2.1#egg=widgets\n");
        assert_eq!(
            out.dependencies,
            vec![Dependency::new("widgets", "v2.1", Ecosystem::Python)]
        );
        assert!(out.issues.is_empty());

        let out = parse("-e git+ssh://git.example.org/team/tools/parser\n");
        assert_eq!(out.dependencies[0].name, "parser");
        assert_eq!(out.dependencies[0].version, "");
    }

    #[test]
    fn test_inline_comment_and_marker_stripped() {
        let out = parse("six==1.16 # pinned\nenum34==1.1; python_version < '3.4'\n");
        assert_eq!(out.dependencies.len(), 2);
        assert_eq!(out.dependencies[0].version, "1.16");
        assert_eq!(out.dependencies[1].version, "1.1");
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_dev_file_only_with_include_test() {
        let input = ManifestInput::new("svc/requirements.txt", "a==1\n").with_dev_content("pytest>=7\n");
        let without = PipParser::new().parse(&input, false).unwrap();
        assert_eq!(without.dependencies.len(), 1);
        let with = PipParser::new().parse(&input, true).unwrap();
        assert_eq!(with.dependencies.len(), 2);
        assert_eq!(with.issues.len(), 1);
    }

    #[test]
    fn test_unreadable_line_reports_position() {
        let err = PipParser::new()
            .parse(&ManifestInput::new("requirements.txt", "ok==1\n>=2\n"), false)
            .unwrap_err();
        match err {
            ParseError::InvalidLine { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, ">=2");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_dev_label_keeps_directory() {
        assert_eq!(dev_file_label("svc/requirements.txt"), "svc/requirements-dev.txt");
        assert_eq!(dev_file_label("requirements.txt"), "requirements-dev.txt");
    }
}
