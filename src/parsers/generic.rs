//! The `name[op]version` requirement grammar shared by the Python-family parsers.

use super::traits::ParseOutput;
use crate::model::{Dependency, Ecosystem, Issue};
use regex::Regex;
use std::sync::LazyLock;

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s<>=!~]+)\s*(==|>=|<=|~=|!=|<|>|=)?\s*(.*)$").expect("static regex")
});

/// A requirement split into its three parts. `operator` and `version` may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement<'a> {
    pub name: &'a str,
    pub operator: &'a str,
    pub version: &'a str,
}

/// Split `numpy>=1.2`, `numpy 1.2`, `numpy=1.2` or bare `numpy`.
///
/// Returns `None` when no name can be read (e.g. a line starting with an operator).
#[must_use]
pub fn split_requirement(spec: &str) -> Option<Requirement<'_>> {
    let caps = REQUIREMENT_RE.captures(spec.trim())?;
    let name = caps.get(1)?.as_str();
    Some(Requirement {
        name,
        operator: caps.get(2).map_or("", |m| m.as_str()),
        version: caps.get(3).map_or("", |m| m.as_str().trim()),
    })
}

/// Record `req` in `out`, emitting a weak-version issue unless its operator is in
/// `exact_ops` and its version has no wildcard (`foo==1.*` is not a pin).
pub fn record_requirement(
    req: Requirement<'_>,
    exact_ops: &[&str],
    ecosystem: Ecosystem,
    out: &mut ParseOutput,
) {
    if !exact_ops.contains(&req.operator) || req.version.contains('*') {
        out.issue(Issue::weak_version(req.name, req.version, req.operator));
    }
    out.push(Dependency::new(req.name, req.version, ecosystem));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_operator() {
        let req = split_requirement("flask>=1.0").unwrap();
        assert_eq!(req.name, "flask");
        assert_eq!(req.operator, ">=");
        assert_eq!(req.version, "1.0");
    }

    #[test]
    fn test_split_space_separated() {
        let req = split_requirement("python >=3.6").unwrap();
        assert_eq!((req.name, req.operator, req.version), ("python", ">=", "3.6"));

        let req = split_requirement("numpy 1.11").unwrap();
        assert_eq!((req.name, req.operator, req.version), ("numpy", "", "1.11"));
    }

    #[test]
    fn test_split_bare_name() {
        let req = split_requirement("requests").unwrap();
        assert_eq!((req.operator, req.version), ("", ""));
    }

    #[test]
    fn test_split_rejects_missing_name() {
        assert!(split_requirement("==1.0").is_none());
        assert!(split_requirement("").is_none());
    }

    #[test]
    fn test_record_exact_has_no_issue() {
        let mut out = ParseOutput::default();
        record_requirement(
            split_requirement("foo==1.2").unwrap(),
            &["=="],
            Ecosystem::Python,
            &mut out,
        );
        assert!(out.issues.is_empty());
        assert_eq!(out.dependencies[0].version, "1.2");
    }

    #[test]
    fn test_record_range_is_weak() {
        let mut out = ParseOutput::default();
        record_requirement(
            split_requirement("foo~=1.2").unwrap(),
            &["=="],
            Ecosystem::Python,
            &mut out,
        );
        assert_eq!(out.issues, vec![Issue::weak_version("foo", "1.2", "~=")]);
    }

    #[test]
    fn test_record_wildcard_pin_is_weak() {
        let mut out = ParseOutput::default();
        record_requirement(
            split_requirement("foo==1.*").unwrap(),
            &["=="],
            Ecosystem::Python,
            &mut out,
        );
        assert_eq!(out.issues, vec![Issue::weak_version("foo", "1.*", "==")]);
        assert_eq!(out.dependencies[0].version, "1.*");
    }
}
