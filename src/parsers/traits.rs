//! Parser trait definitions and error types.
//!
//! This module defines the `ManifestParser` trait implemented once per manifest kind,
//! the borrowed input every parser receives, and the parser-level error enum.

use crate::error::{LedgerError, ParseErrorKind};
use crate::model::{Dependency, Issue};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while parsing a single manifest
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("{file}:{line}: cannot parse '{content}'")]
    InvalidLine {
        file: String,
        line: usize,
        content: String,
    },

    /// Well-formed document with an entry shape the parser does not recognize
    #[error("Unrecognized structure: {0}")]
    SchemaError(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl ParseError {
    /// Attach the manifest path and lift into the crate-wide error type
    pub fn into_ledger_error(self, file: &str) -> LedgerError {
        match self {
            Self::JsonError(msg) => LedgerError::parse(file, ParseErrorKind::InvalidJson(msg)),
            Self::YamlError(msg) => LedgerError::parse(file, ParseErrorKind::InvalidYaml(msg)),
            Self::XmlError(msg) => LedgerError::parse(file, ParseErrorKind::InvalidXml(msg)),
            Self::InvalidLine {
                file: line_file,
                line,
                content,
            } => LedgerError::parse(
                if line_file.is_empty() { file.to_string() } else { line_file },
                ParseErrorKind::InvalidLine { line, content },
            ),
            Self::SchemaError(msg) => LedgerError::schema(file, msg),
            Self::ExternalTool { tool, message } => {
                LedgerError::external_tool(tool, format!("{file}: {message}"))
            }
        }
    }
}

/// The manifest formats the scanner understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestKind {
    MavenPom,
    NpmPackage,
    Glide,
    PipRequirements,
    CondaEnvironment,
    CondaRecipe,
}

impl ManifestKind {
    pub const ALL: [Self; 6] = [
        Self::MavenPom,
        Self::Glide,
        Self::NpmPackage,
        Self::CondaEnvironment,
        Self::PipRequirements,
        Self::CondaRecipe,
    ];

    /// File name of the primary manifest
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::MavenPom => "pom.xml",
            Self::NpmPackage => "package.json",
            Self::Glide => "glide.yaml",
            Self::PipRequirements => "requirements.txt",
            Self::CondaEnvironment => "environment.yml",
            Self::CondaRecipe => "meta.yaml",
        }
    }

    /// File name of the sibling test-only manifest, if this kind has one
    #[must_use]
    pub const fn dev_file_name(&self) -> Option<&'static str> {
        match self {
            Self::PipRequirements => Some("requirements-dev.txt"),
            Self::CondaEnvironment => Some("environment-dev.yml"),
            _ => None,
        }
    }

    /// Classify a bare file name; the flag is true for a dev manifest
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<(Self, bool)> {
        Self::ALL.iter().find_map(|kind| {
            if kind.file_name() == name {
                Some((*kind, false))
            } else if kind.dev_file_name() == Some(name) {
                Some((*kind, true))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Everything a parser may look at for one manifest
#[derive(Debug, Clone, Copy)]
pub struct ManifestInput<'a> {
    /// Path of the manifest relative to the checkout root, used in errors
    pub file_name: &'a str,
    /// Directory holding the manifest on disk; needed by tool-backed parsers
    pub location: Option<&'a Path>,
    pub content: &'a str,
    /// Contents of the sibling dev manifest, when one exists
    pub dev_content: Option<&'a str>,
}

impl<'a> ManifestInput<'a> {
    pub fn new(file_name: &'a str, content: &'a str) -> Self {
        Self {
            file_name,
            location: None,
            content,
            dev_content: None,
        }
    }

    #[must_use]
    pub fn with_dev_content(mut self, dev_content: &'a str) -> Self {
        self.dev_content = Some(dev_content);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: &'a Path) -> Self {
        self.location = Some(location);
        self
    }
}

/// Dependencies and findings produced by one manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub dependencies: Vec<Dependency>,
    pub issues: Vec<Issue>,
}

impl ParseOutput {
    pub fn push(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }

    pub fn issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Self) {
        self.dependencies.extend(other.dependencies);
        self.issues.extend(other.issues);
    }
}

/// Trait for manifest parsers.
///
/// Parsers are pure apart from tool-backed modes: the same input always yields the same
/// output, and a malformed document fails only that manifest.
pub trait ManifestParser: Send + Sync {
    /// Which manifest kind this parser handles
    fn kind(&self) -> ManifestKind;

    /// Parse one manifest. Test-scoped sections are read only when `include_test` is set.
    fn parse(&self, input: &ManifestInput<'_>, include_test: bool)
        -> Result<ParseOutput, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(
            ManifestKind::from_file_name("requirements-dev.txt"),
            Some((ManifestKind::PipRequirements, true))
        );
        assert_eq!(
            ManifestKind::from_file_name("pom.xml"),
            Some((ManifestKind::MavenPom, false))
        );
        assert_eq!(ManifestKind::from_file_name("Cargo.toml"), None);
    }

    #[test]
    fn test_schema_error_maps_to_schema() {
        let err = ParseError::SchemaError("bad entry".into()).into_ledger_error("environment.yml");
        assert!(matches!(err, LedgerError::Schema { .. }));
    }

    #[test]
    fn test_invalid_line_keeps_own_file() {
        let err = ParseError::InvalidLine {
            file: "requirements-dev.txt".into(),
            line: 2,
            content: "==".into(),
        }
        .into_ledger_error("requirements.txt");
        assert!(err.to_string().contains("requirements-dev.txt"));
    }
}
