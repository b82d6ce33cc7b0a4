//! `package.json` parser.

use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::model::{Dependency, Ecosystem};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: IndexMap<String, String>,
    #[serde(default)]
    dev_dependencies: IndexMap<String, String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NpmParser;

impl NpmParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for NpmParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::NpmPackage
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let package: PackageJson = serde_json::from_str(input.content)?;
        let mut out = ParseOutput::default();

        let dev = include_test.then_some(&package.dev_dependencies);
        for (name, version) in package.dependencies.iter().chain(dev.into_iter().flatten()) {
            out.push(Dependency::new(name, version, Ecosystem::Npm));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE: &str = r#"{
        "name": "web",
        "dependencies": {"react": "^16.2.0", "lodash": "4.17.4"},
        "devDependencies": {"jest": "22.0.0"}
    }"#;

    #[test]
    fn test_runtime_dependencies_in_declared_order() {
        let out = NpmParser::new()
            .parse(&ManifestInput::new("package.json", PACKAGE), false)
            .unwrap();
        assert_eq!(
            out.dependencies,
            vec![
                Dependency::new("react", "^16.2.0", Ecosystem::Npm),
                Dependency::new("lodash", "4.17.4", Ecosystem::Npm),
            ]
        );
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_dev_dependencies_with_flag() {
        let out = NpmParser::new()
            .parse(&ManifestInput::new("package.json", PACKAGE), true)
            .unwrap();
        assert_eq!(out.dependencies.len(), 3);
    }

    #[test]
    fn test_missing_sections() {
        let out = NpmParser::new()
            .parse(&ManifestInput::new("package.json", "{}"), true)
            .unwrap();
        assert!(out.dependencies.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let err = NpmParser::new()
            .parse(&ManifestInput::new("package.json", "{\"dependencies\":"), false)
            .unwrap_err();
        assert!(matches!(err, ParseError::JsonError(_)));
    }
}
