//! conda-build recipe (`meta.yaml`) parser.
//!
//! Recipes are Jinja templates. Statement lines (`{% ... %}`) are dropped and expression
//! blocks (`{{ ... }}`) are replaced by a placeholder before the YAML is read, which is
//! enough to reach the requirement lists without rendering the template.

use super::generic::{record_requirement, split_requirement};
use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::model::Ecosystem;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

static JINJA_EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^}]*\}\}").expect("static regex"));

const EXPR_PLACEHOLDER: &str = "JINJA";
const EXACT_OPS: &[&str] = &["=", "=="];
const REQUIREMENT_SECTIONS: &[&str] = &["build", "host", "run"];

#[derive(Debug, Default, Clone, Copy)]
pub struct MetaYamlParser;

impl MetaYamlParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for MetaYamlParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::CondaRecipe
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let doc: Value = serde_yaml::from_str(&strip_jinja(input.content))?;
        let mut out = ParseOutput::default();

        if let Some(requirements) = doc.get("requirements") {
            for section in REQUIREMENT_SECTIONS {
                collect_specs(requirements.get(*section), section, &mut out)?;
            }
        }
        if include_test {
            let test_requires = doc.get("test").and_then(|t| t.get("requires"));
            collect_specs(test_requires, "test.requires", &mut out)?;
        }
        Ok(out)
    }
}

/// Drop Jinja statements and neutralize expressions so the recipe parses as YAML
pub(crate) fn strip_jinja(content: &str) -> String {
    let mut cleaned = String::with_capacity(content.len());
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("{%") || trimmed.starts_with("{#") {
            continue;
        }
        cleaned.push_str(&JINJA_EXPR_RE.replace_all(line, EXPR_PLACEHOLDER));
        cleaned.push('\n');
    }
    cleaned
}

fn collect_specs(
    section: Option<&Value>,
    label: &str,
    out: &mut ParseOutput,
) -> Result<(), ParseError> {
    let entries = match section {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => {
            return Err(ParseError::SchemaError(format!("{label} must be a list")));
        }
    };
    for entry in entries {
        let Value::String(spec) = entry else {
            return Err(ParseError::SchemaError(format!(
                "{label} entries must be strings"
            )));
        };
        // Selector comments like `# [win]` survive YAML only when quoted
        let spec = spec.split(" #").next().unwrap_or(spec);
        let req = split_requirement(spec).ok_or_else(|| {
            ParseError::SchemaError(format!("unreadable requirement '{spec}' in {label}"))
        })?;
        record_requirement(req, EXACT_OPS, Ecosystem::Python, out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependency, Issue};

    const RECIPE: &str = r#"{% set version = "1.0.2" %}
package:
  name: shapes
  version: {{ version }}
requirements:
  build:
    - python
  run:
    - python >=3.6
    - numpy 1.11
    - gdal =2.2
test:
  requires:
    - pytest
"#;

    fn parse(include_test: bool) -> ParseOutput {
        MetaYamlParser::new()
            .parse(&ManifestInput::new("meta.yaml", RECIPE), include_test)
            .unwrap()
    }

    #[test]
    fn test_requirement_sections() {
        let out = parse(false);
        let names: Vec<_> = out.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["python", "python", "numpy", "gdal"]);
        assert_eq!(out.dependencies[3], Dependency::new("gdal", "2.2", Ecosystem::Python));
        assert!(out.issues.contains(&Issue::weak_version("python", "3.6", ">=")));
        assert!(out.issues.contains(&Issue::weak_version("numpy", "1.11", "")));
    }

    #[test]
    fn test_test_requires_only_with_flag() {
        assert!(!parse(false).dependencies.iter().any(|d| d.name == "pytest"));
        assert!(parse(true).dependencies.iter().any(|d| d.name == "pytest"));
    }

    #[test]
    fn test_strip_jinja() {
        let cleaned = strip_jinja("{% set x = 1 %}\nversion: {{ x }}\n");
        assert_eq!(cleaned, "version: JINJA\n");
    }
}
