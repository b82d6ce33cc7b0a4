//! Conda `environment.yml` parser.

use super::generic::{record_requirement, split_requirement};
use super::pip::parse_requirement_line;
use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::model::Ecosystem;
use serde_yaml::Value;

const EXACT_OPS: &[&str] = &["=", "=="];

#[derive(Debug, Default, Clone, Copy)]
pub struct CondaParser;

impl CondaParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for CondaParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::CondaEnvironment
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let mut out = parse_environment(input.content)?;
        if include_test {
            if let Some(dev) = input.dev_content {
                out.extend(parse_environment(dev)?);
            }
        }
        Ok(out)
    }
}

/// Parse one environment document.
///
/// Each `dependencies` entry is either a conda spec string or a mapping whose `pip` key
/// holds a list of pip requirement strings. Any other shape is a schema error.
pub fn parse_environment(content: &str) -> Result<ParseOutput, ParseError> {
    let doc: Value = serde_yaml::from_str(content)?;
    let mut out = ParseOutput::default();

    let entries = match doc.get("dependencies") {
        None | Some(Value::Null) => return Ok(out),
        Some(Value::Sequence(entries)) => entries,
        Some(other) => {
            return Err(ParseError::SchemaError(format!(
                "dependencies must be a list, found {}",
                value_kind(other)
            )))
        }
    };

    for entry in entries {
        match entry {
            Value::String(spec) => parse_conda_spec(spec, &mut out)?,
            Value::Mapping(map) => {
                let pip = map.get("pip").ok_or_else(|| {
                    ParseError::SchemaError("mapping entry without a pip key".to_string())
                })?;
                let Value::Sequence(pip_entries) = pip else {
                    return Err(ParseError::SchemaError(format!(
                        "pip entry must be a list, found {}",
                        value_kind(pip)
                    )));
                };
                for pip_entry in pip_entries {
                    let Value::String(line) = pip_entry else {
                        return Err(ParseError::SchemaError(format!(
                            "pip dependency must be a string, found {}",
                            value_kind(pip_entry)
                        )));
                    };
                    parse_requirement_line(line, &mut out).map_err(|()| {
                        ParseError::SchemaError(format!("unreadable pip dependency '{line}'"))
                    })?;
                }
            }
            other => {
                return Err(ParseError::SchemaError(format!(
                    "unsupported dependency entry of type {}",
                    value_kind(other)
                )))
            }
        }
    }
    Ok(out)
}

fn parse_conda_spec(spec: &str, out: &mut ParseOutput) -> Result<(), ParseError> {
    // `conda-forge::numpy=1.2` pins a channel; the channel is not part of the identity
    let spec = spec.rsplit_once("::").map_or(spec, |(_, rest)| rest);
    let req = split_requirement(spec)
        .ok_or_else(|| ParseError::SchemaError(format!("unreadable conda spec '{spec}'")))?;
    record_requirement(req, EXACT_OPS, Ecosystem::Python, out);
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependency, Issue};

    #[test]
    fn test_mixed_list() {
        let out = parse_environment(
            "name: svc\nchannels: [defaults]\ndependencies:\n  - numpy=1.2\n  - scipy>=1.0\n  - pip:\n    - flask==1.0\n    - requests\n",
        )
        .unwrap();
        assert_eq!(out.dependencies.len(), 4);
        assert_eq!(out.dependencies[0], Dependency::new("numpy", "1.2", Ecosystem::Python));
        assert_eq!(
            out.issues,
            vec![
                Issue::weak_version("scipy", "1.0", ">="),
                Issue::weak_version("requests", "", ""),
            ]
        );
    }

    #[test]
    fn test_double_equals_is_exact() {
        let out = parse_environment("dependencies:\n  - python==3.6\n").unwrap();
        assert!(out.issues.is_empty());
    }

    #[test]
    fn test_channel_prefix_stripped() {
        let out = parse_environment("dependencies:\n  - conda-forge::gdal=2.2\n").unwrap();
        assert_eq!(out.dependencies[0].name, "gdal");
    }

    #[test]
    fn test_mapping_without_pip_is_schema_error() {
        let err = parse_environment("dependencies:\n  - foo: [bar]\n").unwrap_err();
        assert!(matches!(err, ParseError::SchemaError(_)));
    }

    #[test]
    fn test_other_shapes_are_schema_errors() {
        for doc in [
            "dependencies:\n  - 3\n",
            "dependencies:\n  - [a, b]\n",
            "dependencies:\n  - ~\n",
            "dependencies:\n  - pip: flask\n",
            "dependencies:\n  - pip:\n    - 12\n",
        ] {
            assert!(
                matches!(parse_environment(doc), Err(ParseError::SchemaError(_))),
                "{doc}"
            );
        }
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            parse_environment("dependencies: [unclosed"),
            Err(ParseError::YamlError(_))
        ));
    }

    #[test]
    fn test_missing_dependencies_is_empty() {
        assert_eq!(parse_environment("name: empty\n").unwrap(), ParseOutput::default());
    }
}
