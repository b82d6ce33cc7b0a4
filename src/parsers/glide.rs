//! Go `glide.yaml` parser.

use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::model::{Dependency, Ecosystem};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlideFile {
    #[serde(default)]
    import: Vec<GlideImport>,
    #[serde(default)]
    test_import: Vec<GlideImport>,
}

#[derive(Debug, Deserialize)]
struct GlideImport {
    package: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GlideParser;

impl GlideParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for GlideParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::Glide
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let glide: GlideFile = serde_yaml::from_str(input.content)?;
        let mut out = ParseOutput::default();

        let tests = include_test.then_some(&glide.test_import);
        for import in glide.import.iter().chain(tests.into_iter().flatten()) {
            out.push(Dependency::new(
                &import.package,
                import.version.as_deref().unwrap_or_default(),
                Ecosystem::Go,
            ));
        }
        Ok(out)
    }
}
