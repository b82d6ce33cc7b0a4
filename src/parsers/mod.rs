//! Manifest parsers.
//!
//! One [`ManifestParser`] per manifest kind, bound together in a [`ParserRegistry`]
//! that the caller constructs and owns. The registry also drives whole-directory scans:
//! discovery, parallel parsing, and merging into one canonical dependency list.
//!
//! ## Usage
//!
//! ```no_run
//! use dep_ledger::parsers::ParserRegistry;
//! use std::path::Path;
//!
//! let registry = ParserRegistry::declared_only();
//! let scan = registry.scan_directory(Path::new("checkout"), false).unwrap();
//! for dep in &scan.dependencies {
//!     println!("{dep}");
//! }
//! ```

mod conda;
mod detection;
mod generic;
mod glide;
mod maven;
mod meta_yaml;
mod npm;
mod pip;
mod traits;

pub use conda::{parse_environment, CondaParser};
pub use detection::{discover_manifests, DiscoveredManifest, SKIPPED_DIRS};
pub use generic::{split_requirement, Requirement};
pub use glide::GlideParser;
pub use maven::{parse_declared, parse_resolve_output, BuildTool, MavenCli, MavenMode, MavenParser};
pub use meta_yaml::MetaYamlParser;
pub use npm::NpmParser;
pub use pip::{parse_requirements, PipParser};
pub use traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};

use crate::error::{LedgerError, ParseErrorKind, Result};
use crate::model::{
    canonicalize, remove_exact_duplicates, sort_dependencies, Dependency, DependencyHash, Issue,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Binds manifest kinds to parser instances.
///
/// Built explicitly and passed to whoever needs it; there is no global registry.
pub struct ParserRegistry {
    parsers: IndexMap<ManifestKind, Box<dyn ManifestParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::declared_only()
    }
}

impl ParserRegistry {
    /// A registry with no parsers
    pub fn empty() -> Self {
        Self {
            parsers: IndexMap::new(),
        }
    }

    /// All built-in parsers, Maven handled by `maven`
    pub fn with_maven(maven: MavenParser) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(maven));
        registry.register(Box::new(NpmParser::new()));
        registry.register(Box::new(GlideParser::new()));
        registry.register(Box::new(PipParser::new()));
        registry.register(Box::new(CondaParser::new()));
        registry.register(Box::new(MetaYamlParser::new()));
        registry
    }

    /// All built-in parsers without any external tool
    pub fn declared_only() -> Self {
        Self::with_maven(MavenParser::declared())
    }

    /// Bind a parser to its kind, replacing any previous binding
    pub fn register(&mut self, parser: Box<dyn ManifestParser>) {
        self.parsers.insert(parser.kind(), parser);
    }

    #[must_use]
    pub fn get(&self, kind: ManifestKind) -> Option<&dyn ManifestParser> {
        self.parsers.get(&kind).map(|parser| parser.as_ref())
    }

    /// Kinds that currently have a parser
    pub fn kinds(&self) -> impl Iterator<Item = ManifestKind> + '_ {
        self.parsers.keys().copied()
    }

    /// Parse in-memory manifest content
    pub fn parse(
        &self,
        kind: ManifestKind,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput> {
        let parser = self.get(kind).ok_or_else(|| {
            LedgerError::parse(input.file_name, ParseErrorKind::UnsupportedManifest)
        })?;
        parser
            .parse(input, include_test)
            .map_err(|e| e.into_ledger_error(input.file_name))
    }

    /// Read and parse one discovered manifest under `root`
    pub fn parse_manifest(
        &self,
        root: &Path,
        manifest: &DiscoveredManifest,
        include_test: bool,
    ) -> Result<ParseOutput> {
        let full = root.join(&manifest.path);
        let content = fs::read_to_string(&full).map_err(|e| LedgerError::io(&full, e))?;
        let dev_content = match &manifest.dev_path {
            Some(dev) => {
                let full_dev = root.join(dev);
                Some(fs::read_to_string(&full_dev).map_err(|e| LedgerError::io(&full_dev, e))?)
            }
            None => None,
        };
        let file_name = manifest.display_path();
        let location = full.parent().unwrap_or(root);

        let mut input = ManifestInput::new(&file_name, &content).with_location(location);
        if let Some(dev) = dev_content.as_deref() {
            input = input.with_dev_content(dev);
        }
        self.parse(manifest.kind, &input, include_test)
    }

    /// Discover and parse every manifest under `root`.
    ///
    /// Manifests are parsed in parallel and merged in path order. The first failing
    /// manifest fails the whole scan.
    pub fn scan_directory(&self, root: &Path, include_test: bool) -> Result<ManifestScan> {
        let manifests = discover_manifests(root, include_test)?;
        let outputs: Vec<ParseOutput> = manifests
            .par_iter()
            .map(|manifest| self.parse_manifest(root, manifest, include_test))
            .collect::<Result<Vec<_>>>()?;

        let mut scan = ManifestScan {
            files: manifests.iter().map(DiscoveredManifest::display_path).collect(),
            ..ManifestScan::default()
        };
        for output in outputs {
            scan.dependencies.extend(output.dependencies);
            scan.issues.extend(output.issues);
        }
        remove_exact_duplicates(&mut scan.dependencies);
        sort_dependencies(&mut scan.dependencies);

        tracing::debug!(
            root = %root.display(),
            files = scan.files.len(),
            dependencies = scan.dependencies.len(),
            issues = scan.issues.len(),
            "scanned directory"
        );
        Ok(scan)
    }
}

/// Merged result of every manifest in a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestScan {
    /// Unique by identity, sorted by (name, version, ecosystem)
    pub dependencies: Vec<Dependency>,
    pub issues: Vec<Issue>,
    pub files: Vec<String>,
}

impl ManifestScan {
    /// Sorted hash list of the merged dependencies
    #[must_use]
    pub fn hashes(&self) -> Vec<DependencyHash> {
        let mut deps = self.dependencies.clone();
        canonicalize(&mut deps)
    }
}
