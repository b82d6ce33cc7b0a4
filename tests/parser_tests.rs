//! Manifest parser integration tests.
//!
//! Scans the fixture repository under `tests/fixtures/repo`, which holds one manifest of
//! every supported kind plus vendored copies that discovery must skip.

use dep_ledger::error::{LedgerError, ParseErrorKind};
use dep_ledger::model::{Dependency, Ecosystem, Issue};
use dep_ledger::parsers::{
    discover_manifests, parse_resolve_output, BuildTool, ManifestInput, ManifestKind, MavenParser,
    ParseError, ParserRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn repo_root() -> PathBuf {
    fixture_path("repo")
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture should be readable")
}

fn names(deps: &[Dependency]) -> Vec<&str> {
    deps.iter().map(|d| d.name.as_str()).collect()
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[test]
    fn finds_one_manifest_per_kind_and_skips_vendored() {
        let found = discover_manifests(&repo_root(), false).expect("discovery should succeed");
        let paths: Vec<_> = found.iter().map(|m| m.display_path()).collect();
        assert_eq!(
            paths,
            vec![
                "env/environment.yml",
                "java/pom.xml",
                "recipe/meta.yaml",
                "requirements.txt",
                "services/go/glide.yaml",
                "web/package.json",
            ]
        );
        assert!(found.iter().all(|m| m.dev_path.is_none()));
    }

    #[test]
    fn dev_manifest_attached_with_include_test() {
        let found = discover_manifests(&repo_root(), true).unwrap();
        let pip = found
            .iter()
            .find(|m| m.kind == ManifestKind::PipRequirements)
            .expect("requirements.txt should be discovered");
        assert_eq!(pip.dev_path.as_deref(), Some(Path::new("requirements-dev.txt")));
        assert_eq!(found.len(), 6);
    }
}

// ============================================================================
// Directory Scans
// ============================================================================

mod directory_scan {
    use super::*;

    #[test]
    fn runtime_scan_merges_and_deduplicates() {
        let scan = ParserRegistry::declared_only()
            .scan_directory(&repo_root(), false)
            .expect("scan should succeed");

        assert_eq!(scan.files.len(), 6);
        // flask is declared by both requirements.txt and environment.yml
        assert_eq!(scan.dependencies.len(), 12);
        assert_eq!(
            scan.dependencies.iter().filter(|d| d.name == "flask").count(),
            1
        );
        assert!(scan
            .dependencies
            .contains(&Dependency::new("gdal", "2.2.4", Ecosystem::Python)));
        assert!(scan
            .dependencies
            .contains(&Dependency::new("com.google.guava:guava", "23.0", Ecosystem::Maven)));
        assert!(scan
            .dependencies
            .contains(&Dependency::new("github.com/gorilla/mux", "v1.6.0", Ecosystem::Go)));
        assert!(scan
            .dependencies
            .contains(&Dependency::new("lodash", "^4.17.4", Ecosystem::Npm)));
        assert!(!names(&scan.dependencies).contains(&"github.com/should/not-appear"));
        assert!(!names(&scan.dependencies).contains(&"nothing"));

        assert_eq!(scan.issues.len(), 2);
        assert!(scan.issues.contains(&Issue::weak_version("requests", "2.18", ">=")));
        assert!(scan.issues.contains(&Issue::weak_version("python", "3.6", ">=")));
    }

    #[test]
    fn dependencies_sorted_by_name_version_ecosystem() {
        let scan = ParserRegistry::declared_only()
            .scan_directory(&repo_root(), true)
            .unwrap();
        let mut sorted = scan.dependencies.clone();
        sorted.sort();
        assert_eq!(scan.dependencies, sorted);
    }

    #[test]
    fn include_test_adds_test_scoped_dependencies() {
        let scan = ParserRegistry::declared_only()
            .scan_directory(&repo_root(), true)
            .unwrap();
        let found = names(&scan.dependencies);
        for name in ["jest", "junit:junit", "github.com/stretchr/testify"] {
            assert!(found.contains(&name), "missing {name}");
        }
        // pytest==3.5.0 from requirements-dev.txt, bare pytest from the recipe
        assert_eq!(found.iter().filter(|n| **n == "pytest").count(), 2);
        assert_eq!(scan.dependencies.len(), 17);
        assert!(scan.issues.contains(&Issue::weak_version("pytest", "", "")));
    }

    #[test]
    fn hashes_are_sorted_and_unique() {
        let scan = ParserRegistry::declared_only()
            .scan_directory(&repo_root(), false)
            .unwrap();
        let hashes = scan.hashes();
        assert_eq!(hashes.len(), scan.dependencies.len());
        assert!(hashes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn failing_manifest_fails_the_scan() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("requirements.txt"), read_fixture("manifests/broken-requirements.txt"))
            .unwrap();
        std::fs::create_dir(tmp.path().join("web")).unwrap();
        std::fs::write(tmp.path().join("web/package.json"), r#"{"dependencies": {"a": "1.0.0"}}"#)
            .unwrap();

        let err = ParserRegistry::declared_only()
            .scan_directory(tmp.path(), false)
            .unwrap_err();
        match err {
            LedgerError::Parse { file, source, .. } => {
                assert_eq!(file, "requirements.txt");
                assert!(matches!(source, ParseErrorKind::InvalidLine { line: 2, .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

// ============================================================================
// Single Manifests
// ============================================================================

mod single_manifest {
    use super::*;

    #[test]
    fn conda_schema_error_names_file() {
        let content = read_fixture("manifests/bad-environment.yml");
        let err = ParserRegistry::declared_only()
            .parse(
                ManifestKind::CondaEnvironment,
                &ManifestInput::new("env/environment.yml", &content),
                false,
            )
            .unwrap_err();
        match err {
            LedgerError::Schema { file, .. } => assert_eq!(file, "env/environment.yml"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn wildcard_pins_are_weak() {
        let registry = ParserRegistry::declared_only();
        let pip = registry
            .parse(
                ManifestKind::PipRequirements,
                &ManifestInput::new("requirements.txt", "flask==1.*\nsix==1.11.0\n"),
                false,
            )
            .unwrap();
        assert_eq!(pip.issues, vec![Issue::weak_version("flask", "1.*", "==")]);

        let conda = registry
            .parse(
                ManifestKind::CondaEnvironment,
                &ManifestInput::new(
                    "environment.yml",
                    "dependencies:\n  - numpy=1.14.*\n  - scipy=1.0.0\n  - pip:\n    - attrs==17.*\n",
                ),
                false,
            )
            .unwrap();
        assert_eq!(
            conda.issues,
            vec![
                Issue::weak_version("numpy", "1.14.*", "="),
                Issue::weak_version("attrs", "17.*", "=="),
            ]
        );
        assert_eq!(conda.dependencies.len(), 3);
    }

    #[test]
    fn unregistered_kind_is_unsupported() {
        let registry = ParserRegistry::empty();
        let err = registry
            .parse(ManifestKind::Glide, &ManifestInput::new("glide.yaml", "import: []"), false)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Parse {
                source: ParseErrorKind::UnsupportedManifest,
                ..
            }
        ));
    }

    #[test]
    fn recipe_template_is_readable() {
        let content = read_fixture("repo/recipe/meta.yaml");
        let out = ParserRegistry::declared_only()
            .parse(
                ManifestKind::CondaRecipe,
                &ManifestInput::new("recipe/meta.yaml", &content),
                false,
            )
            .unwrap();
        assert_eq!(
            out.dependencies,
            vec![
                Dependency::new("python", "3.6", Ecosystem::Python),
                Dependency::new("pyyaml", "3.12", Ecosystem::Python),
            ]
        );
    }
}

// ============================================================================
// Maven Resolution
// ============================================================================

mod maven_resolution {
    use super::*;

    /// Replays recorded `mvn dependency:resolve` output and remembers where it ran
    struct RecordedResolve {
        stdout: String,
        dirs: Mutex<Vec<PathBuf>>,
    }

    impl BuildTool for RecordedResolve {
        fn resolve(&self, project_dir: &Path) -> Result<String, ParseError> {
            self.dirs.lock().unwrap().push(project_dir.to_path_buf());
            Ok(self.stdout.clone())
        }
    }

    #[test]
    fn resolve_output_fixture() {
        let out = parse_resolve_output(&read_fixture("manifests/mvn-resolve.txt"), false);
        assert_eq!(names(&out.dependencies), vec!["com.google.guava:guava", "org.slf4j:slf4j-api"]);
        assert!(out.issues.is_empty());

        let with_tests = parse_resolve_output(&read_fixture("manifests/mvn-resolve.txt"), true);
        assert_eq!(with_tests.dependencies.len(), 4);
    }

    #[test]
    fn resolving_registry_runs_tool_in_pom_directory() {
        let tool = Arc::new(RecordedResolve {
            stdout: read_fixture("manifests/mvn-resolve.txt"),
            dirs: Mutex::new(Vec::new()),
        });
        let registry = ParserRegistry::with_maven(MavenParser::resolving(tool.clone()));
        let scan = registry.scan_directory(&repo_root(), false).unwrap();

        assert!(scan
            .dependencies
            .contains(&Dependency::new("org.slf4j:slf4j-api", "1.7.25", Ecosystem::Maven)));
        let dirs = tool.dirs.lock().unwrap();
        assert_eq!(dirs.len(), 1);
        assert!(dirs[0].ends_with("java"));
    }
}
