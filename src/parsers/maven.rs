//! Maven `pom.xml` parser.
//!
//! Two modes. `Resolve` asks Maven itself for the resolved dependency list through a
//! [`BuildTool`] and reads its `group:artifact:packaging:version[:scope]` output lines.
//! `Declared` reads `<dependencies>` straight from the POM without running anything,
//! reporting ranges and property placeholders as weak versions.

use super::traits::{ManifestInput, ManifestKind, ManifestParser, ParseError, ParseOutput};
use crate::error::LedgerError;
use crate::model::{Dependency, Ecosystem, Issue};
use crate::utils::run_with_timeout;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static RESOLVED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\[INFO\]\s+)?([\w.\-]+):([\w.\-]+):([\w.\-]+):([\w.\-]+)(?::(\w+))?(?:\s.*)?$",
    )
    .expect("static regex")
});

/// How Maven dependencies are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MavenMode {
    /// Run the build tool and read its resolved list
    #[default]
    Resolve,
    /// Read `<dependency>` elements from the POM
    Declared,
}

/// An external build tool that can list a project's resolved dependencies.
pub trait BuildTool: Send + Sync {
    /// Raw resolver output for the project rooted at `project_dir`
    fn resolve(&self, project_dir: &Path) -> Result<String, ParseError>;
}

/// Runs `mvn -f <dir> dependency:resolve` with a deadline
#[derive(Debug, Clone)]
pub struct MavenCli {
    executable: String,
    timeout: Duration,
}

impl MavenCli {
    pub fn new(executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }
}

impl BuildTool for MavenCli {
    fn resolve(&self, project_dir: &Path) -> Result<String, ParseError> {
        let dir = project_dir.to_string_lossy();
        let output = run_with_timeout(
            &self.executable,
            &["-B", "-f", dir.as_ref(), "dependency:resolve"],
            Some(project_dir),
            self.timeout,
        )
        .map_err(|err| match err {
            LedgerError::ExternalTool { tool, message } => {
                ParseError::ExternalTool { tool, message }
            }
            other => ParseError::ExternalTool {
                tool: self.executable.clone(),
                message: other.to_string(),
            },
        })?;
        Ok(output.stdout)
    }
}

pub struct MavenParser {
    mode: MavenMode,
    tool: Option<Arc<dyn BuildTool>>,
}

impl MavenParser {
    /// Parser that reads declared dependencies only
    pub fn declared() -> Self {
        Self {
            mode: MavenMode::Declared,
            tool: None,
        }
    }

    /// Parser that delegates to `tool`
    pub fn resolving(tool: Arc<dyn BuildTool>) -> Self {
        Self {
            mode: MavenMode::Resolve,
            tool: Some(tool),
        }
    }

    #[must_use]
    pub fn mode(&self) -> MavenMode {
        self.mode
    }

    fn parse_resolved(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        let tool = self.tool.as_ref().ok_or_else(|| ParseError::ExternalTool {
            tool: "mvn".to_string(),
            message: "no build tool configured".to_string(),
        })?;
        let location = input.location.ok_or_else(|| ParseError::ExternalTool {
            tool: "mvn".to_string(),
            message: "manifest has no directory on disk".to_string(),
        })?;
        let stdout = tool.resolve(location)?;
        Ok(parse_resolve_output(&stdout, include_test))
    }
}

impl ManifestParser for MavenParser {
    fn kind(&self) -> ManifestKind {
        ManifestKind::MavenPom
    }

    fn parse(
        &self,
        input: &ManifestInput<'_>,
        include_test: bool,
    ) -> Result<ParseOutput, ParseError> {
        match self.mode {
            MavenMode::Resolve => self.parse_resolved(input, include_test),
            MavenMode::Declared => parse_declared(input.content, include_test),
        }
    }
}

/// Read resolved dependency lines out of `dependency:resolve` output. Other lines are ignored.
pub fn parse_resolve_output(stdout: &str, include_test: bool) -> ParseOutput {
    let mut out = ParseOutput::default();
    for line in stdout.lines() {
        let Some(caps) = RESOLVED_LINE_RE.captures(line.trim()) else {
            continue;
        };
        let scope = caps.get(5).map_or("", |m| m.as_str());
        if scope == "test" && !include_test {
            continue;
        }
        let name = format!("{}:{}", &caps[1], &caps[2]);
        out.push(Dependency::new(name, &caps[4], Ecosystem::Maven));
    }
    out
}

#[derive(Debug, Deserialize)]
struct Pom {
    #[serde(default)]
    dependencies: Option<PomDependencies>,
}

#[derive(Debug, Deserialize)]
struct PomDependencies {
    #[serde(default)]
    dependency: Vec<PomDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PomDependency {
    group_id: String,
    artifact_id: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Read `<project><dependencies>` from POM text
pub fn parse_declared(content: &str, include_test: bool) -> Result<ParseOutput, ParseError> {
    let pom: Pom =
        quick_xml::de::from_str(content).map_err(|e| ParseError::XmlError(e.to_string()))?;
    let mut out = ParseOutput::default();

    let declared = pom.dependencies.map(|d| d.dependency).unwrap_or_default();
    for dep in declared {
        if dep.scope.as_deref() == Some("test") && !include_test {
            continue;
        }
        let name = format!("{}:{}", dep.group_id.trim(), dep.artifact_id.trim());
        let version = dep.version.as_deref().map(str::trim).unwrap_or_default();
        if is_weak_maven_version(version) {
            out.issue(Issue::weak_version(&name, version, ""));
        }
        out.push(Dependency::new(name, version, Ecosystem::Maven));
    }
    Ok(out)
}

fn is_weak_maven_version(version: &str) -> bool {
    version.is_empty()
        || version.starts_with('[')
        || version.starts_with('(')
        || version.contains("${")
}
