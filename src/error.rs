//! Unified error types for dep-ledger.
//!
//! Every failure the ingestion pipeline or the query layer can produce maps onto one
//! [`LedgerError`] variant. Stage workers log these with repository and sha context and
//! drop the task; nothing here is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dep-ledger operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LedgerError {
    /// A manifest could not be read as its declared format
    #[error("Failed to parse manifest {file}: {source}{}", context_suffix(.context))]
    Parse {
        file: String,
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// A manifest was well-formed but structurally unrecognized
    #[error("Unrecognized manifest structure in {file}: {message}")]
    Schema { file: String, message: String },

    /// A repository, ref, tag, sha or document does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: NotFoundKind, id: String },

    /// The document store failed or is unavailable
    #[error("Document store failure: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreErrorKind,
    },

    /// An external tool (git, mvn) failed or timed out
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Persisted state violates a ledger invariant
    #[error("Ledger integrity violation: {0}")]
    Integrity(String),

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    #[error("Unparseable line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    #[error("No parser registered for this manifest")]
    UnsupportedManifest,
}

/// What kind of entity a [`LedgerError::NotFound`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Repository,
    Ref,
    Tag,
    Sha,
    Document,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Repository => "Repository",
            Self::Ref => "Ref",
            Self::Tag => "Tag",
            Self::Sha => "Sha",
            Self::Document => "Document",
        };
        f.write_str(name)
    }
}

/// Specific store error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreErrorKind {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("document serialization failed: {0}")]
    Serialization(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for dep-ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl LedgerError {
    /// Create a parse error for a specific manifest file
    pub fn parse(file: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            file: file.into(),
            context: String::new(),
            source,
        }
    }

    /// Create a schema error for a specific manifest file
    pub fn schema(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: NotFoundKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a store error
    pub fn store(context: impl Into<String>, source: StoreErrorKind) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Create an external tool error
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for the typed "does not exist" outcome, as opposed to a backend failure
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::store(
            "document (de)serialization",
            StoreErrorKind::Serialization(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outermost-first, so a failure deep inside the commit stage
/// reads like `commit acme/api@1a2b: loading repository record: backend unavailable`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<LedgerError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: LedgerError, new_ctx: &str) -> LedgerError {
    match err {
        LedgerError::Parse {
            file,
            context,
            source,
        } => LedgerError::Parse {
            file,
            context: chain_context(new_ctx, &context),
            source,
        },
        LedgerError::Schema { file, message } => LedgerError::Schema {
            file,
            message: chain_context(new_ctx, &message),
        },
        LedgerError::Store { context, source } => LedgerError::Store {
            context: chain_context(new_ctx, &context),
            source,
        },
        LedgerError::ExternalTool { tool, message } => LedgerError::ExternalTool {
            tool,
            message: chain_context(new_ctx, &message),
        },
        LedgerError::Io {
            path,
            message,
            source,
        } => LedgerError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        LedgerError::Integrity(msg) => LedgerError::Integrity(chain_context(new_ctx, &msg)),
        LedgerError::Config(msg) => LedgerError::Config(chain_context(new_ctx, &msg)),
        LedgerError::Validation(msg) => LedgerError::Validation(chain_context(new_ctx, &msg)),
        // Not-found stays typed and unadorned so callers can match on it.
        not_found @ LedgerError::NotFound { .. } => not_found,
    }
}

fn context_suffix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" ({context})")
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a typed not-found error.
    fn or_not_found(self, kind: NotFoundKind, id: impl Into<String>) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    fn or_not_found(self, kind: NotFoundKind, id: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| LedgerError::not_found(kind, id))
    }
}
