//! Structured queries evaluated against JSON documents.
//!
//! Field paths are dotted (`refs.name`). Walking a path through an array fans out over
//! its elements, so a `Term` on `refs.name` matches when any ref has that name.
//! [`Query::Nested`] instead evaluates its inner query against each array element on its
//! own, which keeps conditions on sibling fields of one element together.

use crate::error::{LedgerError, Result, StoreErrorKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll,
    /// Exact equality on the value(s) at `field`
    Term { field: String, value: Value },
    /// Glob match (`*`, `?`) on string value(s) at `field`
    Wildcard { field: String, pattern: String },
    Bool {
        #[serde(default)]
        must: Vec<Query>,
        #[serde(default)]
        should: Vec<Query>,
        #[serde(default)]
        must_not: Vec<Query>,
    },
    /// Evaluate `query` against each element of the array at `path`
    Nested { path: String, query: Box<Query> },
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn must(queries: Vec<Query>) -> Self {
        Self::Bool {
            must: queries,
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    /// Matches when any of `queries` does; an empty list matches everything
    pub fn should(queries: Vec<Query>) -> Self {
        Self::Bool {
            must: Vec::new(),
            should: queries,
            must_not: Vec::new(),
        }
    }

    pub fn nested(path: impl Into<String>, query: Query) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    /// Compile once so wildcard patterns are not rebuilt per document
    pub fn compile(&self) -> Result<CompiledQuery> {
        Ok(match self {
            Self::MatchAll => CompiledQuery::MatchAll,
            Self::Term { field, value } => CompiledQuery::Term {
                field: split_path(field)?,
                value: value.clone(),
            },
            Self::Wildcard { field, pattern } => CompiledQuery::Wildcard {
                field: split_path(field)?,
                regex: glob_to_regex(pattern)?,
            },
            Self::Bool {
                must,
                should,
                must_not,
            } => CompiledQuery::Bool {
                must: compile_all(must)?,
                should: compile_all(should)?,
                must_not: compile_all(must_not)?,
            },
            Self::Nested { path, query } => CompiledQuery::Nested {
                path: split_path(path)?,
                query: Box::new(query.compile()?),
            },
        })
    }
}

/// A [`Query`] ready for evaluation
#[derive(Debug, Clone)]
pub enum CompiledQuery {
    MatchAll,
    Term { field: Vec<String>, value: Value },
    Wildcard { field: Vec<String>, regex: Regex },
    Bool {
        must: Vec<CompiledQuery>,
        should: Vec<CompiledQuery>,
        must_not: Vec<CompiledQuery>,
    },
    Nested {
        path: Vec<String>,
        query: Box<CompiledQuery>,
    },
}

impl CompiledQuery {
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => values_at(doc, field).into_iter().any(|v| v == value),
            Self::Wildcard { field, regex } => values_at(doc, field)
                .into_iter()
                .any(|v| v.as_str().is_some_and(|s| regex.is_match(s))),
            Self::Bool {
                must,
                should,
                must_not,
            } => {
                must.iter().all(|q| q.matches(doc))
                    && (should.is_empty() || should.iter().any(|q| q.matches(doc)))
                    && !must_not.iter().any(|q| q.matches(doc))
            }
            Self::Nested { path, query } => values_at(doc, path)
                .into_iter()
                .any(|element| query.matches(element)),
        }
    }
}

fn compile_all(queries: &[Query]) -> Result<Vec<CompiledQuery>> {
    queries.iter().map(Query::compile).collect()
}

fn split_path(path: &str) -> Result<Vec<String>> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(LedgerError::store(
            "compiling query",
            StoreErrorKind::InvalidQuery(format!("bad field path '{path}'")),
        ));
    }
    Ok(path.split('.').map(str::to_string).collect())
}

/// Every leaf value reachable along `path`, with arrays fanned out at each step
fn values_at<'a>(doc: &'a Value, path: &[String]) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path {
        let mut next = Vec::new();
        for value in current {
            collect_field(value, segment, &mut next);
        }
        current = next;
    }
    // A trailing array is compared element-wise
    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn collect_field<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(segment) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_field(item, segment, out);
            }
        }
        _ => {}
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| {
        LedgerError::store(
            "compiling query",
            StoreErrorKind::InvalidQuery(format!("wildcard '{pattern}': {e}")),
        )
    })
}
