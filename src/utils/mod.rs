//! Shared utilities.

mod hash;
mod process;

pub use hash::content_hash_hex;
pub use process::{run_with_timeout, ToolOutput};

/// Document id for a repository: `owner/name` with `/` replaced by `_`.
#[must_use]
pub fn repository_doc_id(full_name: &str) -> String {
    full_name.replace('/', "_")
}

/// Last path segment of `owner/name`, or the whole string when there is no slash.
#[must_use]
pub fn repository_short_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

/// First seven characters of a sha, used for labels and log lines.
#[must_use]
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(7) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_ids() {
        assert_eq!(repository_doc_id("acme/api"), "acme_api");
        assert_eq!(repository_short_name("acme/api"), "api");
        assert_eq!(repository_short_name("solo"), "solo");
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("0123456789abcdef"), "0123456");
        assert_eq!(short_sha("abc"), "abc");
    }
}
