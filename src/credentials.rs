//! Read-only access to the local key/value store that holds the bearer token

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Key the bearer token is stored under
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStorage {
    /// Open the store at `path`. A missing or unreadable file behaves like an empty store.
    /// Values of any JSON type are kept; only string values are visible through [`Self::get`].
    pub fn open(path: &Path) -> Self {
        let entries = match Self::read_entries(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "local storage unavailable");
                Map::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    fn read_entries(path: &Path) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(path)
            .context("Failed to read local storage")?;
        serde_json::from_str(&content)
            .context("Failed to parse local storage")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// The bearer credential, if one has been stored
    pub fn bearer_token(&self) -> Option<&str> {
        self.get(TOKEN_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_token_under_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, r#"{"token": "abc.def.ghi", "theme": "dark"}"#).unwrap();

        let storage = LocalStorage::open(&path);
        assert_eq!(storage.bearer_token(), Some("abc.def.ghi"));
        assert_eq!(storage.get("theme"), Some("dark"));
        assert_eq!(storage.get("missing"), None);
    }

    #[test]
    fn non_string_values_do_not_hide_the_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(
            &path,
            r#"{"token": "abc", "cartCount": 3, "darkMode": true, "recent": ["milk"], "profile": null}"#,
        )
        .unwrap();

        let storage = LocalStorage::open(&path);
        assert_eq!(storage.bearer_token(), Some("abc"));
        assert_eq!(storage.get("cartCount"), None);
        assert_eq!(storage.get("recent"), None);
        assert_eq!(storage.get("profile"), None);
    }

    #[test]
    fn non_string_token_is_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, r#"{"token": 42}"#).unwrap();

        assert_eq!(LocalStorage::open(&path).bearer_token(), None);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(&dir.path().join("nope.json"));
        assert_eq!(storage.bearer_token(), None);
    }

    #[test]
    fn malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(LocalStorage::open(&path).bearer_token(), None);
    }
}
