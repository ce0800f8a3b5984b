//! Credential store adapters

use crate::domain::ports::CredentialStore;
use crate::domain::session::{CredentialKey, StoredCredentials};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Table holding the service settings inside the credential file
pub const CREDENTIALS_TABLE: &str = "credentials";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: StoredCredentials,
}

/// TOML file with a `[credentials]` table.
///
/// ```toml
/// [credentials]
/// url = "https://metal.example.com"
/// membership_id = "m-1"
/// session_token = "..."
/// fuse_conf = "/etc/metal/fuse.conf"
/// ```
///
/// Saving rewrites one key and leaves every other key in the file intact.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Configuration(format!(
                "failed to read credential file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Stage in a sibling temp file, then rename it over the original
    fn write(&self, content: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<StoredCredentials> {
        let _guard = self.lock.lock();
        let content = self.read()?;
        let file: CredentialFile = toml::from_str(&content)?;
        Ok(file.credentials)
    }

    fn save(&self, key: CredentialKey, value: &str) -> Result<()> {
        let _guard = self.lock.lock();

        let mut document: toml::Table = if self.path.exists() {
            toml::from_str(&self.read()?)?
        } else {
            toml::Table::new()
        };

        let section = document
            .entry(CREDENTIALS_TABLE)
            .or_insert(toml::Value::Table(toml::Table::new()));
        let Some(section) = section.as_table_mut() else {
            return Err(Error::Configuration(format!(
                "'{}' in {} is not a table",
                CREDENTIALS_TABLE,
                self.path.display()
            )));
        };
        section.insert(key.as_str().to_string(), toml::Value::String(value.to_string()));

        self.write(&toml::to_string_pretty(&document)?)?;

        debug!("Updated {} in {}", key, self.path.display());
        Ok(())
    }
}

/// Process-local store for embedding and tests
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl InMemoryCredentialStore {
    pub fn new(credentials: StoredCredentials) -> Self {
        Self {
            inner: Mutex::new(credentials),
        }
    }

    pub fn get(&self, key: CredentialKey) -> Option<String> {
        let inner = self.inner.lock();
        match key {
            CredentialKey::SessionToken => inner.session_token.clone(),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<StoredCredentials> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, key: CredentialKey, value: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        match key {
            CredentialKey::SessionToken => inner.session_token = Some(value.to_string()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
# managed by ops
[credentials]
url = "https://metal.example.com"
membership_id = "m-1"
fuse_conf = "/etc/metal/fuse.conf"

[ui]
color = true
"#;

    #[test]
    fn test_load_reads_credentials_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let stored = FileCredentialStore::new(&path).load().unwrap();
        assert_eq!(stored.url.as_deref(), Some("https://metal.example.com"));
        assert_eq!(stored.membership_id.as_deref(), Some("m-1"));
        assert!(stored.session_token.is_none());
        assert_eq!(stored.fuse_conf, Some(PathBuf::from("/etc/metal/fuse.conf")));
    }

    #[test]
    fn test_save_updates_token_and_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let store = FileCredentialStore::new(&path);

        store.save(CredentialKey::SessionToken, "tok-1").unwrap();
        store.save(CredentialKey::SessionToken, "tok-2").unwrap();

        let stored = store.load().unwrap();
        assert_eq!(stored.session_token.as_deref(), Some("tok-2"));
        assert_eq!(stored.membership_id.as_deref(), Some("m-1"));

        let raw: toml::Table = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["ui"]["color"].as_bool(), Some(true));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("creds.toml"));

        assert_matches!(store.load(), Err(Error::Configuration(_)));

        store.save(CredentialKey::SessionToken, "tok").unwrap();
        assert_eq!(store.load().unwrap().session_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_save_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let store = FileCredentialStore::new(&path);

        store.save(CredentialKey::SessionToken, "tok").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("credentials.toml")]);
        assert_eq!(store.load().unwrap().url.as_deref(), Some("https://metal.example.com"));
    }

    #[test]
    fn test_failed_save_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "credentials = 1\n").unwrap();
        let store = FileCredentialStore::new(&path);

        assert_matches!(
            store.save(CredentialKey::SessionToken, "tok"),
            Err(Error::Configuration(_))
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "credentials = 1\n");
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryCredentialStore::default();
        assert!(store.get(CredentialKey::SessionToken).is_none());
        store.save(CredentialKey::SessionToken, "tok").unwrap();
        assert_eq!(store.load().unwrap().session_token.as_deref(), Some("tok"));
    }
}
