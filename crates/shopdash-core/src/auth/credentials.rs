//! Durable storage for the access and refresh tokens.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

const SERVICE_NAME: &str = "shopdash";

/// Token file name in the cache directory
const TOKEN_FILE: &str = "tokens.json";

/// The two entries a session persists, under fixed storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKey {
    Access,
    Refresh,
}

impl TokenKey {
    pub const ALL: [TokenKey; 2] = [TokenKey::Access, TokenKey::Refresh];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKey::Access => "access_token",
            TokenKey::Refresh => "refresh_token",
        }
    }
}

/// Key/value storage that outlives the in-memory session.
///
/// Only the session manager writes; the request pipeline only reads.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: TokenKey) -> Result<Option<String>>;

    fn set(&self, key: TokenKey, value: &str) -> Result<()>;

    /// Removing an absent key is not an error
    fn remove(&self, key: TokenKey) -> Result<()>;

    /// Remove both tokens, attempting each even if the first fails
    fn clear(&self) -> Result<()> {
        let access = self.remove(TokenKey::Access);
        let refresh = self.remove(TokenKey::Refresh);
        access.and(refresh)
    }
}

/// Tokens kept in the OS keychain, one entry per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: TokenKey) -> Result<Entry> {
        Entry::new(&self.service, key.as_str()).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// Tokens kept in a JSON file, for machines without a usable keychain.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(TOKEN_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Result<TokenFile> {
        if !self.path.exists() {
            return Ok(TokenFile::default());
        }
        let contents = std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn write(&self, file: &TokenFile) -> Result<()> {
        if file.entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove token file")?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(file)?;
        let mut out = owner_only_options()
            .open(&self.path)
            .context("Failed to open token file")?;
        // A file left over from an older build may still be group readable
        restrict_permissions(&self.path)?;
        out.write_all(contents.as_bytes())
            .context("Failed to write token file")?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut TokenFile)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Token file lock poisoned"))?;
        let mut file = self.read()?;
        f(&mut file);
        self.write(&file)
    }
}

/// Options that create the token file readable by its owner only
fn owner_only_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .context("Failed to restrict token file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

impl CredentialStore for FileStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("Token file lock poisoned"))?;
        Ok(self.read()?.entries.get(key.as_str()).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        self.modify(|file| {
            file.entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        self.modify(|file| {
            file.entries.remove(key.as_str());
        })
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<TokenKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with both tokens
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(TokenKey::Access, access.to_string());
        entries.insert(TokenKey::Refresh, refresh.to_string());
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        entries.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shopdash-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_token_key_names() {
        assert_eq!(TokenKey::Access.as_str(), "access_token");
        assert_eq!(TokenKey::Refresh.as_str(), "refresh_token");
    }

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.get(TokenKey::Access).unwrap(), None);

        store.set(TokenKey::Access, "a1").unwrap();
        store.set(TokenKey::Refresh, "r1").unwrap();
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("a1"));

        store.clear().unwrap();
        assert_eq!(store.get(TokenKey::Access).unwrap(), None);
        assert_eq!(store.get(TokenKey::Refresh).unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = temp_dir("file-store");
        let store = FileStore::new(dir.clone());
        store.set(TokenKey::Access, "a1").unwrap();
        store.set(TokenKey::Refresh, "r1").unwrap();

        let reopened = FileStore::new(dir.clone());
        assert_eq!(reopened.get(TokenKey::Access).unwrap().as_deref(), Some("a1"));
        assert_eq!(reopened.get(TokenKey::Refresh).unwrap().as_deref(), Some("r1"));

        let contents = std::fs::read_to_string(reopened.path()).unwrap();
        assert!(contents.contains("\"access_token\""));

        reopened.clear().unwrap();
        assert!(!reopened.path().exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("file-perms");
        let store = FileStore::new(dir.clone());
        store.set(TokenKey::Access, "a1").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("file-loose");
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::new(dir.clone());
        std::fs::write(store.path(), "{}").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.set(TokenKey::Refresh, "r1").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get(TokenKey::Refresh).unwrap().as_deref(), Some("r1"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_owner_only_options_create_file() {
        let dir = temp_dir("file-create");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tokens-new.json");
        owner_only_options().open(&path).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }
}
