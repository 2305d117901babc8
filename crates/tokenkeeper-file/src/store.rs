//! Credential store persisted to a JSON file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use tokenkeeper_core::traits::{ACCESS_CREDENTIAL_KEY, CredentialStore, REFRESH_CREDENTIAL_KEY};
use tokenkeeper_core::{AccessCredential, RefreshCredential};

const CREDENTIALS_FILE: &str = "credentials.json";
const LOCK_FILE: &str = "credentials.lock";

type Entries = BTreeMap<String, String>;

fn map_json(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// A credential store whose durable scope is a file on disk.
///
/// The refresh credential is written to `credentials.json` under the store
/// directory, keyed by [`REFRESH_CREDENTIAL_KEY`]. The file is created with
/// owner-only permissions on Unix and removed once it holds no entries.
/// Concurrent processes coordinate through an exclusive lock on a sibling
/// lock file.
///
/// The access credential never touches the disk; it lives in process
/// memory and is gone when the process exits.
///
/// Filesystem failures are logged and reported as an absent credential:
/// an unreadable file behaves like an empty one.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    volatile: RwLock<Option<AccessCredential>>,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            volatile: RwLock::new(None),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the credentials file path.
    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn open_lock(&self) -> io::Result<File> {
        fs::create_dir_all(&self.root)?;
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
    }

    fn read_entries(&self) -> io::Result<Entries> {
        match fs::read(self.credentials_path()) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(map_json),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(err),
        }
    }

    fn load(&self, key: &str) -> io::Result<Option<String>> {
        if !self.credentials_path().exists() {
            return Ok(None);
        }

        let lock = self.open_lock()?;
        FileExt::lock_shared(&lock)?;
        let entries = self.read_entries();
        FileExt::unlock(&lock)?;

        Ok(entries?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.credentials_path().display()))]
    fn store(&self, key: &str, value: Option<&str>) -> io::Result<()> {
        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)?;
        let result = self.rewrite(key, value);
        FileExt::unlock(&lock)?;
        result
    }

    fn rewrite(&self, key: &str, value: Option<&str>) -> io::Result<()> {
        let mut entries = self.read_entries().unwrap_or_else(|err| {
            warn!(error = %err, "Discarding unreadable credentials file");
            Entries::new()
        });

        match value {
            Some(value) => {
                entries.insert(key.to_string(), value.to_string());
            }
            None => {
                entries.remove(key);
            }
        }

        let path = self.credentials_path();
        if entries.is_empty() {
            debug!("Removing empty credentials file");
            return match fs::remove_file(&path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            };
        }

        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&entries).map_err(map_json)?;
        let replaced = fs::write(&tmp, json)
            .and_then(|()| restrict_permissions(&tmp))
            .and_then(|()| fs::rename(&tmp, &path));
        if let Err(err) = replaced {
            // The temporary file holds the secret; never leave it behind.
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }

        debug!("Credentials file written");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl CredentialStore for FileStore {
    fn read_refresh_credential(&self) -> Option<RefreshCredential> {
        match self.load(REFRESH_CREDENTIAL_KEY) {
            Ok(value) => value.map(RefreshCredential::new),
            Err(err) => {
                warn!(error = %err, path = %self.credentials_path().display(), "Failed to read refresh credential");
                None
            }
        }
    }

    fn write_refresh_credential(&self, value: Option<&RefreshCredential>) {
        if let Err(err) = self.store(REFRESH_CREDENTIAL_KEY, value.map(RefreshCredential::as_str)) {
            warn!(error = %err, path = %self.credentials_path().display(), "Failed to write refresh credential");
        }
    }

    fn read_access_credential(&self) -> Option<AccessCredential> {
        self.volatile
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_access_credential(&self, value: Option<&AccessCredential>) {
        debug!(key = ACCESS_CREDENTIAL_KEY, present = value.is_some(), "Updating volatile scope");
        *self
            .volatile
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value.cloned();
    }
}
