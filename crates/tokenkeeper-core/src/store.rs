//! In-memory credential store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::traits::{ACCESS_CREDENTIAL_KEY, CredentialStore, REFRESH_CREDENTIAL_KEY};
use crate::{AccessCredential, RefreshCredential};

/// A key/value scope held in memory.
#[derive(Debug, Default)]
struct Scope(RwLock<HashMap<&'static str, String>>);

impl Scope {
    fn get(&self, key: &'static str) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &'static str, value: Option<&str>) {
        let mut entries = self
            .0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match value {
            Some(value) => {
                entries.insert(key, value.to_string());
            }
            None => {
                entries.remove(key);
            }
        }
    }
}

/// A credential store holding both scopes in process memory.
///
/// Nothing survives the process; useful for tests and for embedders that
/// persist the refresh credential themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    durable: Scope,
    volatile: Scope,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose durable scope already holds `refresh_credential`.
    pub fn with_refresh_credential(refresh_credential: RefreshCredential) -> Self {
        let store = Self::new();
        store.write_refresh_credential(Some(&refresh_credential));
        store
    }
}

impl CredentialStore for MemoryStore {
    fn read_refresh_credential(&self) -> Option<RefreshCredential> {
        self.durable
            .get(REFRESH_CREDENTIAL_KEY)
            .map(RefreshCredential::new)
    }

    fn write_refresh_credential(&self, value: Option<&RefreshCredential>) {
        self.durable
            .set(REFRESH_CREDENTIAL_KEY, value.map(RefreshCredential::as_str));
    }

    fn read_access_credential(&self) -> Option<AccessCredential> {
        self.volatile
            .get(ACCESS_CREDENTIAL_KEY)
            .map(AccessCredential::new)
    }

    fn write_access_credential(&self, value: Option<&AccessCredential>) {
        self.volatile
            .set(ACCESS_CREDENTIAL_KEY, value.map(AccessCredential::as_str));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_independent() {
        let store = MemoryStore::new();
        store.write_refresh_credential(Some(&RefreshCredential::new("r")));

        assert_eq!(store.read_refresh_credential(), Some(RefreshCredential::new("r")));
        assert_eq!(store.read_access_credential(), None);

        store.write_access_credential(Some(&AccessCredential::new("a")));
        store.write_refresh_credential(None);

        assert_eq!(store.read_refresh_credential(), None);
        assert_eq!(store.read_access_credential(), Some(AccessCredential::new("a")));
    }

    #[test]
    fn removing_absent_entries_is_a_no_op() {
        let store = MemoryStore::new();
        store.write_refresh_credential(None);
        store.write_access_credential(None);
        assert_eq!(store.read_refresh_credential(), None);
        assert_eq!(store.read_access_credential(), None);
    }
}
