//! Secrets-manager contract.
//!
//! The engine never reads secret payloads itself; it resolves names to secret
//! handles through a synchronized external manager and records the handles in
//! container configuration.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::{PodboxError, PodboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A handle on a stored secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Unique ID of the secret
    pub id: String,

    /// Human-readable name of the secret
    pub name: String,
}

/// A secret mounted into a container as a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSecret {
    /// The secret being mounted
    pub secret: Secret,

    /// Owner UID of the mounted file
    pub uid: u32,

    /// Owner GID of the mounted file
    pub gid: u32,

    /// Permission bits of the mounted file
    pub mode: u32,

    /// Target path inside the container
    pub target: String,
}

/// The lookup contract the engine requires from a secrets manager.
pub trait SecretStore: Send + Sync {
    /// Resolves a secret by name.
    fn lookup(&self, name: &str) -> PodboxResult<Secret>;
}

/// A map-backed secrets manager for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<String, Secret>>,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl InMemorySecretStore {
    /// Creates an empty secrets manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a secret under its name.
    pub fn add(&self, secret: Secret) {
        let mut secrets = self
            .secrets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        secrets.insert(secret.name.clone(), secret);
    }
}

impl SecretStore for InMemorySecretStore {
    fn lookup(&self, name: &str) -> PodboxResult<Secret> {
        let secrets = self
            .secrets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        secrets
            .get(name)
            .cloned()
            .ok_or_else(|| PodboxError::SecretNotFound(name.to_string()))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let store = InMemorySecretStore::new();
        store.add(Secret {
            id: "s1".into(),
            name: "db-password".into(),
        });

        assert_eq!(store.lookup("db-password").unwrap().id, "s1");
        assert!(matches!(
            store.lookup("missing"),
            Err(PodboxError::SecretNotFound(_))
        ));
    }
}
