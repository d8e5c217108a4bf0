use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    crypter::{Crypter, CrypterError},
    warehouse::{Warehouse, WarehouseError},
};

/// Failures surfaced by [`Manager`] operations. The backend error that caused
/// each one is kept as its source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("encryption failed")]
    EncryptionFailed(#[source] CrypterError),
    #[error("storage failed")]
    StorageFailed(#[source] WarehouseError),
    #[error("retrieval failed")]
    RetrievalFailed(#[source] WarehouseError),
    #[error("decryption failed")]
    DecryptionFailed(#[source] CrypterError),
}

impl ManagerError {
    /// True when a `get` failed because the id is unknown to the warehouse.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManagerError::RetrievalFailed(WarehouseError::NotFound { .. })
        )
    }

    /// True when a `get` failed because the envelope did not authenticate,
    /// which is what a wrong key looks like.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            ManagerError::DecryptionFailed(CrypterError::Authentication)
        )
    }
}

/// Orchestrates a [`Warehouse`] and a [`Crypter`] to store, retrieve, and list
/// secrets.
///
/// The manager holds no per-call state and adds no locking: concurrent `put`s to
/// the same id resolve last-writer-wins at the warehouse, and there is no
/// atomicity across an encrypt/store or retrieve/decrypt pair.
#[derive(Debug, Clone)]
pub struct Manager<W, C> {
    warehouse: W,
    crypter: C,
}

impl<W: Warehouse, C: Crypter> Manager<W, C> {
    pub fn new(warehouse: W, crypter: C) -> Self {
        Self { warehouse, crypter }
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    pub fn crypter(&self) -> &C {
        &self.crypter
    }

    /// Ids of every secret the warehouse holds.
    pub fn ids(&self) -> Vec<String> {
        self.warehouse.ids()
    }

    /// Encrypt `data` with `key` and store it under `id`, replacing any previous
    /// secret with that id. Nothing is written if encryption fails.
    #[instrument(skip(self, key, data), fields(len = data.len()))]
    pub fn put(&self, id: &str, key: &str, data: &[u8]) -> Result<(), ManagerError> {
        let envelope = self.crypter.encrypt(key, data).map_err(|err| {
            debug!(error = %err, "encrypt rejected");
            ManagerError::EncryptionFailed(err)
        })?;

        self.warehouse.store(id, &envelope).map_err(|err| {
            debug!(error = %err, "store rejected");
            ManagerError::StorageFailed(err)
        })
    }

    /// Retrieve the secret stored under `id` and decrypt it with `key`.
    #[instrument(skip(self, key))]
    pub fn get(&self, id: &str, key: &str) -> Result<Vec<u8>, ManagerError> {
        let envelope = self.warehouse.retrieve(id).map_err(|err| {
            debug!(error = %err, "retrieve rejected");
            ManagerError::RetrievalFailed(err)
        })?;

        self.crypter.decrypt(key, &envelope).map_err(|err| {
            debug!(error = %err, "decrypt rejected");
            ManagerError::DecryptionFailed(err)
        })
    }
}
