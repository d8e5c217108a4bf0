use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use thiserror::Error;

/// Errors produced by warehouse (storage backend) implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WarehouseError {
    /// Requested id does not exist.
    #[error("secret not found: {id}")]
    NotFound { id: String },
    /// The id cannot address a blob in this warehouse.
    #[error("invalid secret id: {id:?}")]
    InvalidId { id: String },
    /// Underlying I/O failure.
    #[error("i/o failure: {reason}")]
    Io { reason: String },
    /// Stored representation could not be decoded back into a blob.
    #[error("decode failure: {reason}")]
    Decode { reason: String },
    /// Any other backend-specific failure.
    #[error("warehouse failure: {reason}")]
    Backend { reason: String },
}

/// Durable mapping from secret id to an opaque blob.
///
/// Blobs are written with full-replace semantics: a successful `store` makes the
/// new blob the only value for `id`, a failed one leaves the previous value alone.
pub trait Warehouse: Send + Sync {
    /// Ids of every blob currently held. Never fails; an empty warehouse yields an
    /// empty list.
    fn ids(&self) -> Vec<String>;

    /// Persist `blob` under `id`, replacing any existing entry.
    fn store(&self, id: &str, blob: &[u8]) -> Result<(), WarehouseError>;

    /// Fetch the blob stored under `id`.
    fn retrieve(&self, id: &str) -> Result<Vec<u8>, WarehouseError>;
}

impl<T: Warehouse + ?Sized> Warehouse for Box<T> {
    fn ids(&self) -> Vec<String> {
        (**self).ids()
    }

    fn store(&self, id: &str, blob: &[u8]) -> Result<(), WarehouseError> {
        (**self).store(id, blob)
    }

    fn retrieve(&self, id: &str) -> Result<Vec<u8>, WarehouseError> {
        (**self).retrieve(id)
    }
}

impl<T: Warehouse + ?Sized> Warehouse for Arc<T> {
    fn ids(&self) -> Vec<String> {
        (**self).ids()
    }

    fn store(&self, id: &str, blob: &[u8]) -> Result<(), WarehouseError> {
        (**self).store(id, blob)
    }

    fn retrieve(&self, id: &str) -> Result<Vec<u8>, WarehouseError> {
        (**self).retrieve(id)
    }
}

/// Reference warehouse that keeps raw blobs in memory.
/// Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct MemoryWarehouse {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Warehouse for MemoryWarehouse {
    fn ids(&self) -> Vec<String> {
        // A poisoned map is still a consistent map: every insert is a single call.
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.keys().cloned().collect()
    }

    fn store(&self, id: &str, blob: &[u8]) -> Result<(), WarehouseError> {
        validate_id(id)?;
        let mut map = self.inner.lock().map_err(|err| WarehouseError::Backend {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert(id.to_string(), blob.to_vec());
        Ok(())
    }

    fn retrieve(&self, id: &str) -> Result<Vec<u8>, WarehouseError> {
        let map = self.inner.lock().map_err(|err| WarehouseError::Backend {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.get(id).cloned().ok_or_else(|| WarehouseError::NotFound {
            id: id.to_string(),
        })
    }
}

fn validate_id(id: &str) -> Result<(), WarehouseError> {
    if id.is_empty() {
        return Err(WarehouseError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_warehouse_has_no_ids() {
        let warehouse = MemoryWarehouse::new();
        assert!(warehouse.ids().is_empty());
    }

    #[test]
    fn stored_id_is_listed_and_retrievable() {
        let warehouse = MemoryWarehouse::new();
        warehouse.store("id1", b"i am some data").expect("store");

        assert_eq!(warehouse.ids(), vec!["id1".to_string()]);
        assert_eq!(
            warehouse.retrieve("id1").expect("retrieve"),
            b"i am some data"
        );
    }

    #[test]
    fn store_overwrites_previous_blob() {
        let warehouse = MemoryWarehouse::new();
        warehouse.store("k", b"first").expect("store");
        warehouse.store("k", b"second").expect("store again");

        assert_eq!(warehouse.retrieve("k").expect("retrieve"), b"second");
        assert_eq!(warehouse.ids().len(), 1);
    }

    #[test]
    fn retrieve_unknown_id_is_not_found() {
        let warehouse = MemoryWarehouse::new();
        let err = warehouse.retrieve("missing").expect_err("should be missing");
        assert_eq!(
            err,
            WarehouseError::NotFound {
                id: "missing".into()
            }
        );
    }

    #[test]
    fn rejects_empty_id() {
        let warehouse = MemoryWarehouse::new();
        let err = warehouse.store("", b"v").expect_err("empty id");
        assert!(matches!(err, WarehouseError::InvalidId { .. }));
    }

    #[test]
    fn ids_are_sorted_and_clones_share_state() {
        let warehouse = MemoryWarehouse::new();
        let handle = warehouse.clone();
        handle.store("b", b"2").expect("store");
        handle.store("a", b"1").expect("store");

        assert_eq!(warehouse.ids(), vec!["a".to_string(), "b".to_string()]);

        warehouse.store("c", b"3").expect("store");
        assert_eq!(handle.retrieve("c").expect("retrieve"), b"3");
    }

    #[test]
    fn boxed_trait_object_delegates() {
        let warehouse: Box<dyn Warehouse> = Box::new(MemoryWarehouse::new());
        warehouse.store("boxed", b"v").expect("store");
        assert_eq!(warehouse.retrieve("boxed").expect("retrieve"), b"v");
        assert_eq!(warehouse.ids(), vec!["boxed".to_string()]);
    }
}
