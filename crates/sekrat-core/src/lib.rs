//! Core abstractions for Sekrat: the secret manager and the storage/encryption
//! contracts it orchestrates. Concrete backends live in sibling crates.

pub mod crypter;
pub mod manager;
pub mod warehouse;

pub use crypter::{Crypter, CrypterError, PassthroughCrypter};
pub use manager::{Manager, ManagerError};
pub use warehouse::{MemoryWarehouse, Warehouse, WarehouseError};
