//! Concrete warehouse implementations.
//! Blobs are stored base64-encoded, one file per secret id under a base directory.

pub mod fs_warehouse;

pub use fs_warehouse::FsWarehouse;
