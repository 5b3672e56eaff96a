//! Local persistence for the planning engine.
//!
//! Capacity is written to a small checksummed file after every committed
//! change and restored when the session starts. Downloaded reports are
//! written next to it. Both writes go through [`atomic_write`].

mod atomic_write;
pub mod capacity_file;
pub mod file_header;
mod store_error;
mod store_plugin;

pub use atomic_write::atomic_write;
pub use capacity_file::{decode_capacity, encode_capacity, read_capacity, write_capacity};
pub use store_error::StoreError;
pub use store_plugin::LocalStorePlugin;
