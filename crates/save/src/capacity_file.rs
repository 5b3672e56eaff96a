//! Capacity store file: a [`file_header`](crate::file_header) followed by a
//! bitcode-encoded `CapacityState`.

use std::path::Path;

use engine::capacity::CapacityState;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_header, wrap_with_header};
use crate::StoreError;

pub fn encode_capacity(state: &CapacityState) -> Vec<u8> {
    wrap_with_header(&bitcode::encode(state))
}

pub fn decode_capacity(bytes: &[u8]) -> Result<CapacityState, StoreError> {
    let (_, payload) = unwrap_header(bytes)?;
    Ok(bitcode::decode(payload)?)
}

pub fn write_capacity(path: &Path, state: &CapacityState) -> Result<(), StoreError> {
    atomic_write(path, &encode_capacity(state))?;
    Ok(())
}

/// Reads the stored capacity. A missing or empty file is [`StoreError::NoData`].
pub fn read_capacity(path: &Path) -> Result<CapacityState, StoreError> {
    let bytes = std::fs::read(path)?;
    decode_capacity(&bytes)
}
