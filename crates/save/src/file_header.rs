// ---------------------------------------------------------------------------
// file_header – store header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (24 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "CRHS"
//   [4..8]   Format version (u32)
//   [8..16]  Timestamp (Unix epoch seconds, u64)
//   [16..20] Payload size (u32)
//   [20..24] xxHash32 checksum of the payload
//
// On write: encode payload -> prepend header
// On read: check magic -> check version -> check size and checksum -> payload

use xxhash_rust::xxh32::xxh32;

use crate::StoreError;

pub const MAGIC: [u8; 4] = *b"CRHS";

pub const HEADER_SIZE: usize = 24;

pub const HEADER_FORMAT_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub timestamp: u64,
    pub payload_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn new(payload: &[u8]) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            format_version: HEADER_FORMAT_VERSION,
            timestamp,
            payload_size: payload.len() as u32,
            checksum: xxh32(payload, XXHASH_SEED),
        }
    }
}

/// Returns `[header] ++ [payload]`.
pub fn wrap_with_header(payload: &[u8]) -> Vec<u8> {
    let header = FileHeader::new(payload);
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&header.format_version.to_le_bytes());
    out.extend_from_slice(&header.timestamp.to_le_bytes());
    out.extend_from_slice(&header.payload_size.to_le_bytes());
    out.extend_from_slice(&header.checksum.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Validate the header and return it with the payload that follows.
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), StoreError> {
    if bytes.is_empty() {
        return Err(StoreError::NoData);
    }
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(StoreError::BadHeader("missing CRHS magic bytes".into()));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::BadHeader(format!(
            "file is too short ({} bytes, need at least {HEADER_SIZE})",
            bytes.len()
        )));
    }

    let format_version = le_u32(bytes, 4);
    if format_version > HEADER_FORMAT_VERSION {
        return Err(StoreError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&bytes[8..16]);
    let timestamp = u64::from_le_bytes(ts);
    let payload_size = le_u32(bytes, 16);
    let checksum = le_u32(bytes, 20);

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_size as usize {
        return Err(StoreError::BadHeader(format!(
            "payload is {} bytes, header says {payload_size}",
            payload.len()
        )));
    }
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: checksum,
            found: computed,
        });
    }

    Ok((
        FileHeader {
            format_version,
            timestamp,
            payload_size,
            checksum,
        },
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_unwrap() {
        let payload = b"beds and staff";
        let wrapped = wrap_with_header(payload);
        assert_eq!(&wrapped[..4], b"CRHS");
        assert_eq!(wrapped.len(), HEADER_SIZE + payload.len());

        let (header, body) = unwrap_header(&wrapped).unwrap();
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert_eq!(header.payload_size, payload.len() as u32);
        assert!(header.timestamp > 0);
        assert_eq!(body, payload);
    }

    #[test]
    fn test_empty_file_is_no_data() {
        assert!(matches!(unwrap_header(b""), Err(StoreError::NoData)));
    }

    #[test]
    fn test_foreign_file_rejected() {
        let err = unwrap_header(b"MEGA\x01\x00\x00\x00").unwrap_err();
        assert!(matches!(err, StoreError::BadHeader(_)));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let err = unwrap_header(b"CRHS\x01\x00").unwrap_err();
        assert!(err.to_string().contains("too short"), "got: {err}");
    }

    #[test]
    fn test_flipped_payload_byte_detected() {
        let mut wrapped = wrap_with_header(b"payload");
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(StoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_payload_detected() {
        let mut wrapped = wrap_with_header(b"payload");
        wrapped.pop();
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(StoreError::BadHeader(_))
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut wrapped = wrap_with_header(b"payload");
        wrapped[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(StoreError::VersionMismatch { found: 9, .. })
        ));
    }
}
