// ---------------------------------------------------------------------------
// StoreError: failures reading or writing the local store
// ---------------------------------------------------------------------------

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// I/O error (permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Bitcode decoding failed.
    Decode(String),
    /// The file does not start with a store header.
    BadHeader(String),
    /// The header was written by a newer build.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload bytes do not match the header checksum.
    ChecksumMismatch { expected: u32, found: u32 },
    /// Nothing has been stored yet.
    NoData,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            StoreError::BadHeader(msg) => write!(f, "Not a capacity store: {msg}"),
            StoreError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: store is v{found}, but this build only supports up to v{expected_max}"
            ),
            StoreError::ChecksumMismatch { expected, found } => write!(
                f,
                "Store is corrupted: checksum mismatch (expected {expected:#010X}, got {found:#010X})"
            ),
            StoreError::NoData => write!(f, "No stored capacity"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NoData
        } else {
            StoreError::Io(e)
        }
    }
}

impl From<bitcode::Error> for StoreError {
    fn from(e: bitcode::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_no_data() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, StoreError::NoData));
    }

    #[test]
    fn test_other_io_errors_keep_source() {
        let err: StoreError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_version_mismatch_display() {
        let msg = StoreError::VersionMismatch {
            expected_max: 1,
            found: 7,
        }
        .to_string();
        assert!(msg.contains("v7"), "got: {msg}");
        assert!(msg.contains("v1"), "got: {msg}");
    }

    #[test]
    fn test_checksum_display_is_hex() {
        let msg = StoreError::ChecksumMismatch {
            expected: 0xAB,
            found: 0x10,
        }
        .to_string();
        assert!(msg.contains("0x000000AB"), "got: {msg}");
        assert!(msg.contains("corrupted"), "got: {msg}");
    }
}
