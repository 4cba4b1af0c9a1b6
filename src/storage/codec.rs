//! Binary framing for snapshot entries.
//!
//! Data is serialized with:
//! - JSON for the payload (reuses the serde attributes of the model types)
//! - a length prefix for framing
//! - a CRC32 checksum for corruption detection
//! - a version byte for forward compatibility

use std::io::{ErrorKind, Read, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

/// Current codec version.
pub const CODEC_VERSION: u8 = 1;

/// Magic bytes identifying namesake snapshots.
pub const MAGIC: [u8; 4] = *b"NMSK";

/// Largest payload accepted by [`decode`].
const MAX_ENTRY_SIZE: usize = 100 * 1024 * 1024;

/// Serializes a value into one framed entry.
///
/// Format:
/// ```text
/// [version: 1 byte][length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
/// ```
///
/// # Errors
/// Returns [`StorageError::Serialization`] if the value cannot be encoded or
/// is larger than the format allows.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let data = serde_json::to_vec(value)
        .map_err(|e| StorageError::Serialization(format!("serialization failed: {e}")))?;

    if data.len() > MAX_ENTRY_SIZE {
        return Err(StorageError::Serialization(format!(
            "entry size {} exceeds maximum {MAX_ENTRY_SIZE}",
            data.len()
        )));
    }
    let len = u32::try_from(data.len())
        .map_err(|_| StorageError::Serialization("entry length overflows u32".to_string()))?;

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let crc = hasher.finalize();

    let mut out = Vec::with_capacity(1 + 4 + data.len() + 4);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Reads one framed entry, verifying its checksum.
///
/// # Errors
/// - [`StorageError::Corrupt`] on a version, size or checksum mismatch, or a
///   truncated entry
/// - [`StorageError::Serialization`] if the payload does not decode
/// - [`StorageError::Io`] on other read failures
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> Result<T, StorageError> {
    let mut version = [0u8; 1];
    read_exact(reader, &mut version, "version")?;
    if version[0] != CODEC_VERSION {
        return Err(StorageError::Corrupt(format!(
            "unsupported codec version: {} (expected {CODEC_VERSION})",
            version[0]
        )));
    }

    let mut len_bytes = [0u8; 4];
    read_exact(reader, &mut len_bytes, "length")?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_ENTRY_SIZE {
        return Err(StorageError::Corrupt(format!(
            "entry size {len} exceeds maximum {MAX_ENTRY_SIZE}"
        )));
    }

    let mut data = vec![0u8; len];
    read_exact(reader, &mut data, "payload")?;

    let mut crc_bytes = [0u8; 4];
    read_exact(reader, &mut crc_bytes, "checksum")?;
    let stored_crc = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let computed_crc = hasher.finalize();
    if stored_crc != computed_crc {
        return Err(StorageError::Corrupt(format!(
            "CRC mismatch: stored={stored_crc:08x}, computed={computed_crc:08x}"
        )));
    }

    serde_json::from_slice(&data)
        .map_err(|e| StorageError::Serialization(format!("deserialization failed: {e}")))
}

/// Writes the file header (magic + version).
///
/// # Errors
/// Returns [`StorageError::Io`] if the writer fails.
pub fn write_header(writer: &mut impl Write) -> Result<(), StorageError> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])?;
    Ok(())
}

/// Reads and validates the file header, returning its version.
///
/// # Errors
/// Returns [`StorageError::Corrupt`] on wrong magic bytes or a truncated
/// header.
pub fn read_header(reader: &mut impl Read) -> Result<u8, StorageError> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if magic != MAGIC {
        return Err(StorageError::Corrupt(format!(
            "invalid magic bytes: expected {MAGIC:?}, got {magic:?}"
        )));
    }

    let mut version = [0u8; 1];
    read_exact(reader, &mut version, "header version")?;
    Ok(version[0])
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], what: &str) -> Result<(), StorageError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => StorageError::Corrupt(format!("truncated {what}")),
        _ => StorageError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::tally::Tally;

    #[test]
    fn test_roundtrip_tally() {
        let value: Tally = ["JR", "PHILIP MORRIS", "JR"].into_iter().collect();
        let encoded = encode(&value).unwrap();

        let mut cursor = Cursor::new(encoded);
        let decoded: Tally = decode(&mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_detects_corruption() {
        let mut encoded = encode(&"Dunn, William L".to_string()).unwrap();
        encoded[8] ^= 0xFF;

        let mut cursor = Cursor::new(encoded);
        let err = decode::<String>(&mut cursor).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(err.to_string().contains("CRC"));
    }

    #[test]
    fn test_rejects_oversized_entry() {
        let mut bad = vec![CODEC_VERSION];
        bad.extend_from_slice(&200_000_000u32.to_le_bytes());

        let mut cursor = Cursor::new(bad);
        let err = decode::<String>(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_truncated_entry_is_corrupt() {
        let encoded = encode(&"Temko, SL".to_string()).unwrap();
        let mut cursor = Cursor::new(&encoded[..encoded.len() - 2]);
        let err = decode::<String>(&mut cursor).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[test]
    fn test_header_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"NMSK");

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_header(&mut cursor).unwrap(), CODEC_VERSION);

        let mut cursor = Cursor::new(b"ABCD\x01".to_vec());
        assert!(matches!(read_header(&mut cursor), Err(StorageError::Corrupt(_))));
    }
}
