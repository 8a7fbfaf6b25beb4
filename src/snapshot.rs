// 📦 Binary Snapshot Codec - whole-collection persistence
//
// A snapshot captures an entire collection in one blob and is restored in one
// piece, so a load always replaces and a save always captures every field
// (nested vaccines and relationship ids included).
//
// Layout (all integers big-endian):
//
//   [magic:4 = "VETR"][version:1][kind:1][count:4]
//   repeated count times: [len:4][record JSON: len bytes]
//
// Each record is self-describing JSON behind a length prefix; the header pins
// the codec version and what kind of collection the file holds.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ClinicError, Result};

pub const SNAPSHOT_MAGIC: &[u8; 4] = b"VETR";
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 1 + 4;

/// Which collection a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SnapshotKind {
    Animals = 1,
    Owners = 2,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Animals => "animals",
            SnapshotKind::Owners => "owners",
        }
    }
}

impl TryFrom<u8> for SnapshotKind {
    type Error = ClinicError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(SnapshotKind::Animals),
            2 => Ok(SnapshotKind::Owners),
            other => Err(ClinicError::format(0, format!("unknown snapshot kind {}", other))),
        }
    }
}

// ============================================================================
// ENCODE
// ============================================================================

pub fn encode_snapshot<T: Serialize>(kind: SnapshotKind, items: &[T]) -> Result<Vec<u8>> {
    let count = u32::try_from(items.len())
        .map_err(|_| ClinicError::format(0, "too many records for one snapshot"))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + items.len() * 128);
    buf.extend_from_slice(SNAPSHOT_MAGIC);
    buf.push(SNAPSHOT_VERSION);
    buf.push(kind as u8);
    buf.extend_from_slice(&count.to_be_bytes());

    for (index, item) in items.iter().enumerate() {
        let record = serde_json::to_vec(item).map_err(|e| {
            ClinicError::format(index + 1, format!("failed to encode record: {}", e))
        })?;
        let len = u32::try_from(record.len())
            .map_err(|_| ClinicError::format(index + 1, "record too large"))?;
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&record);
    }

    Ok(buf)
}

// ============================================================================
// DECODE
// ============================================================================

/// Cursor over the snapshot bytes; `position` feeds error messages
struct SnapshotReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> SnapshotReader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                ClinicError::format(
                    0,
                    format!("snapshot truncated while reading {} at byte {}", what, self.position),
                )
            })?;
        let bytes = self.bytes;
        let slice = &bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let raw = self.take(4, what)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

pub fn decode_snapshot<T: DeserializeOwned>(expected: SnapshotKind, bytes: &[u8]) -> Result<Vec<T>> {
    let mut reader = SnapshotReader { bytes, position: 0 };

    if reader.take(4, "magic")? != SNAPSHOT_MAGIC {
        return Err(ClinicError::format(0, "not a snapshot file (bad magic)"));
    }

    let version = reader.u8("version")?;
    if version != SNAPSHOT_VERSION {
        return Err(ClinicError::format(
            0,
            format!("unsupported snapshot version {} (expected {})", version, SNAPSHOT_VERSION),
        ));
    }

    let kind = SnapshotKind::try_from(reader.u8("kind")?)?;
    if kind != expected {
        return Err(ClinicError::format(
            0,
            format!("snapshot holds {}, expected {}", kind.as_str(), expected.as_str()),
        ));
    }

    let count = reader.u32("record count")? as usize;
    let mut items = Vec::with_capacity(count.min(bytes.len() / 4));

    for index in 0..count {
        let len = reader.u32("record length")? as usize;
        let record = reader.take(len, "record")?;
        let item = serde_json::from_slice(record).map_err(|e| {
            ClinicError::format(index + 1, format!("failed to decode record: {}", e))
        })?;
        items.push(item);
    }

    if reader.position != bytes.len() {
        return Err(ClinicError::format(
            0,
            format!("{} trailing bytes after last record", bytes.len() - reader.position),
        ));
    }

    Ok(items)
}

// ============================================================================
// FILES
// ============================================================================

pub fn save_snapshot<T: Serialize>(path: &Path, kind: SnapshotKind, items: &[T]) -> Result<()> {
    let bytes = encode_snapshot(kind, items)?;
    fs::write(path, &bytes).map_err(|e| ClinicError::io(path, e))?;

    debug!(
        "Saved {} {} ({} bytes) to {}",
        items.len(),
        kind.as_str(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

pub fn load_snapshot<T: DeserializeOwned>(path: &Path, kind: SnapshotKind) -> Result<Vec<T>> {
    let bytes = fs::read(path).map_err(|e| ClinicError::io(path, e))?;
    let items = decode_snapshot(kind, &bytes)?;

    debug!("Loaded {} {} from {}", items.len(), kind.as_str(), path.display());
    Ok(items)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        tags: Vec<u32>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "a".to_string(), tags: vec![1, 2] },
            Row { name: "b".to_string(), tags: vec![] },
        ]
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_snapshot(SnapshotKind::Owners, &rows()).unwrap();

        assert_eq!(&bytes[0..4], SNAPSHOT_MAGIC);
        assert_eq!(bytes[4], SNAPSHOT_VERSION);
        assert_eq!(bytes[5], SnapshotKind::Owners as u8);
        assert_eq!(&bytes[6..10], &2u32.to_be_bytes());
    }

    #[test]
    fn test_encode_decode_preserves_order() {
        let bytes = encode_snapshot(SnapshotKind::Animals, &rows()).unwrap();
        let decoded: Vec<Row> = decode_snapshot(SnapshotKind::Animals, &bytes).unwrap();

        assert_eq!(decoded, rows());
    }

    #[test]
    fn test_empty_collection() {
        let bytes = encode_snapshot::<Row>(SnapshotKind::Animals, &[]).unwrap();
        let decoded: Vec<Row> = decode_snapshot(SnapshotKind::Animals, &bytes).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let bytes = encode_snapshot(SnapshotKind::Animals, &rows()).unwrap();
        let result: Result<Vec<Row>> = decode_snapshot(SnapshotKind::Owners, &bytes);

        assert!(matches!(result, Err(ClinicError::Format { .. })));
    }

    #[test]
    fn test_rejects_bad_magic_and_version() {
        let mut bytes = encode_snapshot(SnapshotKind::Animals, &rows()).unwrap();

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(decode_snapshot::<Row>(SnapshotKind::Animals, &bad_magic).is_err());

        bytes[4] = SNAPSHOT_VERSION + 1;
        assert!(decode_snapshot::<Row>(SnapshotKind::Animals, &bytes).is_err());
    }

    #[test]
    fn test_rejects_truncated_and_trailing_bytes() {
        let bytes = encode_snapshot(SnapshotKind::Animals, &rows()).unwrap();

        let truncated = &bytes[..bytes.len() - 3];
        assert!(decode_snapshot::<Row>(SnapshotKind::Animals, truncated).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(decode_snapshot::<Row>(SnapshotKind::Animals, &trailing).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.bin");

        save_snapshot(&path, SnapshotKind::Animals, &rows()).unwrap();
        let loaded: Vec<Row> = load_snapshot(&path, SnapshotKind::Animals).unwrap();

        assert_eq!(loaded, rows());
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let dir = TempDir::new().unwrap();
        let result: Result<Vec<Row>> = load_snapshot(&dir.path().join("nope.bin"), SnapshotKind::Owners);

        assert!(matches!(result, Err(ClinicError::Io { .. })));
    }
}
