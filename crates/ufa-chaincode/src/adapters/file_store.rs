//! # File-Backed State Store
//!
//! Persists the whole key space to a single file after every write, for
//! running the chaincode standalone without a hosting ledger.
//!
//! File format: repeated `[key_len:u32 LE][key][value_len:u32 LE][value]`.
//! Writes go to a sibling `.tmp` file which is then renamed over the target.

use crate::errors::StoreError;
use crate::ports::StateAccessor;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// File-backed implementation of `StateAccessor`.
#[derive(Debug)]
pub struct FileBackedStateStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    path: PathBuf,
}

impl FileBackedStateStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file yields an empty store. A truncated or non-UTF-8 file is
    /// reported as [`StoreError::Corrupted`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read(&path) {
            Ok(bytes) => decode_entries(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(StoreError::Io {
                    message: e.to_string(),
                })
            }
        };

        info!(path = %path.display(), keys = entries.len(), "Opened state file");

        Ok(Self {
            entries: RwLock::new(entries),
            path,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &HashMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let bytes = encode_entries(entries)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl StateAccessor for FileBackedStateStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let previous = entries.insert(key.to_string(), value.to_vec());
        if let Err(e) = self.save(&entries) {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn encode_entries(entries: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    for (key, value) in entries {
        for chunk in [key.as_bytes(), value.as_slice()] {
            let len = u32::try_from(chunk.len()).map_err(|_| StoreError::Io {
                message: format!("entry of {} bytes exceeds file format limit", chunk.len()),
            })?;
            bytes.extend_from_slice(&len.to_le_bytes());
            bytes.extend_from_slice(chunk);
        }
    }
    Ok(bytes)
}

fn decode_entries(bytes: &[u8]) -> Result<HashMap<String, Vec<u8>>, StoreError> {
    let mut entries = HashMap::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let key = read_chunk(bytes, &mut cursor)?;
        let value = read_chunk(bytes, &mut cursor)?;
        let key = String::from_utf8(key.to_vec()).map_err(|e| StoreError::Corrupted {
            message: format!("non UTF-8 key: {e}"),
        })?;
        entries.insert(key, value.to_vec());
    }

    Ok(entries)
}

fn read_chunk<'a>(bytes: &'a [u8], cursor: &mut usize) -> Result<&'a [u8], StoreError> {
    let truncated = || StoreError::Corrupted {
        message: format!("truncated entry at offset {}", *cursor),
    };

    let len_end = cursor.checked_add(4).ok_or_else(truncated)?;
    let len_bytes: [u8; 4] = bytes
        .get(*cursor..len_end)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(truncated)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let end = len_end.checked_add(len).ok_or_else(truncated)?;
    let chunk = bytes.get(len_end..end).ok_or_else(truncated)?;
    *cursor = end;
    Ok(chunk)
}
