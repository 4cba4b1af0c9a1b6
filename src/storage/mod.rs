//! Registry snapshots.
//!
//! A snapshot is the file header from [`codec::write_header`] followed by a
//! single framed entry holding the records, the dictionary (curated and
//! observed entries) and the configuration. The alias index is not stored;
//! it is rebuilt from the records on load.

pub mod codec;

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::StorageError;
use crate::org_dictionary::OrgDictionary;
use crate::person::Person;
use crate::registry::PersonRegistry;

/// Metadata stored ahead of the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Number of records in the snapshot.
    pub people: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    header: SnapshotHeader,
    config: RegistryConfig,
    dictionary: OrgDictionary,
    people: Vec<Person>,
}

impl PersonRegistry {
    /// Serializes the registry into a snapshot blob.
    ///
    /// # Errors
    /// Returns [`StorageError::Serialization`] if encoding fails.
    pub fn store(&self) -> Result<Vec<u8>, StorageError> {
        let snapshot = Snapshot {
            header: SnapshotHeader {
                created_at: Utc::now(),
                people: self.len(),
            },
            config: self.config.clone(),
            dictionary: self.dictionary.clone(),
            people: self.people.values().cloned().collect(),
        };

        let mut out = Vec::new();
        codec::write_header(&mut out)?;
        out.extend_from_slice(&codec::encode(&snapshot)?);
        Ok(out)
    }

    /// Restores a registry from a snapshot blob and rebuilds its index.
    ///
    /// # Errors
    /// Returns [`StorageError::Corrupt`] if the blob is damaged or its header
    /// does not match its contents, and [`StorageError::Serialization`] if
    /// the payload does not decode.
    pub fn load(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut reader = Cursor::new(bytes);
        let version = codec::read_header(&mut reader)?;
        if version != codec::CODEC_VERSION {
            return Err(StorageError::Corrupt(format!(
                "unsupported snapshot version: {version}"
            )));
        }

        let snapshot: Snapshot = codec::decode(&mut reader)?;
        if snapshot.header.people != snapshot.people.len() {
            return Err(StorageError::Corrupt(format!(
                "header lists {} people, snapshot holds {}",
                snapshot.header.people,
                snapshot.people.len()
            )));
        }
        let config = snapshot
            .config
            .validate()
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let mut registry = Self::from_parts(snapshot.dictionary, config);
        for person in snapshot.people {
            if registry.people.insert(person.id, person).is_some() {
                return Err(StorageError::Corrupt("duplicate person id".to_string()));
            }
        }
        registry.rebuild_index();

        debug!(
            people = registry.len(),
            created_at = %snapshot.header.created_at,
            "loaded snapshot"
        );
        Ok(registry)
    }

    /// Writes a snapshot to `path`, replacing any existing file.
    ///
    /// The blob goes to a sibling temp file first and is renamed into place
    /// once synced.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the file cannot be written.
    pub fn store_to_path(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let bytes = self.store()?;

        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), people = self.len(), bytes = bytes.len(), "wrote snapshot");
        Ok(())
    }

    /// Reads a snapshot from `path`.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the file cannot be read, or any error
    /// from [`PersonRegistry::load`].
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let bytes = fs::read(path.as_ref())?;
        Self::load(&bytes)
    }
}
