//! Persistence operations for InMemory database
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory database state to/from JSON files.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{CollectionState, InMemory};
use crate::{Result, backend::BackendError};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Serializable version of InMemory database for persistence
#[derive(Serialize, Deserialize)]
struct SerializableDatabase {
    /// File format version for compatibility checking
    #[serde(rename = "_v", default)]
    version: u8,
    #[serde(default)]
    collections: HashMap<String, CollectionState>,
}

/// Save the in-memory database to a JSON file
pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let path = path.as_ref();
    let snapshot = SerializableDatabase {
        version: PERSISTENCE_VERSION,
        collections: backend.collections.read().await.clone(),
    };

    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| BackendError::SerializationFailed { source: e })?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| BackendError::FileIo { source: e })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| BackendError::FileIo { source: e })?;

    Ok(())
}

/// Load the in-memory database from a JSON file
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };

    let snapshot: SerializableDatabase = serde_json::from_str(&json)
        .map_err(|e| BackendError::DeserializationFailed { source: e })?;

    if snapshot.version != PERSISTENCE_VERSION {
        return Err(BackendError::UnsupportedVersion {
            found: snapshot.version,
            expected: PERSISTENCE_VERSION,
        }
        .into());
    }

    Ok(InMemory {
        collections: RwLock::new(snapshot.collections),
    })
}
