use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::identity::domain::identity_store::{IdentityStore, IdentityStoreError};

/// One enrolled person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub face_id: i64,
    pub name: String,
}

/// Identity store backed by a JSON array of [`IdentityRecord`]s.
///
/// The file is loaded on first use; until it exists every call reports
/// `NotReady` and the next call tries again.
pub struct JsonIdentityStore {
    path: PathBuf,
    names: Option<HashMap<i64, String>>,
}

impl JsonIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            names: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn loaded(&mut self) -> Result<&HashMap<i64, String>, IdentityStoreError> {
        if self.names.is_none() {
            self.names = Some(self.load()?);
        }
        self.names
            .as_ref()
            .ok_or_else(|| IdentityStoreError::NotReady(self.path.clone()))
    }

    fn load(&self) -> Result<HashMap<i64, String>, IdentityStoreError> {
        if !self.path.is_file() {
            return Err(IdentityStoreError::NotReady(self.path.clone()));
        }
        let json = fs::read_to_string(&self.path).map_err(|e| IdentityStoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let records: Vec<IdentityRecord> =
            serde_json::from_str(&json).map_err(|e| IdentityStoreError::Parse {
                path: self.path.clone(),
                source: e,
            })?;
        log::info!(
            "Loaded {} identities from {}",
            records.len(),
            self.path.display()
        );
        Ok(records.into_iter().map(|r| (r.face_id, r.name)).collect())
    }
}

impl IdentityStore for JsonIdentityStore {
    fn lookup(&mut self, face_id: i64) -> Result<Option<String>, IdentityStoreError> {
        Ok(self.loaded()?.get(&face_id).cloned())
    }

    fn count(&mut self) -> Result<usize, IdentityStoreError> {
        Ok(self.loaded()?.len())
    }
}
