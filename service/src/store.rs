//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Player record persistence

use crate::error::StoreError;
use crate::types::Level;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Persisted player data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Capitalized player name
    pub name: String,
    /// PHC password hash
    pub password: String,
    /// Privilege level
    #[serde(default)]
    pub level: Level,
}

/// Storage backend for player records
///
/// Names are looked up exactly as given; the login dialogue capitalizes them first.
pub trait PlayerStore: fmt::Debug {
    /// Load the record for `name`, or `None` if the player does not exist
    fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StoreError>;

    /// Create or replace a record
    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError>;
}

/// Store backed by a shared map
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, PlayerRecord>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing has been saved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(name).cloned())
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }
}

/// Store keeping one JSON document per player in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the record for `name`
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl PlayerStore for FileStore {
    fn load(&self, name: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let path = self.path_for(name)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "No player file");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let record = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded player file");
        Ok(Some(record))
    }

    fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let path = self.path_for(&record.name)?;
        std::fs::create_dir_all(&self.dir)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(record)?)?;
        std::fs::rename(&staging, &path)?;
        debug!(path = %path.display(), "Saved player file");
        Ok(())
    }
}
