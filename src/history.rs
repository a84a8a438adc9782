//! Search history
//!
//! Cities a user looked up are kept as bookmarks in a flat JSON file. Each
//! entry gets a UUID so the front end can refresh or delete it later. Names are
//! de-duplicated on insert by exact match.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::Result;
use crate::error::CitycastError;

/// One bookmarked city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub id: String,
}

impl City {
    /// New record with a freshly generated identifier
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// Storage for searched city names
#[async_trait]
pub trait SearchHistory: Send + Sync {
    /// All stored records, oldest first
    async fn list(&self) -> Result<Vec<City>>;

    /// Store `name` unless an entry with exactly that name exists; returns the
    /// stored (or already existing) record
    async fn add(&self, name: &str) -> Result<City>;

    /// Delete the record with `id`; returns whether one was removed
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// History persisted as a pretty-printed JSON array
pub struct JsonFileHistory {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileHistory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<City>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("History file {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<City>>(&contents) {
            Ok(cities) => Ok(cities),
            Err(e) => {
                warn!(
                    "Ignoring unreadable history file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, cities: &[City]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(cities)
            .map_err(|e| CitycastError::history(format!("Failed to serialize history: {e}")))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchHistory for JsonFileHistory {
    async fn list(&self) -> Result<Vec<City>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    #[instrument(skip(self))]
    async fn add(&self, name: &str) -> Result<City> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CitycastError::validation("city cannot be blank"));
        }

        let _guard = self.lock.lock().await;
        let mut cities = self.read().await?;

        if let Some(existing) = cities.iter().find(|city| city.name == name) {
            debug!("City '{}' already in history as {}", name, existing.id);
            return Ok(existing.clone());
        }

        let city = City::new(name);
        cities.push(city.clone());
        self.write(&cities).await?;

        info!("Added '{}' to search history as {}", city.name, city.id);
        Ok(city)
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut cities = self.read().await?;

        let before = cities.len();
        cities.retain(|city| city.id != id);
        let removed = cities.len() != before;

        if removed {
            self.write(&cities).await?;
            info!("Removed {} from search history", id);
        } else {
            debug!("No history entry with id {}", id);
        }

        Ok(removed)
    }
}
