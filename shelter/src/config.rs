//! Configuration-related functionality.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{Collection, Error, MarkerFields, Shelter, Value};

/// Dashboard configuration. Every setting has a default, so an empty (or
/// missing) configuration file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database holding the record collection.
    pub database: PathBuf,
    /// Name of the record collection.
    pub collection: String,
    /// How long to wait for the record store before giving up on a query.
    pub query_timeout_ms: u64,
    /// Number of rows per table page.
    pub page_size: usize,
    /// Record fields used for the map marker.
    pub fields: MarkerFields,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("shelter.db"),
            collection: "animals".to_string(),
            query_timeout_ms: 5000,
            page_size: 10,
            fields: MarkerFields::default(),
        }
    }
}

impl Config {
    /// Load configuration from the given file if it exists, falling back to
    /// the defaults otherwise. The format is detected from the file
    /// extension.
    pub fn load<P: AsRef<Path>>(maybe_config_file: P) -> Result<Self> {
        let maybe_config_file = maybe_config_file.as_ref();
        let existing = if maybe_config_file.exists() {
            Some(maybe_config_file.canonicalize()?)
        } else {
            None
        };
        match existing {
            Some(config_path) => {
                let config = Value::load_from_file(&config_path)
                    .map_err(eyre::Report::from)
                    .and_then(Self::from_value)
                    .wrap_err_with(|| Error::FailedToLoadConfig(config_path.clone()))?;
                debug!("Loaded configuration from {}", config_path.display());
                Ok(config)
            }
            None => {
                debug!(
                    "No such configuration file, using defaults: {}",
                    maybe_config_file.display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Interpret an already loaded value as configuration.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(JsonValue::from(value))?)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Open the configured collection and wrap it in a client.
    pub fn open_shelter(&self) -> Result<Shelter<Collection>> {
        let collection = Collection::open(&self.database, &self.collection)
            .wrap_err_with(|| format!("failed to open {}", self.database.display()))?;
        Ok(Shelter::new(collection, self.query_timeout()))
    }
}
