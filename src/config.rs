// config lets you read a separate config file
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::Result;
use crate::persist::PersistenceMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    File,
    Memory,
}

/// Console settings, layered from defaults, an optional `hbnb.*` file in
/// the working directory and `HBNB_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub storage_file: String,
    pub persistence: Persistence,
    pub startup_script: Option<String>,
    pub prompt: String,
    pub log_filter: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from("hbnb")
    }

    /// `name` is a file stem; any format the config crate knows is accepted.
    pub fn load_from(name: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("storage_file", "file.json")?
            .set_default("persistence", "file")?
            .set_default("prompt", "(hbnb) ")?
            .set_default("log_filter", "warn")?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("HBNB"))
            .build()?;
        Ok(settings.try_deserialize::<Settings>()?)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        match self.persistence {
            Persistence::File => PersistenceMode::File(PathBuf::from(&self.storage_file)),
            Persistence::Memory => PersistenceMode::InMemory,
        }
    }
}
