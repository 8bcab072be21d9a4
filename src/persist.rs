// used for persistence
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HbnbError, Result};

/// The persisted document: store key to serialized entity mapping.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Nothing touches the disk; saves are still counted.
    InMemory,
    /// One JSON document at the given path.
    File(PathBuf),
}

// ------------- Persistence -------------
#[derive(Debug)]
pub struct Persistor {
    mode: PersistenceMode,
    flushes: usize,
}
impl Persistor {
    pub fn new(mode: PersistenceMode) -> Self {
        Self { mode, flushes: 0 }
    }
    /// How many times a complete document has been written since creation.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
    /// Replaces the persisted document with `document`. The new content is
    /// written next to the target and renamed over it, so a reader never
    /// sees a half written document.
    pub fn write(&mut self, document: &Document) -> Result<()> {
        if let PersistenceMode::File(path) = &self.mode {
            let payload = serde_json::to_vec(document).map_err(|e| {
                HbnbError::Persistence(format!("could not encode {}: {}", path.display(), e))
            })?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| failure("prepare directory for", path, e))?;
            }
            let temporary = temporary_path(path);
            fs::write(&temporary, payload).map_err(|e| failure("write", &temporary, e))?;
            fs::rename(&temporary, path).map_err(|e| failure("replace", path, e))?;
            debug!(path = %path.display(), entries = document.len(), "document written");
        }
        self.flushes += 1;
        Ok(())
    }
    /// Reads the persisted document. `None` when there is nothing to read,
    /// either because the file does not exist yet or because the store is
    /// kept in memory.
    pub fn read(&self) -> Result<Option<Document>> {
        let PersistenceMode::File(path) = &self.mode else {
            return Ok(None);
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(failure("read", path, e)),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(Some(document)),
            Ok(_) => Err(HbnbError::DataCorruption {
                message: format!("{} does not hold a JSON object", path.display()),
            }),
            Err(e) => Err(HbnbError::DataCorruption {
                message: format!("{} is not valid JSON: {}", path.display(), e),
            }),
        }
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut temporary = path.as_os_str().to_owned();
    temporary.push(".tmp");
    PathBuf::from(temporary)
}

fn failure(action: &str, path: &Path, e: std::io::Error) -> HbnbError {
    HbnbError::Persistence(format!("could not {} {}: {}", action, path.display(), e))
}
