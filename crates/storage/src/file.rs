//! JSON file backend
//!
//! The whole database lives in a single JSON file. A missing file is an empty
//! database. Writes go to a temporary file next to the target which is then
//! renamed, so a crash never leaves a truncated file behind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use gymlog_domain::StorageError;

use crate::{Backend, Database};

#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for File {
    fn load(&self) -> Result<Database, StorageError> {
        read(&self.path).map_err(storage_error)
    }

    fn store(&self, database: Database) -> Result<(), StorageError> {
        write(&self.path, &database).map_err(storage_error)
    }
}

fn read(path: &Path) -> anyhow::Result<Database> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Database::default()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn write(path: &Path, database: &Database) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(database)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to rename {} to {}", tmp.display(), path.display()))
}

fn storage_error(err: anyhow::Error) -> StorageError {
    if err.downcast_ref::<serde_json::Error>().is_some() {
        StorageError::Corrupt(format!("{err:#}"))
    } else {
        StorageError::Other(err.into())
    }
}
