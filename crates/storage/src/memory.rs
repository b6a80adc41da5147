use std::sync::{Mutex, PoisonError};

use gymlog_domain::StorageError;

use crate::{Backend, Database};

/// Keeps the database in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct Memory {
    database: Mutex<Database>,
}

impl Memory {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database: Mutex::new(database),
        }
    }
}

impl Backend for Memory {
    fn load(&self) -> Result<Database, StorageError> {
        Ok(self
            .database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, database: Database) -> Result<(), StorageError> {
        *self.database.lock().unwrap_or_else(PoisonError::into_inner) = database;
        Ok(())
    }
}
