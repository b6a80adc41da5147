#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! Local stores
//!
//! A store keeps the complete [`Database`] in a [`Backend`]. Every operation
//! loads the database, applies the change and writes it back while holding the
//! store lock, so a failing operation never leaves partial changes behind.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use chrono::NaiveDateTime;
use gymlog_app::{Settings, SettingsRepository, log};
use gymlog_domain as domain;

pub mod database;
pub mod file;
pub mod memory;

pub use database::Database;
pub use file::File;
pub use memory::Memory;

pub type InMemory = Local<Memory>;
pub type FileStorage = Local<File>;

pub trait Backend: Send + Sync + 'static {
    fn load(&self) -> Result<Database, domain::StorageError>;
    fn store(&self, database: Database) -> Result<(), domain::StorageError>;
}

pub struct Local<B> {
    backend: B,
    lock: Mutex<()>,
}

impl<B: Backend> Local<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn read<T, E: From<domain::StorageError>>(
        &self,
        f: impl FnOnce(&Database) -> Result<T, E>,
    ) -> Result<T, E> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let database = self.backend.load()?;
        f(&database)
    }

    fn write<T, E: From<domain::StorageError>>(
        &self,
        f: impl FnOnce(&mut Database) -> Result<T, E>,
    ) -> Result<T, E> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut database = self.backend.load()?;
        let result = f(&mut database)?;
        self.backend.store(database)?;
        Ok(result)
    }
}

impl<B: Backend> domain::ExerciseGroupRepository for Local<B> {
    async fn read_exercise_groups(
        &self,
    ) -> Result<Vec<domain::ExerciseGroup>, domain::ReadError> {
        self.read(|db| Ok(db.read_exercise_groups()?))
    }

    async fn create_exercise_group(
        &self,
        name: domain::Name,
    ) -> Result<domain::ExerciseGroup, domain::CreateError> {
        self.write(|db| db.create_exercise_group(name))
    }

    async fn replace_exercise_group(
        &self,
        exercise_group: domain::ExerciseGroup,
    ) -> Result<domain::ExerciseGroup, domain::UpdateError> {
        self.write(|db| db.replace_exercise_group(exercise_group))
    }

    async fn delete_exercise_group(
        &self,
        id: domain::ExerciseGroupID,
    ) -> Result<domain::ExerciseGroupID, domain::DeleteError> {
        self.write(|db| db.delete_exercise_group(id))
    }
}

impl<B: Backend> domain::ExerciseRepository for Local<B> {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        self.read(|db| Ok(db.read_exercises()?))
    }

    async fn create_exercise(
        &self,
        name: domain::Name,
        group_id: Option<domain::ExerciseGroupID>,
    ) -> Result<domain::Exercise, domain::CreateError> {
        self.write(|db| db.create_exercise(name, group_id))
    }

    async fn replace_exercise(
        &self,
        exercise: domain::Exercise,
    ) -> Result<domain::Exercise, domain::UpdateError> {
        self.write(|db| db.replace_exercise(exercise))
    }

    async fn delete_exercise(
        &self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        self.write(|db| db.delete_exercise(id))
    }
}

impl<B: Backend> domain::PerformanceRepository for Local<B> {
    async fn read_performance(
        &self,
        id: domain::PerformanceID,
    ) -> Result<domain::Performance, domain::ReadError> {
        self.read(|db| db.read_performance(id))
    }

    async fn read_performances(
        &self,
        exercise_id: domain::ExerciseID,
    ) -> Result<Vec<domain::Performance>, domain::ReadError> {
        self.read(|db| Ok(db.read_performances(exercise_id)?))
    }

    async fn create_performance(
        &self,
        exercise_id: domain::ExerciseID,
        date: NaiveDateTime,
        notes: String,
        sets: Vec<domain::Set>,
    ) -> Result<domain::Performance, domain::CreateError> {
        self.write(|db| db.create_performance(exercise_id, date, notes, sets))
    }

    async fn replace_performance(
        &self,
        performance: domain::Performance,
    ) -> Result<domain::Performance, domain::UpdateError> {
        self.write(|db| db.replace_performance(performance))
    }

    async fn delete_performance(
        &self,
        id: domain::PerformanceID,
    ) -> Result<domain::PerformanceID, domain::DeleteError> {
        self.write(|db| db.delete_performance(id))
    }
}

impl<B: Backend> SettingsRepository for Local<B> {
    async fn read_settings(&self) -> Result<Settings, String> {
        self.read(|db| Ok::<_, domain::StorageError>(db.settings.unwrap_or_default()))
            .map_err(|err| err.to_string())
    }

    async fn write_settings(&self, settings: Settings) -> Result<(), String> {
        self.write(|db| {
            db.settings = Some(settings);
            db.log.truncate(settings.log_capacity);
            Ok::<_, domain::StorageError>(())
        })
        .map_err(|err| err.to_string())
    }
}

impl<B: Backend> log::Repository for Local<B> {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        self.read(|db| Ok::<_, domain::StorageError>(db.log.clone()))
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        self.write(|db| {
            db.log.push_front(entry);
            db.log.truncate(db.settings.unwrap_or_default().log_capacity);
            Ok::<_, domain::StorageError>(())
        })
        .map_err(|err| log::Error::Unknown(err.to_string()))
    }
}
