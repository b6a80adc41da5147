use chrono::NaiveDateTime;
use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, DeleteError, ExerciseID, ReadError, Set, UpdateError};

#[allow(async_fn_in_trait)]
pub trait PerformanceService {
    async fn get_performance(&self, id: PerformanceID) -> Result<Performance, ReadError>;
    /// Performances of an exercise, most recent first.
    async fn get_performances(&self, exercise_id: ExerciseID)
    -> Result<Vec<Performance>, ReadError>;
    async fn create_performance(
        &self,
        exercise_id: ExerciseID,
        date: NaiveDateTime,
        notes: String,
        sets: Vec<Set>,
    ) -> Result<Performance, CreateError>;
    async fn replace_performance(
        &self,
        performance: Performance,
    ) -> Result<Performance, UpdateError>;
    async fn delete_performance(&self, id: PerformanceID) -> Result<PerformanceID, DeleteError>;
}

#[allow(async_fn_in_trait)]
pub trait PerformanceRepository {
    async fn read_performance(&self, id: PerformanceID) -> Result<Performance, ReadError>;
    async fn read_performances(
        &self,
        exercise_id: ExerciseID,
    ) -> Result<Vec<Performance>, ReadError>;
    async fn create_performance(
        &self,
        exercise_id: ExerciseID,
        date: NaiveDateTime,
        notes: String,
        sets: Vec<Set>,
    ) -> Result<Performance, CreateError>;
    async fn replace_performance(
        &self,
        performance: Performance,
    ) -> Result<Performance, UpdateError>;
    async fn delete_performance(&self, id: PerformanceID) -> Result<PerformanceID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub id: PerformanceID,
    pub exercise_id: ExerciseID,
    pub date: NaiveDateTime,
    pub sets: Vec<Set>,
    pub notes: String,
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PerformanceID(Uuid);

impl PerformanceID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for PerformanceID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for PerformanceID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
