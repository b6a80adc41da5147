//! Persisted data model shared by all local stores.
//!
//! Records are kept in plain serde structs and converted from and to the
//! domain types at the boundary. Weights are stored as `f64`, which holds
//! every `f32` exactly and survives a JSON round trip unchanged.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use gymlog_app::{Settings, log};
use gymlog_domain as domain;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Database {
    pub exercise_groups: Vec<ExerciseGroup>,
    pub exercises: Vec<Exercise>,
    pub performances: Vec<Performance>,
    pub settings: Option<Settings>,
    pub log: VecDeque<log::Entry>,
}

impl Database {
    pub fn read_exercise_groups(&self) -> Result<Vec<domain::ExerciseGroup>, domain::StorageError> {
        self.exercise_groups
            .iter()
            .cloned()
            .map(|g| domain::ExerciseGroup::try_from(g).map_err(corrupt))
            .collect()
    }

    pub fn create_exercise_group(
        &mut self,
        name: domain::Name,
    ) -> Result<domain::ExerciseGroup, domain::CreateError> {
        if self.exercise_groups.iter().any(|g| g.name == name.to_string()) {
            return Err(domain::CreateError::Conflict);
        }
        let exercise_group = domain::ExerciseGroup {
            id: Uuid::new_v4().into(),
            name,
        };
        self.exercise_groups.push(ExerciseGroup::from(&exercise_group));
        Ok(exercise_group)
    }

    pub fn replace_exercise_group(
        &mut self,
        exercise_group: domain::ExerciseGroup,
    ) -> Result<domain::ExerciseGroup, domain::UpdateError> {
        let id = *exercise_group.id;
        if self
            .exercise_groups
            .iter()
            .any(|g| g.id != id && g.name == exercise_group.name.to_string())
        {
            return Err(domain::UpdateError::Conflict);
        }
        let stored = self
            .exercise_groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(domain::UpdateError::NotFound)?;
        *stored = ExerciseGroup::from(&exercise_group);
        Ok(exercise_group)
    }

    pub fn delete_exercise_group(
        &mut self,
        id: domain::ExerciseGroupID,
    ) -> Result<domain::ExerciseGroupID, domain::DeleteError> {
        let len = self.exercise_groups.len();
        self.exercise_groups.retain(|g| g.id != *id);
        if self.exercise_groups.len() == len {
            return Err(domain::DeleteError::NotFound);
        }
        for exercise in &mut self.exercises {
            if exercise.group_id == Some(*id) {
                exercise.group_id = None;
            }
        }
        Ok(id)
    }

    pub fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::StorageError> {
        self.exercises
            .iter()
            .cloned()
            .map(|e| domain::Exercise::try_from(e).map_err(corrupt))
            .collect()
    }

    pub fn create_exercise(
        &mut self,
        name: domain::Name,
        group_id: Option<domain::ExerciseGroupID>,
    ) -> Result<domain::Exercise, domain::CreateError> {
        if !self.has_exercise_group(group_id) {
            return Err(domain::CreateError::NotFound);
        }
        if self.exercises.iter().any(|e| e.name == name.to_string()) {
            return Err(domain::CreateError::Conflict);
        }
        let exercise = domain::Exercise {
            id: Uuid::new_v4().into(),
            name,
            group_id,
        };
        self.exercises.push(Exercise::from(&exercise));
        Ok(exercise)
    }

    pub fn replace_exercise(
        &mut self,
        exercise: domain::Exercise,
    ) -> Result<domain::Exercise, domain::UpdateError> {
        let id = *exercise.id;
        if !self.has_exercise_group(exercise.group_id) {
            return Err(domain::UpdateError::NotFound);
        }
        if self
            .exercises
            .iter()
            .any(|e| e.id != id && e.name == exercise.name.to_string())
        {
            return Err(domain::UpdateError::Conflict);
        }
        let stored = self
            .exercises
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(domain::UpdateError::NotFound)?;
        *stored = Exercise::from(&exercise);
        Ok(exercise)
    }

    /// Deletes the exercise together with its performances.
    pub fn delete_exercise(
        &mut self,
        id: domain::ExerciseID,
    ) -> Result<domain::ExerciseID, domain::DeleteError> {
        let len = self.exercises.len();
        self.exercises.retain(|e| e.id != *id);
        if self.exercises.len() == len {
            return Err(domain::DeleteError::NotFound);
        }
        self.performances.retain(|p| p.exercise_id != *id);
        Ok(id)
    }

    pub fn read_performance(
        &self,
        id: domain::PerformanceID,
    ) -> Result<domain::Performance, domain::ReadError> {
        let performance = self
            .performances
            .iter()
            .find(|p| p.id == *id)
            .ok_or(domain::ReadError::NotFound)?;
        domain::Performance::try_from(performance.clone()).map_err(|err| corrupt(err).into())
    }

    pub fn read_performances(
        &self,
        exercise_id: domain::ExerciseID,
    ) -> Result<Vec<domain::Performance>, domain::StorageError> {
        self.performances
            .iter()
            .filter(|p| p.exercise_id == *exercise_id)
            .cloned()
            .map(|p| domain::Performance::try_from(p).map_err(corrupt))
            .collect()
    }

    pub fn create_performance(
        &mut self,
        exercise_id: domain::ExerciseID,
        date: NaiveDateTime,
        notes: String,
        sets: Vec<domain::Set>,
    ) -> Result<domain::Performance, domain::CreateError> {
        if !self.exercises.iter().any(|e| e.id == *exercise_id) {
            return Err(domain::CreateError::NotFound);
        }
        let performance = domain::Performance {
            id: Uuid::new_v4().into(),
            exercise_id,
            date,
            sets,
            notes,
        };
        self.performances.push(Performance::from(&performance));
        Ok(performance)
    }

    pub fn replace_performance(
        &mut self,
        performance: domain::Performance,
    ) -> Result<domain::Performance, domain::UpdateError> {
        if !self.exercises.iter().any(|e| e.id == *performance.exercise_id) {
            return Err(domain::UpdateError::NotFound);
        }
        let stored = self
            .performances
            .iter_mut()
            .find(|p| p.id == *performance.id)
            .ok_or(domain::UpdateError::NotFound)?;
        *stored = Performance::from(&performance);
        Ok(performance)
    }

    pub fn delete_performance(
        &mut self,
        id: domain::PerformanceID,
    ) -> Result<domain::PerformanceID, domain::DeleteError> {
        let len = self.performances.len();
        self.performances.retain(|p| p.id != *id);
        if self.performances.len() == len {
            return Err(domain::DeleteError::NotFound);
        }
        Ok(id)
    }

    fn has_exercise_group(&self, group_id: Option<domain::ExerciseGroupID>) -> bool {
        group_id.is_none_or(|group_id| self.exercise_groups.iter().any(|g| g.id == *group_id))
    }
}

fn corrupt(err: impl std::error::Error) -> domain::StorageError {
    domain::StorageError::Corrupt(err.to_string())
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExerciseGroup {
    pub id: Uuid,
    pub name: String,
}

impl From<&domain::ExerciseGroup> for ExerciseGroup {
    fn from(value: &domain::ExerciseGroup) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
        }
    }
}

impl TryFrom<ExerciseGroup> for domain::ExerciseGroup {
    type Error = domain::NameError;

    fn try_from(value: ExerciseGroup) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            group_id: value.group_id.map(|id| *id),
        }
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = domain::NameError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            group_id: value.group_id.map(domain::ExerciseGroupID::from),
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Performance {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub date: NaiveDateTime,
    pub notes: String,
    pub sets: Vec<Set>,
}

impl From<&domain::Performance> for Performance {
    fn from(value: &domain::Performance) -> Self {
        Self {
            id: *value.id,
            exercise_id: *value.exercise_id,
            date: value.date,
            notes: value.notes.clone(),
            sets: value.sets.iter().map(Set::from).collect(),
        }
    }
}

impl TryFrom<Performance> for domain::Performance {
    type Error = SetError;

    fn try_from(value: Performance) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            exercise_id: value.exercise_id.into(),
            date: value.date,
            sets: value
                .sets
                .into_iter()
                .map(domain::Set::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            notes: value.notes,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Set {
    pub weight: f64,
    pub reps: u32,
    pub order: u32,
}

impl From<&domain::Set> for Set {
    fn from(value: &domain::Set) -> Self {
        Self {
            weight: f64::from(f32::from(value.weight)),
            reps: u32::from(value.reps),
            order: value.order,
        }
    }
}

impl TryFrom<Set> for domain::Set {
    type Error = SetError;

    fn try_from(value: Set) -> Result<Self, Self::Error> {
        #[allow(clippy::cast_possible_truncation)]
        let weight = domain::Weight::new(value.weight as f32)?;
        Ok(Self {
            weight,
            reps: domain::Reps::new(value.reps)?,
            order: value.order,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SetError {
    #[error(transparent)]
    Weight(#[from] domain::WeightError),
    #[error(transparent)]
    Reps(#[from] domain::RepsError),
}
