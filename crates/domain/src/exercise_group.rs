use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, DeleteError, Name, ReadError, UpdateError, ValidationError};

#[allow(async_fn_in_trait)]
pub trait ExerciseGroupService {
    async fn get_exercise_groups(&self) -> Result<Vec<ExerciseGroup>, ReadError>;
    async fn get_exercise_group(&self, id: ExerciseGroupID) -> Result<ExerciseGroup, ReadError>;
    async fn create_exercise_group(&self, name: Name) -> Result<ExerciseGroup, CreateError>;
    async fn replace_exercise_group(
        &self,
        exercise_group: ExerciseGroup,
    ) -> Result<ExerciseGroup, UpdateError>;
    async fn delete_exercise_group(
        &self,
        id: ExerciseGroupID,
    ) -> Result<ExerciseGroupID, DeleteError>;

    async fn validate_exercise_group_name(
        &self,
        name: &str,
        id: ExerciseGroupID,
    ) -> Result<Name, ValidationError> {
        let name = Name::new(name).map_err(|err| ValidationError::Other(err.into()))?;
        let groups = self
            .get_exercise_groups()
            .await
            .map_err(|err| ValidationError::Other(err.into()))?;
        if groups.iter().any(|g| g.id != id && g.name == name) {
            return Err(ValidationError::Conflict("name".to_string()));
        }
        Ok(name)
    }
}

/// Deleting a group keeps its exercises, they become ungrouped.
#[allow(async_fn_in_trait)]
pub trait ExerciseGroupRepository {
    async fn read_exercise_groups(&self) -> Result<Vec<ExerciseGroup>, ReadError>;
    async fn create_exercise_group(&self, name: Name) -> Result<ExerciseGroup, CreateError>;
    async fn replace_exercise_group(
        &self,
        exercise_group: ExerciseGroup,
    ) -> Result<ExerciseGroup, UpdateError>;
    async fn delete_exercise_group(
        &self,
        id: ExerciseGroupID,
    ) -> Result<ExerciseGroupID, DeleteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseGroup {
    pub id: ExerciseGroupID,
    pub name: Name,
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseGroupID(Uuid);

impl ExerciseGroupID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseGroupID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseGroupID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
