use chrono::NaiveDateTime;
use log::{debug, error};

use crate::{
    CreateError, DeleteError, Exercise, ExerciseGroup, ExerciseGroupID, ExerciseGroupRepository,
    ExerciseGroupService, ExerciseID, ExerciseRepository, ExerciseService, Name, Performance,
    PerformanceID, PerformanceRepository, PerformanceService, ReadError, Set, UpdateError,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::NotFound => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: ExerciseRepository> ExerciseService for Service<R> {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercises(),
            ReadError,
            "get",
            "exercises"
        )
    }

    async fn get_exercise(&self, id: ExerciseID) -> Result<Exercise, ReadError> {
        let exercises = self.get_exercises().await?;
        exercises
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(ReadError::NotFound)
    }

    async fn create_exercise(
        &self,
        name: Name,
        group_id: Option<ExerciseGroupID>,
    ) -> Result<Exercise, CreateError> {
        log_on_error!(
            self.repository.create_exercise(name, group_id),
            CreateError,
            "create",
            "exercise"
        )
    }

    async fn replace_exercise(&self, exercise: Exercise) -> Result<Exercise, UpdateError> {
        log_on_error!(
            self.repository.replace_exercise(exercise),
            UpdateError,
            "replace",
            "exercise"
        )
    }

    async fn delete_exercise(&self, id: ExerciseID) -> Result<ExerciseID, DeleteError> {
        log_on_error!(
            self.repository.delete_exercise(id),
            DeleteError,
            "delete",
            "exercise"
        )
    }
}

impl<R: ExerciseGroupRepository> ExerciseGroupService for Service<R> {
    async fn get_exercise_groups(&self) -> Result<Vec<ExerciseGroup>, ReadError> {
        log_on_error!(
            self.repository.read_exercise_groups(),
            ReadError,
            "get",
            "exercise groups"
        )
    }

    async fn get_exercise_group(&self, id: ExerciseGroupID) -> Result<ExerciseGroup, ReadError> {
        let groups = self.get_exercise_groups().await?;
        groups
            .into_iter()
            .find(|g| g.id == id)
            .ok_or(ReadError::NotFound)
    }

    async fn create_exercise_group(&self, name: Name) -> Result<ExerciseGroup, CreateError> {
        log_on_error!(
            self.repository.create_exercise_group(name),
            CreateError,
            "create",
            "exercise group"
        )
    }

    async fn replace_exercise_group(
        &self,
        exercise_group: ExerciseGroup,
    ) -> Result<ExerciseGroup, UpdateError> {
        log_on_error!(
            self.repository.replace_exercise_group(exercise_group),
            UpdateError,
            "replace",
            "exercise group"
        )
    }

    async fn delete_exercise_group(
        &self,
        id: ExerciseGroupID,
    ) -> Result<ExerciseGroupID, DeleteError> {
        log_on_error!(
            self.repository.delete_exercise_group(id),
            DeleteError,
            "delete",
            "exercise group"
        )
    }
}

impl<R: PerformanceRepository> PerformanceService for Service<R> {
    async fn get_performance(&self, id: PerformanceID) -> Result<Performance, ReadError> {
        log_on_error!(
            self.repository.read_performance(id),
            ReadError,
            "get",
            "performance"
        )
    }

    async fn get_performances(
        &self,
        exercise_id: ExerciseID,
    ) -> Result<Vec<Performance>, ReadError> {
        let mut performances = log_on_error!(
            self.repository.read_performances(exercise_id),
            ReadError,
            "get",
            "performances"
        )?;
        performances.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(performances)
    }

    async fn create_performance(
        &self,
        exercise_id: ExerciseID,
        date: NaiveDateTime,
        notes: String,
        sets: Vec<Set>,
    ) -> Result<Performance, CreateError> {
        log_on_error!(
            self.repository
                .create_performance(exercise_id, date, notes, sets),
            CreateError,
            "create",
            "performance"
        )
    }

    async fn replace_performance(
        &self,
        performance: Performance,
    ) -> Result<Performance, UpdateError> {
        log_on_error!(
            self.repository.replace_performance(performance),
            UpdateError,
            "replace",
            "performance"
        )
    }

    async fn delete_performance(&self, id: PerformanceID) -> Result<PerformanceID, DeleteError> {
        log_on_error!(
            self.repository.delete_performance(id),
            DeleteError,
            "delete",
            "performance"
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::{Reps, StorageError, Weight};

    use super::*;

    #[derive(Default)]
    struct Repository {
        performances: RefCell<Vec<Performance>>,
        fail: bool,
    }

    impl PerformanceRepository for Repository {
        async fn read_performance(&self, id: PerformanceID) -> Result<Performance, ReadError> {
            if self.fail {
                return Err(StorageError::Corrupt("x".to_string()).into());
            }
            self.performances
                .borrow()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(ReadError::NotFound)
        }

        async fn read_performances(
            &self,
            exercise_id: ExerciseID,
        ) -> Result<Vec<Performance>, ReadError> {
            Ok(self
                .performances
                .borrow()
                .iter()
                .filter(|p| p.exercise_id == exercise_id)
                .cloned()
                .collect())
        }

        async fn create_performance(
            &self,
            exercise_id: ExerciseID,
            date: NaiveDateTime,
            notes: String,
            sets: Vec<Set>,
        ) -> Result<Performance, CreateError> {
            let performance = Performance {
                id: (self.performances.borrow().len() as u128 + 1).into(),
                exercise_id,
                date,
                sets,
                notes,
            };
            self.performances.borrow_mut().push(performance.clone());
            Ok(performance)
        }

        async fn replace_performance(
            &self,
            _: Performance,
        ) -> Result<Performance, UpdateError> {
            Err(UpdateError::NotFound)
        }

        async fn delete_performance(
            &self,
            _: PerformanceID,
        ) -> Result<PerformanceID, DeleteError> {
            Err(DeleteError::Storage(StorageError::Corrupt("x".to_string())))
        }
    }

    fn date(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn sets() -> Vec<Set> {
        vec![Set::new(
            Weight::new(60.0).unwrap(),
            Reps::new(5).unwrap(),
            0,
        )]
    }

    #[tokio::test]
    async fn test_get_performances_most_recent_first() {
        let service = Service::new(Repository::default());
        for day in [3, 9, 1] {
            service
                .create_performance(1.into(), date(day), String::new(), sets())
                .await
                .unwrap();
        }
        service
            .create_performance(2.into(), date(5), String::new(), sets())
            .await
            .unwrap();

        assert_eq!(
            service
                .get_performances(1.into())
                .await
                .unwrap()
                .iter()
                .map(|p| p.date)
                .collect::<Vec<_>>(),
            vec![date(9), date(3), date(1)]
        );
    }

    #[tokio::test]
    async fn test_get_performance() {
        let service = Service::new(Repository::default());
        let created = service
            .create_performance(1.into(), date(2), String::from("easy"), sets())
            .await
            .unwrap();

        assert_eq!(service.get_performance(created.id).await.unwrap(), created);
        assert!(matches!(
            service.get_performance(42.into()).await,
            Err(ReadError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_errors_are_passed_through() {
        let service = Service::new(Repository {
            fail: true,
            ..Repository::default()
        });

        assert!(matches!(
            service.get_performance(1.into()).await,
            Err(ReadError::Storage(StorageError::Corrupt(_)))
        ));
        assert!(matches!(
            service
                .replace_performance(Performance {
                    id: 1.into(),
                    exercise_id: 1.into(),
                    date: date(1),
                    sets: sets(),
                    notes: String::new(),
                })
                .await,
            Err(UpdateError::NotFound)
        ));
        assert!(matches!(
            service.delete_performance(1.into()).await,
            Err(DeleteError::Storage(_))
        ));
    }
}
