//! Editing session of a single performance.
//!
//! The editor keeps the weight rows shown to the user and the flat list of
//! sets derived from them. All edits go through the rows, the sets are
//! re-derived after every edit and are the only thing that gets persisted.

use chrono::NaiveDateTime;
use gymlog_domain::{
    CreateError, DeleteError, Exercise, ExerciseID, ExerciseService, Performance, PerformanceID,
    PerformanceService, ReadError, Reps, Set, UpdateError, Weight, WeightRow, WeightRows,
    sets_for_save,
};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Loading,
    Ready,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("The {0} could not be found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Storage(String),
}

impl EditorError {
    fn from_read_error(err: ReadError, entity: &'static str) -> Self {
        match err {
            ReadError::NotFound => EditorError::NotFound(entity),
            err => EditorError::Storage(format!("Failed to load {entity}: {err}")),
        }
    }

    fn from_create_error(err: CreateError) -> Self {
        match err {
            CreateError::NotFound => EditorError::NotFound("exercise"),
            err => EditorError::Storage(format!("Failed to save performance: {err}")),
        }
    }

    fn from_update_error(err: UpdateError) -> Self {
        match err {
            UpdateError::NotFound => EditorError::NotFound("performance"),
            err => EditorError::Storage(format!("Failed to save performance: {err}")),
        }
    }

    fn from_delete_error(err: DeleteError) -> Self {
        match err {
            DeleteError::NotFound => EditorError::NotFound("performance"),
            err => EditorError::Storage(format!("Failed to delete performance: {err}")),
        }
    }
}

pub struct PerformanceEditor<S> {
    service: S,
    state: State,
    exercise: Option<Exercise>,
    performance_id: Option<PerformanceID>,
    date: NaiveDateTime,
    notes: String,
    rows: WeightRows,
    sets: Vec<Set>,
    error: Option<EditorError>,
}

impl<S> PerformanceEditor<S>
where
    S: ExerciseService + PerformanceService,
{
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: State::Loading,
            exercise: None,
            performance_id: None,
            date: NaiveDateTime::default(),
            notes: String::new(),
            rows: WeightRows::default(),
            sets: vec![],
            error: None,
        }
    }

    /// Starts a new performance of the given exercise with a single empty row.
    pub async fn open_new(
        &mut self,
        exercise_id: ExerciseID,
        date: NaiveDateTime,
    ) -> Result<(), EditorError> {
        self.state = State::Loading;

        let exercise = match self.service.get_exercise(exercise_id).await {
            Ok(exercise) => exercise,
            Err(err) => return self.fail(EditorError::from_read_error(err, "exercise")),
        };

        self.exercise = Some(exercise);
        self.performance_id = None;
        self.date = date;
        self.notes = String::new();
        self.rows = WeightRows::initial();
        self.sets = self.rows.to_sets();
        self.error = None;
        self.transition(State::Ready);

        Ok(())
    }

    /// Loads a stored performance and groups its sets into rows.
    pub async fn open_existing(&mut self, id: PerformanceID) -> Result<(), EditorError> {
        self.state = State::Loading;

        let performance = match self.service.get_performance(id).await {
            Ok(performance) => performance,
            Err(err) => return self.fail(EditorError::from_read_error(err, "performance")),
        };
        let exercise = match self.service.get_exercise(performance.exercise_id).await {
            Ok(exercise) => exercise,
            Err(err) => return self.fail(EditorError::from_read_error(err, "exercise")),
        };

        self.exercise = Some(exercise);
        self.performance_id = Some(performance.id);
        self.date = performance.date;
        self.notes = performance.notes;
        self.rows = WeightRows::from_sets(&performance.sets);
        self.sets = self.rows.to_sets();
        self.error = None;
        self.transition(State::Ready);

        Ok(())
    }

    pub fn append_row(&mut self) {
        self.edit(WeightRows::append_row);
    }

    pub fn append_rep(&mut self, row: usize) {
        self.edit(|rows| rows.append_rep(row));
    }

    pub fn set_weight(&mut self, row: usize, weight: Weight) {
        self.edit(|rows| rows.set_weight(row, weight));
    }

    /// Sets the weight of a row from user input.
    ///
    /// Invalid input is recorded as error and leaves the rows unchanged.
    pub fn set_weight_input(&mut self, row: usize, input: &str) -> Result<(), EditorError> {
        match Weight::try_from(input) {
            Ok(weight) => {
                self.set_weight(row, weight);
                Ok(())
            }
            Err(err) => self.fail(EditorError::Validation(err.to_string())),
        }
    }

    pub fn set_reps(&mut self, row: usize, position: usize, reps: Reps) {
        self.edit(|rows| rows.set_reps(row, position, reps));
    }

    pub fn set_reps_input(
        &mut self,
        row: usize,
        position: usize,
        input: &str,
    ) -> Result<(), EditorError> {
        match Reps::try_from(input) {
            Ok(reps) => {
                self.set_reps(row, position, reps);
                Ok(())
            }
            Err(err) => self.fail(EditorError::Validation(err.to_string())),
        }
    }

    pub fn delete_row(&mut self, row: usize) {
        self.edit(|rows| rows.delete_row(row));
    }

    pub fn delete_rep(&mut self, row: usize, position: usize) {
        self.edit(|rows| rows.delete_rep(row, position));
    }

    pub fn set_notes(&mut self, notes: &str) {
        if self.is_editable() {
            self.notes = notes.to_string();
            self.resume_editing();
        }
    }

    pub fn set_date(&mut self, date: NaiveDateTime) {
        if self.is_editable() {
            self.date = date;
            self.resume_editing();
        }
    }

    /// Persists the current sets.
    ///
    /// Sets without reps are not stored. On failure the error is recorded,
    /// the editor returns to `Ready` and rows and sets stay as they were.
    pub async fn save(&mut self) -> Result<(), EditorError> {
        if !self.is_editable() {
            debug!("ignoring save in state {:?}", self.state);
            return Ok(());
        }
        let Some(exercise_id) = self.exercise.as_ref().map(|e| e.id) else {
            return Ok(());
        };

        self.transition(State::Saving);

        let sets = match sets_for_save(&self.sets) {
            Ok(sets) => sets,
            Err(err) => {
                self.transition(State::Ready);
                return self.fail(EditorError::Validation(err.to_string()));
            }
        };

        let result = match self.performance_id {
            None => self
                .service
                .create_performance(exercise_id, self.date, self.notes.clone(), sets)
                .await
                .map_err(EditorError::from_create_error),
            Some(id) => self
                .service
                .replace_performance(Performance {
                    id,
                    exercise_id,
                    date: self.date,
                    sets,
                    notes: self.notes.clone(),
                })
                .await
                .map_err(EditorError::from_update_error),
        };

        match result {
            Ok(performance) => {
                info!("saved performance with {} sets", performance.sets.len());
                self.performance_id = Some(performance.id);
                self.error = None;
                self.transition(State::Saved);
                Ok(())
            }
            Err(err) => {
                self.transition(State::Ready);
                self.fail(err)
            }
        }
    }

    /// Deletes the performance. A performance that was never saved is just
    /// discarded.
    pub async fn delete(&mut self) -> Result<(), EditorError> {
        if !self.is_editable() {
            debug!("ignoring delete in state {:?}", self.state);
            return Ok(());
        }

        let Some(id) = self.performance_id else {
            self.transition(State::Deleted);
            return Ok(());
        };

        self.transition(State::Deleting);

        match self.service.delete_performance(id).await {
            Ok(_) => {
                self.error = None;
                self.transition(State::Deleted);
                Ok(())
            }
            Err(err) => {
                self.transition(State::Ready);
                self.fail(EditorError::from_delete_error(err))
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.state, State::Loading | State::Saving | State::Deleting)
    }

    #[must_use]
    pub fn rows(&self) -> &[WeightRow] {
        &self.rows
    }

    #[must_use]
    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    #[must_use]
    pub fn error(&self) -> Option<&EditorError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    #[must_use]
    pub fn performance_id(&self) -> Option<PerformanceID> {
        self.performance_id
    }

    #[must_use]
    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    fn is_editable(&self) -> bool {
        matches!(self.state, State::Ready | State::Saved)
    }

    fn edit(&mut self, f: impl FnOnce(&mut WeightRows)) {
        if !self.is_editable() {
            debug!("ignoring edit in state {:?}", self.state);
            return;
        }
        f(&mut self.rows);
        self.sets = self.rows.to_sets();
        self.resume_editing();
    }

    fn resume_editing(&mut self) {
        if self.state != State::Ready {
            self.transition(State::Ready);
        }
    }

    fn transition(&mut self, state: State) {
        debug!("performance editor: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn fail(&mut self, err: EditorError) -> Result<(), EditorError> {
        warn!("{err}");
        self.error = Some(err.clone());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::NaiveDate;
    use gymlog_domain::{ExerciseGroupID, Name, StorageError};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeService {
        exercises: Vec<Exercise>,
        performances: RefCell<Vec<Performance>>,
        fail_writes: Cell<bool>,
    }

    impl FakeService {
        fn storage_error() -> StorageError {
            StorageError::Io(std::io::Error::other("disk full"))
        }
    }

    impl ExerciseService for FakeService {
        async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError> {
            Ok(self.exercises.clone())
        }

        async fn get_exercise(&self, id: ExerciseID) -> Result<Exercise, ReadError> {
            self.exercises
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .ok_or(ReadError::NotFound)
        }

        async fn create_exercise(
            &self,
            _: Name,
            _: Option<ExerciseGroupID>,
        ) -> Result<Exercise, CreateError> {
            unimplemented!()
        }

        async fn replace_exercise(&self, _: Exercise) -> Result<Exercise, UpdateError> {
            unimplemented!()
        }

        async fn delete_exercise(&self, _: ExerciseID) -> Result<ExerciseID, DeleteError> {
            unimplemented!()
        }
    }

    impl PerformanceService for FakeService {
        async fn get_performance(&self, id: PerformanceID) -> Result<Performance, ReadError> {
            self.performances
                .borrow()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(ReadError::NotFound)
        }

        async fn get_performances(
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
            if self.fail_writes.get() {
                return Err(Self::storage_error().into());
            }
            let performance = Performance {
                id: 100.into(),
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
            performance: Performance,
        ) -> Result<Performance, UpdateError> {
            if self.fail_writes.get() {
                return Err(Self::storage_error().into());
            }
            let mut performances = self.performances.borrow_mut();
            let Some(stored) = performances.iter_mut().find(|p| p.id == performance.id) else {
                return Err(UpdateError::NotFound);
            };
            *stored = performance.clone();
            Ok(performance)
        }

        async fn delete_performance(
            &self,
            id: PerformanceID,
        ) -> Result<PerformanceID, DeleteError> {
            if self.fail_writes.get() {
                return Err(Self::storage_error().into());
            }
            let mut performances = self.performances.borrow_mut();
            let len = performances.len();
            performances.retain(|p| p.id != id);
            if performances.len() == len {
                return Err(DeleteError::NotFound);
            }
            Ok(id)
        }
    }

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn set(weight: f32, reps: u32, order: u32) -> Set {
        Set::new(Weight::new(weight).unwrap(), Reps::new(reps).unwrap(), order)
    }

    fn row(weight: f32, reps: &[u32]) -> (Weight, Vec<Reps>) {
        (
            Weight::new(weight).unwrap(),
            reps.iter().map(|r| Reps::new(*r).unwrap()).collect(),
        )
    }

    fn rows<S>(editor: &PerformanceEditor<S>) -> Vec<(Weight, Vec<Reps>)>
    where
        S: ExerciseService + PerformanceService,
    {
        editor
            .rows()
            .iter()
            .map(|r| (r.weight, r.reps.clone()))
            .collect()
    }

    fn service() -> FakeService {
        FakeService {
            exercises: vec![Exercise {
                id: 1.into(),
                name: Name::new("Bench Press").unwrap(),
                group_id: None,
            }],
            performances: RefCell::new(vec![Performance {
                id: 10.into(),
                exercise_id: 1.into(),
                date: date(),
                sets: vec![
                    set(20.0, 8, 3),
                    set(22.0, 7, 2),
                    set(20.0, 10, 0),
                    set(20.0, 10, 1),
                ],
                notes: String::from("felt heavy"),
            }]),
            ..FakeService::default()
        }
    }

    async fn existing_performance() -> PerformanceEditor<FakeService> {
        let mut editor = PerformanceEditor::new(service());
        editor.open_existing(10.into()).await.unwrap();
        editor
    }

    async fn new_performance() -> PerformanceEditor<FakeService> {
        let mut editor = PerformanceEditor::new(service());
        editor.open_new(1.into(), date()).await.unwrap();
        editor
    }

    #[test]
    fn test_new_editor_is_loading() {
        let editor = PerformanceEditor::new(service());

        assert_eq!(editor.state(), State::Loading);
        assert!(editor.is_busy());
        assert!(editor.rows().is_empty());
    }

    #[tokio::test]
    async fn test_open_new() {
        let editor = new_performance().await;

        assert_eq!(editor.state(), State::Ready);
        assert_eq!(editor.rows(), &[WeightRow::new(Weight::ZERO, 0)]);
        assert!(editor.sets().is_empty());
        assert_eq!(editor.performance_id(), None);
        assert_eq!(editor.exercise().unwrap().id, 1.into());
    }

    #[tokio::test]
    async fn test_open_new_unknown_exercise() {
        let mut editor = PerformanceEditor::new(service());

        assert_eq!(
            editor.open_new(2.into(), date()).await,
            Err(EditorError::NotFound("exercise"))
        );
        assert_eq!(editor.state(), State::Loading);
        assert_eq!(
            editor.error().map(ToString::to_string),
            Some(String::from("The exercise could not be found"))
        );
    }

    #[tokio::test]
    async fn test_open_existing() {
        let editor = existing_performance().await;

        assert_eq!(editor.state(), State::Ready);
        assert_eq!(
            rows(&editor),
            vec![row(20.0, &[10, 10]), row(22.0, &[7]), row(20.0, &[8])]
        );
        assert_eq!(
            editor.rows().iter().map(|r| r.start_order).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(editor.notes(), "felt heavy");
        assert_eq!(editor.date(), date());
    }

    #[tokio::test]
    async fn test_open_existing_unknown_performance() {
        let mut editor = PerformanceEditor::new(service());

        assert_eq!(
            editor.open_existing(11.into()).await,
            Err(EditorError::NotFound("performance"))
        );
        assert_eq!(editor.state(), State::Loading);
    }

    #[tokio::test]
    async fn test_edits_rederive_sets() {
        let mut editor = existing_performance().await;

        editor.delete_row(1);
        editor.append_rep(1);
        editor.set_reps(1, 1, Reps::new(6).unwrap());

        assert_eq!(
            rows(&editor),
            vec![row(20.0, &[10, 10]), row(20.0, &[8, 6])]
        );
        assert_eq!(
            editor.sets(),
            &[
                set(20.0, 10, 0),
                set(20.0, 10, 1),
                set(20.0, 8, 2),
                set(20.0, 6, 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_set_weight_keeps_rows_separate() {
        let mut editor = new_performance().await;

        editor.set_weight(0, Weight::new(20.0).unwrap());
        editor.append_rep(0);
        editor.set_reps(0, 0, Reps::new(10).unwrap());
        editor.append_row();
        editor.set_weight(1, Weight::new(25.0).unwrap());
        editor.append_rep(1);
        editor.set_reps(1, 0, Reps::new(8).unwrap());
        editor.set_weight(1, Weight::new(20.0).unwrap());

        assert_eq!(rows(&editor), vec![row(20.0, &[10]), row(20.0, &[8])]);
        assert_eq!(editor.sets(), &[set(20.0, 10, 0), set(20.0, 8, 1)]);
    }

    #[tokio::test]
    async fn test_delete_rep() {
        let mut editor = existing_performance().await;

        editor.delete_rep(1, 0);

        assert_eq!(
            rows(&editor),
            vec![row(20.0, &[10, 10]), row(22.0, &[]), row(20.0, &[8])]
        );
        assert_eq!(
            editor.sets(),
            &[set(20.0, 10, 0), set(20.0, 10, 1), set(20.0, 8, 2)]
        );
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let mut editor = existing_performance().await;

        assert!(matches!(
            editor.set_weight_input(0, "heavy"),
            Err(EditorError::Validation(_))
        ));
        assert!(matches!(
            editor.set_reps_input(0, 0, "-3"),
            Err(EditorError::Validation(_))
        ));
        assert_eq!(
            rows(&editor),
            vec![row(20.0, &[10, 10]), row(22.0, &[7]), row(20.0, &[8])]
        );
        assert!(editor.error().is_some());

        editor.clear_error();

        assert_eq!(editor.error(), None);

        editor.set_weight_input(1, "22,5").unwrap();
        editor.set_reps_input(1, 0, " 9").unwrap();

        assert_eq!(
            rows(&editor),
            vec![row(20.0, &[10, 10]), row(22.5, &[9]), row(20.0, &[8])]
        );
    }

    #[tokio::test]
    async fn test_save_new() {
        let mut editor = new_performance().await;

        editor.set_weight(0, Weight::new(40.0).unwrap());
        editor.append_rep(0);
        editor.append_rep(0);
        editor.set_reps(0, 1, Reps::new(12).unwrap());
        editor.set_notes("warm-up");

        editor.save().await.unwrap();

        assert_eq!(editor.state(), State::Saved);
        assert_eq!(editor.performance_id(), Some(100.into()));
        assert_eq!(
            editor.service.get_performance(100.into()).await.unwrap(),
            Performance {
                id: 100.into(),
                exercise_id: 1.into(),
                date: date(),
                sets: vec![set(40.0, 12, 0)],
                notes: String::from("warm-up"),
            }
        );
    }

    #[tokio::test]
    async fn test_save_without_reps_fails() {
        let mut editor = new_performance().await;

        editor.append_rep(0);

        assert_eq!(editor.sets(), &[set(0.0, 0, 0)]);
        assert!(matches!(
            editor.save().await,
            Err(EditorError::Validation(_))
        ));
        assert_eq!(editor.state(), State::Ready);
        assert_eq!(
            editor.rows(),
            &[WeightRow {
                weight: Weight::ZERO,
                reps: vec![Reps::ZERO],
                start_order: 0,
            }]
        );
        assert_eq!(editor.service.performances.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_save_existing() {
        let mut editor = existing_performance().await;

        editor.append_row();
        editor.append_rep(3);
        editor.set_reps(3, 0, Reps::new(6).unwrap());
        editor.append_rep(0);

        editor.save().await.unwrap();

        assert_eq!(editor.state(), State::Saved);
        assert_eq!(
            editor.service.get_performance(10.into()).await.unwrap().sets,
            vec![
                set(20.0, 10, 0),
                set(20.0, 10, 1),
                set(22.0, 7, 2),
                set(20.0, 8, 3),
                set(20.0, 6, 4)
            ]
        );
    }

    #[tokio::test]
    async fn test_save_storage_failure_keeps_state() {
        let mut editor = existing_performance().await;
        editor.delete_row(0);
        let rows_before = rows(&editor);
        let sets_before = editor.sets().to_vec();
        editor.service.fail_writes.set(true);

        assert!(matches!(
            editor.save().await,
            Err(EditorError::Storage(message)) if message.starts_with("Failed to save performance")
        ));
        assert_eq!(editor.state(), State::Ready);
        assert_eq!(rows(&editor), rows_before);
        assert_eq!(editor.sets(), sets_before.as_slice());
        assert!(editor.error().is_some());

        editor.service.fail_writes.set(false);
        editor.clear_error();
        editor.save().await.unwrap();

        assert_eq!(editor.state(), State::Saved);
        assert_eq!(editor.error(), None);
    }

    #[tokio::test]
    async fn test_edit_after_save() {
        let mut editor = existing_performance().await;
        editor.save().await.unwrap();

        editor.append_rep(2);

        assert_eq!(editor.state(), State::Ready);
    }

    #[tokio::test]
    async fn test_notes_and_date_after_save() {
        let mut editor = existing_performance().await;
        editor.save().await.unwrap();

        editor.set_notes("easy");

        assert_eq!(editor.state(), State::Ready);

        editor.save().await.unwrap();
        editor.set_date(date() + chrono::Duration::hours(1));

        assert_eq!(editor.state(), State::Ready);

        editor.save().await.unwrap();

        let stored = editor.service.get_performance(10.into()).await.unwrap();
        assert_eq!(stored.notes, "easy");
        assert_eq!(stored.date, date() + chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let mut editor = existing_performance().await;

        editor.delete().await.unwrap();

        assert_eq!(editor.state(), State::Deleted);
        assert!(editor.service.performances.borrow().is_empty());

        editor.append_row();

        assert_eq!(editor.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_unsaved() {
        let mut editor = new_performance().await;

        editor.delete().await.unwrap();

        assert_eq!(editor.state(), State::Deleted);
        assert_eq!(editor.service.performances.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure() {
        let mut editor = existing_performance().await;
        editor.service.fail_writes.set(true);

        assert!(matches!(
            editor.delete().await,
            Err(EditorError::Storage(_))
        ));
        assert_eq!(editor.state(), State::Ready);
        assert_eq!(editor.service.performances.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_edits_ignored_while_loading() {
        let mut editor = PerformanceEditor::new(service());

        editor.append_row();
        editor.set_notes("x");
        editor.save().await.unwrap();

        assert!(editor.rows().is_empty());
        assert_eq!(editor.notes(), "");
        assert_eq!(editor.state(), State::Loading);
    }
}
