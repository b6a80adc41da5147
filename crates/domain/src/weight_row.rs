use derive_more::Deref;

use crate::{Reps, Set, ValidationError, Weight};

/// A run of chronologically adjacent sets performed with the same weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    pub weight: Weight,
    pub reps: Vec<Reps>,
    /// Order of the first set in the run at the time the row was derived.
    pub start_order: u32,
}

impl WeightRow {
    #[must_use]
    pub fn new(weight: Weight, start_order: u32) -> Self {
        Self {
            weight,
            reps: vec![],
            start_order,
        }
    }
}

/// Groups sets into weight rows.
///
/// The sets are processed in ascending `order`. A new row is started for each
/// change of weight, so a weight that reappears after a different weight
/// yields a separate row.
#[must_use]
pub fn sets_to_rows(sets: &[Set]) -> Vec<WeightRow> {
    let mut sorted_sets = sets.to_vec();
    sorted_sets.sort_by_key(|set| set.order);

    let mut rows: Vec<WeightRow> = vec![];

    for set in sorted_sets {
        match rows.last_mut() {
            Some(row) if row.weight == set.weight => row.reps.push(set.reps),
            _ => rows.push(WeightRow {
                weight: set.weight,
                reps: vec![set.reps],
                start_order: set.order,
            }),
        }
    }

    rows
}

/// Flattens weight rows into sets numbered contiguously from zero.
///
/// The `start_order` of the rows is ignored, the row position alone defines
/// the chronological sequence.
#[must_use]
pub fn rows_to_sets(rows: &[WeightRow]) -> Vec<Set> {
    rows.iter()
        .flat_map(|row| row.reps.iter().map(move |reps| (row.weight, *reps)))
        .zip(0..)
        .map(|((weight, reps), order)| Set {
            weight,
            reps,
            order,
        })
        .collect()
}

/// Prepares sets for persisting.
///
/// Sets without reps are dropped and the remaining sets are renumbered in
/// chronological sequence.
pub fn sets_for_save(sets: &[Set]) -> Result<Vec<Set>, ValidationError> {
    let mut sorted_sets = sets.to_vec();
    sorted_sets.sort_by_key(|set| set.order);

    let result = sorted_sets
        .into_iter()
        .filter(|set| !set.reps.is_zero())
        .zip(0..)
        .map(|(set, order)| Set { order, ..set })
        .collect::<Vec<_>>();

    if result.is_empty() {
        return Err(ValidationError::NoSets);
    }

    Ok(result)
}

/// Editable list of weight rows.
///
/// Rows are identified by their position. Edits never merge rows, even if
/// adjacent rows end up with the same weight. Passing a row index that does
/// not exist leaves the rows unchanged.
#[derive(Deref, Debug, Default, Clone, PartialEq)]
pub struct WeightRows(Vec<WeightRow>);

impl WeightRows {
    /// Rows for a performance without any sets yet.
    #[must_use]
    pub fn initial() -> Self {
        Self(vec![WeightRow::new(Weight::ZERO, 0)])
    }

    #[must_use]
    pub fn from_sets(sets: &[Set]) -> Self {
        Self(sets_to_rows(sets))
    }

    #[must_use]
    pub fn to_sets(&self) -> Vec<Set> {
        rows_to_sets(&self.0)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<WeightRow> {
        self.0
    }

    pub fn append_row(&mut self) {
        let weight = self.0.last().map_or(Weight::ZERO, |row| row.weight);
        let start_order = u32::try_from(self.0.iter().map(|row| row.reps.len()).sum::<usize>())
            .unwrap_or(u32::MAX);
        self.0.push(WeightRow::new(weight, start_order));
    }

    pub fn append_rep(&mut self, row: usize) {
        if let Some(row) = self.0.get_mut(row) {
            row.reps.push(Reps::ZERO);
        }
    }

    pub fn set_weight(&mut self, row: usize, weight: Weight) {
        if let Some(row) = self.0.get_mut(row) {
            row.weight = weight;
        }
    }

    pub fn set_reps(&mut self, row: usize, position: usize, reps: Reps) {
        if let Some(value) = self
            .0
            .get_mut(row)
            .and_then(|row| row.reps.get_mut(position))
        {
            *value = reps;
        }
    }

    pub fn delete_row(&mut self, row: usize) {
        if row < self.0.len() {
            self.0.remove(row);
        }
    }

    pub fn delete_rep(&mut self, row: usize, position: usize) {
        if let Some(row) = self.0.get_mut(row) {
            if position < row.reps.len() {
                row.reps.remove(position);
            }
        }
    }
}

impl From<Vec<WeightRow>> for WeightRows {
    fn from(value: Vec<WeightRow>) -> Self {
        Self(value)
    }
}
