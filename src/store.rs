// In-memory workout collection, the single source of truth for the app.

use serde::{Deserialize, Serialize};

use crate::workout::{Workout, WorkoutDetails, WorkoutId};

/// Numeric field a list ordering can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

pub const ALL_SORT_FIELDS: [SortField; 4] = [
    SortField::Distance,
    SortField::Duration,
    SortField::Cadence,
    SortField::ElevationGain,
];

impl SortField {
    pub fn label(self) -> &'static str {
        match self {
            SortField::Distance => "Distance",
            SortField::Duration => "Duration",
            SortField::Cadence => "Cadence",
            SortField::ElevationGain => "Elev. gain",
        }
    }
}

fn sort_value(workout: &Workout, field: SortField) -> Option<f64> {
    match field {
        SortField::Distance => Some(workout.distance),
        SortField::Duration => Some(workout.duration),
        SortField::Cadence => match workout.details {
            WorkoutDetails::Running { cadence, .. } => Some(cadence),
            WorkoutDetails::Cycling { .. } => None,
        },
        SortField::ElevationGain => match workout.details {
            WorkoutDetails::Cycling { elevation_gain, .. } => Some(elevation_gain),
            WorkoutDetails::Running { .. } => None,
        },
    }
}

/// Ordered collection of workouts. Insertion order is the persisted order;
/// display orderings are derived and never written back.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn from_workouts(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn append(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn find(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn find_mut(&mut self, id: WorkoutId) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id == id)
    }

    pub fn contains(&self, id: WorkoutId) -> bool {
        self.find(id).is_some()
    }

    /// Apply `mutator` to the matching workout. Returns whether a workout
    /// was found; a miss mutates nothing.
    pub fn update(&mut self, id: WorkoutId, mutator: impl FnOnce(&mut Workout)) -> bool {
        match self.find_mut(id) {
            Some(workout) => {
                mutator(workout);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: WorkoutId) {
        self.workouts.retain(|w| w.id != id);
    }

    pub fn remove_all(&mut self) {
        self.workouts.clear();
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Ids ordered ascending by the numeric value of `field`. Records that
    /// lack the field sort with value zero; the stored order is untouched.
    pub fn sorted_ids(&self, field: SortField) -> Vec<WorkoutId> {
        let mut refs: Vec<&Workout> = self.workouts.iter().collect();
        refs.sort_by(|a, b| {
            let av = sort_value(a, field).unwrap_or(0.0);
            let bv = sort_value(b, field).unwrap_or(0.0);
            av.partial_cmp(&bv).unwrap_or(std::cmp::Ordering::Equal)
        });
        refs.into_iter().map(|w| w.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::Coords;
    use chrono::NaiveDate;

    fn running(id: WorkoutId, distance: f64) -> Workout {
        Workout::new_running(
            id,
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            Coords {
                lat: 50.0,
                lon: 19.9,
            },
            distance,
            30.0,
            170.0,
        )
    }

    fn cycling(id: WorkoutId, elevation_gain: f64) -> Workout {
        Workout::new_cycling(
            id,
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            Coords {
                lat: 50.0,
                lon: 19.9,
            },
            20.0,
            60.0,
            elevation_gain,
        )
    }

    #[test]
    fn sorting_is_display_only() {
        let mut store = WorkoutStore::default();
        store.append(running(1, 5.0));
        store.append(running(2, 2.0));
        store.append(running(3, 8.0));

        assert_eq!(store.sorted_ids(SortField::Distance), vec![2, 1, 3]);

        let order: Vec<WorkoutId> = store.all().iter().map(|w| w.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn mixed_field_sort_does_not_panic() {
        let mut store = WorkoutStore::default();
        store.append(running(1, 5.0));
        store.append(cycling(2, 250.0));
        let ids = store.sorted_ids(SortField::Cadence);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn remove_on_absent_id_is_a_noop() {
        let mut store = WorkoutStore::default();
        store.append(running(1, 5.0));
        store.remove(99);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_all_is_idempotent() {
        let mut store = WorkoutStore::default();
        store.append(running(1, 5.0));
        store.append(cycling(2, 0.0));
        store.remove_all();
        assert!(store.is_empty());
        store.remove_all();
        assert!(store.is_empty());
    }

    #[test]
    fn update_miss_reports_false() {
        let mut store = WorkoutStore::default();
        store.append(running(1, 5.0));
        let hit = store.update(1, |w| w.distance = 6.0);
        let miss = store.update(42, |w| w.distance = 7.0);
        assert!(hit);
        assert!(!miss);
        assert_eq!(store.find(1).unwrap().distance, 6.0);
    }

    #[test]
    fn find_returns_the_unique_match() {
        let mut store = WorkoutStore::default();
        store.append(running(7, 5.0));
        assert!(store.find(7).is_some());
        assert!(store.find(8).is_none());
        assert!(store.contains(7));
    }
}
