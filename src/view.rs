//! Retained view state derived from the store: the list display order and
//! the map marker layer. Both are keyed by workout id and never
//! authoritative - the store is.

use crate::store::WorkoutStore;
use crate::workout::{Coords, Workout, WorkoutId, WorkoutKind};

/// Display ordering of the list rows, newest first by default. Sorting
/// replaces the ordering without touching the store, so it survives only as
/// long as the session and later-created rows still go to the front.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkoutList {
    order: Vec<WorkoutId>,
}

impl WorkoutList {
    /// Rebuild from the store, newest first.
    pub fn rebuild(&mut self, store: &WorkoutStore) {
        self.order = store.all().iter().rev().map(|w| w.id).collect();
    }

    /// A new row goes to the front, directly under the form.
    pub fn on_create(&mut self, id: WorkoutId) {
        self.order.insert(0, id);
    }

    pub fn on_delete(&mut self, id: WorkoutId) {
        self.order.retain(|&other| other != id);
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Replace the ordering with a requested one (display-only sort).
    pub fn set_order(&mut self, ids: Vec<WorkoutId>) {
        self.order = ids;
    }

    pub fn ids(&self) -> &[WorkoutId] {
        &self.order
    }
}

/// One map marker per workout.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: WorkoutId,
    pub coords: Coords,
    pub kind: WorkoutKind,
    pub label: String,
    pub open: bool,
}

impl Marker {
    fn from_workout(workout: &Workout) -> Self {
        Self {
            id: workout.id,
            coords: workout.coords,
            kind: workout.kind(),
            label: workout.popup_label(),
            open: true,
        }
    }
}

/// Markers currently on the map. Empty until the map is ready; populated in
/// one pass from the restored store at that point. Popups stay open until
/// their marker goes away.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    /// Materialize every stored workout as a marker with an open popup.
    pub fn rebuild(&mut self, store: &WorkoutStore) {
        self.markers = store.all().iter().map(Marker::from_workout).collect();
    }

    /// Add a marker for a freshly created workout and open its popup.
    pub fn add(&mut self, workout: &Workout) {
        if self.markers.iter().any(|m| m.id == workout.id) {
            self.refresh(workout);
            return;
        }
        self.markers.push(Marker::from_workout(workout));
    }

    /// Update the existing marker in place after an edit and re-open its
    /// popup. Unknown ids are ignored.
    pub fn refresh(&mut self, workout: &Workout) {
        if let Some(marker) = self.markers.iter_mut().find(|m| m.id == workout.id) {
            marker.kind = workout.kind();
            marker.label = workout.popup_label();
            marker.open = true;
        }
    }

    pub fn remove(&mut self, id: WorkoutId) {
        self.markers.retain(|m| m.id != id);
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}
