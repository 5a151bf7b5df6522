//! Workout records and their derived metrics.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifier derived from the creation timestamp in milliseconds.
pub type WorkoutId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

pub const ALL_KINDS: [WorkoutKind; 2] = [WorkoutKind::Running, WorkoutKind::Cycling];

impl WorkoutKind {
    pub fn label(self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            WorkoutKind::Running => "\u{1F3C3}",
            WorkoutKind::Cycling => "\u{1F6B4}",
        }
    }
}

/// Minutes per kilometre.
pub fn pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

/// Kilometres per hour.
pub fn speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// Variant-specific fields plus the metric derived from distance/duration.
///
/// The `type` tag keeps the serialized records flat, so a stored collection
/// is an array of objects each carrying `"type": "running"` or
/// `"type": "cycling"` next to its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutDetails {
    Running {
        cadence: f64,
        pace: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
        speed: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub date: NaiveDate,
    pub coords: Coords,
    pub distance: f64,
    pub duration: f64,
    pub description: String,
    #[serde(flatten)]
    pub details: WorkoutDetails,
}

/// Human-readable description, e.g. "Running on April 5".
pub fn describe(kind: WorkoutKind, date: NaiveDate) -> String {
    format!("{} on {} {}", kind.label(), date.format("%B"), date.day())
}

impl Workout {
    pub fn new_running(
        id: WorkoutId,
        date: NaiveDate,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Self {
        Self {
            id,
            date,
            coords,
            distance,
            duration,
            description: describe(WorkoutKind::Running, date),
            details: WorkoutDetails::Running {
                cadence,
                pace: pace(distance, duration),
            },
        }
    }

    pub fn new_cycling(
        id: WorkoutId,
        date: NaiveDate,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Self {
        Self {
            id,
            date,
            coords,
            distance,
            duration,
            description: describe(WorkoutKind::Cycling, date),
            details: WorkoutDetails::Cycling {
                elevation_gain,
                speed: speed(distance, duration),
            },
        }
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// Recompute pace/speed after a distance or duration change.
    pub fn recompute_derived(&mut self) {
        match &mut self.details {
            WorkoutDetails::Running { pace: p, .. } => *p = pace(self.distance, self.duration),
            WorkoutDetails::Cycling { speed: s, .. } => *s = speed(self.distance, self.duration),
        }
    }

    /// Popup text for the map marker.
    pub fn popup_label(&self) -> String {
        format!("{} {}", self.kind().emoji(), self.description)
    }
}
