//! Entry form state: add/edit mode, raw field buffers and validation.

use crate::workout::{self, Coords, Workout, WorkoutDetails, WorkoutId, WorkoutKind};
use chrono::NaiveDate;

/// Which submission the form currently drives. `Edit` remembers the record
/// being reworked; only one edit is in flight at a time and re-targeting
/// simply replaces the remembered id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(WorkoutId),
}

/// Generic validation failure. Deliberately carries no field detail - the
/// form surfaces a single inline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidInput;

impl std::fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid input")
    }
}

impl std::error::Error for InvalidInput {}

/// Field values that passed validation for one activity type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormValues {
    Running {
        distance: f64,
        duration: f64,
        cadence: f64,
    },
    Cycling {
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    },
}

impl FormValues {
    /// Build a fresh workout from validated values.
    pub fn build(&self, id: WorkoutId, date: NaiveDate, coords: Coords) -> Workout {
        match *self {
            FormValues::Running {
                distance,
                duration,
                cadence,
            } => Workout::new_running(id, date, coords, distance, duration, cadence),
            FormValues::Cycling {
                distance,
                duration,
                elevation_gain,
            } => Workout::new_cycling(id, date, coords, distance, duration, elevation_gain),
        }
    }

    /// Mutate an existing workout in place, swapping the variant when the
    /// type changed. The description is regenerated from the stored creation
    /// date and pace/speed are re-derived.
    pub fn apply_to(&self, workout: &mut Workout) {
        match *self {
            FormValues::Running {
                distance,
                duration,
                cadence,
            } => {
                workout.distance = distance;
                workout.duration = duration;
                workout.details = WorkoutDetails::Running { cadence, pace: 0.0 };
                workout.description = workout::describe(WorkoutKind::Running, workout.date);
            }
            FormValues::Cycling {
                distance,
                duration,
                elevation_gain,
            } => {
                workout.distance = distance;
                workout.duration = duration;
                workout.details = WorkoutDetails::Cycling {
                    elevation_gain,
                    speed: 0.0,
                };
                workout.description = workout::describe(WorkoutKind::Cycling, workout.date);
            }
        }
        workout.recompute_derived();
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Check the raw field values for one activity type.
///
/// Running requires distance, duration and cadence to be finite and strictly
/// positive. Cycling requires positive distance and duration; elevation only
/// has to be finite, and an empty elevation field counts as zero.
pub fn validate(
    kind: WorkoutKind,
    distance: &str,
    duration: &str,
    cadence: &str,
    elevation: &str,
) -> Result<FormValues, InvalidInput> {
    let distance = parse_number(distance).ok_or(InvalidInput)?;
    let duration = parse_number(duration).ok_or(InvalidInput)?;
    if distance <= 0.0 || duration <= 0.0 {
        return Err(InvalidInput);
    }

    match kind {
        WorkoutKind::Running => {
            let cadence = parse_number(cadence).ok_or(InvalidInput)?;
            if cadence <= 0.0 {
                return Err(InvalidInput);
            }
            Ok(FormValues::Running {
                distance,
                duration,
                cadence,
            })
        }
        WorkoutKind::Cycling => {
            let elevation_gain = if elevation.trim().is_empty() {
                0.0
            } else {
                parse_number(elevation).ok_or(InvalidInput)?
            };
            Ok(FormValues::Cycling {
                distance,
                duration,
                elevation_gain,
            })
        }
    }
}

/// The one physical form. Rendered at the top of the list in add mode and in
/// place of the edited row in edit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub mode: FormMode,
    pub visible: bool,
    pub pending_coords: Option<Coords>,
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
    pub error: bool,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Add,
            visible: false,
            pending_coords: None,
            kind: WorkoutKind::Running,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
            error: false,
        }
    }
}

impl WorkoutForm {
    /// Map click: remember where the workout will go and show the form. The
    /// mode is left alone so a click landing mid-edit does not abandon it.
    pub fn open_at(&mut self, coords: Coords) {
        self.pending_coords = Some(coords);
        self.visible = true;
    }

    /// Enter edit mode for `workout`, snapshotting its values into the field
    /// buffers. The buffer for the other variant's field is cleared.
    pub fn begin_edit(&mut self, workout: &Workout) {
        self.mode = FormMode::Edit(workout.id);
        self.visible = true;
        self.error = false;
        self.kind = workout.kind();
        self.distance = format!("{}", workout.distance);
        self.duration = format!("{}", workout.duration);
        match workout.details {
            WorkoutDetails::Running { cadence, .. } => {
                self.cadence = format!("{cadence}");
                self.elevation.clear();
            }
            WorkoutDetails::Cycling { elevation_gain, .. } => {
                self.elevation = format!("{elevation_gain}");
                self.cadence.clear();
            }
        }
    }

    /// Hide the form and clear the buffers. The mode is untouched; a
    /// successful edit resets it explicitly.
    pub fn close(&mut self) {
        self.visible = false;
        self.error = false;
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }

    pub fn dismiss_error(&mut self) {
        self.error = false;
    }

    pub fn editing(&self) -> Option<WorkoutId> {
        match self.mode {
            FormMode::Edit(id) => Some(id),
            FormMode::Add => None,
        }
    }

    pub fn validate(&self) -> Result<FormValues, InvalidInput> {
        validate(
            self.kind,
            &self.distance,
            &self.duration,
            &self.cadence,
            &self.elevation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Coords {
        Coords {
            lat: 50.0,
            lon: 19.9,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
    }

    #[test]
    fn rejects_non_numeric_distance_for_both_kinds() {
        for kind in [WorkoutKind::Running, WorkoutKind::Cycling] {
            let res = validate(kind, "abc", "30", "170", "10");
            assert_eq!(res, Err(InvalidInput));
        }
    }

    #[test]
    fn rejects_zero_cadence_for_running() {
        let res = validate(WorkoutKind::Running, "5", "30", "0", "");
        assert_eq!(res, Err(InvalidInput));
    }

    #[test]
    fn accepts_negative_elevation_for_cycling() {
        let res = validate(WorkoutKind::Cycling, "20", "60", "", "-5");
        assert_eq!(
            res,
            Ok(FormValues::Cycling {
                distance: 20.0,
                duration: 60.0,
                elevation_gain: -5.0,
            })
        );
    }

    #[test]
    fn empty_elevation_counts_as_zero() {
        let res = validate(WorkoutKind::Cycling, "20", "60", "", "  ");
        assert_eq!(
            res,
            Ok(FormValues::Cycling {
                distance: 20.0,
                duration: 60.0,
                elevation_gain: 0.0,
            })
        );
    }

    #[test]
    fn rejects_non_finite_numbers() {
        assert_eq!(
            validate(WorkoutKind::Running, "1e999", "30", "170", ""),
            Err(InvalidInput)
        );
        assert_eq!(
            validate(WorkoutKind::Cycling, "20", "60", "", "NaN"),
            Err(InvalidInput)
        );
    }

    #[test]
    fn rejects_empty_required_fields() {
        assert_eq!(
            validate(WorkoutKind::Running, "", "30", "170", ""),
            Err(InvalidInput)
        );
        assert_eq!(
            validate(WorkoutKind::Cycling, "20", "", "", "5"),
            Err(InvalidInput)
        );
    }

    #[test]
    fn begin_edit_snapshots_values_and_retargets() {
        let a = Workout::new_running(1, date(), coords(), 5.0, 25.0, 170.0);
        let b = Workout::new_cycling(2, date(), coords(), 20.0, 60.0, 300.0);

        let mut form = WorkoutForm::default();
        form.begin_edit(&a);
        assert_eq!(form.editing(), Some(1));
        assert_eq!(form.kind, WorkoutKind::Running);
        assert_eq!(form.distance, "5");
        assert_eq!(form.cadence, "170");
        assert!(form.elevation.is_empty());

        form.begin_edit(&b);
        assert_eq!(form.editing(), Some(2));
        assert_eq!(form.kind, WorkoutKind::Cycling);
        assert_eq!(form.elevation, "300");
        assert!(form.cadence.is_empty());
    }

    #[test]
    fn open_at_shows_form_without_touching_mode() {
        let w = Workout::new_running(1, date(), coords(), 5.0, 25.0, 170.0);
        let mut form = WorkoutForm::default();
        form.begin_edit(&w);
        form.open_at(coords());
        assert!(form.visible);
        assert_eq!(form.editing(), Some(1));
        assert_eq!(form.pending_coords, Some(coords()));
    }

    #[test]
    fn close_clears_buffers_but_keeps_mode() {
        let w = Workout::new_running(1, date(), coords(), 5.0, 25.0, 170.0);
        let mut form = WorkoutForm::default();
        form.begin_edit(&w);
        form.close();
        assert!(!form.visible);
        assert!(form.distance.is_empty());
        assert_eq!(form.editing(), Some(1));
    }

    #[test]
    fn apply_to_swaps_variant_and_rewrites_description() {
        let mut w = Workout::new_running(1, date(), coords(), 5.0, 25.0, 170.0);
        let values = FormValues::Cycling {
            distance: 30.0,
            duration: 60.0,
            elevation_gain: -5.0,
        };
        values.apply_to(&mut w);

        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert_eq!(w.description, "Cycling on April 5");
        match w.details {
            WorkoutDetails::Cycling {
                elevation_gain,
                speed,
            } => {
                assert_eq!(elevation_gain, -5.0);
                assert!((speed - 30.0).abs() < 1e-9);
            }
            _ => panic!("expected a cycling variant"),
        }
    }

    #[test]
    fn apply_to_same_kind_recomputes_metric() {
        let mut w = Workout::new_running(1, date(), coords(), 5.0, 25.0, 170.0);
        let values = FormValues::Running {
            distance: 10.0,
            duration: 50.0,
            cadence: 180.0,
        };
        values.apply_to(&mut w);
        assert_eq!(w.description, "Running on April 5");
        match w.details {
            WorkoutDetails::Running { cadence, pace } => {
                assert_eq!(cadence, 180.0);
                assert!((pace - 5.0).abs() < 1e-9);
            }
            _ => panic!("expected a running variant"),
        }
    }
}
