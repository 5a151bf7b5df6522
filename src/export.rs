use crate::workout::{Workout, WorkoutDetails, WorkoutId, WorkoutKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

#[derive(Serialize)]
struct Row<'a> {
    id: WorkoutId,
    #[serde(rename = "type")]
    kind: WorkoutKind,
    date: NaiveDate,
    lat: f64,
    lon: f64,
    distance_km: f64,
    duration_min: f64,
    cadence_spm: Option<f64>,
    pace_min_per_km: Option<f64>,
    elevation_gain_m: Option<f64>,
    speed_kmh: Option<f64>,
    description: &'a str,
}

pub fn write_workouts_csv(writer: impl Write, workouts: &[Workout]) -> csv::Result<()> {
    let rows: Vec<Row> = workouts
        .iter()
        .map(|w| {
            let (cadence, pace, elevation, speed) = match w.details {
                WorkoutDetails::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
                WorkoutDetails::Cycling {
                    elevation_gain,
                    speed,
                } => (None, None, Some(elevation_gain), Some(speed)),
            };
            Row {
                id: w.id,
                kind: w.kind(),
                date: w.date,
                lat: w.coords.lat,
                lon: w.coords.lon,
                distance_km: w.distance,
                duration_min: w.duration,
                cadence_spm: cadence,
                pace_min_per_km: pace,
                elevation_gain_m: elevation,
                speed_kmh: speed,
                description: &w.description,
            }
        })
        .collect();
    write_csv(writer, &rows)
}

pub fn save_workouts_csv<P: AsRef<Path>>(path: P, workouts: &[Workout]) -> csv::Result<()> {
    write_workouts_csv(std::fs::File::create(path)?, workouts)
}

pub fn save_workouts_json<P: AsRef<Path>>(path: P, workouts: &[Workout]) -> std::io::Result<()> {
    write_json(workouts, path)
}
