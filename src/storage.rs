//! JSON persistence for the workout collection.
//!
//! The whole ordered collection lives in one file under the platform config
//! directory, overwritten on every save. A missing or unreadable file is
//! treated as "no prior data", never as an error.

use std::io;
use std::path::PathBuf;

use dirs_next as dirs;

use crate::workout::Workout;

const FILE: &str = "waytrack_workouts.json";

pub fn path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(FILE))
}

/// Load the persisted collection. Records come back as their proper
/// variants thanks to the `type` tag, so derived metrics stay computable
/// on later edits.
pub fn load() -> Vec<Workout> {
    if let Some(path) = path() {
        if let Ok(data) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<Vec<Workout>>(&data) {
                Ok(workouts) => return workouts,
                Err(e) => log::warn!("Ignoring unreadable workout file {}: {e}", path.display()),
            }
        }
    }
    Vec::new()
}

/// Overwrite the snapshot with the full ordered collection.
pub fn save(workouts: &[Workout]) -> io::Result<()> {
    let Some(path) = path() else {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no config directory",
        ));
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(workouts)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(path, data)
}

/// Drop the snapshot entirely.
pub fn clear() {
    if let Some(path) = path() {
        let _ = std::fs::remove_file(path);
    }
}

/// Runs `f` with `XDG_CONFIG_HOME` pointed at a fresh temporary directory.
///
/// Every test that reads or writes config files must go through this helper;
/// the shared mutex keeps parallel tests from clobbering each other's
/// environment.
#[cfg(test)]
pub(crate) fn with_temp_config_dir(f: impl FnOnce()) {
    use once_cell::sync::Lazy;
    use std::env;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    let _guard = ENV_MUTEX.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let prev = env::var_os("XDG_CONFIG_HOME");
    unsafe {
        env::set_var("XDG_CONFIG_HOME", dir.path());
    }

    f();

    if let Some(val) = prev {
        unsafe {
            env::set_var("XDG_CONFIG_HOME", val);
        }
    } else {
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{Coords, WorkoutDetails};
    use chrono::NaiveDate;

    fn sample_workouts() -> Vec<Workout> {
        vec![
            Workout::new_running(
                1,
                NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
                Coords {
                    lat: 50.06,
                    lon: 19.94,
                },
                5.0,
                25.0,
                170.0,
            ),
            Workout::new_cycling(
                2,
                NaiveDate::from_ymd_opt(2024, 4, 6).unwrap(),
                Coords {
                    lat: 50.05,
                    lon: 19.96,
                },
                27.0,
                90.0,
                -5.0,
            ),
        ]
    }

    #[test]
    fn roundtrip_reconstitutes_variants() {
        with_temp_config_dir(|| {
            let workouts = sample_workouts();
            save(&workouts).unwrap();
            let loaded = load();
            assert_eq!(loaded, workouts);

            match loaded[0].details {
                WorkoutDetails::Running { pace, .. } => {
                    assert!((pace - 25.0 / 5.0).abs() < 1e-9);
                }
                _ => panic!("expected a running variant"),
            }
            match loaded[1].details {
                WorkoutDetails::Cycling { speed, .. } => {
                    assert!((speed - 18.0).abs() < 1e-9);
                }
                _ => panic!("expected a cycling variant"),
            }
        });
    }

    #[test]
    fn missing_file_loads_empty() {
        with_temp_config_dir(|| {
            assert!(load().is_empty());
        });
    }

    #[test]
    fn unreadable_file_loads_empty() {
        with_temp_config_dir(|| {
            let path = path().unwrap();
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "not json at all").unwrap();
            assert!(load().is_empty());
        });
    }

    #[test]
    fn clear_drops_the_snapshot() {
        with_temp_config_dir(|| {
            save(&sample_workouts()).unwrap();
            assert_eq!(load().len(), 2);
            clear();
            assert!(load().is_empty());
            clear();
            assert!(load().is_empty());
        });
    }

    #[test]
    fn save_overwrites_the_previous_snapshot() {
        with_temp_config_dir(|| {
            let workouts = sample_workouts();
            save(&workouts).unwrap();
            save(&workouts[..1]).unwrap();
            assert_eq!(load().len(), 1);
        });
    }
}
