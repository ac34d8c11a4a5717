//! Export/import format: the whole dataset as one JSON document.
//!
//! ```json
//! { "templates": [ ... ], "completed": [ ... ] }
//! ```
//!
//! Imports are checked in two passes before anything is written: first the
//! top-level shape (both fields present and arrays), then every record against
//! the [`Workout`] / [`CompletedWorkout`] schema. One bad record rejects the
//! whole file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{StorageError, TrackerError, ValidationError};
use crate::workout_model::{CompletedWorkout, Exercise, Workout};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSnapshot {
    pub templates: Vec<Workout>,
    pub completed: Vec<CompletedWorkout>,
}

impl WorkoutSnapshot {
    /// Parses and validates an import file.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let root: JsonValue =
            serde_json::from_str(text).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        let object = root.as_object().ok_or(ValidationError::NotAnObject)?;

        let templates = array_field(object, "templates")?;
        let completed = array_field(object, "completed")?;

        let snapshot = Self {
            templates: parse_records("templates", templates)?,
            completed: parse_records("completed", completed)?,
        };
        snapshot.check_identities()?;
        Ok(snapshot)
    }

    /// Pretty-printed export text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// `workout-tracker-YYYY-MM-DD.json`
    pub fn export_file_name(date: NaiveDate) -> String {
        format!("workout-tracker-{}.json", date.format("%Y-%m-%d"))
    }

    /// Writes the export file into `dir` and returns its path.
    pub fn write_to_dir(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf, StorageError> {
        let path = dir.join(Self::export_file_name(date));
        let json = self
            .to_json()
            .map_err(|e| StorageError::with_cause("Failed to serialize export", e))?;
        fs::write(&path, json)
            .map_err(|e| StorageError::with_cause(format!("Failed to write {}", path.display()), e))?;
        info!(
            "Exported {} templates and {} completed workouts to {}",
            self.templates.len(),
            self.completed.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn read_from_file(path: &Path) -> Result<Self, TrackerError> {
        let text = fs::read_to_string(path)
            .map_err(|e| StorageError::with_cause(format!("Failed to read {}", path.display()), e))?;
        debug!("Read {} bytes of import data from {}", text.len(), path.display());
        Ok(Self::from_json(&text)?)
    }

    fn check_identities(&self) -> Result<(), ValidationError> {
        let mut template_ids = HashSet::new();
        for (index, template) in self.templates.iter().enumerate() {
            if !template_ids.insert(template.id.as_str()) {
                return Err(ValidationError::DuplicateId { kind: "template", id: template.id.clone() });
            }
            unique_exercise_ids("templates", index, &template.exercises)?;
        }

        for (index, record) in self.completed.iter().enumerate() {
            if record.id == record.template_id {
                return Err(ValidationError::InvalidRecord {
                    collection: "completed",
                    index,
                    reason: "id must differ from templateId".to_string(),
                });
            }
            unique_exercise_ids("completed", index, &record.exercises)?;
        }
        Ok(())
    }
}

fn array_field<'a>(
    object: &'a serde_json::Map<String, JsonValue>,
    field: &'static str,
) -> Result<&'a Vec<JsonValue>, ValidationError> {
    object
        .get(field)
        .ok_or(ValidationError::MissingField(field))?
        .as_array()
        .ok_or(ValidationError::NotAnArray(field))
}

fn parse_records<T: DeserializeOwned>(
    collection: &'static str,
    values: &[JsonValue],
) -> Result<Vec<T>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            T::deserialize(value).map_err(|e| ValidationError::InvalidRecord {
                collection,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn unique_exercise_ids(
    collection: &'static str,
    index: usize,
    exercises: &[Exercise],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for exercise in exercises {
        if !seen.insert(exercise.id.as_str()) {
            return Err(ValidationError::InvalidRecord {
                collection,
                index,
                reason: format!("duplicate exercise id `{}`", exercise.id),
            });
        }
    }
    Ok(())
}
