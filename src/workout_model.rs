//! Data model for workout templates and completed sessions.
//!
//! All records are stored and exchanged as JSON with camelCase field names.
//! Optional fields are left out entirely when they are not set.
//!
//! ```rust
//! use workout_tracker_core::workout_model::{Exercise, Workout};
//!
//! let workout = Workout {
//!     id: "push-day".to_string(),
//!     name: "Push Day".to_string(),
//!     exercises: vec![Exercise::new("bench", "Bench Press", 3, 8, 135.0)],
//!     notes: None,
//! };
//!
//! let json = serde_json::to_string(&workout)?;
//! assert!(json.contains(r#""sets":3"#));
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Template id recorded for stretch sessions, which have no template.
pub const STRETCH_TEMPLATE_ID: &str = "stretch";

/// Display name given to completed stretch sessions.
pub const STRETCH_SESSION_NAME: &str = "Stretch Session";

/// Fresh random id for templates, exercises and completed records.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Unique within its owning workout.
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Only set on exercises that belong to a session or a completed record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sets: u32, reps: u32, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sets,
            reps,
            weight,
            notes: None,
            completed: None,
        }
    }

    /// Training volume of this exercise: weight × sets × reps.
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.sets) * f64::from(self.reps)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }
}

/// A reusable workout template. Its position in the template list defines
/// the rotation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Generated at creation and never changed afterwards.
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Name and exercises as entered in the add/edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

/// Immutable snapshot of one performed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWorkout {
    pub id: String,
    /// Source template, or [`STRETCH_TEMPLATE_ID`].
    pub template_id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub completed_at: DateTime<Utc>,
    /// Elapsed session time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CompletedWorkout {
    /// Record for a stretch session, which has no exercises.
    pub fn stretch(duration: u64, notes: Option<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            template_id: STRETCH_TEMPLATE_ID.to_string(),
            name: STRETCH_SESSION_NAME.to_string(),
            exercises: Vec::new(),
            completed_at,
            duration: Some(duration),
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn is_stretch(&self) -> bool {
        self.template_id == STRETCH_TEMPLATE_ID
    }
}
