//! Templates and completed workouts on top of a [`StorageAdapter`].
//!
//! Both collections live under their own key as one JSON array each. Every
//! mutation reads the whole array, changes it, and writes it back. There is no
//! locking: two writers racing on the same namespace lose updates (last write
//! wins). Callers that need concurrency must serialize access themselves.

use log::{debug, warn};

use crate::error::StorageError;
use crate::snapshot::WorkoutSnapshot;
use crate::storage::{StorageAdapter, StorageBackend};
use crate::workout_model::{CompletedWorkout, Workout};

pub const TEMPLATES_KEY: &str = "workout-templates";
pub const COMPLETED_KEY: &str = "completed-workouts";

pub struct WorkoutRepository<B> {
    storage: StorageAdapter<B>,
}

impl<B: StorageBackend> WorkoutRepository<B> {
    pub fn new(storage: StorageAdapter<B>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageAdapter<B> {
        &self.storage
    }

    pub fn get_all_templates(&self) -> Result<Vec<Workout>, StorageError> {
        Ok(self.storage.get_item(TEMPLATES_KEY)?.unwrap_or_default())
    }

    /// Replaces the template with the same id in place, or appends it.
    pub fn save_template(&self, workout: &Workout) -> Result<(), StorageError> {
        let mut templates = self.get_all_templates()?;
        match templates.iter_mut().find(|t| t.id == workout.id) {
            Some(existing) => *existing = workout.clone(),
            None => templates.push(workout.clone()),
        }
        self.storage.set_item(TEMPLATES_KEY, &templates)
    }

    /// Replaces the whole template list, keeping the given order.
    pub fn set_all_templates(&self, templates: &[Workout]) -> Result<(), StorageError> {
        self.storage.set_item(TEMPLATES_KEY, templates)
    }

    /// Deleting an unknown id is a no-op.
    pub fn delete_template(&self, id: &str) -> Result<(), StorageError> {
        let mut templates = self.get_all_templates()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            debug!("No template {id} to delete");
        }
        self.storage.set_item(TEMPLATES_KEY, &templates)
    }

    pub fn get_all_completed(&self) -> Result<Vec<CompletedWorkout>, StorageError> {
        Ok(self.storage.get_item(COMPLETED_KEY)?.unwrap_or_default())
    }

    /// Appends to the history. Ids are not deduplicated.
    pub fn save_completed(&self, workout: &CompletedWorkout) -> Result<(), StorageError> {
        let mut completed = self.get_all_completed()?;
        completed.push(workout.clone());
        self.storage.set_item(COMPLETED_KEY, &completed)
    }

    pub fn clear_templates(&self) -> Result<(), StorageError> {
        self.storage.remove_item(TEMPLATES_KEY)
    }

    pub fn clear_completed(&self) -> Result<(), StorageError> {
        self.storage.remove_item(COMPLETED_KEY)
    }

    pub fn export(&self) -> Result<WorkoutSnapshot, StorageError> {
        Ok(WorkoutSnapshot {
            templates: self.get_all_templates()?,
            completed: self.get_all_completed()?,
        })
    }

    /// Overwrites both collections.
    ///
    /// Templates are written first. If the history write then fails, the
    /// previous templates are put back before the error is returned, so the
    /// two collections never end up from different snapshots.
    ///
    /// The previous value is kept as raw text, so an import also succeeds
    /// over stored data that no longer decodes.
    pub fn import(&self, snapshot: &WorkoutSnapshot) -> Result<(), StorageError> {
        let templates_key = self.storage.namespaced_key(TEMPLATES_KEY);
        let previous_templates = self.storage.backend().read(&templates_key)?;

        self.storage.set_item(TEMPLATES_KEY, &snapshot.templates)?;
        if let Err(e) = self.storage.set_item(COMPLETED_KEY, &snapshot.completed) {
            warn!("Import failed while writing completed workouts, restoring templates: {e}");
            let backend = self.storage.backend();
            let restored = match &previous_templates {
                Some(raw) => backend.write(&templates_key, raw),
                None => backend.remove(&templates_key),
            };
            if let Err(restore_err) = restored {
                warn!("Could not restore templates after failed import: {restore_err}");
            }
            return Err(e);
        }

        debug!(
            "Imported {} templates and {} completed workouts",
            snapshot.templates.len(),
            snapshot.completed.len()
        );
        Ok(())
    }

    /// The template that follows the most recent completion in rotation order.
    ///
    /// Starts at the first template when there is no history, wraps after the
    /// last one, and falls back to the first template when the last completed
    /// record points at a template that no longer exists.
    pub fn get_next_workout(&self) -> Result<Option<Workout>, StorageError> {
        let templates = self.get_all_templates()?;
        let completed = self.get_all_completed()?;
        Ok(next_in_rotation(&templates, &completed).cloned())
    }
}

/// Pure rotation step over the two collections.
pub fn next_in_rotation<'a>(templates: &'a [Workout], completed: &[CompletedWorkout]) -> Option<&'a Workout> {
    if templates.is_empty() {
        return None;
    }
    let Some(last) = completed.last() else {
        return templates.first();
    };
    let next = templates
        .iter()
        .position(|t| t.id == last.template_id)
        .map_or(0, |index| (index + 1) % templates.len());
    templates.get(next)
}
