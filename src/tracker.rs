//! UI-facing facade over the repository.
//!
//! [`WorkoutTracker`] is what a screen talks to. It owns the repository, the
//! current [`ViewState`], and cached copies of both collections plus the next
//! workout in rotation. Every successful write is followed by a full reload of
//! the caches; a failed call leaves them exactly as they were. All failures are
//! logged here before they are returned.

use std::mem;

use chrono::Utc;
use log::{info, warn};

use crate::error::{SessionError, StorageError, TrackerError, ValidationError};
use crate::progress::{history_by_month, MonthGroup, ProgressSummary};
use crate::session::{self, ActiveSession, SessionView, StretchSession};
use crate::snapshot::WorkoutSnapshot;
use crate::storage::StorageBackend;
use crate::validation::validate_workout;
use crate::view_state::{Tab, ViewState};
use crate::workout_model::{new_id, CompletedWorkout, NewWorkout, Workout};
use crate::workout_repository::{next_in_rotation, WorkoutRepository};

pub struct WorkoutTracker<B> {
    repository: WorkoutRepository<B>,
    view: ViewState,
    tab: Tab,
    live_timer: bool,
    templates: Vec<Workout>,
    completed: Vec<CompletedWorkout>,
    next_workout: Option<Workout>,
}

impl<B: StorageBackend> WorkoutTracker<B> {
    /// Builds the tracker and loads both collections.
    ///
    /// Stored data that cannot be read leaves the caches empty instead of
    /// failing, so the host can still import or clear to repair it.
    pub fn open(repository: WorkoutRepository<B>) -> Self {
        let mut tracker = Self {
            repository,
            view: ViewState::default(),
            tab: Tab::default(),
            live_timer: false,
            templates: Vec::new(),
            completed: Vec::new(),
            next_workout: None,
        };
        if let Err(e) = tracker.reload() {
            warn!("Failed to load workout data: {e}");
        }
        tracker
    }

    /// Sessions started from now on advance their timer from a background
    /// thread instead of through [`tick`](Self::tick).
    pub fn with_live_timer(mut self, enabled: bool) -> Self {
        self.live_timer = enabled;
        self
    }

    pub fn repository(&self) -> &WorkoutRepository<B> {
        &self.repository
    }

    pub fn templates(&self) -> &[Workout] {
        &self.templates
    }

    pub fn completed(&self) -> &[CompletedWorkout] {
        &self.completed
    }

    pub fn next_workout(&self) -> Option<&Workout> {
        self.next_workout.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Re-reads both collections and recomputes the rotation. Caches change
    /// only if both reads succeed.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        let templates = self.repository.get_all_templates()?;
        let completed = self.repository.get_all_completed()?;
        let next_workout = next_in_rotation(&templates, &completed).cloned();
        self.templates = templates;
        self.completed = completed;
        self.next_workout = next_workout;
        Ok(())
    }

    fn refresh(&mut self) {
        if let Err(e) = self.reload() {
            warn!("Failed to reload workout data: {e}");
        }
    }

    // Navigation

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if let ViewState::Browsing(_) = self.view {
            self.view = ViewState::Browsing(tab);
        }
    }

    pub fn begin_add(&mut self) -> Result<(), TrackerError> {
        self.ensure_browsing()?;
        self.view = ViewState::Adding;
        Ok(())
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<(), TrackerError> {
        self.ensure_browsing()?;
        let workout = self
            .find_template(id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownTemplate(id.to_string()))?;
        self.view = ViewState::Editing(workout);
        Ok(())
    }

    /// Leaves the add/edit form without saving.
    pub fn close_form(&mut self) {
        if matches!(self.view, ViewState::Adding | ViewState::Editing(_)) {
            self.view = ViewState::Browsing(self.tab);
        }
    }

    fn ensure_browsing(&self) -> Result<(), TrackerError> {
        if self.view.in_session() {
            return Err(SessionError::AlreadyActive.into());
        }
        Ok(())
    }

    fn find_template(&self, id: &str) -> Option<&Workout> {
        self.templates.iter().find(|t| t.id == id)
    }

    // Templates

    pub fn add_workout(&mut self, form: NewWorkout) -> Result<Workout, TrackerError> {
        let result = validate_workout(&form.name, &form.exercises)
            .map_err(TrackerError::from)
            .and_then(|name| {
                let workout = Workout { id: new_id(), name, exercises: form.exercises, notes: None };
                self.repository.save_template(&workout)?;
                Ok(workout)
            });
        let workout = logged("save workout", result)?;
        info!("Added workout {} ({})", workout.name, workout.id);
        self.close_form();
        self.refresh();
        Ok(workout)
    }

    /// Replaces name and exercises of an existing template; id, notes and
    /// rotation position are kept.
    pub fn update_workout(&mut self, id: &str, form: NewWorkout) -> Result<Workout, TrackerError> {
        let result = self
            .find_template(id)
            .cloned()
            .ok_or_else(|| TrackerError::from(ValidationError::UnknownTemplate(id.to_string())))
            .and_then(|existing| {
                let name = validate_workout(&form.name, &form.exercises)?;
                let workout = Workout { name, exercises: form.exercises, ..existing };
                self.repository.save_template(&workout)?;
                Ok(workout)
            });
        let workout = logged("update workout", result)?;
        self.close_form();
        self.refresh();
        Ok(workout)
    }

    pub fn delete_workout(&mut self, id: &str) -> Result<(), TrackerError> {
        logged("delete workout", self.repository.delete_template(id).map_err(TrackerError::from))?;
        self.refresh();
        Ok(())
    }

    /// Persists a new template order, e.g. after a drag reorder.
    pub fn reorder_templates(&mut self, templates: &[Workout]) -> Result<(), TrackerError> {
        logged(
            "reorder workouts",
            self.repository.set_all_templates(templates).map_err(TrackerError::from),
        )?;
        self.refresh();
        Ok(())
    }

    pub fn clear_templates(&mut self) -> Result<(), TrackerError> {
        logged("clear workouts", self.repository.clear_templates().map_err(TrackerError::from))?;
        self.refresh();
        Ok(())
    }

    pub fn clear_completed(&mut self) -> Result<(), TrackerError> {
        logged("clear history", self.repository.clear_completed().map_err(TrackerError::from))?;
        self.refresh();
        Ok(())
    }

    // Workout sessions

    pub fn start_workout(&mut self, template_id: &str) -> Result<SessionView, TrackerError> {
        self.ensure_browsing()?;
        let template = self
            .find_template(template_id)
            .ok_or_else(|| ValidationError::UnknownTemplate(template_id.to_string()))?;
        let mut active = session::start_session(template);
        if self.live_timer {
            active.start_timer();
        }
        let view = active.view();
        self.view = ViewState::Active(active);
        Ok(view)
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        match &self.view {
            ViewState::Active(active) => Some(active),
            _ => None,
        }
    }

    pub fn session_view(&self) -> Option<SessionView> {
        self.active_session().map(ActiveSession::view)
    }

    pub fn toggle_exercise(&mut self, exercise_id: &str) -> Result<bool, TrackerError> {
        match &mut self.view {
            ViewState::Active(active) => Ok(active.toggle_exercise(exercise_id)?),
            _ => Err(SessionError::NoActiveSession.into()),
        }
    }

    pub fn set_session_notes(&mut self, notes: Option<String>) -> Result<(), TrackerError> {
        match &mut self.view {
            ViewState::Active(active) => {
                active.set_notes(notes);
                Ok(())
            }
            _ => Err(SessionError::NoActiveSession.into()),
        }
    }

    /// Advances the open session's timer by one second.
    pub fn tick(&mut self) -> Result<u64, TrackerError> {
        match &self.view {
            ViewState::Active(active) => {
                active.tick();
                Ok(active.elapsed_seconds())
            }
            ViewState::Stretching(stretch) => {
                stretch.tick();
                Ok(stretch.elapsed_seconds())
            }
            _ => Err(SessionError::NoActiveSession.into()),
        }
    }

    /// Records the active workout. On failure the session stays open.
    pub fn end_workout(&mut self) -> Result<CompletedWorkout, TrackerError> {
        let active = match mem::replace(&mut self.view, ViewState::Browsing(self.tab)) {
            ViewState::Active(active) => active,
            other => {
                self.view = other;
                return Err(SessionError::NoActiveSession.into());
            }
        };
        match session::end_session(&self.repository, active) {
            Ok(record) => {
                self.refresh();
                Ok(record)
            }
            Err((active, e)) => {
                match &e {
                    TrackerError::Session(refusal) => info!("Workout not ended: {refusal}"),
                    _ => warn!("Failed to save completed workout: {e}"),
                }
                self.view = ViewState::Active(active);
                Err(e)
            }
        }
    }

    pub fn cancel_workout(&mut self) -> Result<(), TrackerError> {
        match mem::replace(&mut self.view, ViewState::Browsing(self.tab)) {
            ViewState::Active(active) => {
                session::cancel_session(active);
                Ok(())
            }
            other => {
                self.view = other;
                Err(SessionError::NoActiveSession.into())
            }
        }
    }

    // Stretch sessions

    pub fn start_stretch(&mut self) -> Result<(), TrackerError> {
        self.ensure_browsing()?;
        let mut stretch = StretchSession::new();
        if self.live_timer {
            stretch.start_timer();
        }
        self.view = ViewState::Stretching(stretch);
        Ok(())
    }

    /// Records the stretch session with the given notes.
    pub fn complete_stretch(&mut self, notes: &str) -> Result<CompletedWorkout, TrackerError> {
        let ViewState::Stretching(stretch) = &mut self.view else {
            return Err(SessionError::NoActiveSession.into());
        };
        stretch.set_notes(notes);
        let record = stretch.to_completed(Utc::now());
        logged(
            "save stretch session",
            self.repository.save_completed(&record).map_err(TrackerError::from),
        )?;
        self.view = ViewState::Browsing(self.tab);
        self.refresh();
        Ok(record)
    }

    pub fn cancel_stretch(&mut self) -> Result<(), TrackerError> {
        match mem::replace(&mut self.view, ViewState::Browsing(self.tab)) {
            ViewState::Stretching(_) => Ok(()),
            other => {
                self.view = other;
                Err(SessionError::NoActiveSession.into())
            }
        }
    }

    // Import / export

    pub fn export(&self) -> Result<WorkoutSnapshot, TrackerError> {
        logged("export data", self.repository.export().map_err(TrackerError::from))
    }

    /// Validates the whole file first; nothing is written when it is rejected.
    pub fn import_json(&mut self, text: &str) -> Result<WorkoutSnapshot, TrackerError> {
        let result = WorkoutSnapshot::from_json(text)
            .map_err(TrackerError::from)
            .and_then(|snapshot| {
                self.repository.import(&snapshot)?;
                Ok(snapshot)
            });
        let snapshot = logged("import data", result)?;
        info!(
            "Imported {} templates and {} completed workouts",
            snapshot.templates.len(),
            snapshot.completed.len()
        );
        self.refresh();
        Ok(snapshot)
    }

    // History

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::build(&self.completed, Utc::now())
    }

    pub fn history(&self) -> Vec<MonthGroup> {
        history_by_month(&self.completed)
    }
}

fn logged<T>(operation: &str, result: Result<T, TrackerError>) -> Result<T, TrackerError> {
    if let Err(e) = &result {
        warn!("Failed to {operation}: {e}");
    }
    result
}
