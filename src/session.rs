//! In-memory workout and stretch sessions.
//!
//! A session lives only in memory. Its elapsed time advances once per second,
//! either through [`ActiveSession::tick`] or through a ticker thread started
//! with [`ActiveSession::start_timer`]. Nothing is persisted until the session
//! ends; a cancelled or interrupted session leaves no trace.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::error::{SessionError, TrackerError};
use crate::storage::StorageBackend;
use crate::workout_model::{new_id, CompletedWorkout, Exercise, Workout};
use crate::workout_repository::WorkoutRepository;

const TICK: Duration = Duration::from_secs(1);

/// Elapsed-seconds counter, optionally driven by a background thread.
#[derive(Debug, Default)]
pub struct SessionClock {
    elapsed: Arc<AtomicU64>,
    ticker: Option<Ticker>,
}

impl SessionClock {
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn tick(&self) {
        self.elapsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn start(&mut self) {
        if self.ticker.is_none() {
            self.ticker = Some(Ticker::spawn(Arc::clone(&self.elapsed)));
        }
    }

    /// Stops the ticker thread and returns the final count.
    pub fn stop(&mut self) -> u64 {
        self.ticker = None;
        self.elapsed_seconds()
    }
}

struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    fn spawn(elapsed: Arc<AtomicU64>) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stopped.recv_timeout(TICK) {
                Err(RecvTimeoutError::Timeout) => {
                    elapsed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self { stop: Some(stop), handle: Some(handle) }
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker").field("running", &self.stop.is_some()).finish()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Dropping the sender wakes the thread immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A workout in progress.
#[derive(Debug)]
pub struct ActiveSession {
    template_id: String,
    name: String,
    exercises: Vec<Exercise>,
    notes: Option<String>,
    clock: SessionClock,
}

/// Serializable view of an [`ActiveSession`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub template_id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub elapsed_seconds: u64,
    pub can_finish: bool,
}

/// Snapshots the template's exercises, all marked not completed.
pub fn start_session(template: &Workout) -> ActiveSession {
    info!("Starting session for {}", template.name);
    ActiveSession {
        template_id: template.id.clone(),
        name: template.name.clone(),
        exercises: template
            .exercises
            .iter()
            .cloned()
            .map(|exercise| Exercise { completed: Some(false), ..exercise })
            .collect(),
        notes: None,
        clock: SessionClock::default(),
    }
}

/// Records the session through the repository and returns what was saved.
///
/// Refused while no exercise is marked completed; the session is handed back
/// untouched in that case so it can continue.
pub fn end_session<B: StorageBackend>(
    repository: &WorkoutRepository<B>,
    session: ActiveSession,
) -> Result<CompletedWorkout, (ActiveSession, TrackerError)> {
    end_session_at(repository, session, Utc::now())
}

pub fn end_session_at<B: StorageBackend>(
    repository: &WorkoutRepository<B>,
    mut session: ActiveSession,
    completed_at: DateTime<Utc>,
) -> Result<CompletedWorkout, (ActiveSession, TrackerError)> {
    if !session.can_finish() {
        return Err((session, SessionError::NothingCompleted.into()));
    }
    let record = session.to_completed(completed_at);
    if let Err(e) = repository.save_completed(&record) {
        return Err((session, e.into()));
    }
    session.clock.stop();
    info!("Recorded {} ({}s)", record.name, record.duration.unwrap_or_default());
    Ok(record)
}

/// Discards the session. Nothing is persisted.
pub fn cancel_session(session: ActiveSession) {
    debug!("Cancelled session for {} after {}s", session.name, session.elapsed_seconds());
    drop(session);
}

impl ActiveSession {
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    /// Flips the exercise's completed flag and returns the new value.
    pub fn toggle_exercise(&mut self, exercise_id: &str) -> Result<bool, SessionError> {
        let exercise = self
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))?;
        let completed = !exercise.is_completed();
        exercise.completed = Some(completed);
        Ok(completed)
    }

    /// True once at least one exercise is marked completed.
    pub fn can_finish(&self) -> bool {
        self.exercises.iter().any(Exercise::is_completed)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn tick(&self) {
        self.clock.tick();
    }

    pub fn start_timer(&mut self) {
        self.clock.start();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            template_id: self.template_id.clone(),
            name: self.name.clone(),
            exercises: self.exercises.clone(),
            elapsed_seconds: self.elapsed_seconds(),
            can_finish: self.can_finish(),
        }
    }

    fn to_completed(&self, completed_at: DateTime<Utc>) -> CompletedWorkout {
        CompletedWorkout {
            id: new_id(),
            template_id: self.template_id.clone(),
            name: self.name.clone(),
            exercises: self.exercises.clone(),
            completed_at,
            duration: Some(self.elapsed_seconds()),
            notes: self.notes.clone(),
        }
    }
}

/// A timed stretch session with free-form notes.
#[derive(Debug, Default)]
pub struct StretchSession {
    notes: String,
    clock: SessionClock,
}

impl StretchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn tick(&self) {
        self.clock.tick();
    }

    pub fn start_timer(&mut self) {
        self.clock.start();
    }

    /// Builds the stretch record; notes are trimmed and dropped when blank.
    pub fn to_completed(&self, completed_at: DateTime<Utc>) -> CompletedWorkout {
        let notes = self.notes.trim().to_string();
        CompletedWorkout::stretch(self.elapsed_seconds(), Some(notes), completed_at)
    }
}
