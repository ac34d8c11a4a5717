//! # Workout Tracker Core
//!
//! Local persistence and workout rotation for an offline workout-tracking app,
//! designed for FFI (Foreign Function Interface) integration with Flutter and
//! other cross-platform UIs. Data lives in LMDB on the device; there is no
//! server and no sync.
//!
//! ## Features
//!
//! - **Workout templates**: ordered, reusable lists of exercises
//! - **Rotation**: the next suggested workout follows the most recent completion
//! - **Sessions**: in-memory workout and stretch sessions with a running timer
//! - **History**: append-only completed workouts, grouped and charted
//! - **Import/export**: the whole dataset as one validated JSON document
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use workout_tracker_core::{create_tracker, add_workout, get_next_workout};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"dbPath":"workouts"}"#).unwrap();
//! let tracker = create_tracker(config.as_ptr());
//!
//! let form = CString::new(
//!     r#"{"name":"Push","exercises":[{"id":"e1","name":"Bench","sets":3,"reps":8,"weight":135}]}"#,
//! ).unwrap();
//! let saved = add_workout(tracker, form.as_ptr());
//! let next = get_next_workout(tracker);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON [`AppResponse`] C string that must be released
//! with [`free_response`].
//!
//! - [`create_tracker`] / [`close_tracker`] - Open and release a tracker
//! - [`get_templates`], [`get_completed`], [`get_next_workout`], [`get_progress`], [`get_history`]
//! - [`get_view`], [`select_tab`], [`begin_add`], [`begin_edit`], [`close_form`]
//! - [`add_workout`], [`update_workout`], [`delete_workout`], [`reorder_templates`]
//! - [`start_workout`], [`toggle_exercise`], [`set_session_notes`], [`tick_session`], [`get_session`], [`end_workout`], [`cancel_workout`]
//! - [`start_stretch`], [`complete_stretch`]
//! - [`export_data`], [`import_data`], [`clear_templates`], [`clear_completed`]

pub mod config;
pub mod error;
pub mod local_db_state;
pub mod progress;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod tracker;
pub mod validation;
pub mod view_state;
pub mod workout_model;
pub mod workout_repository;
mod app_response;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::config::TrackerConfig;
use crate::local_db_state::AppDbState;
use crate::storage::StorageAdapter;
use crate::tracker::WorkoutTracker;
use crate::view_state::Tab;
use crate::workout_model::{NewWorkout, Workout};
use crate::workout_repository::WorkoutRepository;

/// The tracker handed across the FFI boundary.
pub type LmdbTracker = WorkoutTracker<AppDbState>;

/// Opens the database described by `config_json` and loads all workout data.
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON [`TrackerConfig`], e.g.
///   `{"dbPath": "/data/app/workouts", "namespace": "workout-tracker"}`
///
/// # Returns
///
/// A pointer to the tracker, or null when the config or the database cannot
/// be opened (details are logged). Unreadable stored data does not fail here;
/// the tracker starts empty so the host can import or clear.
/// Release it with [`close_tracker`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_tracker(config_json: *const c_char) -> *mut LmdbTracker {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_tracker");
        return std::ptr::null_mut();
    }

    let config_str = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match TrackerConfig::from_json(config_str) {
        Ok(config) => config,
        Err(e) => {
            warn!("Invalid tracker config: {e}");
            return std::ptr::null_mut();
        }
    };

    info!("Opening workout database at {}.lmdb", config.db_path);

    let db = match AppDbState::init(&config.db_path, config.map_size) {
        Ok(db) => db,
        Err(e) => {
            warn!("Failed to initialize database: {e}");
            return std::ptr::null_mut();
        }
    };

    let repository = WorkoutRepository::new(StorageAdapter::new(db, &config.namespace));
    let tracker = WorkoutTracker::open(repository).with_live_timer(true);
    info!("Workout tracker ready");
    Box::into_raw(Box::new(tracker))
}

/// Releases a tracker created by [`create_tracker`]. Any open session is
/// discarded. The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_tracker(state: *mut LmdbTracker) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_tracker".to_string());
        return response_to_c_string(&error);
    }

    let tracker = unsafe { Box::from_raw(state) };
    drop(tracker);
    response_to_c_string(&AppResponse::success("Tracker closed successfully"))
}

/// Frees a response string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *const c_char) {
    if response.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(response as *mut c_char) });
}

/// All templates in rotation order.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_templates(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_templates", |tracker| AppResponse::from_payload(&tracker.templates()))
}

/// The workout history in the order it was recorded.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_completed(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_completed", |tracker| AppResponse::from_payload(&tracker.completed()))
}

/// The next workout in rotation, or `NotFound` when there are no templates.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_next_workout(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_next_workout", |tracker| match tracker.next_workout() {
        Some(workout) => AppResponse::from_payload(workout),
        None => AppResponse::NotFound("No workout templates".to_string()),
    })
}

/// Weekly count and per-exercise weight/volume series.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_progress(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_progress", |tracker| AppResponse::from_payload(&tracker.progress()))
}

/// History grouped by month, newest first.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_history(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_history", |tracker| AppResponse::from_payload(&tracker.history()))
}

/// What the UI is showing, e.g. `{"view": "browsing", "tab": "home"}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_view(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_view", |tracker| AppResponse::from_payload(&tracker.view().kind()))
}

/// Switches tab by name (`home`, `history`, `progress`, `settings`).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn select_tab(state: *mut LmdbTracker, tab: *const c_char) -> *const c_char {
    let tab_str = match c_ptr_to_string(tab, "tab") {
        Ok(tab) => tab,
        Err(error_ptr) => return error_ptr,
    };
    let tab: Tab = match serde_json::from_value(serde_json::Value::String(tab_str)) {
        Ok(tab) => tab,
        Err(e) => return response_to_c_string(&AppResponse::BadRequest(format!("Unknown tab: {e}"))),
    };
    with_tracker(state, "select_tab", |tracker| {
        tracker.select_tab(tab);
        AppResponse::from_payload(&tracker.view().kind())
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn begin_add(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "begin_add", |tracker| {
        respond(tracker.begin_add().map(|()| tracker.view().kind()))
    })
}

/// Opens the edit form for the template `id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn begin_edit(state: *mut LmdbTracker, id: *const c_char) -> *const c_char {
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "begin_edit", |tracker| {
        respond(tracker.begin_edit(&id_str).map(|()| tracker.view().kind()))
    })
}

/// Leaves the add/edit form without saving.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_form(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "close_form", |tracker| {
        tracker.close_form();
        AppResponse::from_payload(&tracker.view().kind())
    })
}

/// Creates a template from `{"name": ..., "exercises": [...]}`.
///
/// Returns the saved workout, including its generated id.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_workout(state: *mut LmdbTracker, json_ptr: *const c_char) -> *const c_char {
    let form: NewWorkout = match parse_json_arg(json_ptr) {
        Ok(form) => form,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "add_workout", |tracker| respond(tracker.add_workout(form)))
}

/// Replaces the name and exercises of the template `id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_workout(
    state: *mut LmdbTracker,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    let form: NewWorkout = match parse_json_arg(json_ptr) {
        Ok(form) => form,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "update_workout", |tracker| respond(tracker.update_workout(&id_str, form)))
}

/// Deletes the template `id`. Unknown ids succeed without changes.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_workout(state: *mut LmdbTracker, id: *const c_char) -> *const c_char {
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "delete_workout", |tracker| {
        respond(tracker.delete_workout(&id_str).map(|()| format!("Workout {id_str} deleted")))
    })
}

/// Stores a complete template list in the given order.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reorder_templates(state: *mut LmdbTracker, json_ptr: *const c_char) -> *const c_char {
    let templates: Vec<Workout> = match parse_json_arg(json_ptr) {
        Ok(templates) => templates,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "reorder_templates", |tracker| {
        respond(tracker.reorder_templates(&templates).map(|()| tracker.templates().to_vec()))
    })
}

/// Opens a workout session from the template `id` and starts its timer.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn start_workout(state: *mut LmdbTracker, id: *const c_char) -> *const c_char {
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "start_workout", |tracker| respond(tracker.start_workout(&id_str)))
}

/// Flips the completed flag of one exercise in the open session.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_exercise(state: *mut LmdbTracker, exercise_id: *const c_char) -> *const c_char {
    let id_str = match c_ptr_to_string(exercise_id, "exercise id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "toggle_exercise", |tracker| {
        respond(tracker.toggle_exercise(&id_str).and_then(|_| {
            tracker
                .session_view()
                .ok_or_else(|| error::SessionError::NoActiveSession.into())
        }))
    })
}

/// Sets the notes recorded with the open workout. Blank notes clear them.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_session_notes(state: *mut LmdbTracker, notes: *const c_char) -> *const c_char {
    let notes_str = match c_ptr_to_string(notes, "notes") {
        Ok(notes) => notes,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "set_session_notes", |tracker| {
        respond(tracker.set_session_notes(Some(notes_str)).map(|()| "Session notes updated"))
    })
}

/// Advances the open session's timer by one second and returns the elapsed seconds.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn tick_session(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "tick_session", |tracker| respond(tracker.tick()))
}

/// Current state of the open workout session.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_session(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "get_session", |tracker| match tracker.session_view() {
        Some(view) => AppResponse::from_payload(&view),
        None => AppResponse::NotFound("No session in progress".to_string()),
    })
}

/// Records the open session. Requires at least one completed exercise.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn end_workout(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "end_workout", |tracker| respond(tracker.end_workout()))
}

/// Discards the open session without saving anything.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cancel_workout(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "cancel_workout", |tracker| {
        respond(tracker.cancel_workout().map(|()| "Workout cancelled"))
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn start_stretch(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "start_stretch", |tracker| {
        respond(tracker.start_stretch().map(|()| "Stretch session started"))
    })
}

/// Records the open stretch session with the given notes (may be empty).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn complete_stretch(state: *mut LmdbTracker, notes: *const c_char) -> *const c_char {
    let notes_str = match c_ptr_to_string(notes, "notes") {
        Ok(notes) => notes,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "complete_stretch", |tracker| respond(tracker.complete_stretch(&notes_str)))
}

/// The whole dataset as `{"templates": [...], "completed": [...]}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_data(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "export_data", |tracker| respond(tracker.export()))
}

/// Replaces all data with an exported document. Rejected files change nothing.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_data(state: *mut LmdbTracker, json_ptr: *const c_char) -> *const c_char {
    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    with_tracker(state, "import_data", |tracker| {
        respond(tracker.import_json(&json_str).map(|snapshot| {
            format!(
                "Imported {} templates and {} completed workouts",
                snapshot.templates.len(),
                snapshot.completed.len()
            )
        }))
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_templates(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "clear_templates", |tracker| {
        respond(tracker.clear_templates().map(|()| "All workout templates cleared"))
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_completed(state: *mut LmdbTracker) -> *const c_char {
    with_tracker(state, "clear_completed", |tracker| {
        respond(tracker.clear_completed().map(|()| "Workout history cleared"))
    })
}

/// Runs `operation` against the tracker behind `state`, or reports a null pointer.
fn with_tracker<F>(state: *mut LmdbTracker, name: &str, operation: F) -> *const c_char
where
    F: FnOnce(&mut LmdbTracker) -> AppResponse,
{
    match unsafe { state.as_mut() } {
        Some(tracker) => response_to_c_string(&operation(tracker)),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {name}"));
            response_to_c_string(&error)
        }
    }
}

fn respond<T: Serialize, E: Into<AppResponse>>(result: Result<T, E>) -> AppResponse {
    match result {
        Ok(payload) => AppResponse::from_payload(&payload),
        Err(e) => e.into(),
    }
}

fn parse_json_arg<T: serde::de::DeserializeOwned>(json_ptr: *const c_char) -> Result<T, *const c_char> {
    let json_str = c_ptr_to_string(json_ptr, "JSON")?;
    serde_json::from_str(&json_str).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Serializes the response to JSON and hands ownership of the C string to the
/// caller. Returns null if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - Pointer to a `BadRequest` response otherwise
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
