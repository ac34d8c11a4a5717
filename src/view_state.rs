//! What the UI is currently showing, as one tagged state.

use serde::{Deserialize, Serialize};

use crate::session::{ActiveSession, StretchSession};
use crate::workout_model::Workout;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Home,
    History,
    Progress,
    Settings,
}

#[derive(Debug)]
pub enum ViewState {
    Browsing(Tab),
    Adding,
    Editing(Workout),
    Active(ActiveSession),
    Stretching(StretchSession),
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Browsing(Tab::Home)
    }
}

/// Serializable summary of a [`ViewState`], for the FFI boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ViewKind {
    Browsing { tab: Tab },
    Adding,
    Editing {
        #[serde(rename = "workoutId")]
        workout_id: String,
    },
    Active,
    Stretching,
}

impl ViewState {
    /// True while a workout or stretch session is open.
    pub fn in_session(&self) -> bool {
        matches!(self, ViewState::Active(_) | ViewState::Stretching(_))
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            ViewState::Browsing(tab) => ViewKind::Browsing { tab: *tab },
            ViewState::Adding => ViewKind::Adding,
            ViewState::Editing(workout) => ViewKind::Editing { workout_id: workout.id.clone() },
            ViewState::Active(_) => ViewKind::Active,
            ViewState::Stretching(_) => ViewKind::Stretching,
        }
    }
}
