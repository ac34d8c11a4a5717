//! Read-only views over the workout history.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::workout_model::CompletedWorkout;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGroup {
    /// e.g. `"October 2026"`
    pub label: String,
    pub workouts: Vec<CompletedWorkout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub workouts_this_week: usize,
    pub exercises: BTreeMap<String, Vec<ProgressPoint>>,
}

impl ProgressSummary {
    pub fn build(completed: &[CompletedWorkout], now: DateTime<Utc>) -> Self {
        Self {
            workouts_this_week: workouts_since(completed, now, 7),
            exercises: exercise_progress(completed),
        }
    }
}

/// Number of records completed strictly after `now - days`.
pub fn workouts_since(completed: &[CompletedWorkout], now: DateTime<Utc>, days: i64) -> usize {
    let cutoff = now - Duration::days(days);
    completed.iter().filter(|w| w.completed_at > cutoff).count()
}

/// Weight and volume per exercise name, in history order.
pub fn exercise_progress(completed: &[CompletedWorkout]) -> BTreeMap<String, Vec<ProgressPoint>> {
    let mut progress: BTreeMap<String, Vec<ProgressPoint>> = BTreeMap::new();
    for workout in completed {
        for exercise in &workout.exercises {
            progress.entry(exercise.name.clone()).or_default().push(ProgressPoint {
                date: workout.completed_at,
                weight: exercise.weight,
                volume: exercise.volume(),
            });
        }
    }
    progress
}

/// History grouped by calendar month, newest month first and newest record
/// first within each month.
pub fn history_by_month(completed: &[CompletedWorkout]) -> Vec<MonthGroup> {
    let mut months: BTreeMap<(i32, u32), Vec<CompletedWorkout>> = BTreeMap::new();
    for workout in completed {
        let at = workout.completed_at;
        months.entry((at.year(), at.month())).or_default().push(workout.clone());
    }

    months
        .into_iter()
        .rev()
        .map(|((year, month), mut workouts)| {
            workouts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|first| first.format("%B %Y").to_string())
                .unwrap_or_default();
            MonthGroup { label, workouts }
        })
        .collect()
}
