//! Checks applied to the add/edit workout form before anything is saved.
//!
//! The repository itself never re-validates what it is given.

use crate::error::ValidationError;
use crate::workout_model::Exercise;

/// Validates a workout form and returns the trimmed name.
pub fn validate_workout(name: &str, exercises: &[Exercise]) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if exercises.is_empty() {
        return Err(ValidationError::NoExercises);
    }
    for (index, exercise) in exercises.iter().enumerate() {
        validate_exercise(exercise).map_err(|reason| ValidationError::InvalidExercise { index, reason })?;
    }
    Ok(name.to_string())
}

fn validate_exercise(exercise: &Exercise) -> Result<(), &'static str> {
    if exercise.name.trim().is_empty() {
        return Err("name must not be empty");
    }
    if exercise.sets == 0 {
        return Err("sets must be positive");
    }
    if exercise.reps == 0 {
        return Err("reps must be positive");
    }
    if !exercise.weight.is_finite() || exercise.weight < 0.0 {
        return Err("weight must be zero or more");
    }
    Ok(())
}
