//! Student attempts at an exercise set.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ExerciseSet;
use crate::results::AttemptGrade;

/// Where an attempt is in its lifecycle.
///
/// `InProgress` accepts responses. `Completed` has a frozen grade.
/// `Submitted` means the grade was passed back to the LMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Submitted,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::InProgress => write!(f, "in progress"),
            AttemptStatus::Completed => write!(f, "completed"),
            AttemptStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// One student's attempt at an exercise set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub exercise_set_id: String,
    pub student_id: String,
    /// 1-based; unique per student and exercise set.
    pub number: u32,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    /// Set when the exercise set has a time limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Sum of the time spent on each response.
    #[serde(default)]
    pub time_spent_secs: u64,
    /// Frozen when the attempt is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<AttemptGrade>,
}

impl Attempt {
    pub fn new(set: &ExerciseSet, student_id: &str, number: u32, started_at: DateTime<Utc>) -> Self {
        let deadline = set
            .settings
            .time_limit_mins
            .map(|mins| started_at + Duration::minutes(i64::from(mins)));
        Self {
            id: Uuid::new_v4(),
            exercise_set_id: set.id.clone(),
            student_id: student_id.to_string(),
            number,
            status: AttemptStatus::InProgress,
            started_at,
            deadline,
            completed_at: None,
            submitted_at: None,
            time_spent_secs: 0,
            grade: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    /// The deadline, if it has passed at `now`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.deadline.filter(|deadline| now >= *deadline)
    }
}
