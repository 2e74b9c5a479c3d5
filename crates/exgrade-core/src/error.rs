//! Error types for question configuration and response intake.
//!
//! A malformed *submission* is never an error: the validator grades it as
//! incorrect. These types cover faults in the question definitions themselves
//! and in the intake collaborator that feeds the validator.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::attempt::AttemptStatus;
use crate::model::QuestionType;

/// A question definition that violates the model invariants.
///
/// Surfacing one of these while grading is a server-side fault; it must not
/// be reported to the student as a wrong answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuestionError {
    /// The `type` field names no known question type.
    #[error("question '{question_id}': unknown question type '{type_name}'")]
    UnknownType {
        question_id: String,
        type_name: String,
    },

    /// No correct answer was configured.
    #[error("question '{question_id}': missing correct answer")]
    MissingCorrectAnswer { question_id: String },

    /// The correct answer's shape does not fit the question type.
    #[error("question '{question_id}': {question_type} questions need {expected} as the correct answer")]
    AnswerShapeMismatch {
        question_id: String,
        question_type: QuestionType,
        expected: &'static str,
    },

    /// Numeric tolerance is negative or not finite.
    #[error("question '{question_id}': tolerance must be a non-negative number, got {tolerance}")]
    NegativeTolerance { question_id: String, tolerance: f64 },

    /// Points are negative or not finite.
    #[error("question '{question_id}': points must be a non-negative number, got {points}")]
    InvalidPoints { question_id: String, points: f64 },

    /// Multiple choice needs at least two options.
    #[error("question '{question_id}': multiple choice needs at least 2 options, got {count}")]
    TooFewOptions { question_id: String, count: usize },

    /// A correct choice index points past the option list.
    #[error("question '{question_id}': correct choice {index} is out of range for {option_count} options")]
    ChoiceOutOfRange {
        question_id: String,
        index: usize,
        option_count: usize,
    },

    /// The correct answer is blank (empty text or an empty choice list).
    #[error("question '{question_id}': correct answer is empty")]
    EmptyCorrectAnswer { question_id: String },
}

impl QuestionError {
    /// The id of the offending question.
    pub fn question_id(&self) -> &str {
        match self {
            QuestionError::UnknownType { question_id, .. }
            | QuestionError::MissingCorrectAnswer { question_id }
            | QuestionError::AnswerShapeMismatch { question_id, .. }
            | QuestionError::NegativeTolerance { question_id, .. }
            | QuestionError::InvalidPoints { question_id, .. }
            | QuestionError::TooFewOptions { question_id, .. }
            | QuestionError::ChoiceOutOfRange { question_id, .. }
            | QuestionError::EmptyCorrectAnswer { question_id } => question_id,
        }
    }
}

/// Errors raised while accepting a student's response.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The submission references a question outside the attempt's set.
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    /// No exercise set with this id.
    #[error("exercise set not found: {0}")]
    ExerciseSetNotFound(String),

    /// No attempt with this id was started.
    #[error("attempt not found: {0}")]
    AttemptNotFound(Uuid),

    /// The attempt no longer accepts changes.
    #[error("attempt {attempt_id} is {status}")]
    AttemptClosed {
        attempt_id: Uuid,
        status: AttemptStatus,
    },

    /// Only completed attempts can be submitted.
    #[error("attempt {0} is still in progress")]
    AttemptNotCompleted(Uuid),

    /// The attempt's time limit has passed.
    #[error("attempt {attempt_id} expired at {deadline}")]
    AttemptExpired {
        attempt_id: Uuid,
        deadline: DateTime<Utc>,
    },

    /// The student used every attempt the exercise set allows.
    #[error("student '{student_id}' has used all {max_attempts} attempt(s) at '{exercise_set_id}'")]
    AttemptLimitReached {
        exercise_set_id: String,
        student_id: String,
        max_attempts: u32,
    },

    /// The attempt already holds a response for this question.
    #[error("attempt {attempt_id} already answered question '{question_id}'")]
    DuplicateResponse {
        question_id: String,
        attempt_id: Uuid,
    },

    /// The stored question is malformed.
    #[error("invalid question definition: {0}")]
    InvalidQuestion(#[from] QuestionError),

    /// The question repository failed.
    #[error("question repository failure: {0:#}")]
    Repository(anyhow::Error),
}

impl IntakeError {
    /// Returns `true` if this is a server fault rather than a problem with
    /// the student's request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            IntakeError::InvalidQuestion(_) | IntakeError::Repository(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_classification() {
        let shape = QuestionError::MissingCorrectAnswer {
            question_id: "q1".into(),
        };
        assert!(IntakeError::from(shape).is_internal());
        assert!(IntakeError::Repository(anyhow::anyhow!("db down")).is_internal());
        assert!(!IntakeError::QuestionNotFound("q1".into()).is_internal());
        assert!(!IntakeError::AttemptNotFound(Uuid::nil()).is_internal());
        assert!(!IntakeError::AttemptClosed {
            attempt_id: Uuid::nil(),
            status: AttemptStatus::Completed,
        }
        .is_internal());
        assert!(!IntakeError::AttemptLimitReached {
            exercise_set_id: "set".into(),
            student_id: "ana".into(),
            max_attempts: 1,
        }
        .is_internal());
        assert!(!IntakeError::DuplicateResponse {
            question_id: "q1".into(),
            attempt_id: Uuid::nil(),
        }
        .is_internal());
    }

    #[test]
    fn closed_attempt_message_names_status() {
        let err = IntakeError::AttemptClosed {
            attempt_id: Uuid::nil(),
            status: AttemptStatus::Submitted,
        };
        assert_eq!(
            err.to_string(),
            "attempt 00000000-0000-0000-0000-000000000000 is submitted"
        );
    }

    #[test]
    fn messages_name_the_question() {
        let err = QuestionError::AnswerShapeMismatch {
            question_id: "derivative".into(),
            question_type: QuestionType::Numeric,
            expected: "a number",
        };
        assert_eq!(err.question_id(), "derivative");
        assert_eq!(
            err.to_string(),
            "question 'derivative': numeric questions need a number as the correct answer"
        );
    }
}
