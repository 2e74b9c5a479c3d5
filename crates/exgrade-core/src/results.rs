//! Grading result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{ExerciseSet, Question};

/// The outcome of validating one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_correct: bool,
    /// `score_max` when correct, 0 otherwise.
    pub score_awarded: f64,
    pub score_max: f64,
    /// The question's correct or incorrect feedback text.
    pub feedback_shown: String,
}

impl ValidationVerdict {
    /// Build the all-or-nothing verdict for a question.
    pub fn new(question: &Question, is_correct: bool) -> Self {
        let (score_awarded, feedback_shown) = if is_correct {
            (question.points, &question.feedback.on_correct)
        } else {
            (0.0, &question.feedback.on_incorrect)
        };
        Self {
            is_correct,
            score_awarded,
            score_max: question.points,
            feedback_shown: feedback_shown.clone(),
        }
    }
}

/// A graded response as recorded by the intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question_id: String,
    pub attempt_id: Uuid,
    /// The raw answer, kept verbatim.
    pub submitted_answer: Value,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub time_spent_secs: u64,
    pub verdict: ValidationVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Present when the exercise set shows answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Value>,
}

/// Aggregate grade for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptGrade {
    pub score: f64,
    pub max_score: f64,
    /// `score / max_score` as a percentage in `[0, 100]`.
    pub percentage: f64,
}

impl AttemptGrade {
    fn from_totals(score: f64, max_score: f64) -> Self {
        let percentage = if max_score > 0.0 {
            (score / max_score * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            score,
            max_score,
            percentage,
        }
    }

    /// Sum the answered questions only.
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a ValidationVerdict>) -> Self {
        let (score, max_score) = verdicts
            .into_iter()
            .fold((0.0, 0.0), |(score, max), v| {
                (score + v.score_awarded, max + v.score_max)
            });
        Self::from_totals(score, max_score)
    }

    /// Grade against the whole set: unanswered questions count as 0 out of
    /// their points. Responses to questions outside the set are ignored.
    pub fn for_exercise_set(set: &ExerciseSet, responses: &[QuestionResponse]) -> Self {
        let score: f64 = responses
            .iter()
            .filter(|r| set.question(&r.question_id).is_some())
            .map(|r| r.verdict.score_awarded)
            .sum();
        Self::from_totals(score, set.total_points())
    }
}
