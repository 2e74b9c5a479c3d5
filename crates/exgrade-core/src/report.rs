//! Grade report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::{Attempt, AttemptStatus};
use crate::model::ExerciseSet;
use crate::results::{AttemptGrade, QuestionResponse};

/// The graded outcome of one attempt at an exercise set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the exercise set.
    pub exercise_set: ExerciseSetSummary,
    pub attempt_id: Uuid,
    pub student_id: String,
    pub attempt_number: u32,
    pub status: AttemptStatus,
    /// Recorded responses, in exercise set order.
    pub responses: Vec<QuestionResponse>,
    /// Question ids with no response.
    pub unanswered: Vec<String>,
    pub grade: AttemptGrade,
}

/// Summary of an exercise set (without the full question definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSetSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl GradeReport {
    /// Assemble a report from an attempt's responses.
    ///
    /// Uses the attempt's frozen grade when it has one.
    pub fn new(set: &ExerciseSet, attempt: &Attempt, mut responses: Vec<QuestionResponse>) -> Self {
        let position = |question_id: &str| {
            set.questions
                .iter()
                .position(|q| q.id == question_id)
                .unwrap_or(usize::MAX)
        };
        responses.sort_by_key(|r| position(&r.question_id));

        let unanswered = set
            .questions
            .iter()
            .filter(|q| !responses.iter().any(|r| r.question_id == q.id))
            .map(|q| q.id.clone())
            .collect();
        let grade = attempt
            .grade
            .unwrap_or_else(|| AttemptGrade::for_exercise_set(set, &responses));

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exercise_set: ExerciseSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                question_count: set.questions.len(),
            },
            attempt_id: attempt.id,
            student_id: attempt.student_id.clone(),
            attempt_number: attempt.number,
            status: attempt.status,
            responses,
            unanswered,
            grade,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## {}: attempt {} by {} ({})\n\n",
            self.exercise_set.name, self.attempt_number, self.student_id, self.status
        ));
        md.push_str(&format!(
            "**Score:** {} / {} ({:.1}%)\n\n",
            self.grade.score, self.grade.max_score, self.grade.percentage
        ));

        if !self.responses.is_empty() {
            md.push_str("| Question | Answer | Result | Score | Feedback |\n");
            md.push_str("|----------|--------|--------|-------|----------|\n");
            for r in &self.responses {
                md.push_str(&format!(
                    "| {} | `{}` | {} | {} / {} | {} |\n",
                    r.question_id,
                    r.submitted_answer,
                    if r.verdict.is_correct { "correct" } else { "incorrect" },
                    r.verdict.score_awarded,
                    r.verdict.score_max,
                    r.verdict.feedback_shown.replace('|', "\\|"),
                ));
            }
            md.push('\n');
        }

        if !self.unanswered.is_empty() {
            md.push_str(&format!("**Unanswered:** {}\n", self.unanswered.join(", ")));
        }

        md
    }
}
