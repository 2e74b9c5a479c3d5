//! Response intake: the caller side of the validator.
//!
//! Students start an attempt at an exercise set, submit answers to it, and
//! complete it. Each answer is graded against the question loaded from the
//! repository and recorded against the attempt, one response per question
//! unless retries are enabled. Completing an attempt freezes its grade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::attempt::{Attempt, AttemptStatus};
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::model::{ExerciseSet, ExerciseSettings, Question};
use crate::results::{AttemptGrade, QuestionResponse, ValidationVerdict};
use crate::validator::validate;

/// Source of exercise sets and question definitions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch a question by id. `Ok(None)` means it does not exist.
    async fn find_question(&self, question_id: &str) -> anyhow::Result<Option<Question>>;

    /// Fetch an exercise set by id. `Ok(None)` means it does not exist.
    async fn find_exercise_set(&self, exercise_set_id: &str) -> anyhow::Result<Option<ExerciseSet>>;
}

/// Repository backed by loaded exercise sets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionRepository {
    questions: HashMap<String, Question>,
    exercise_sets: HashMap<String, ExerciseSet>,
}

impl InMemoryQuestionRepository {
    pub fn new(exercise_sets: impl IntoIterator<Item = ExerciseSet>) -> Self {
        let mut repository = Self::default();
        for set in exercise_sets {
            for question in &set.questions {
                repository
                    .questions
                    .insert(question.id.clone(), question.clone());
            }
            repository.exercise_sets.insert(set.id.clone(), set);
        }
        repository
    }

    pub fn from_exercise_set(set: &ExerciseSet) -> Self {
        Self::new([set.clone()])
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn find_question(&self, question_id: &str) -> anyhow::Result<Option<Question>> {
        Ok(self.questions.get(question_id).cloned())
    }

    async fn find_exercise_set(&self, exercise_set_id: &str) -> anyhow::Result<Option<ExerciseSet>> {
        Ok(self.exercise_sets.get(exercise_set_id).cloned())
    }
}

/// A raw, untrusted answer tied to a question and an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub question_id: String,
    pub attempt_id: Uuid,
    pub answer: Value,
    #[serde(default)]
    pub time_spent_secs: u64,
}

struct AttemptEntry {
    attempt: Attempt,
    exercise_set: Arc<ExerciseSet>,
}

#[derive(Default)]
struct IntakeState {
    attempts: HashMap<Uuid, AttemptEntry>,
    responses: HashMap<(Uuid, String), QuestionResponse>,
}

/// Runs attempts, grades submissions and keeps the resulting responses.
pub struct ResponseIntake {
    repository: Arc<dyn QuestionRepository>,
    config: IntakeConfig,
    state: Mutex<IntakeState>,
}

impl ResponseIntake {
    pub fn new(repository: Arc<dyn QuestionRepository>, config: IntakeConfig) -> Self {
        Self {
            repository,
            config,
            state: Mutex::new(IntakeState::default()),
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Start an attempt, or resume the student's attempt in progress.
    ///
    /// Fails once the student has used the exercise set's `max_attempts`.
    pub async fn start_attempt(
        &self,
        exercise_set_id: &str,
        student_id: &str,
    ) -> Result<Attempt, IntakeError> {
        let exercise_set = self
            .repository
            .find_exercise_set(exercise_set_id)
            .await
            .map_err(IntakeError::Repository)?
            .ok_or_else(|| IntakeError::ExerciseSetNotFound(exercise_set_id.to_string()))?;

        let mut state = self.lock();
        let previous: Vec<&Attempt> = state
            .attempts
            .values()
            .map(|entry| &entry.attempt)
            .filter(|a| a.exercise_set_id == exercise_set_id && a.student_id == student_id)
            .collect();

        if let Some(open) = previous.iter().find(|a| a.is_open()) {
            tracing::debug!(attempt_id = %open.id, student_id, "resuming attempt");
            return Ok((*open).clone());
        }

        let used = u32::try_from(previous.len()).unwrap_or(u32::MAX);
        let max_attempts = exercise_set.settings.max_attempts;
        if used >= max_attempts {
            return Err(IntakeError::AttemptLimitReached {
                exercise_set_id: exercise_set_id.to_string(),
                student_id: student_id.to_string(),
                max_attempts,
            });
        }

        let attempt = Attempt::new(&exercise_set, student_id, used + 1, Utc::now());
        tracing::info!(
            attempt_id = %attempt.id,
            exercise_set_id,
            student_id,
            number = attempt.number,
            "attempt started"
        );
        state.attempts.insert(
            attempt.id,
            AttemptEntry {
                attempt: attempt.clone(),
                exercise_set: Arc::new(exercise_set),
            },
        );
        Ok(attempt)
    }

    /// Grade and record a submission.
    ///
    /// A malformed answer is recorded as incorrect. Errors are reserved for
    /// unknown questions, attempts that are closed or past their deadline,
    /// duplicate answers, and faults in the question or the repository (see
    /// [`IntakeError::is_internal`]).
    pub async fn submit(&self, submission: Submission) -> Result<QuestionResponse, IntakeError> {
        let key = (submission.attempt_id, submission.question_id.clone());

        let exercise_set = {
            let state = self.lock();
            let entry = state
                .attempts
                .get(&submission.attempt_id)
                .ok_or(IntakeError::AttemptNotFound(submission.attempt_id))?;
            ensure_accepting(&entry.attempt, Utc::now())?;
            // Early rejection; the check is repeated under the insert lock.
            if !self.config.allow_retry && state.responses.contains_key(&key) {
                return Err(duplicate(&key));
            }
            Arc::clone(&entry.exercise_set)
        };

        if exercise_set.question(&submission.question_id).is_none() {
            return Err(IntakeError::QuestionNotFound(submission.question_id));
        }

        let question = self
            .repository
            .find_question(&submission.question_id)
            .await
            .map_err(IntakeError::Repository)?
            .ok_or_else(|| IntakeError::QuestionNotFound(submission.question_id.clone()))?;

        let verdict = validate(&question, &submission.answer).inspect_err(|e| {
            tracing::error!(
                attempt_id = %submission.attempt_id,
                "cannot grade submission: {e}"
            );
        })?;

        let response = self.build_response(&question, &exercise_set.settings, submission, verdict);

        let mut guard = self.lock();
        let state = &mut *guard;
        let entry = state
            .attempts
            .get(&key.0)
            .ok_or(IntakeError::AttemptNotFound(key.0))?;
        ensure_accepting(&entry.attempt, response.submitted_at)?;
        if !self.config.allow_retry && state.responses.contains_key(&key) {
            return Err(duplicate(&key));
        }
        if state.responses.insert(key, response.clone()).is_some() {
            tracing::info!(
                attempt_id = %response.attempt_id,
                question_id = %response.question_id,
                "replaced earlier response"
            );
        }
        tracing::debug!(
            attempt_id = %response.attempt_id,
            question_id = %response.question_id,
            correct = response.verdict.is_correct,
            "response recorded"
        );

        Ok(response)
    }

    /// Close an attempt and freeze its grade over the whole exercise set.
    pub fn complete_attempt(&self, attempt_id: Uuid) -> Result<Attempt, IntakeError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let responses: Vec<QuestionResponse> = state
            .responses
            .values()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect();
        let entry = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or(IntakeError::AttemptNotFound(attempt_id))?;
        if !entry.attempt.is_open() {
            return Err(IntakeError::AttemptClosed {
                attempt_id,
                status: entry.attempt.status,
            });
        }

        let grade = AttemptGrade::for_exercise_set(&entry.exercise_set, &responses);
        let attempt = &mut entry.attempt;
        attempt.status = AttemptStatus::Completed;
        attempt.completed_at = Some(Utc::now());
        attempt.time_spent_secs = responses.iter().map(|r| r.time_spent_secs).sum();
        attempt.grade = Some(grade);
        tracing::info!(
            attempt_id = %attempt_id,
            score = grade.score,
            max_score = grade.max_score,
            "attempt completed"
        );
        Ok(attempt.clone())
    }

    /// Mark a completed attempt's grade as passed back to the LMS.
    pub fn mark_submitted(&self, attempt_id: Uuid) -> Result<Attempt, IntakeError> {
        let mut state = self.lock();
        let entry = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or(IntakeError::AttemptNotFound(attempt_id))?;
        let attempt = &mut entry.attempt;
        match attempt.status {
            AttemptStatus::InProgress => return Err(IntakeError::AttemptNotCompleted(attempt_id)),
            AttemptStatus::Submitted => {
                return Err(IntakeError::AttemptClosed {
                    attempt_id,
                    status: attempt.status,
                })
            }
            AttemptStatus::Completed => {}
        }
        attempt.status = AttemptStatus::Submitted;
        attempt.submitted_at = Some(Utc::now());
        Ok(attempt.clone())
    }

    pub fn attempt(&self, attempt_id: Uuid) -> Option<Attempt> {
        self.lock()
            .attempts
            .get(&attempt_id)
            .map(|entry| entry.attempt.clone())
    }

    /// A student's attempts at an exercise set, by attempt number.
    pub fn attempts_for_student(&self, exercise_set_id: &str, student_id: &str) -> Vec<Attempt> {
        let mut attempts: Vec<Attempt> = self
            .lock()
            .attempts
            .values()
            .map(|entry| &entry.attempt)
            .filter(|a| a.exercise_set_id == exercise_set_id && a.student_id == student_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.number);
        attempts
    }

    /// All responses for an attempt, oldest first.
    pub fn responses_for_attempt(&self, attempt_id: Uuid) -> Vec<QuestionResponse> {
        let mut responses: Vec<QuestionResponse> = self
            .lock()
            .responses
            .values()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect();
        responses.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });
        responses
    }

    /// The frozen grade of a completed attempt, or the running grade over
    /// the questions answered so far.
    pub fn attempt_grade(&self, attempt_id: Uuid) -> AttemptGrade {
        if let Some(grade) = self.attempt(attempt_id).and_then(|a| a.grade) {
            return grade;
        }
        let responses = self.responses_for_attempt(attempt_id);
        AttemptGrade::from_verdicts(responses.iter().map(|r| &r.verdict))
    }

    fn build_response(
        &self,
        question: &Question,
        settings: &ExerciseSettings,
        submission: Submission,
        verdict: ValidationVerdict,
    ) -> QuestionResponse {
        let show_explanations = settings
            .show_explanations
            .unwrap_or(self.config.show_explanations);
        let explanation = question
            .feedback
            .explanation
            .clone()
            .filter(|_| show_explanations);
        let hint = question
            .feedback
            .hint
            .clone()
            .filter(|_| self.config.hints_on_incorrect && !verdict.is_correct);
        let correct_answer = settings.show_answers.then(|| question.correct_answer());

        QuestionResponse {
            id: Uuid::new_v4(),
            question_id: submission.question_id,
            attempt_id: submission.attempt_id,
            submitted_answer: submission.answer,
            submitted_at: Utc::now(),
            time_spent_secs: submission.time_spent_secs,
            verdict,
            explanation,
            hint,
            correct_answer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, IntakeState> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_accepting(attempt: &Attempt, now: DateTime<Utc>) -> Result<(), IntakeError> {
    if !attempt.is_open() {
        return Err(IntakeError::AttemptClosed {
            attempt_id: attempt.id,
            status: attempt.status,
        });
    }
    if let Some(deadline) = attempt.expired_at(now) {
        return Err(IntakeError::AttemptExpired {
            attempt_id: attempt.id,
            deadline,
        });
    }
    Ok(())
}

fn duplicate(key: &(Uuid, String)) -> IntakeError {
    IntakeError::DuplicateResponse {
        question_id: key.1.clone(),
        attempt_id: key.0,
    }
}
