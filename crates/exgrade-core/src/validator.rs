//! Answer validation and scoring.
//!
//! [`validate`] is total over submissions: any value a student can send,
//! including `null` and wrongly-typed JSON, produces a verdict. Only a
//! malformed [`Question`] yields an error.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::QuestionError;
use crate::model::{choice_index, expression_text, ChoiceKey, Question, QuestionKind, TextMatching};
use crate::results::ValidationVerdict;

/// Grade a submitted answer against a question.
///
/// Pure and deterministic: no I/O, no shared state. Scoring is
/// all-or-nothing, so `score_awarded` is either the question's points or 0.
pub fn validate(question: &Question, submitted: &Value) -> Result<ValidationVerdict, QuestionError> {
    question.check()?;

    let is_correct = match &question.kind {
        QuestionKind::MultipleChoice { correct, .. } => check_choice(correct, submitted),
        QuestionKind::TrueFalse { correct } => submitted.as_bool().map(|b| b == *correct),
        QuestionKind::ShortText { correct, matching } => submitted
            .as_str()
            .and_then(|answer| check_text(correct, matching, answer)),
        QuestionKind::MathExpression { correct, matching } => expression_text(submitted)
            .and_then(|answer| check_text(correct, matching, &answer)),
        QuestionKind::Numeric { correct, tolerance } => parse_number(submitted)
            .map(|value| (value - correct).abs() <= tolerance.unwrap_or(0.0)),
    }
    .unwrap_or_else(|| {
        tracing::debug!(
            question_id = %question.id,
            question_type = %question.question_type(),
            "malformed submission graded as incorrect"
        );
        false
    });

    Ok(ValidationVerdict::new(question, is_correct))
}

// Checkers return `None` when the submission has the wrong shape.
fn check_choice(correct: &ChoiceKey, submitted: &Value) -> Option<bool> {
    match correct {
        ChoiceKey::Single(index) => Some(choice_index(submitted)? == *index),
        ChoiceKey::Multiple(indices) => {
            let items = submitted.as_array()?;
            if items.is_empty() {
                return None;
            }
            let chosen = items
                .iter()
                .map(choice_index)
                .collect::<Option<BTreeSet<_>>>()?;
            Some(&chosen == indices)
        }
    }
}

fn check_text(correct: &str, matching: &TextMatching, submitted: &str) -> Option<bool> {
    let answer = matching.normalize(submitted);
    if answer.is_empty() {
        return None;
    }
    let matched = std::iter::once(correct)
        .chain(matching.accepted_alternatives.iter().map(String::as_str))
        .any(|accepted| matching.normalize(accepted) == answer);
    Some(matched)
}

/// Read a submitted number, parsing strings such as `"4.00"`.
fn parse_number(submitted: &Value) -> Option<f64> {
    let value = match submitted {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
