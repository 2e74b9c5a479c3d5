//! Core data model types for exgrade.
//!
//! Questions arrive as loosely-typed [`QuestionDefinition`]s (the authoring
//! shape stored by the question repository) and are converted into typed
//! [`Question`]s, whose [`QuestionKind`] carries a precisely-typed correct
//! answer for each question type.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuestionError;

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortText,
    Numeric,
    MathExpression,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::TrueFalse => write!(f, "true_false"),
            QuestionType::ShortText => write!(f, "short_text"),
            QuestionType::Numeric => write!(f, "numeric"),
            QuestionType::MathExpression => write!(f, "math_expression"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "true_false" => Ok(QuestionType::TrueFalse),
            "short_text" | "short_answer" => Ok(QuestionType::ShortText),
            "numeric" => Ok(QuestionType::Numeric),
            "math_expression" | "mathematical_expression" => Ok(QuestionType::MathExpression),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Feedback texts attached to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Shown when the answer is correct.
    pub on_correct: String,
    /// Shown when the answer is incorrect.
    pub on_incorrect: String,
    /// Worked explanation, attached by the intake when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Hint for a retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Per-type tuning knobs as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionConfig {
    /// Choice labels (multiple choice only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Absolute tolerance (numeric only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Compare text case-sensitively (text and math only).
    #[serde(default)]
    pub case_sensitive: bool,
    /// Other spellings that also count as correct (text and math only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_alternatives: Vec<String>,
}

/// A question as stored by the question repository.
///
/// `correct_answer` is polymorphic: its expected shape depends on
/// `question_type`. Convert with `Question::try_from` to check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Value>,
    #[serde(default)]
    pub config: QuestionConfig,
    #[serde(default = "default_points")]
    pub points: f64,
    pub feedback: Feedback,
}

fn default_points() -> f64 {
    1.0
}

/// The correct choice(s) of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceKey {
    /// Exactly one option is correct; the student submits one index.
    Single(usize),
    /// A set of options is correct; the student submits a list of indices.
    Multiple(BTreeSet<usize>),
}

/// How free-text answers are compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatching {
    pub case_sensitive: bool,
    pub accepted_alternatives: Vec<String>,
}

impl TextMatching {
    /// Trim and, unless case-sensitive, lowercase a text for comparison.
    pub fn normalize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }
}

/// A question type together with its typed correct answer.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct: ChoiceKey,
    },
    TrueFalse {
        correct: bool,
    },
    ShortText {
        correct: String,
        matching: TextMatching,
    },
    Numeric {
        correct: f64,
        /// Inclusive absolute tolerance. `None` requires an exact match.
        tolerance: Option<f64>,
    },
    /// Compared lexically, like short text. Algebraically equivalent but
    /// differently written expressions do not match.
    MathExpression {
        correct: String,
        matching: TextMatching,
    },
}

/// A typed, immutable question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDefinition", into = "QuestionDefinition")]
pub struct Question {
    pub id: String,
    pub title: String,
    pub kind: QuestionKind,
    /// Maximum score awardable.
    pub points: f64,
    pub feedback: Feedback,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::ShortText { .. } => QuestionType::ShortText,
            QuestionKind::Numeric { .. } => QuestionType::Numeric,
            QuestionKind::MathExpression { .. } => QuestionType::MathExpression,
        }
    }

    /// The correct answer in its authored JSON shape.
    pub fn correct_answer(&self) -> Value {
        match &self.kind {
            QuestionKind::MultipleChoice { correct, .. } => match correct {
                ChoiceKey::Single(index) => Value::from(*index),
                ChoiceKey::Multiple(indices) => {
                    Value::from(indices.iter().copied().collect::<Vec<_>>())
                }
            },
            QuestionKind::TrueFalse { correct } => Value::Bool(*correct),
            QuestionKind::ShortText { correct, .. }
            | QuestionKind::MathExpression { correct, .. } => Value::String(correct.clone()),
            QuestionKind::Numeric { correct, .. } => Value::from(*correct),
        }
    }

    /// Check the invariants the type system cannot express.
    pub fn check(&self) -> Result<(), QuestionError> {
        let question_id = || self.id.clone();

        if !self.points.is_finite() || self.points < 0.0 {
            return Err(QuestionError::InvalidPoints {
                question_id: question_id(),
                points: self.points,
            });
        }

        match &self.kind {
            QuestionKind::MultipleChoice { options, correct } => {
                if options.len() < 2 {
                    return Err(QuestionError::TooFewOptions {
                        question_id: question_id(),
                        count: options.len(),
                    });
                }
                let out_of_range = match correct {
                    ChoiceKey::Single(index) => Some(*index).filter(|i| *i >= options.len()),
                    ChoiceKey::Multiple(indices) => {
                        if indices.is_empty() {
                            return Err(QuestionError::EmptyCorrectAnswer {
                                question_id: question_id(),
                            });
                        }
                        indices.iter().copied().find(|i| *i >= options.len())
                    }
                };
                if let Some(index) = out_of_range {
                    return Err(QuestionError::ChoiceOutOfRange {
                        question_id: question_id(),
                        index,
                        option_count: options.len(),
                    });
                }
            }
            QuestionKind::TrueFalse { .. } => {}
            QuestionKind::ShortText { correct, .. } | QuestionKind::MathExpression { correct, .. } => {
                if correct.trim().is_empty() {
                    return Err(QuestionError::EmptyCorrectAnswer {
                        question_id: question_id(),
                    });
                }
            }
            QuestionKind::Numeric { correct, tolerance } => {
                if let Some(tolerance) = tolerance.filter(|t| !t.is_finite() || *t < 0.0) {
                    return Err(QuestionError::NegativeTolerance {
                        question_id: question_id(),
                        tolerance,
                    });
                }
                if !correct.is_finite() {
                    return Err(QuestionError::AnswerShapeMismatch {
                        question_id: question_id(),
                        question_type: QuestionType::Numeric,
                        expected: "a finite number",
                    });
                }
            }
        }

        Ok(())
    }
}

/// Interpret a JSON value as an option index.
///
/// Accepts non-negative integers, including integral floats such as `1.0`.
/// Strings are not coerced.
pub(crate) fn choice_index(value: &Value) -> Option<usize> {
    if let Some(index) = value.as_u64() {
        return usize::try_from(index).ok();
    }
    let float = value.as_f64()?;
    if float.is_finite()
        && float.is_sign_positive()
        && float.fract() == 0.0
        && float <= u32::MAX as f64
    {
        Some(float as usize)
    } else {
        None
    }
}

/// The text of a math expression value. Numbers are written the way JSON
/// prints them, so `12` reads as `"12"` and `1e3` as `"1000.0"`.
pub(crate) fn expression_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

impl TryFrom<QuestionDefinition> for Question {
    type Error = QuestionError;

    fn try_from(def: QuestionDefinition) -> Result<Self, Self::Error> {
        let question_type: QuestionType =
            def.question_type
                .parse()
                .map_err(|_| QuestionError::UnknownType {
                    question_id: def.id.clone(),
                    type_name: def.question_type.clone(),
                })?;

        let correct = match def.correct_answer {
            Some(value) if !value.is_null() => value,
            _ => {
                return Err(QuestionError::MissingCorrectAnswer {
                    question_id: def.id,
                })
            }
        };

        let mismatch = |expected: &'static str| QuestionError::AnswerShapeMismatch {
            question_id: def.id.clone(),
            question_type,
            expected,
        };

        let config = def.config;
        let matching = TextMatching {
            case_sensitive: config.case_sensitive,
            accepted_alternatives: config.accepted_alternatives,
        };

        let kind = match question_type {
            QuestionType::MultipleChoice => {
                const EXPECTED: &str = "a choice index or a list of choice indices";
                let correct = match &correct {
                    Value::Array(items) => ChoiceKey::Multiple(
                        items
                            .iter()
                            .map(choice_index)
                            .collect::<Option<BTreeSet<_>>>()
                            .ok_or_else(|| mismatch(EXPECTED))?,
                    ),
                    other => ChoiceKey::Single(choice_index(other).ok_or_else(|| mismatch(EXPECTED))?),
                };
                QuestionKind::MultipleChoice {
                    options: config.options,
                    correct,
                }
            }
            QuestionType::TrueFalse => QuestionKind::TrueFalse {
                correct: correct.as_bool().ok_or_else(|| mismatch("a boolean"))?,
            },
            QuestionType::ShortText => QuestionKind::ShortText {
                correct: correct
                    .as_str()
                    .ok_or_else(|| mismatch("a string"))?
                    .to_string(),
                matching,
            },
            QuestionType::Numeric => QuestionKind::Numeric {
                correct: correct.as_f64().ok_or_else(|| mismatch("a number"))?,
                tolerance: config.tolerance,
            },
            QuestionType::MathExpression => QuestionKind::MathExpression {
                correct: expression_text(&correct)
                    .ok_or_else(|| mismatch("a string or a number"))?
                    .into_owned(),
                matching,
            },
        };

        let question = Question {
            id: def.id,
            title: def.title,
            kind,
            points: def.points,
            feedback: def.feedback,
        };
        question.check()?;
        Ok(question)
    }
}

impl From<Question> for QuestionDefinition {
    fn from(question: Question) -> Self {
        let question_type = question.question_type();
        let correct_answer = question.correct_answer();
        let mut config = QuestionConfig::default();

        match question.kind {
            QuestionKind::MultipleChoice { options, .. } => config.options = options,
            QuestionKind::TrueFalse { .. } => {}
            QuestionKind::ShortText { matching, .. }
            | QuestionKind::MathExpression { matching, .. } => {
                config.case_sensitive = matching.case_sensitive;
                config.accepted_alternatives = matching.accepted_alternatives;
            }
            QuestionKind::Numeric { tolerance, .. } => config.tolerance = tolerance,
        }

        QuestionDefinition {
            id: question.id,
            title: question.title,
            question_type: question_type.to_string(),
            correct_answer: Some(correct_answer),
            config,
            points: question.points,
            feedback: question.feedback,
        }
    }
}

/// How an exercise set is delivered to students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSettings {
    /// Attempts each student may start.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Minutes allowed from the start of an attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_mins: Option<u32>,
    /// Attach the correct answer to every recorded response.
    #[serde(default)]
    pub show_answers: bool,
    /// Overrides the intake's `show_explanations` for this set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_explanations: Option<bool>,
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for ExerciseSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            time_limit_mins: None,
            show_answers: false,
            show_explanations: None,
        }
    }
}

/// A collection of questions delivered together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    /// Unique identifier for this exercise set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: ExerciseSettings,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ExerciseSet {
    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Sum of all question points.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feedback() -> Feedback {
        Feedback {
            on_correct: "Well done".into(),
            on_incorrect: "Not quite".into(),
            explanation: None,
            hint: None,
        }
    }

    fn definition(question_type: &str, correct: Value) -> QuestionDefinition {
        QuestionDefinition {
            id: "q1".into(),
            title: String::new(),
            question_type: question_type.into(),
            correct_answer: Some(correct),
            config: QuestionConfig::default(),
            points: 5.0,
            feedback: feedback(),
        }
    }

    #[test]
    fn question_type_display_and_parse() {
        assert_eq!(QuestionType::MultipleChoice.to_string(), "multiple_choice");
        assert_eq!(QuestionType::MathExpression.to_string(), "math_expression");
        assert_eq!(
            "true_false".parse::<QuestionType>().unwrap(),
            QuestionType::TrueFalse
        );
        assert_eq!(
            "Short_Answer".parse::<QuestionType>().unwrap(),
            QuestionType::ShortText
        );
        assert_eq!(
            "mathematical_expression".parse::<QuestionType>().unwrap(),
            QuestionType::MathExpression
        );
        assert!("drag_and_drop".parse::<QuestionType>().is_err());
    }

    #[test]
    fn converts_multiple_choice_list() {
        let mut def = definition("multiple_choice", json!([2, 0, 0, 1]));
        def.config.options = vec!["a".into(), "b".into(), "c".into()];
        let question = Question::try_from(def).unwrap();
        assert_eq!(
            question.kind,
            QuestionKind::MultipleChoice {
                options: vec!["a".into(), "b".into(), "c".into()],
                correct: ChoiceKey::Multiple(BTreeSet::from([0, 1, 2])),
            }
        );
    }

    #[test]
    fn converts_numeric_with_default_tolerance() {
        let question = Question::try_from(definition("numeric", json!(4))).unwrap();
        assert_eq!(
            question.kind,
            QuestionKind::Numeric {
                correct: 4.0,
                tolerance: None
            }
        );
    }

    #[test]
    fn math_expression_accepts_numeric_answer() {
        let question = Question::try_from(definition("math_expression", json!(12))).unwrap();
        assert!(matches!(
            question.kind,
            QuestionKind::MathExpression { ref correct, .. } if correct == "12"
        ));
    }

    #[test]
    fn expression_text_reads_strings_and_numbers() {
        assert_eq!(expression_text(&json!("2x")).as_deref(), Some("2x"));
        assert_eq!(expression_text(&json!(12)).as_deref(), Some("12"));
        assert_eq!(expression_text(&json!(-0.5)).as_deref(), Some("-0.5"));
        assert_eq!(expression_text(&json!(true)), None);
        assert_eq!(expression_text(&Value::Null), None);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = Question::try_from(definition("ordering", json!([0, 1]))).unwrap_err();
        assert!(matches!(err, QuestionError::UnknownType { ref type_name, .. } if type_name == "ordering"));
    }

    #[test]
    fn rejects_missing_or_null_answer() {
        let mut def = definition("true_false", Value::Null);
        assert!(matches!(
            Question::try_from(def.clone()),
            Err(QuestionError::MissingCorrectAnswer { .. })
        ));
        def.correct_answer = None;
        assert!(matches!(
            Question::try_from(def),
            Err(QuestionError::MissingCorrectAnswer { .. })
        ));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let err = Question::try_from(definition("numeric", json!("four"))).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::AnswerShapeMismatch {
                question_type: QuestionType::Numeric,
                ..
            }
        ));
        assert!(Question::try_from(definition("true_false", json!("true"))).is_err());
        assert!(Question::try_from(definition("short_text", json!(3))).is_err());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let mut def = definition("numeric", json!(4));
        def.config.tolerance = Some(-0.5);
        assert!(matches!(
            Question::try_from(def),
            Err(QuestionError::NegativeTolerance { .. })
        ));
    }

    #[test]
    fn rejects_bad_points() {
        let mut def = definition("true_false", json!(true));
        def.points = -1.0;
        assert!(matches!(
            Question::try_from(def),
            Err(QuestionError::InvalidPoints { .. })
        ));
    }

    #[test]
    fn multiple_choice_checks_options() {
        let mut def = definition("multiple_choice", json!(0));
        def.config.options = vec!["only".into()];
        assert!(matches!(
            Question::try_from(def.clone()),
            Err(QuestionError::TooFewOptions { count: 1, .. })
        ));

        def.config.options = vec!["a".into(), "b".into()];
        def.correct_answer = Some(json!(3));
        assert!(matches!(
            Question::try_from(def.clone()),
            Err(QuestionError::ChoiceOutOfRange { index: 3, option_count: 2, .. })
        ));

        def.correct_answer = Some(json!([]));
        assert!(matches!(
            Question::try_from(def),
            Err(QuestionError::EmptyCorrectAnswer { .. })
        ));
    }

    #[test]
    fn rejects_blank_text_answer() {
        assert!(matches!(
            Question::try_from(definition("short_text", json!("   "))),
            Err(QuestionError::EmptyCorrectAnswer { .. })
        ));
    }

    #[test]
    fn definition_conversion_keeps_config() {
        let mut def = definition("short_text", json!("sin(x)+C"));
        def.config.case_sensitive = true;
        def.config.accepted_alternatives = vec!["sinx+C".into()];
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);
    }

    #[test]
    fn numeric_definition_round_trips_with_and_without_tolerance() {
        let def = definition("numeric", json!(4.0));
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);

        let mut def = definition("numeric", json!(4.0));
        def.config.tolerance = Some(0.0);
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);

        def.config.tolerance = Some(0.01);
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);
    }

    #[test]
    fn multiple_choice_definition_round_trips() {
        let mut def = definition("multiple_choice", json!(1));
        def.config.options = vec!["a".into(), "b".into(), "c".into()];
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);

        def.correct_answer = Some(json!([0, 2]));
        let question = Question::try_from(def.clone()).unwrap();
        assert_eq!(QuestionDefinition::from(question), def);
    }

    #[test]
    fn question_deserializes_through_definition() {
        let question: Question = serde_json::from_value(json!({
            "id": "tf",
            "type": "true_false",
            "correct_answer": false,
            "feedback": { "on_correct": "yes", "on_incorrect": "no" }
        }))
        .unwrap();
        assert_eq!(question.points, 1.0);
        assert_eq!(question.kind, QuestionKind::TrueFalse { correct: false });

        let bad = serde_json::from_value::<Question>(json!({
            "id": "tf",
            "type": "true_false",
            "correct_answer": "no",
            "feedback": { "on_correct": "yes", "on_incorrect": "no" }
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn exercise_set_lookup_and_total() {
        let a = Question::try_from(definition("true_false", json!(true))).unwrap();
        let mut b_def = definition("numeric", json!(2.5));
        b_def.id = "q2".into();
        b_def.points = 2.5;
        let b = Question::try_from(b_def).unwrap();
        let set = ExerciseSet {
            id: "set".into(),
            name: "Set".into(),
            description: String::new(),
            settings: ExerciseSettings::default(),
            questions: vec![a, b],
        };
        assert_eq!(set.total_points(), 7.5);
        assert!(set.question("q2").is_some());
        assert!(set.question("missing").is_none());
    }

    #[test]
    fn correct_answer_keeps_authored_shape() {
        let mut def = definition("multiple_choice", json!([2, 0]));
        def.config.options = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(Question::try_from(def).unwrap().correct_answer(), json!([0, 2]));

        let q = Question::try_from(definition("true_false", json!(false))).unwrap();
        assert_eq!(q.correct_answer(), json!(false));
        let q = Question::try_from(definition("numeric", json!(2.5))).unwrap();
        assert_eq!(q.correct_answer(), json!(2.5));
    }

    #[test]
    fn settings_default_to_one_attempt() {
        let set: ExerciseSet = serde_json::from_value(json!({ "id": "s", "name": "S" })).unwrap();
        assert_eq!(set.settings, ExerciseSettings::default());
        assert_eq!(set.settings.max_attempts, 1);
        assert_eq!(set.settings.time_limit_mins, None);
        assert!(!set.settings.show_answers);
    }

    #[test]
    fn choice_index_parsing() {
        assert_eq!(choice_index(&json!(2)), Some(2));
        assert_eq!(choice_index(&json!(1.0)), Some(1));
        assert_eq!(choice_index(&json!(1.5)), None);
        assert_eq!(choice_index(&json!(-1)), None);
        assert_eq!(choice_index(&json!(-0.0)), None);
        assert_eq!(choice_index(&json!("1")), None);
        assert_eq!(choice_index(&Value::Null), None);
    }
}
