//! TOML exercise set parser.
//!
//! Loads exercise sets from TOML files and directories, and lints them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    ChoiceKey, ExerciseSet, ExerciseSettings, Question, QuestionDefinition, QuestionKind, QuestionType,
};

/// Intermediate TOML structure for parsing exercise set files.
#[derive(Debug, Deserialize)]
struct TomlExerciseFile {
    exercise_set: TomlExerciseSetHeader,
    #[serde(default)]
    questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Deserialize)]
struct TomlExerciseSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    settings: ExerciseSettings,
}

/// Parse a single TOML file into an `ExerciseSet`.
pub fn parse_exercise_set(path: &Path) -> Result<ExerciseSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise set file: {}", path.display()))?;

    parse_exercise_set_str(&content, path)
}

/// Parse a TOML string into an `ExerciseSet` (useful for testing).
pub fn parse_exercise_set_str(content: &str, source_path: &Path) -> Result<ExerciseSet> {
    let parsed: TomlExerciseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let settings = parsed.exercise_set.settings;
    anyhow::ensure!(
        settings.max_attempts >= 1,
        "{}: max_attempts must be at least 1",
        source_path.display()
    );
    anyhow::ensure!(
        settings.time_limit_mins != Some(0),
        "{}: time_limit_mins must be at least 1",
        source_path.display()
    );

    let questions = parsed
        .questions
        .into_iter()
        .map(|def| {
            warn_unused_config(&def, source_path);
            let id = def.id.clone();
            Question::try_from(def).with_context(|| {
                format!("invalid question '{id}' in {}", source_path.display())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExerciseSet {
        id: parsed.exercise_set.id,
        name: parsed.exercise_set.name,
        description: parsed.exercise_set.description,
        settings,
        questions,
    })
}

/// Config keys that have no effect for the question's type.
fn warn_unused_config(def: &QuestionDefinition, source_path: &Path) {
    let Ok(question_type) = def.question_type.parse::<QuestionType>() else {
        return;
    };
    let config = &def.config;
    let is_text = matches!(
        question_type,
        QuestionType::ShortText | QuestionType::MathExpression
    );

    let mut ignored = Vec::new();
    if !config.options.is_empty() && question_type != QuestionType::MultipleChoice {
        ignored.push("options");
    }
    if config.tolerance.is_some() && question_type != QuestionType::Numeric {
        ignored.push("tolerance");
    }
    if config.case_sensitive && !is_text {
        ignored.push("case_sensitive");
    }
    if !config.accepted_alternatives.is_empty() && !is_text {
        ignored.push("accepted_alternatives");
    }

    if !ignored.is_empty() {
        tracing::warn!(
            "{}: question '{}' ({question_type}) ignores config: {}",
            source_path.display(),
            def.id,
            ignored.join(", ")
        );
    }
}

/// Recursively load all `.toml` exercise set files from a directory.
pub fn load_exercise_directory(dir: &Path) -> Result<Vec<ExerciseSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_exercise_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exercise_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    sets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sets)
}

/// A warning from exercise set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(question_id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question_id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate an exercise set for authoring mistakes that still load.
pub fn validate_exercise_set(set: &ExerciseSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exercise set has no questions".into(),
        });
    }

    if set.settings.show_answers && set.settings.max_attempts > 1 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "correct answers are shown but {} attempts are allowed",
                set.settings.max_attempts
            ),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &set.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning::question(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    for question in &set.questions {
        if question.points == 0.0 {
            warnings.push(ValidationWarning::question(
                &question.id,
                "question is worth 0 points",
            ));
        }

        if question.feedback.on_correct.trim().is_empty()
            || question.feedback.on_incorrect.trim().is_empty()
        {
            warnings.push(ValidationWarning::question(&question.id, "feedback text is empty"));
        }

        match &question.kind {
            QuestionKind::ShortText { correct, matching }
            | QuestionKind::MathExpression { correct, matching } => {
                let normalized = matching.normalize(correct);
                for alternative in &matching.accepted_alternatives {
                    if matching.normalize(alternative) == normalized {
                        warnings.push(ValidationWarning::question(
                            &question.id,
                            format!("accepted alternative '{alternative}' duplicates the correct answer"),
                        ));
                    }
                }
            }
            QuestionKind::MultipleChoice { options, correct } => {
                let mut seen_options = HashSet::new();
                for option in options {
                    if !seen_options.insert(option.trim()) {
                        warnings.push(ValidationWarning::question(
                            &question.id,
                            format!("duplicate option: {option}"),
                        ));
                    }
                }
                if let ChoiceKey::Multiple(indices) = correct {
                    if indices.len() == options.len() {
                        warnings.push(ValidationWarning::question(
                            &question.id,
                            "every option is marked correct",
                        ));
                    }
                }
            }
            QuestionKind::TrueFalse { .. } | QuestionKind::Numeric { .. } => {}
        }
    }

    warnings
}
