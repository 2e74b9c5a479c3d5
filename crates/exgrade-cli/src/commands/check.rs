//! The `exgrade check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use exgrade_core::validate;

use super::{load_single_set, parse_answer};

pub fn execute(exercise_set_path: PathBuf, question_id: String, answer: String, format: String) -> Result<()> {
    let set = load_single_set(&exercise_set_path)?;
    let question = set.question(&question_id).with_context(|| {
        format!(
            "question '{question_id}' not found in exercise set '{}'",
            set.id
        )
    })?;

    let submitted = parse_answer(&answer);
    let verdict = validate(question, &submitted)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&verdict)?),
        _ => {
            println!(
                "{}: {} ({} / {})",
                question.id,
                if verdict.is_correct { "CORRECT" } else { "INCORRECT" },
                verdict.score_awarded,
                verdict.score_max
            );
            println!("{}", verdict.feedback_shown);
        }
    }

    Ok(())
}
