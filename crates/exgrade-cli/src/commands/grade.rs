//! The `exgrade grade` command.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use exgrade_core::config::load_config_from;
use exgrade_core::intake::{InMemoryQuestionRepository, ResponseIntake, Submission};
use exgrade_core::report::GradeReport;
use exgrade_core::IntakeError;

use super::load_single_set;

/// Submissions file layout.
#[derive(Debug, Deserialize)]
struct SubmissionsFile {
    #[serde(default = "default_student")]
    student_id: String,
    answers: BTreeMap<String, Value>,
}

fn default_student() -> String {
    "anonymous".to_string()
}

pub async fn execute(
    exercise_set_path: PathBuf,
    submissions_path: PathBuf,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let set = load_single_set(&exercise_set_path)?;

    let content = std::fs::read_to_string(&submissions_path).with_context(|| {
        format!(
            "failed to read submissions file: {}",
            submissions_path.display()
        )
    })?;
    let submissions: SubmissionsFile = serde_json::from_str(&content).with_context(|| {
        format!(
            "failed to parse submissions file: {}",
            submissions_path.display()
        )
    })?;
    let repository = Arc::new(InMemoryQuestionRepository::from_exercise_set(&set));
    let intake = ResponseIntake::new(repository, config.intake.clone());
    let attempt_id = intake
        .start_attempt(&set.id, &submissions.student_id)
        .await
        .context("failed to start attempt")?
        .id;

    for (question_id, answer) in submissions.answers {
        let result = intake
            .submit(Submission {
                question_id: question_id.clone(),
                attempt_id,
                answer,
                time_spent_secs: 0,
            })
            .await;
        match result {
            Ok(_) => {}
            Err(IntakeError::QuestionNotFound(id)) => {
                tracing::warn!("skipping answer to unknown question '{id}'");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to grade question '{question_id}'"));
            }
        }
    }

    let attempt = intake
        .complete_attempt(attempt_id)
        .context("failed to complete attempt")?;
    let report = GradeReport::new(&set, &attempt, intake.responses_for_attempt(attempt_id));

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_summary(&report),
    }

    if let Some(dir) = output {
        let path = dir.join(format!("{attempt_id}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &GradeReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Answer", "Result", "Score", "Feedback"]);

    for r in &report.responses {
        table.add_row(vec![
            Cell::new(&r.question_id),
            Cell::new(r.submitted_answer.to_string()),
            Cell::new(if r.verdict.is_correct { "correct" } else { "incorrect" }),
            Cell::new(format!("{} / {}", r.verdict.score_awarded, r.verdict.score_max)),
            Cell::new(&r.verdict.feedback_shown),
        ]);
    }

    println!(
        "{}: attempt {} by {} ({})",
        report.exercise_set.name, report.attempt_number, report.student_id, report.attempt_id
    );
    println!("{table}");
    if !report.unanswered.is_empty() {
        println!("Unanswered: {}", report.unanswered.join(", "));
    }
    println!(
        "Total: {} / {} ({:.1}%)",
        report.grade.score, report.grade.max_score, report.grade.percentage
    );
}
