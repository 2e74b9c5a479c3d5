//! The `exgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(exercise_set_path: PathBuf) -> Result<()> {
    let sets = if exercise_set_path.is_dir() {
        exgrade_core::parser::load_exercise_directory(&exercise_set_path)?
    } else {
        vec![exgrade_core::parser::parse_exercise_set(&exercise_set_path)?]
    };

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Exercise set: {} ({} questions, {} points)",
            set.name,
            set.questions.len(),
            set.total_points()
        );

        let warnings = exgrade_core::parser::validate_exercise_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All exercise sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
