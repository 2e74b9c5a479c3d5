pub mod check;
pub mod grade;
pub mod init;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use exgrade_core::model::ExerciseSet;
use exgrade_core::parser;

/// Load one exercise set file.
pub(crate) fn load_single_set(path: &Path) -> Result<ExerciseSet> {
    anyhow::ensure!(
        !path.is_dir(),
        "expected an exercise set file, got a directory: {}",
        path.display()
    );
    parser::parse_exercise_set(path)
}

/// Parse an answer given on the command line: JSON if it parses, otherwise
/// the raw text as a string.
pub(crate) fn parse_answer(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answers_parse_as_json_first() {
        assert_eq!(parse_answer("2"), json!(2));
        assert_eq!(parse_answer("[0, 2]"), json!([0, 2]));
        assert_eq!(parse_answer("true"), json!(true));
        assert_eq!(parse_answer("\"true\""), json!("true"));
        assert_eq!(parse_answer("6x + 2"), json!("6x + 2"));
        assert_eq!(parse_answer("4.00"), json!(4.0));
    }
}
