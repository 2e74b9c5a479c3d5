//! The `exgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("exgrade.toml").exists() {
        println!("exgrade.toml already exists, skipping.");
    } else {
        std::fs::write("exgrade.toml", SAMPLE_CONFIG)?;
        println!("Created exgrade.toml");
    }

    std::fs::create_dir_all("exercise-sets")?;
    let example_path = std::path::Path::new("exercise-sets/example.toml");
    if example_path.exists() {
        println!("exercise-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXERCISE_SET)?;
        println!("Created exercise-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: exgrade validate --exercise-set exercise-sets/example.toml");
    println!("  2. Run: exgrade check --exercise-set exercise-sets/example.toml --question sum --answer 4");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# exgrade configuration

output_dir = "./exgrade-results"

[intake]
# Replace an earlier answer instead of rejecting it.
allow_retry = false
show_explanations = true
hints_on_incorrect = true
"#;

const EXAMPLE_EXERCISE_SET: &str = r#"[exercise_set]
id = "example"
name = "Example Exercise Set"
description = "One question of each type"

[exercise_set.settings]
max_attempts = 2
# time_limit_mins = 30
# show_answers = false

[[questions]]
id = "sum"
title = "Addition"
type = "numeric"
correct_answer = 4
points = 2

[questions.config]
tolerance = 0

[questions.feedback]
on_correct = "2 + 2 = 4."
on_incorrect = "Add the two numbers again."

[[questions]]
id = "primes"
title = "Pick the primes"
type = "multiple_choice"
correct_answer = [0, 2]
points = 3

[questions.config]
options = ["2", "4", "7", "9"]

[questions.feedback]
on_correct = "Both 2 and 7 are prime."
on_incorrect = "A prime has exactly two divisors."
hint = "Only one even number is prime."

[[questions]]
id = "earth-round"
title = "Shape of the Earth"
type = "true_false"
correct_answer = true

[questions.feedback]
on_correct = "Yes, roughly."
on_incorrect = "It is an oblate spheroid."

[[questions]]
id = "capital"
title = "Capital of France"
type = "short_text"
correct_answer = "Paris"

[questions.config]
case_sensitive = false

[questions.feedback]
on_correct = "Correct."
on_incorrect = "It is Paris."

[[questions]]
id = "antiderivative"
title = "Integrate cos(x)"
type = "math_expression"
correct_answer = "sin(x)+C"
points = 4

[questions.config]
accepted_alternatives = ["sin(x) + C", "sinx+C"]

[questions.feedback]
on_correct = "Right."
on_incorrect = "The derivative of sin(x) is cos(x)."
explanation = "Expressions are compared as written, not algebraically."
"#;
