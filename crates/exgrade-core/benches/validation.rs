use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use exgrade_core::model::{Feedback, Question, QuestionConfig, QuestionDefinition};
use exgrade_core::validate;

fn make_question(question_type: &str, correct: Value, config: QuestionConfig) -> Question {
    Question::try_from(QuestionDefinition {
        id: "bench".into(),
        title: String::new(),
        question_type: question_type.into(),
        correct_answer: Some(correct),
        config,
        points: 10.0,
        feedback: Feedback {
            on_correct: "Correct".into(),
            on_incorrect: "Incorrect".into(),
            explanation: None,
            hint: None,
        },
    })
    .expect("bench question is valid")
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    let choice = make_question(
        "multiple_choice",
        json!([0, 2, 5, 7]),
        QuestionConfig {
            options: (0..8).map(|i| format!("option {i}")).collect(),
            ..Default::default()
        },
    );
    group.bench_function("multiple_choice_set", |b| {
        let submitted = json!([7, 5, 2, 0]);
        b.iter(|| validate(black_box(&choice), black_box(&submitted)))
    });

    let numeric = make_question(
        "numeric",
        json!(4),
        QuestionConfig {
            tolerance: Some(0.01),
            ..Default::default()
        },
    );
    group.bench_function("numeric_string", |b| {
        let submitted = json!("4.005");
        b.iter(|| validate(black_box(&numeric), black_box(&submitted)))
    });

    let text = make_question(
        "short_text",
        json!("sin(x)+C"),
        QuestionConfig {
            accepted_alternatives: (0..16).map(|i| format!("alternative {i}")).collect(),
            ..Default::default()
        },
    );
    group.bench_function("short_text_last_alternative", |b| {
        let submitted = json!("  ALTERNATIVE 15 ");
        b.iter(|| validate(black_box(&text), black_box(&submitted)))
    });

    group.bench_function("malformed", |b| {
        let submitted = json!({ "unexpected": [null] });
        b.iter(|| validate(black_box(&numeric), black_box(&submitted)))
    });

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
