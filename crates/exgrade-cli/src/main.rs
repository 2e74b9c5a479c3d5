//! exgrade command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "exgrade", version, about = "Exercise-set answer grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate exercise set TOML files
    Validate {
        /// Path to exercise set file or directory
        #[arg(long)]
        exercise_set: PathBuf,
    },

    /// Grade a single answer
    Check {
        /// Path to .toml exercise set
        #[arg(long)]
        exercise_set: PathBuf,

        /// Question id
        #[arg(long)]
        question: String,

        /// Answer as JSON (e.g. 2, [0,1], true, "text"); plain text is taken as a string
        #[arg(long, allow_hyphen_values = true)]
        answer: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Grade an attempt's submissions file
    Grade {
        /// Path to .toml exercise set
        #[arg(long)]
        exercise_set: PathBuf,

        /// JSON file with {"student_id"?: string, "answers": {question_id: answer}}
        #[arg(long)]
        submissions: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Directory to save the JSON report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example exercise set
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("exgrade=info,exgrade_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { exercise_set } => commands::validate::execute(exercise_set),
        Commands::Check {
            exercise_set,
            question,
            answer,
            format,
        } => commands::check::execute(exercise_set, question, answer, format),
        Commands::Grade {
            exercise_set,
            submissions,
            format,
            output,
            config,
        } => commands::grade::execute(exercise_set, submissions, format, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
