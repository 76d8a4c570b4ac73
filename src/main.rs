use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use topic_quiz::{
    log_system_event, ApiMode, Config, Difficulty, GenerationOutcome, LoggingConfig, QuizAggregator,
    QuizApiFactory, QuizController, ScoreSummary,
};

#[derive(Parser, Debug)]
#[command(version, about = "Generate and take a quiz spanning up to three topics", long_about = None)]
struct Args {
    /// Topic to include; repeat for up to three topics
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// easy, medium or hard
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Build the quiz from a resume (pdf, docx or doc) instead of topics
    #[arg(short, long, conflicts_with = "topics")]
    resume: Option<PathBuf>,

    /// Use the built-in sample backend instead of the quiz service
    #[arg(long)]
    offline: bool,

    /// Seed for question shuffling
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logging first, so configuration loading is traced too
    let _guard = setup_logging(&LoggingConfig::from_env()?)?;
    log_system_event!(startup, component = "cli", "topic quiz starting");

    let mut config = Config::from_env()?;
    if args.offline {
        config.service.mode = ApiMode::Offline;
    }
    if args.seed.is_some() {
        config.aggregator.shuffle_seed = args.seed;
    }
    config.validate()?;

    let api = QuizApiFactory::create(&config.service)?;
    info!(backend = api.backend_name(), "Quiz backend ready");

    let aggregator = Arc::new(QuizAggregator::new(api, config.resolver.clone(), config.aggregator.clone()));
    let controller = QuizController::new(aggregator);

    let outcome = match &args.resume {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read resume {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Invalid resume path {}", path.display()))?;
            println!("Generating quiz from {}...", file_name);
            controller.generate_from_resume(file_name, bytes).await?
        }
        None => {
            controller.configure(&args.topics, args.difficulty)?;
            println!("Generating quiz for {}...", args.topics.join(", "));
            controller.generate().await?
        }
    };

    if let GenerationOutcome::Failed(message) = outcome {
        bail!(message);
    }

    let quiz = controller
        .quiz()
        .ok_or_else(|| anyhow!("No quiz available after generation"))?;
    println!("\n{} ({}, {} questions)", quiz.title, quiz.difficulty, quiz.len());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    for (index, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. [{}] {}", index + 1, question.source_topic, question.prompt);
        for (letter, option) in ('A'..='D').zip(&question.options) {
            println!("   {}) {}", letter, option);
        }

        loop {
            print!("Your answer (A-D): ");
            io::stdout().flush()?;
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("Input closed before the quiz was finished"))??;
            match parse_choice(&line) {
                Some(choice) => {
                    controller.select_answer(index, choice)?;
                    break;
                }
                None => println!("Please answer with A, B, C or D"),
            }
        }
    }

    let score = controller.submit()?;
    print_score(&quiz.questions, &score);

    log_system_event!(shutdown, component = "cli", "topic quiz finished");
    Ok(())
}

fn parse_choice(input: &str) -> Option<usize> {
    match input.trim().to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

fn print_score(questions: &[topic_quiz::Question], score: &ScoreSummary) {
    println!(
        "\nScore: {}/{} ({}%), {} incorrect",
        score.correct,
        score.total,
        score.percentage,
        score.incorrect()
    );
    println!("{}", score.performance().message());

    // Submission requires every answer, so outcomes line up with questions
    for (index, (question, outcome)) in questions.iter().zip(&score.outcomes).enumerate() {
        let letter = |i: usize| ('A'..='D').nth(i).unwrap_or('?');
        if outcome.is_correct {
            println!("  Q{} [{}] correct ({})", index + 1, question.source_topic, letter(outcome.selected));
        } else {
            println!(
                "  Q{} [{}] wrong: answered {}, correct answer {}",
                index + 1,
                question.source_topic,
                letter(outcome.selected),
                letter(outcome.correct_index)
            );
        }
    }
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Console output goes to stderr so it never interleaves with quiz prompts
    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(true)
            .with_writer(io::stderr)
    });

    let (file_layer, guard) = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        // Set up file appender with daily rotation
        let file_appender = tracing_appender::rolling::daily(&config.log_directory, "topic-quiz.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if config.file_enabled {
        info!(
            "Logging initialized - writing to {}/topic-quiz.log with daily rotation",
            config.log_directory
        );
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("a"), Some(0));
        assert_eq!(parse_choice(" D \n"), Some(3));
        assert_eq!(parse_choice("E"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn test_cli_accepts_repeated_topics() {
        let args = Args::try_parse_from(["topic-quiz", "-t", "Rust", "--topic", "Go", "-d", "hard"]).unwrap();
        assert_eq!(args.topics, vec!["Rust", "Go"]);
        assert_eq!(args.difficulty, Some(Difficulty::Hard));
        assert!(!args.offline);
    }

    #[test]
    fn test_cli_rejects_resume_with_topics() {
        assert!(Args::try_parse_from(["topic-quiz", "-t", "Rust", "-r", "cv.pdf"]).is_err());
    }
}
