//! Console front end: take the quiz in a terminal or print catalog counts.
//!
//! Uses the same environment configuration as the HTTP service.

use clap::{Parser, Subcommand};
use std::io::{self, Write};

use preference_engine::SessionController;
use style_preference_service::config::Config;
use style_preference_service::console::{render_counts, render_results, ConsoleFeedback};
use style_preference_service::services::catalog;

#[derive(Parser)]
#[command(name = "quiz-cli", version, about = "Style preference quiz in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer the quiz interactively and print the style analysis
    Play {
        #[arg(long, default_value = "women")]
        segment: String,
        /// Fixed seed for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
        /// Override MAX_TURNS
        #[arg(long)]
        max_turns: Option<usize>,
    },
    /// Count catalog images per segment and style
    Report,
}

fn other(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

async fn play(
    config: &Config,
    segment: &str,
    seed: Option<u64>,
    max_turns: Option<usize>,
) -> io::Result<()> {
    if !config.quiz.is_allowed_segment(segment) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown segment '{}'", segment),
        ));
    }

    let catalog = catalog::from_config(&config.catalog).await.map_err(other)?;
    let pool = catalog.list_available_items(segment).await.map_err(other)?;
    if pool.values().all(|items| items.is_empty()) {
        println!("No images found for segment '{}'", segment);
        return Ok(());
    }

    let mut settings = config.quiz.session_settings();
    if let Some(seed) = seed {
        settings = settings.with_seed(seed);
    }
    if let Some(max_turns) = max_turns {
        settings = settings.with_max_turns(max_turns);
    }

    let mut session = SessionController::new(segment, config.algorithm, settings);
    let stdin = io::stdin();
    let mut feedback = ConsoleFeedback::new(stdin.lock(), io::stdout());
    let summary = session.run(&pool, &mut feedback);

    let mut out = io::stdout().lock();
    render_results(&mut out, &summary)?;
    out.flush()
}

async fn report(config: &Config) -> io::Result<()> {
    let catalog = catalog::from_config(&config.catalog).await.map_err(other)?;
    let counts = catalog::style_counts(catalog.as_ref(), &config.quiz.allowed_segments)
        .await
        .map_err(other)?;

    let mut out = io::stdout().lock();
    render_counts(&mut out, &counts)?;
    out.flush()
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Play {
            segment,
            seed,
            max_turns,
        } => play(&config, &segment, seed, max_turns).await,
        Command::Report => report(&config).await,
    }
}
