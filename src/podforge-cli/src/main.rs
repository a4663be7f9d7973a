//! Podforge CLI - AI Podcast Studio
//!
//! A command-line tool for turning text content into multi-speaker
//! podcast episodes.

use clap::{Parser, Subcommand};
use colored::Colorize;
use podforge_core::{
    EpisodeOutcome, ExportFormat, ScriptWriter, SpeechSynthesizer, Studio, StudioCallback,
    StudioConfig, StudioEvent, extract,
};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "podforge",
    version,
    about = "AI Podcast Studio - Turn any text into a podcast",
    long_about = "A CLI tool that drafts a multi-speaker podcast script from a file or URL and records it with configurable TTS voices."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce a new podcast episode from a file or URL
    New {
        /// Path to the input file, or a URL
        #[arg(value_name = "INPUT")]
        input: String,

        /// Name of the podcast episode
        #[arg(long, value_name = "NAME")]
        name: String,

        /// Path to the studio configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,

        /// Only generate the script and exit
        #[arg(long)]
        only_script: bool,

        /// Output container format
        #[arg(long, default_value = "wav", value_name = "FORMAT")]
        format: String,

        /// Chat model used to draft the script
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::New {
            input,
            name,
            config_file,
            only_script,
            format,
            model,
        } => new_episode(input, name, config_file, only_script, format, model).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn new_episode(
    input: String,
    name: String,
    config_file: PathBuf,
    only_script: bool,
    format: String,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = ExportFormat::from_name(&format).ok_or_else(|| {
        format!(
            "Unknown format '{}'. Available formats: {}",
            format,
            ExportFormat::available_formats().join(", ")
        )
    })?;

    if env::var("OPENAI_API_KEY").is_err() {
        eprintln!(
            "{}",
            "Warning: OPENAI_API_KEY not set. API calls may fail.".yellow()
        );
    }

    let config = StudioConfig::load(&config_file)?;

    // Print header
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        format!("  {} - {}", "Podforge".bold(), config.show.name)
            .bright_blue()
            .bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Episode:".bold(), name.bright_white());
    println!("{} {}", "Source:".bold(), input.bright_white());
    println!();
    println!("{}", "Speakers:".bold());
    let mut speaker_ids: Vec<&String> = config.speakers.keys().collect();
    speaker_ids.sort();
    for id in speaker_ids {
        let speaker = &config.speakers[id];
        println!(
            "  {} ({}) - {} voice '{}'",
            speaker.name.bright_cyan(),
            id.dimmed(),
            speaker.settings.provider.to_string().yellow(),
            speaker.settings.voice_id.dimmed()
        );
    }
    println!();
    println!("{}", "─".repeat(70).dimmed());

    let writer = ScriptWriter::from_env(model);
    let synthesizer = SpeechSynthesizer::from_env()?;
    let studio = Studio::new(config, writer, synthesizer).with_callback(console_callback());

    println!("{} {}", "▶".bright_cyan(), "Extracting content".bold());
    let content = extract(&input).await?;

    let work_dir = studio.work_dir(&name);
    fs::create_dir_all(&work_dir)?;
    fs::write(work_dir.join("content.txt"), &content)?;

    let outcome = studio
        .produce_episode(&name, &content, format, only_script)
        .await?;

    println!();
    match outcome {
        EpisodeOutcome::ScriptOnly { script_path } => {
            println!(
                "{} Script saved to {}",
                "✔".bright_green().bold(),
                script_path.display().to_string().bright_white()
            );
        }
        EpisodeOutcome::Complete {
            output_path,
            duration_secs,
            ..
        } => {
            let minutes = (duration_secs / 60.0) as u64;
            let seconds = duration_secs as u64 % 60;
            println!(
                "{} Episode ready: {} ({}m{:02}s)",
                "✔".bright_green().bold(),
                output_path.display().to_string().bright_white(),
                minutes,
                seconds
            );
        }
        EpisodeOutcome::AudioFailed { script_path, error } => {
            eprintln!("{} Audio generation failed: {}", "✘".red().bold(), error);
            eprintln!(
                "  The script is still cached at {} and will be reused on retry.",
                script_path.display()
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Create a callback that narrates studio progress on the console.
fn console_callback() -> StudioCallback {
    Box::new(move |event| match event {
        StudioEvent::ScriptReady { cached } => {
            let note = if cached {
                "Using cached script"
            } else {
                "Script drafted"
            };
            println!("{} {}", "▶".bright_cyan(), note.bold());
        }
        StudioEvent::RecordingStart { segments } => {
            println!(
                "{} {}",
                "▶".bright_cyan(),
                format!("Recording {} segments", segments).bold()
            );
        }
        StudioEvent::Exporting { path } => {
            println!(
                "{} {}",
                "▶".bright_cyan(),
                format!("Exporting to {}", path.display()).bold()
            );
        }
    })
}
