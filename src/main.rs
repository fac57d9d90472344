//! Precis CLI - document summarisation with notes and report export
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use precis::export::SystemClipboard;
use precis::gateway::{HttpSummarizer, ServiceExtractor};
use precis::metrics::InputStats;
use precis::summary::SummaryLength;
use precis::{ui, Config, FileUpload, WorkflowController};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "precis")]
#[command(author, version, about = "Summarise documents, take notes and export a report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text (argument or stdin) or a PDF file
    Summarise {
        /// Text to summarise; read from stdin when omitted
        text: Option<String>,
        /// PDF file to summarise instead of text
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Summary length
        #[arg(long, value_enum)]
        length: Option<SummaryLength>,
        /// Notes to include in the report
        #[arg(long)]
        notes: Option<String>,
        /// Copy the report to the clipboard
        #[arg(long)]
        copy: bool,
        /// Save the report as a text file, into DIR or the configured directory
        #[arg(long, value_name = "DIR", num_args = 0..=1)]
        download: Option<Option<PathBuf>>,
    },
    /// Show length statistics for text (argument or stdin)
    Stats {
        /// Text to analyse; read from stdin when omitted
        text: Option<String>,
    },
    /// Check that the summarisation service is up
    Health,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Take text from the argument, or from stdin when it is piped in
fn text_or_stdin(text: Option<String>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if atty::is(atty::Stream::Stdin) {
        anyhow::bail!("no text given: pass it as an argument or pipe it on stdin");
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Summarise {
            text,
            file,
            length,
            notes,
            copy,
            download,
        }) => {
            let mut config = Config::load()?;
            if let Some(length) = length {
                config.service.length = length;
            }

            let mut controller = WorkflowController::new();
            if let Some(path) = file {
                println!("Extracting: {}", path.display());
                let upload = FileUpload::from_path(&path)?;
                let extractor = ServiceExtractor::new(&config.service.base_url)?;
                controller.load_file(&extractor, &upload).await?;
            } else {
                controller.set_text(&text_or_stdin(text)?)?;
            }

            let Some(stats) = controller.input_stats() else {
                anyhow::bail!("no text to summarise");
            };
            ui::print_input_stats(&stats);

            let summarizer = ui::build_summarizer(&config)?;
            controller.summarize(summarizer.as_ref()).await?;
            if let Some(failure) = controller.failure() {
                anyhow::bail!("summarisation failed: {}", failure.message);
            }

            if let Some(notes) = notes {
                controller.edit_notes(notes)?;
            }
            ui::print_result(&controller);

            let report = controller.report()?;
            if copy {
                ui::copy_report(&report, &SystemClipboard::new());
            }
            if let Some(dir) = download {
                let dir = dir.unwrap_or_else(|| config.export.directory.clone());
                ui::download_report(&report, &dir, &config.export.filename_prefix);
            }
        }
        Some(Commands::Stats { text }) => {
            let text = text_or_stdin(text)?;
            ui::print_input_stats(&InputStats::of(&text));
        }
        Some(Commands::Health) => {
            let config = Config::load()?;
            let gateway = HttpSummarizer::new(&config.service.base_url, config.service.length)?;
            let health = gateway.health().await?;
            println!("{} {}", "Service:".bold(), gateway.base_url());
            println!("{} {}", "Status:".bold(), health.status.green());
            if let Some(engine) = health.ai_engine {
                println!("{} {}", "Engine:".bold(), engine);
            }
            println!("{} {}", "Gemini available:".bold(), health.gemini_available);
            if let Some(message) = health.message {
                println!("{}", message);
            }
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "precis", &mut std::io::stdout());
        }
        None => {
            // Default: launch the interactive session
            let config = Config::load()?;
            ui::run(&config).await?;
        }
    }

    Ok(())
}
