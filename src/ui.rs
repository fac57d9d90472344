//! Terminal host for the workflow.
//!
//! Presentation only: every decision is made by `WorkflowController`, this
//! module prints its state and turns menu choices into controller calls.

use crate::agent::GeminiSummarizer;
use crate::config::{Backend, Config};
use crate::document::FileUpload;
use crate::export::{DirectoryDownloader, Report, SystemClipboard};
use crate::gateway::{HttpSummarizer, ServiceExtractor, Summarizer};
use crate::metrics::{InputStats, NotesStats, Severity};
use crate::workflow::{Phase, Resolution, WorkflowController};
use chrono::Utc;
use colored::Colorize;
use dialoguer::{Input, Select};
use std::path::Path;

/// Build the summariser selected in the configuration
pub fn build_summarizer(config: &Config) -> anyhow::Result<Box<dyn Summarizer + Send + Sync>> {
    Ok(match config.service.backend {
        Backend::Http => Box::new(HttpSummarizer::new(
            &config.service.base_url,
            config.service.length,
        )?),
        Backend::Gemini => Box::new(GeminiSummarizer::from_config(config)?),
    })
}

pub fn print_input_stats(stats: &InputStats) {
    println!(
        "📏 {} characters · {} words · {} min to read",
        stats.character_count.to_string().bold(),
        stats.word_count.to_string().bold(),
        stats.reading_time_minutes.to_string().bold()
    );
    if stats.character_count == 0 {
        return;
    }
    let message = stats.quality.message();
    match stats.quality.severity() {
        Severity::Warning => println!("⚠️  {}", message.yellow()),
        Severity::Info => println!("👍 {}", message.blue()),
        Severity::Positive => println!("🎯 {}", message.green()),
    }
}

fn print_notes_stats(stats: &NotesStats) {
    if stats.character_count == 0 {
        println!("{}", "No notes yet".dimmed());
    } else {
        println!(
            "{}",
            format!(
                "Characters: {}  Words: {}",
                stats.character_count, stats.word_count
            )
            .dimmed()
        );
    }
}

/// Print the result, its statistics and the notes held by `controller`
pub fn print_result(controller: &WorkflowController) {
    let (Some(result), Some(stats)) = (controller.result(), controller.result_stats()) else {
        return;
    };

    println!("\n{}", "=== Summary Results ===".bold());
    println!(
        "Compression: {}  Key sentences: {}  Key points: {}  Sections covered: {}",
        stats.compression.to_string().blue().bold(),
        stats.sentence_count.to_string().green().bold(),
        stats.key_point_count.to_string().purple().bold(),
        stats.sections_covered.to_string().yellow().bold()
    );

    println!("\n🤖 {} ({})", "Summary".bold(), result.engine_label().dimmed());
    println!("  {}", result.summary);

    println!("\n🔑 {}", "Key Points".bold());
    if result.key_points.is_empty() {
        println!("  {}", "No key points identified".italic().dimmed());
    }
    for (index, point) in result.key_points.iter().enumerate() {
        println!("  {}. {}", index + 1, point);
    }

    println!(
        "\n📈 Original sentences: {}  Summary sentences: {}  Original characters: {}",
        stats.original_sentences, stats.sentence_count, stats.original_length
    );

    if let Some(notes) = controller.notes() {
        println!("\n📝 {}", "Your Notes".bold());
        if !notes.is_empty() {
            println!("  {}", notes);
        }
        if let Some(notes_stats) = controller.notes_stats() {
            print_notes_stats(&notes_stats);
        }
    }
}

/// Copy the report, reporting the outcome without failing the session
pub fn copy_report(report: &Report, clipboard: &SystemClipboard) {
    match report.copy_to(clipboard) {
        Ok(()) => println!("{}", "📋 Report copied to clipboard".green()),
        Err(e) => eprintln!("{} {}", "Warning:".yellow(), e),
    }
}

/// Save the report into `dir`, reporting the outcome without failing the session
pub fn download_report(report: &Report, dir: &Path, prefix: &str) {
    let downloader = DirectoryDownloader::new(dir);
    match report.download(&downloader, prefix, Utc::now()) {
        Ok(download) => println!(
            "{} {}",
            "💾 Report saved to".green(),
            downloader.path_for(&download.filename).display()
        ),
        Err(e) => eprintln!("{} {}", "Warning:".yellow(), e),
    }
}

/// Submit the current document, letting Ctrl-C abandon the request
async fn summarise(controller: &mut WorkflowController, summarizer: &(dyn Summarizer + Send + Sync)) -> anyhow::Result<()> {
    let submission = controller.submit()?;
    println!("{}", "🤖 Processing... (Ctrl-C to cancel)".cyan());

    tokio::select! {
        outcome = summarizer.submit(&submission.document) => {
            if controller.resolve(submission.id, outcome) == Resolution::Stale {
                tracing::debug!(submission = %submission.id, "response arrived after cancel");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            controller.cancel()?;
            println!("{}", "Cancelled".yellow());
        }
    }
    Ok(())
}

fn choose(prompt: &str, items: &[&str]) -> anyhow::Result<usize> {
    Ok(Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?)
}

fn edit_text(current: &str) -> anyhow::Result<String> {
    Ok(edit::edit(current)?)
}

async fn load_pdf(controller: &mut WorkflowController, extractor: &ServiceExtractor) -> anyhow::Result<()> {
    let path: String = Input::new().with_prompt("Path to PDF").interact_text()?;
    let upload = FileUpload::from_path(Path::new(path.trim()))?;
    println!("{}", "Extracting text...".cyan());
    if let Err(e) = controller.load_file(extractor, &upload).await {
        eprintln!("{} {}", "Error:".red(), e);
    }
    Ok(())
}

/// Run the interactive session until the user quits
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let summarizer = build_summarizer(config)?;
    let extractor = ServiceExtractor::new(&config.service.base_url)?;
    let mut clipboard: Option<SystemClipboard> = None;
    let mut controller = WorkflowController::new();

    println!("{}", "Summary Maker - paste text or load a PDF".bold());

    loop {
        println!();
        match controller.phase() {
            Phase::Idle => match choose("What do you want to summarise?", &["Type or paste text", "Load a PDF", "Quit"])? {
                0 => {
                    if let Err(e) = controller.set_text(&edit_text("")?) {
                        eprintln!("{} {}", "Error:".red(), e);
                    }
                }
                1 => load_pdf(&mut controller, &extractor).await?,
                _ => break,
            },
            Phase::HasInput => {
                if let Some(stats) = controller.input_stats() {
                    print_input_stats(&stats);
                }
                match choose("Ready", &["Summarise", "Edit text", "Load a PDF instead", "Clear input", "Quit"])? {
                    0 => summarise(&mut controller, summarizer.as_ref()).await?,
                    1 => {
                        let current = controller
                            .document()
                            .map(|d| d.content().to_string())
                            .unwrap_or_default();
                        controller.set_text(&edit_text(&current)?)?;
                    }
                    2 => load_pdf(&mut controller, &extractor).await?,
                    3 => controller.clear_input()?,
                    _ => break,
                }
            }
            // `summarise` never returns while still processing.
            Phase::Processing => controller.cancel()?,
            Phase::Failed => {
                if let Some(failure) = controller.failure() {
                    eprintln!("{} {}", "❌ Summarisation failed:".red(), failure.message);
                }
                match choose("What now?", &["Retry", "Edit text", "Start over", "Quit"])? {
                    0 => controller.retry()?,
                    1 => {
                        let current = controller
                            .document()
                            .map(|d| d.content().to_string())
                            .unwrap_or_default();
                        if let Err(e) = controller.set_text(&edit_text(&current)?) {
                            eprintln!("{} {}", "Error:".red(), e);
                        }
                    }
                    2 => controller.start_over(),
                    _ => break,
                }
            }
            Phase::Result => {
                print_result(&controller);
                match choose(
                    "Next",
                    &["Edit notes", "Copy report", "Download report", "Start over", "Quit"],
                )? {
                    0 => {
                        let current = controller.notes().unwrap_or_default().to_string();
                        controller.edit_notes(edit_text(&current)?.trim_end())?;
                    }
                    1 => copy_report(&controller.report()?, clipboard.get_or_insert_with(SystemClipboard::new)),
                    2 => download_report(
                        &controller.report()?,
                        &config.export.directory,
                        &config.export.filename_prefix,
                    ),
                    3 => controller.start_over(),
                    _ => break,
                }
            }
        }
    }

    Ok(())
}
