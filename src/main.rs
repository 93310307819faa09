use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use timedrop::common::config::{load_config, Slot};
use timedrop::session::{FileBlob, UploadSession};
use timedrop::store::JsonFileStore;
use timedrop::transport::HttpTransport;

#[derive(Parser)]
#[command(name = "timedrop")]
#[command(about = "Publish timetable PDFs to the portal backend")]
struct Cli {
    /// Operate on the exam timetable slot instead of the general one
    #[arg(long, global = true)]
    exam: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a PDF and publish its reference
    Publish {
        #[arg(help = "Path to the PDF to publish")]
        file: PathBuf,
    },
    /// Delete the published PDF and forget its reference
    Remove {
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Show the currently published reference
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;
    let slot = if cli.exam { Slot::Exam } else { Slot::Timetable };

    let store = Arc::new(JsonFileStore::new(config.store_path()));
    let transport = Arc::new(HttpTransport::with_settings(
        Duration::from_secs(config.timeout_secs),
        config.chunk_size as usize,
    )?);
    let session = UploadSession::new(config.profile(slot), store, transport);
    session.restore()?;

    match cli.command {
        Commands::Publish { file } => publish(&session, &file).await,
        Commands::Remove { yes } => remove(&session, yes).await,
        Commands::Status => {
            status(&session);
            Ok(())
        }
    }
}

async fn publish(session: &UploadSession, file: &Path) -> Result<()> {
    // Fail fast before touching the network
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let blob = FileBlob::from_path(file).await?;
    let name = blob.name.clone();
    session.select_file(blob);

    let bar = progress_bar(&name);
    let mut updates = session.subscribe();

    let publish = session.publish();
    tokio::pin!(publish);

    let result = loop {
        tokio::select! {
            result = &mut publish => break result,
            changed = updates.changed() => {
                if changed.is_ok() {
                    bar.set_position(u64::from(updates.borrow_and_update().progress));
                }
            }
        }
    };

    match result {
        Ok(url) => {
            bar.finish_with_message(format!("{} Published", style("✓").green().bold()));
            println!("{url}");
            Ok(())
        }
        Err(err) => {
            bar.finish_with_message(format!("{} Upload failed", style("✗").red().bold()));
            Err(err.into())
        }
    }
}

async fn remove(session: &UploadSession, yes: bool) -> Result<()> {
    let Some(url) = session.reference() else {
        println!("Nothing published.");
        return Ok(());
    };

    if !yes {
        let prompt = format!("Delete the published file at {url}? This cannot be undone.");
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    session.remove().await?;
    println!("{} Deleted", style("✓").green().bold());
    Ok(())
}

fn status(session: &UploadSession) {
    match session.snapshot().reference {
        Some(url) => println!("Published: {url}"),
        None => println!("Nothing published."),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn progress_bar(name: &str) -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan}] {pos}%")
            .unwrap(),
    );
    bar.set_message(name.to_string());
    bar
}
