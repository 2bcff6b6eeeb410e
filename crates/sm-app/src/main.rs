//! Main application entry point

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sm_core::Bookmark;
use sm_data::{export, Confirm, Outcome, Workbench, WorkbenchConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Annotate imported sheets row by row
#[derive(Parser)]
#[command(name = "sheetmark", version)]
struct Cli {
    /// SQLite file holding all state (overrides the config file)
    #[arg(long, env = "SHEETMARK_DB")]
    db: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, env = "SHEETMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(long, short)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a sheet and show its last viewed page
    Import { file: PathBuf },
    /// Show a page (the current one by default)
    Show { page: Option<u32> },
    /// Show the next page
    Next,
    /// Show the previous page
    Prev,
    /// Flag a row (1-based) as messaged
    Message {
        row: usize,
        /// Remove the flag instead
        #[arg(long)]
        off: bool,
    },
    /// Place a range marker on a row (1-based): start, end or none
    Mark { row: usize, bookmark: Bookmark },
    /// Print the counting range
    Summary,
    /// Clear all flags and markers of the current file
    ClearMarks,
    /// Remove the current file's rows, keeping its flags and markers
    Remove,
}

/// Confirmation read from the terminal
struct TerminalConfirm {
    assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn row_index(row: usize) -> Result<usize> {
    if row == 0 {
        bail!("Rows are numbered from 1");
    }
    Ok(row - 1)
}

async fn print_page(workbench: &Workbench) -> Result<()> {
    let view = workbench.page_view();
    if view.row_count == 0 {
        println!("No rows loaded");
    } else {
        let rows = workbench.page_rows().await?;
        println!("{}", export::pretty_page(&rows)?);
        println!("{}", view);

        let buttons: Vec<String> = view
            .buttons()
            .map(|p| if p == view.page { format!("[{}]", p) } else { p.to_string() })
            .collect();
        println!(
            "{} {} {}",
            if view.has_prev() { "‹ Prev" } else { "" },
            buttons.join(" "),
            if view.has_next() { "Next ›" } else { "" }
        );
    }

    print_summary(workbench).await
}

async fn print_summary(workbench: &Workbench) -> Result<()> {
    let range = workbench.summary().await?;
    println!("Messaged: {}", range.count);
    println!("{}", range);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => WorkbenchConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => WorkbenchConfig::default(),
    };
    match cli.db {
        Some(db) => config = config.with_store_path(db),
        None if config.store.path.is_none() => config = config.with_store_path("sheetmark.db"),
        None => {}
    }

    let mut workbench = Workbench::from_config(&config)?;
    workbench.restore().await.context("Failed to restore the previous session")?;

    let confirm = TerminalConfirm { assume_yes: cli.yes };

    match cli.command {
        Command::Import { file } => {
            let content = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            workbench.import(&name, &content).await?;
            print_page(&workbench).await?;
        }
        Command::Show { page } => {
            if let Some(page) = page {
                workbench.go_to_page(page).await?;
            }
            print_page(&workbench).await?;
        }
        Command::Next => {
            workbench.next_page().await?;
            print_page(&workbench).await?;
        }
        Command::Prev => {
            workbench.prev_page().await?;
            print_page(&workbench).await?;
        }
        Command::Message { row, off } => {
            workbench.set_messaged(row_index(row)?, !off).await?;
            print_summary(&workbench).await?;
        }
        Command::Mark { row, bookmark } => {
            workbench.set_bookmark(row_index(row)?, bookmark).await?;
            print_summary(&workbench).await?;
        }
        Command::Summary => print_summary(&workbench).await?,
        Command::ClearMarks => match workbench.clear_annotations(&confirm).await? {
            Outcome::Completed => println!("All checkmarks and bookmarks were cleared for this file."),
            Outcome::Declined => println!("Nothing changed."),
        },
        Command::Remove => match workbench.remove_dataset(&confirm).await? {
            Outcome::Completed => println!("File removed. Bookmarks and checkmarks are saved."),
            Outcome::Declined => println!("Nothing changed."),
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    info!("Starting sheetmark");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
