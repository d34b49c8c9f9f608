use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capstan::browse::{BrowseMode, BrowseState};
use capstan::config::Config;
use capstan::console::Console;
use capstan::error::{Error, Result};
use capstan::logs::ClearOutcome;
use capstan::models::{DashboardSummary, LogEntry, LogKind, ScheduledTask, SyncMode, SyncScope};
use capstan::notify::ConfirmPrompt;
use capstan::tasks::{parse_interval_hours, DeleteOutcome};

#[derive(Parser)]
#[command(
    name = "capstan",
    version,
    about = "Console client for a channel resource indexer",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        /// Account name
        username: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Drop the persisted session
    Logout,

    /// Show session and sync status
    Status,

    /// Show the aggregated dashboard
    Dashboard,

    /// List monitored channels
    Channels,

    /// Browse resources page by page
    Browse {
        /// Page to fetch
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Restrict to one channel
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Search resources by keyword
    Search {
        /// Search query
        query: String,

        /// Restrict to one channel
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Start a sync and watch it to completion
    Sync {
        /// Channel to sync, or "all" for every channel
        #[arg(default_value = "all")]
        scope: String,

        /// Re-fetch everything instead of only new messages
        #[arg(long)]
        full: bool,

        /// Start the job without watching it
        #[arg(long)]
        detach: bool,
    },

    /// Manage scheduled sync tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// View or clear the activity log
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },

    /// Transfer a resource link into cloud storage
    Transfer {
        /// Link to transfer
        url: String,
    },

    /// Manage saved search history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List scheduled tasks
    List,

    /// Schedule a recurring sync
    Add {
        /// Channel to sync
        channel: String,

        /// Sync mode (incremental, full)
        #[arg(short, long, default_value = "incremental")]
        mode: String,

        /// Hours between runs
        #[arg(short, long, default_value = "6")]
        interval: String,
    },

    /// Delete a scheduled task
    Remove {
        /// Task identifier
        id: String,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Show recent entries
    Show {
        /// Maximum entries to fetch
        #[arg(short, long)]
        limit: Option<u32>,

        /// Restrict to one entry kind (sync, scheduled, parse)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Delete every entry
    Clear,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Show saved queries
    Show,

    /// Remove one saved query
    Remove {
        /// Query to remove
        query: String,
    },

    /// Remove every saved query
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    let console = Console::new(config)?;

    // A login establishes identity itself; every other command restores it
    if !matches!(cli.command, Commands::Login { .. }) {
        console.startup().await?;
    }

    let result = run(&console, cli.command).await;
    print_toasts(&console).await;
    console.shutdown();

    if let Err(e) = result {
        tracing::debug!(category = e.category().as_str(), "Command failed");
        if e.is_auth() {
            eprintln!("error: not logged in (run 'capstan login <username>')");
        } else {
            eprintln!("error: {}", e.user_message());
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(console: &Console, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            tracing::info!(username = %username, "Starting login command");
            login(console, &username, password).await?;
        }

        Commands::Logout => {
            tracing::info!("Starting logout command");
            console.logout().await?;
        }

        Commands::Status => {
            tracing::info!("Starting status command");
            status(console).await?;
        }

        Commands::Dashboard => {
            tracing::info!("Starting dashboard command");
            let summary = console.dashboard.refresh().await?;
            render_summary(&summary);
        }

        Commands::Channels => {
            tracing::info!("Starting channels command");
            channels(console).await?;
        }

        Commands::Browse { page, channel } => {
            tracing::info!(page = %page, channel = ?channel, "Starting browse command");
            browse(console, page, channel).await?;
        }

        Commands::Search { query, channel } => {
            tracing::info!(query = %query, channel = ?channel, "Starting search command");
            console.browser.stage_channel(channel).await;
            let state = console.browser.execute(Some(&query)).await?;
            render_resources(&state);
        }

        Commands::Sync {
            scope,
            full,
            detach,
        } => {
            tracing::info!(scope = %scope, full = %full, "Starting sync command");
            sync(console, &scope, full, detach).await?;
        }

        Commands::Tasks { command } => match command {
            TaskCommands::List => {
                tracing::info!("Starting tasks list command");
                let tasks = console.tasks.refresh().await?;
                render_tasks(&tasks);
            }

            TaskCommands::Add {
                channel,
                mode,
                interval,
            } => {
                tracing::info!(channel = %channel, mode = %mode, interval = %interval, "Starting tasks add command");
                let mode = parse_mode(&mode)?;
                let interval_hours = parse_interval_hours(&interval)?;
                let tasks = console.tasks.add(&channel, mode, interval_hours).await?;
                render_tasks(&tasks);
            }

            TaskCommands::Remove { id } => {
                tracing::info!(id = %id, "Starting tasks remove command");
                let outcome = run_with_prompts(console, console.tasks.delete(&id)).await?;
                match outcome {
                    DeleteOutcome::Deleted(_) => render_tasks(&console.tasks.tasks().await),
                    DeleteOutcome::Declined => println!("Aborted."),
                }
            }
        },

        Commands::Logs { command } => match command {
            LogCommands::Show { limit, kind } => {
                tracing::info!(limit = ?limit, kind = ?kind, "Starting logs show command");
                let kind = kind.as_deref().map(parse_log_kind).transpose()?;
                let entries = console.logs.fetch(limit, kind).await?;
                render_logs(&entries);
            }

            LogCommands::Clear => {
                tracing::info!("Starting logs clear command");
                let outcome = run_with_prompts(console, console.logs.clear()).await?;
                if outcome == ClearOutcome::Declined {
                    println!("Aborted.");
                }
            }
        },

        Commands::Transfer { url } => {
            tracing::info!(url = %url, "Starting transfer command");
            console.transfer(&url).await?;
        }

        Commands::History { command } => match command {
            HistoryCommands::Show => {
                tracing::info!("Starting history show command");
                history(console).await;
            }

            HistoryCommands::Remove { query } => {
                tracing::info!(query = %query, "Starting history remove command");
                console.history.remove(&query).await?;
                history(console).await;
            }

            HistoryCommands::Clear => {
                tracing::info!("Starting history clear command");
                console.history.clear().await?;
                println!("Search history cleared.");
            }
        },
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> anyhow::Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("capstan=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("capstan=warn")
    };

    // Logs go to stderr so stdout stays parseable command output
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

async fn login(console: &Console, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ").await?,
    };

    let session = console.login(username, password.trim()).await?;
    let summary = console.dashboard.summary().await;
    println!(
        "Logged in as {} ({} resources indexed)",
        session.username, summary.total_resources
    );
    Ok(())
}

async fn status(console: &Console) -> Result<()> {
    match console.session.username().await {
        Some(username) => println!("Session:  {username}"),
        None => println!("Session:  not logged in"),
    }

    let status = console.gateway.sync_status().await?;
    if status.running {
        println!("Sync:     running");
        if !status.message.is_empty() {
            println!("          {}", status.message);
        }
    } else {
        println!("Sync:     idle");
    }
    Ok(())
}

async fn channels(console: &Console) -> Result<()> {
    let channels = console.dashboard.refresh_channels().await?;
    if channels.is_empty() {
        println!("No channels configured.");
        return Ok(());
    }

    println!("{:<16} {:<24} {:<10}", "ID", "NAME", "PARSER");
    for channel in &channels {
        println!(
            "{:<16} {:<24} {:<10}",
            channel.id,
            channel.name,
            channel.parse_mode.as_str()
        );
    }
    Ok(())
}

async fn browse(console: &Console, page: u32, channel: Option<String>) -> Result<()> {
    console.browser.stage_channel(channel).await;
    let mut state = console.browser.execute(None).await?;

    // Absolute page moves go through the same relative-move validation,
    // so an out-of-range request lands on page 1 instead of erroring
    if page > 1 {
        state = console
            .browser
            .change_page(i64::from(page) - 1)
            .await?;
    }

    render_resources(&state);
    Ok(())
}

async fn sync(console: &Console, scope: &str, full: bool, detach: bool) -> Result<()> {
    let scope = SyncScope::parse(scope);
    let mode = if full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };

    let ack = console.sync.start_sync(scope, mode).await?;
    println!("{}", ack.message);

    if detach {
        return Ok(());
    }

    tokio::select! {
        _ = console.sync.wait_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            console.sync.cancel().await;
            println!("\nStopped watching; the job keeps running on the server.");
            return Ok(());
        }
    }

    match console.sync.last_error().await {
        Some(error) => Err(Error::other(format!("sync watch failed: {error}"))),
        None => {
            let summary = console.dashboard.summary().await;
            println!(
                "Sync finished: {} resources, {} parsed",
                summary.total_resources, summary.total_parsed
            );
            Ok(())
        }
    }
}

async fn history(console: &Console) {
    let entries = console.history.entries().await;
    if entries.is_empty() {
        println!("No saved searches.");
        return;
    }

    for (index, query) in entries.iter().enumerate() {
        println!("{:>2}. {query}", index + 1);
    }
}

// ============================================================================
// Parsing and rendering
// ============================================================================

fn parse_mode(raw: &str) -> Result<SyncMode> {
    SyncMode::parse(raw).ok_or_else(|| {
        Error::invalid_input(format!("unknown sync mode '{raw}' (expected incremental, full)"))
    })
}

fn parse_log_kind(raw: &str) -> Result<LogKind> {
    LogKind::parse(raw).ok_or_else(|| {
        Error::invalid_input(format!(
            "unknown log type '{raw}' (expected sync, scheduled, parse)"
        ))
    })
}

fn render_summary(summary: &DashboardSummary) {
    println!(
        "Resources: {} total, {} parsed",
        summary.total_resources, summary.total_parsed
    );
    if summary.sync_status.running {
        println!("Sync:      running");
        if !summary.sync_status.message.is_empty() {
            println!("           {}", summary.sync_status.message);
        }
    } else {
        println!("Sync:      idle");
    }

    if summary.channels.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<24} {:>8} {:>8} {:>9}",
        "CHANNEL", "TOTAL", "PARSED", "UNPARSED"
    );
    for channel in &summary.channels {
        println!(
            "{:<24} {:>8} {:>8} {:>9}",
            channel.name, channel.total, channel.parsed, channel.unparsed
        );
    }
}

fn render_resources(state: &BrowseState) {
    match state.mode {
        BrowseMode::Search => {
            println!("{} matches for \"{}\"", state.total, state.query);
        }
        BrowseMode::Browse => {
            println!(
                "Page {} of {} ({} resources)",
                state.page, state.total_pages, state.total
            );
        }
    }

    for resource in &state.resources {
        println!("{:>10}  {}", resource.message_id, resource.title);
        if let Some(name) = &resource.channel_name {
            println!("            in {name}");
        }
        if !resource.pan_url.is_empty() {
            println!("            {}", resource.pan_url);
        }
    }
}

fn render_tasks(tasks: &[ScheduledTask]) {
    if tasks.is_empty() {
        println!("No scheduled tasks.");
        return;
    }

    println!("{:<28} {:<28} {}", "ID", "NAME", "NEXT RUN");
    for task in tasks {
        let next_run = task
            .next_run
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| String::from("-"));
        println!("{:<28} {:<28} {next_run}", task.id, task.name);
    }
}

fn render_logs(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log entries.");
        return;
    }

    for entry in entries {
        let channel = entry.channel.as_deref().unwrap_or("-");
        println!(
            "{}  {:<9} {:<7} [{}] {}",
            entry.timestamp,
            entry.kind.as_str(),
            entry.status.as_str(),
            channel,
            entry.message
        );
    }
}

// ============================================================================
// Prompt plumbing
// ============================================================================

/// Print queued toasts in arrival order
async fn print_toasts(console: &Console) {
    for toast in console.notify.active_toasts().await {
        println!("[{}] {}", toast.kind.as_str(), toast.message);
    }
}

/// Drive queued confirmation prompts from stdin while an operation runs
///
/// Components block on their confirmation internally, so the prompt has to
/// be answered from a concurrent arm or the operation would never resolve.
async fn run_with_prompts<T, F>(console: &Console, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::pin!(operation);

    loop {
        tokio::select! {
            result = &mut operation => return result,
            _ = tokio::time::sleep(Duration::from_millis(25)) => {
                if let Some(prompt) = console.notify.active_confirm().await {
                    let accepted = ask(&prompt).await?;
                    console.notify.resolve_active(accepted).await;
                }
            }
        }
    }
}

async fn ask(prompt: &ConfirmPrompt) -> Result<bool> {
    let line = prompt_line(&format!("{}: {} [y/N] ", prompt.title, prompt.message)).await?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Read one line from stdin off the async runtime
async fn prompt_line(prompt: &str) -> Result<String> {
    use std::io::Write;

    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>(line)
    })
    .await
    .map_err(|e| Error::other(format!("prompt task failed: {e}")))?
    .map_err(Error::from)
}
