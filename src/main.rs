//! rollcall CLI entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rollcall::api::ApiClient;
use rollcall::auth::Authenticator;
use rollcall::config::Config;
use rollcall::scan::{ReconcileOutcome, ScanGate, ScanOutcome, ScanPipeline};
use rollcall::store::KvStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rollcall", version, about = "Student attendance check-in client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and replay any pending check-in.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Process a scanned QR payload.
    Scan {
        /// Raw text decoded from the QR code.
        text: String,
    },
    /// List the class schedule.
    Schedule,
    /// List upcoming events.
    Events,
    /// Show attendance history (classes and events), newest first.
    History,
    /// Show the pending and dead-letter check-in records.
    Pending {
        /// Remove both records.
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rollcall=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let data_dir = config.resolve_data_dir()?;
    let store = KvStore::open(&data_dir.join("rollcall.db"))
        .with_context(|| format!("opening store in {}", data_dir.display()))?;
    let api = ApiClient::new(&config.api_url, config.request_timeout())?;

    match cli.command {
        Command::Login { email, password } => {
            let auth = Authenticator::new(&api, &store);
            let outcome = auth.login(&email, &password).await?;
            println!("Logged in as user {}.", outcome.user.id);

            match outcome.reconcile {
                ReconcileOutcome::Nothing => {}
                ReconcileOutcome::Submitted(message) => {
                    println!("Deferred check-in submitted: {message}");
                }
                ReconcileOutcome::DeadLettered(reason) => {
                    println!(
                        "Deferred check-in failed ({reason}); kept for manual \
                         resubmission, see `rollcall pending`."
                    );
                }
            }
        }

        Command::Logout => {
            Authenticator::new(&api, &store).logout()?;
            println!("Logged out.");
        }

        Command::Whoami => match store.user()? {
            Some(user) => println!("User {}: {}", user.id, serde_json::to_string(&user.extra)?),
            None => println!("Not logged in."),
        },

        Command::Scan { text } => {
            let gate = ScanGate::new(config.scan_cooldown(), config.scan_max_hold());
            let pipeline = ScanPipeline::new(&gate, &api, &store);

            match pipeline.handle_scan(&text).await? {
                ScanOutcome::Debounced => println!("Ignored: duplicate scan."),
                ScanOutcome::Invalid(reason) => {
                    println!("Invalid QR code ({reason}). Please rescan.");
                }
                ScanOutcome::DeferredPendingLogin => {
                    println!("Not logged in. The scan was saved; log in to complete check-in.");
                }
                ScanOutcome::Submitted(message) => println!("{message}"),
                ScanOutcome::SubmissionFailed(message) => {
                    println!("Check-in failed: {message}. You can rescan to retry.");
                }
            }
        }

        Command::Schedule => {
            let user = store.user()?.ok_or(rollcall::RollcallError::NotLoggedIn)?;
            let entries = api.student_schedule(user.id).await?;
            if entries.is_empty() {
                println!("No scheduled classes.");
            }
            for entry in entries {
                println!(
                    "{}  {} - {}  {}  {}",
                    entry.date.as_deref().unwrap_or("----------"),
                    entry.start_time.as_deref().unwrap_or("--:--"),
                    entry.end_time.as_deref().unwrap_or("--:--"),
                    entry.subject.as_deref().unwrap_or("(unknown)"),
                    entry.room.as_deref().unwrap_or(""),
                );
            }
        }

        Command::Events => {
            let user = store.user()?.ok_or(rollcall::RollcallError::NotLoggedIn)?;
            let events = api.student_events(user.id).await?;
            if events.is_empty() {
                println!("No upcoming events.");
            }
            for event in events {
                println!(
                    "{}  {} - {}  {}  @ {}",
                    event.date.as_deref().unwrap_or("----------"),
                    event.start_time.as_deref().unwrap_or("--:--"),
                    event.end_time.as_deref().unwrap_or("--:--"),
                    event.title.as_deref().unwrap_or("(untitled)"),
                    event.location.as_deref().unwrap_or("?"),
                );
                if let Some(description) = event.description.as_deref() {
                    println!("    {description}");
                }
            }
        }

        Command::History => {
            let user = store.user()?.ok_or(rollcall::RollcallError::NotLoggedIn)?;
            let history = api.student_history(user.id).await?;
            if history.is_empty() {
                println!("No attendance records.");
            }
            for entry in &history {
                println!(
                    "{}  {}  {}  checked: {}",
                    entry.date.as_deref().unwrap_or("----------"),
                    entry.label(),
                    entry.status.as_deref().unwrap_or("?"),
                    entry.checked_at.as_deref().unwrap_or("never"),
                );
                if let Some(place) = entry.place() {
                    println!("    at {place}");
                }
            }
        }

        Command::Pending { clear } => {
            if clear {
                let had_pending = store.clear_pending_scan()?;
                let had_dead = store.clear_dead_letter()?;
                println!(
                    "Cleared {} record(s).",
                    u8::from(had_pending) + u8::from(had_dead)
                );
            } else {
                match store.pending_scan()? {
                    Some(pending) => println!("Pending: {}", serde_json::to_string(&pending)?),
                    None => println!("No pending check-in."),
                }
                match store.dead_letter()? {
                    Some(dead) => println!("Dead letter: {}", serde_json::to_string(&dead)?),
                    None => println!("No dead-letter check-in."),
                }
            }
        }
    }

    Ok(())
}
