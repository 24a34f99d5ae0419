mod anchor;
mod clock;
mod config;
mod display;
mod elapsed;
mod host;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use clock::{FixedClock, SystemClock};
use config::SettingsStore;
use host::Counter;

#[derive(Parser)]
#[command(name = "together", version)]
#[command(about = "Counts the time since your special date")]
struct Cli {
    /// Settings file holding the special date
    #[arg(
        long,
        global = true,
        env = config::STATE_ENV,
        value_name = "PATH",
        default_value = config::DEFAULT_STATE_FILE
    )]
    state: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the counter once
    Show {
        /// Print JSON instead of the text card
        #[arg(long)]
        json: bool,

        /// Evaluate at this instant instead of now
        #[arg(long, value_name = "RFC3339")]
        at: Option<String>,
    },
    /// Save a new special date (YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS] or RFC 3339)
    Set { date: String },
    /// Live counter refreshed every second (default)
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = SettingsStore::new(cli.state);

    match cli.command.unwrap_or(Command::Watch) {
        Command::Show { json, at } => show(&store, json, at.as_deref()),
        Command::Set { date } => set(&store, &date),
        Command::Watch => watch(store).await,
    }
}

fn show(store: &SettingsStore, json: bool, at: Option<&str>) -> Result<()> {
    let now = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --at timestamp {raw:?}"))?
            .with_timezone(&Local),
        None => Local::now(),
    };

    let settings = store.load()?;
    if settings.special_date.is_none() {
        tracing::warn!("No special date saved yet, run `together set YYYY-MM-DD`");
    }

    let counter = Counter::new(settings.anchor_or(now), FixedClock(now));
    let frame = counter.frame();
    if frame.breakdown.is_zero() && settings.special_date.is_some() {
        tracing::warn!(since = %frame.since, "Special date has not been reached yet");
    }

    if json {
        let units: Vec<_> = frame
            .units
            .iter()
            .map(|u| serde_json::json!({ "value": u.value, "label": u.label() }))
            .collect();
        let out = serde_json::json!({
            "since": frame.since,
            "breakdown": frame.breakdown,
            "units": units,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", display::render_card(&frame.units, frame.since));
    }

    Ok(())
}

fn set(store: &SettingsStore, date: &str) -> Result<()> {
    let now = Local::now();
    let anchor = anchor::parse_anchor(date, &now)?;
    store.save_anchor(anchor)?;

    let units = display::select_display_units(&elapsed::compute_local(&anchor, &now));
    println!(
        "{}: {}",
        display::since_caption(anchor.date_naive()),
        display::render_inline(&units)
    );
    Ok(())
}

async fn watch(store: SettingsStore) -> Result<()> {
    let settings = store.load()?;
    let anchor = settings.anchor_or(Local::now());

    tracing::info!(
        path = %store.path().display(),
        since = %anchor.format("%Y-%m-%d %H:%M:%S"),
        "Starting counter, type \"pick\" to change the date or \"quit\" to exit"
    );

    let (tx, rx) = mpsc::channel(16);
    let reader = host::spawn_input_reader(BufReader::new(tokio::io::stdin()), SystemClock, tx);

    let counter = Counter::new(anchor, SystemClock);
    host::run(counter, rx, store, |frame| {
        let mut stdout = std::io::stdout().lock();
        // Clear the screen and home the cursor before redrawing.
        write!(
            stdout,
            "\x1b[2J\x1b[H{}",
            display::render_card(&frame.units, frame.since)
        )
        .and_then(|()| stdout.flush())
        .context("Failed to write to stdout")
    })
    .await?;

    reader.abort();
    Ok(())
}
