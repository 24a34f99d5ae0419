//! The live counter loop.
//!
//! The loop owns the anchor and the "picking" flag and pulls a fresh
//! breakdown once a second. Input arrives as [`Event`] messages on a channel;
//! while a new date is being picked the tick is suspended, and a committed
//! date replaces the anchor before the next frame is computed.

use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::anchor::parse_anchor;
use crate::clock::Clock;
use crate::config::SettingsStore;
use crate::display::{DisplayUnit, select_display_units};
use crate::elapsed::{Breakdown, compute_local};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    BeginPick,
    Commit(DateTime<Local>),
    CancelPick,
    Quit,
}

/// Maps one line of user input to an event. Anything that is not a
/// keyword is treated as a date to commit.
pub fn parse_input(line: &str, now: &DateTime<Local>) -> Result<Event> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => bail!("empty input"),
        "p" | "pick" => Ok(Event::BeginPick),
        "c" | "cancel" => Ok(Event::CancelPick),
        "q" | "quit" | "exit" => Ok(Event::Quit),
        _ => parse_anchor(line, now).map(Event::Commit),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub since: NaiveDate,
    pub breakdown: Breakdown,
    pub units: Vec<DisplayUnit>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Committed,
    Stop,
}

pub struct Counter<C> {
    anchor: DateTime<Local>,
    picking: bool,
    clock: C,
}

impl<C: Clock> Counter<C> {
    pub fn new(anchor: DateTime<Local>, clock: C) -> Self {
        Self {
            anchor,
            picking: false,
            clock,
        }
    }

    pub fn anchor(&self) -> DateTime<Local> {
        self.anchor
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    /// Recomputes from scratch against the clock.
    pub fn frame(&self) -> Frame {
        let breakdown = compute_local(&self.anchor, &self.clock.now());
        Frame {
            since: self.anchor.date_naive(),
            breakdown,
            units: select_display_units(&breakdown),
        }
    }

    pub fn apply(&mut self, event: Event) -> Step {
        match event {
            Event::BeginPick => {
                tracing::debug!("Picking a new date, ticks suspended");
                self.picking = true;
                Step::Continue
            }
            Event::CancelPick => {
                tracing::debug!("Date pick cancelled");
                self.picking = false;
                Step::Continue
            }
            Event::Commit(anchor) => {
                tracing::info!(
                    from = %self.anchor.format("%Y-%m-%d %H:%M:%S"),
                    to = %anchor.format("%Y-%m-%d %H:%M:%S"),
                    "Special date changed"
                );
                self.anchor = anchor;
                self.picking = false;
                Step::Committed
            }
            Event::Quit => Step::Stop,
        }
    }
}

/// Runs until `Quit` arrives, every sender is dropped, or `render` fails
/// (for example because stdout was closed).
pub async fn run<C: Clock>(
    mut counter: Counter<C>,
    mut events: mpsc::Receiver<Event>,
    store: SettingsStore,
    mut render: impl FnMut(&Frame) -> Result<()>,
) -> Result<()> {
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("Input closed, stopping counter");
                    break;
                };

                match counter.apply(event) {
                    Step::Continue => {}
                    Step::Stop => break,
                    Step::Committed => {
                        // A failed save keeps the new date for this session only.
                        if let Err(e) = store.save_anchor(counter.anchor()) {
                            tracing::error!("Failed to save special date: {e:#}");
                        }
                        if let Err(e) = render(&counter.frame()) {
                            tracing::warn!("Output closed, stopping counter: {e:#}");
                            break;
                        }
                        ticker.reset();
                    }
                }
            }

            _ = ticker.tick(), if !counter.is_picking() => {
                if let Err(e) = render(&counter.frame()) {
                    tracing::warn!("Output closed, stopping counter: {e:#}");
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Forwards parsed input lines to the counter. Lines that do not parse are
/// logged and dropped. Reading stops after `quit` so a blocked stdin read
/// cannot hold up runtime shutdown.
pub fn spawn_input_reader<R, C>(reader: R, clock: C, tx: mpsc::Sender<Event>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read input");
                    break;
                }
            };

            let event = match parse_input(&line, &clock.now()) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Ignoring input: {e:#}");
                    continue;
                }
            };

            if event == Event::BeginPick {
                tracing::info!("Enter a date (YYYY-MM-DD) or \"cancel\"");
            }

            let quit = event == Event::Quit;
            if tx.send(event).await.is_err() || quit {
                break;
            }
        }
    })
}
