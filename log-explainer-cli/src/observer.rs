//! Terminal progress output
//!
//! Everything here goes to stderr so stdout only carries the result.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use log_explainer_sdk::render::Stepper;
use log_explainer_sdk::session::{rotating_message, ANALYSIS_STEPS, LOADING_MESSAGE_INTERVAL};
use log_explainer_sdk::{ClassifiedError, SessionObserver, SessionUpdate};

/// Prints session updates as they happen
pub struct TerminalObserver {
    enabled: bool,
    /// Set once the server reports its own progress
    server_progress: Arc<AtomicBool>,
    /// Partial output was printed and the line is still open
    streaming_line: bool,
}

impl TerminalObserver {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            server_progress: Arc::new(AtomicBool::new(false)),
            streaming_line: false,
        }
    }

    /// Print rotating loading messages until `stop` is cancelled or the
    /// server starts reporting progress
    pub fn spawn_loading_ticker(&self, stop: CancellationToken) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let server_progress = Arc::clone(&self.server_progress);
        Some(tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval(LOADING_MESSAGE_INTERVAL);

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = interval.tick() => {
                        if server_progress.load(Ordering::Relaxed) {
                            break;
                        }
                        eprintln!("… {}", rotating_message(started.elapsed()));
                    }
                }
            }
        }))
    }

    /// Announce another attempt after a failure
    pub fn retrying(&mut self, attempt: u32, max: u32) {
        self.server_progress.store(false, Ordering::Relaxed);
        if self.enabled {
            eprintln!("↻ Retrying ({}/{})", attempt, max);
        }
    }

    fn end_line(&mut self) {
        if self.streaming_line {
            eprintln!();
            self.streaming_line = false;
        }
    }
}

impl SessionObserver for TerminalObserver {
    fn on_update(&mut self, update: &SessionUpdate) {
        if !self.enabled {
            return;
        }

        match update {
            SessionUpdate::Started { transport } => {
                eprintln!("→ Sending log ({})", transport);
            }
            SessionUpdate::FallingBack => {
                self.end_line();
                eprintln!("↺ Streaming unavailable, sending a single request instead");
            }
            SessionUpdate::Progress { step, message } => {
                self.server_progress.store(true, Ordering::Relaxed);
                self.end_line();
                let stepper = Stepper::new(ANALYSIS_STEPS, *step as usize);
                match message {
                    Some(message) => eprintln!("{}  {}", stepper.render(), message),
                    None => eprintln!("{}", stepper.render()),
                }
            }
            SessionUpdate::Partial { fragment } => {
                self.server_progress.store(true, Ordering::Relaxed);
                eprint!("{}", fragment);
                let _ = io::stderr().flush();
                self.streaming_line = true;
            }
            SessionUpdate::Completed => {
                self.end_line();
                eprintln!("✓ Analysis complete");
            }
            SessionUpdate::Failed(error) => {
                self.end_line();
                eprintln!("✗ {}", error.title);
            }
            SessionUpdate::Cancelled => {
                self.end_line();
                eprintln!("■ Analysis cancelled");
            }
        }
    }
}

/// Print a classified failure with its suggestions
pub fn print_error(error: &ClassifiedError) {
    eprintln!();
    eprintln!("{}", error.title);
    eprintln!("{}", error.message);

    if !error.suggestions.is_empty() {
        eprintln!();
        eprintln!("Suggestions:");
        for suggestion in &error.suggestions {
            eprintln!("  • {}", suggestion);
        }
    }
}
