//! Operator command sources: standard input and process signals

use crate::control::ControlState;
use std::io::BufRead;
use std::thread;

/// A textual operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

impl ControlCommand {
    /// Parses a command line; unrecognized input yields `None`
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "pause" | "p" => Some(ControlCommand::Pause),
            "resume" | "r" => Some(ControlCommand::Resume),
            "stop" | "s" | "q" | "quit" => Some(ControlCommand::Stop),
            _ => None,
        }
    }
}

/// Reads operator commands from standard input
///
/// Runs on a dedicated OS thread so a blocked read never holds up runtime
/// shutdown. End of input just ends the reader; it does not stop the crawl.
pub fn spawn_stdin_listener(control: ControlState) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("control-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match ControlCommand::parse(&line) {
                    Some(command) => {
                        control.apply(command);
                        if command == ControlCommand::Stop {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => tracing::debug!(input = %line.trim(), "Ignoring unknown command"),
                }
            }
        })
}

/// Maps SIGINT (and SIGTERM on unix) onto the stop path
pub fn spawn_signal_listener(control: ControlState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let cancelled = control.cancelled();
        tokio::select! {
            _ = cancelled.cancelled() => {}
            _ = shutdown_signal() => {
                tracing::warn!("Interrupt received");
                control.apply(ControlCommand::Stop);
            }
        }
    })
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
