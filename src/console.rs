//! Interactive device selection on a line-oriented terminal.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::manager::{Command, MonitorEvent};
use crate::transport::DeviceCandidate;

/// Answers every [`MonitorEvent::CandidatesPresented`] with a [`Command`] read from `input`.
///
/// Runs until the event channel closes. Once `input` is exhausted every presentation is answered with a rescan.
pub async fn run_selector<R>(
    input: R,
    mut events: mpsc::Receiver<MonitorEvent>,
    commands: mpsc::UnboundedSender<Command>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(event) = events.recv().await {
        let MonitorEvent::CandidatesPresented(candidates) = event else {
            continue;
        };

        println!("No HRM device found.\nCtrl+C to stop, select from list or rescan [r]");
        println!("Available devices:");
        for (idx, candidate) in candidates.iter().enumerate() {
            println!("[{}]: {}", idx, candidate);
        }
        println!("Select device: ... Then press Enter");

        let command = match lines.next_line().await {
            Ok(Some(line)) => parse_selection(&line, &candidates),
            Ok(None) => Command::Rescan,
            Err(err) => {
                warn!("cannot read selection: {}", err);
                Command::Rescan
            }
        };
        if commands.send(command).is_err() {
            break;
        }
    }
}

/// `r` rescans, an index into `candidates` selects that device, anything else rescans.
pub fn parse_selection(input: &str, candidates: &[DeviceCandidate]) -> Command {
    let input = input.trim();
    if input == "r" {
        return Command::Rescan;
    }

    match input.parse::<usize>().ok().and_then(|idx| candidates.get(idx)) {
        Some(candidate) => {
            println!("Selected '{}'", candidate.name);
            Command::Select(candidate.name.clone())
        }
        None => {
            println!("Please only enter one of the listed numbers!");
            Command::Rescan
        }
    }
}
