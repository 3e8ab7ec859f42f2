//! A stdin-driven stand-in for the physical studio button panels, which
//! are out of scope (spec.md §1). Lines are `<studio-name> <takeover|
//! release|immediate>`; unrecognized lines are logged and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use dispatcher_core::{ButtonEvent, ButtonKind, Studio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Reads button commands from stdin until EOF, forwarding well-formed
/// ones on `tx`. Runs until the channel closes or stdin is closed.
pub async fn run_stdin_feed(studios: HashMap<String, Arc<Studio>>, tx: mpsc::Sender<ButtonEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("stdin closed, button feed stopping");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading stdin button feed");
                return;
            }
        };
        match parse_command(&line, &studios) {
            Some(event) => {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            None => tracing::warn!(%line, "unrecognized button command, expected '<studio> <takeover|release|immediate>'"),
        }
    }
}

fn parse_command(line: &str, studios: &HashMap<String, Arc<Studio>>) -> Option<ButtonEvent> {
    let mut parts = line.split_whitespace();
    let studio_name = parts.next()?;
    let button_name = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let studio = studios.get(studio_name)?.clone();
    let button = match button_name {
        "takeover" => ButtonKind::Takeover,
        "release" => ButtonKind::Release,
        "immediate" => ButtonKind::Immediate,
        _ => return None,
    };
    Some(ButtonEvent { studio, button })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatcher_core::RecordingLampSink;

    fn studios() -> HashMap<String, Arc<Studio>> {
        let mut map = HashMap::new();
        map.insert("studio-a".to_string(), Studio::new("studio-a", Arc::new(RecordingLampSink::new())));
        map
    }

    #[test]
    fn parses_a_well_formed_command() {
        let event = parse_command("studio-a takeover", &studios()).unwrap();
        assert_eq!(event.studio.name, "studio-a");
        assert_eq!(event.button, ButtonKind::Takeover);
    }

    #[test]
    fn rejects_unknown_studio_or_button_or_extra_tokens() {
        assert!(parse_command("studio-z takeover", &studios()).is_none());
        assert!(parse_command("studio-a spin", &studios()).is_none());
        assert!(parse_command("studio-a takeover now", &studios()).is_none());
        assert!(parse_command("studio-a", &studios()).is_none());
    }
}
