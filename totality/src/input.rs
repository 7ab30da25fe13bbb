/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Operator commands read line by line from stdin.
//!
//! | Line | Command                             |
//! |------|-------------------------------------|
//! | `+`  | raise every camera's enhancement by 0.1 |
//! | `-`  | lower every camera's enhancement by 0.1 |
//! | `q`  | stop the run gracefully             |

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Enhancement step applied by `+` / `-`.
pub const ENHANCEMENT_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    RaiseEnhancement,
    LowerEnhancement,
    Stop,
}

pub fn parse_command(line: &str) -> Option<OperatorCommand> {
    match line.trim() {
        "+" | "up" => Some(OperatorCommand::RaiseEnhancement),
        "-" | "down" => Some(OperatorCommand::LowerEnhancement),
        "q" | "quit" | "exit" => Some(OperatorCommand::Stop),
        _ => None,
    }
}

/// Forwards commands parsed from `reader` until it closes or the receiver
/// goes away.
pub async fn listen<R>(reader: R, tx: UnboundedSender<OperatorCommand>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(cmd) => {
                    debug!(?cmd, "Operator command");
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => info!("Unknown command '{}' (use +, - or q)", line.trim()),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Cannot read operator input: {}", e);
                break;
            }
        }
    }
}

/// Spawns [`listen`] on the process's stdin.
pub fn spawn_stdin_listener(tx: UnboundedSender<OperatorCommand>) -> JoinHandle<()> {
    info!("Operator input enabled: '+' / '-' adjust enhancement, 'q' stops");
    tokio::spawn(listen(BufReader::new(tokio::io::stdin()), tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("+"), Some(OperatorCommand::RaiseEnhancement));
        assert_eq!(parse_command(" - \n"), Some(OperatorCommand::LowerEnhancement));
        assert_eq!(parse_command("q"), Some(OperatorCommand::Stop));
        assert_eq!(parse_command("x"), None);
    }

    #[tokio::test]
    async fn listen_forwards_known_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input: &[u8] = b"+\n\nbogus\n-\nq\n";
        listen(input, tx).await;

        let mut got = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            got.push(cmd);
        }
        assert_eq!(
            got,
            vec![
                OperatorCommand::RaiseEnhancement,
                OperatorCommand::LowerEnhancement,
                OperatorCommand::Stop
            ]
        );
    }
}
