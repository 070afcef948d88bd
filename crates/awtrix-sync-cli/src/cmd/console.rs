use awtrix_sync_core::scheduler::Command;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One console line mapped to a scheduler command.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Blank,
    Unknown(String),
}

pub fn parse(line: &str) -> Input {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Input::Blank,
        "u" | "update" => Input::Command(Command::Update),
        "q" | "quit" => Input::Command(Command::Shutdown),
        other => Input::Unknown(other.to_string()),
    }
}

/// Forward `u`/`q` lines from stdin to the scheduler. EOF leaves the
/// scheduler running on its timer.
pub async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("stdin closed; console commands disabled");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read stdin; console commands disabled");
                return;
            }
        };
        match parse(&line) {
            Input::Command(cmd) => {
                let stop = cmd == Command::Shutdown;
                if tx.send(cmd).await.is_err() || stop {
                    return;
                }
            }
            Input::Blank => {}
            Input::Unknown(other) => {
                tracing::info!(input = %other, "unknown command; use 'u' to update or 'q' to quit");
            }
        }
    }
}
