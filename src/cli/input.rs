//! Line-based keyboard input for interactive commands

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One line typed by the user, trimmed and lowercased
pub type Line = String;

/// Read stdin lines on a background task. The receiver yields None at EOF.
pub fn spawn_line_reader() -> mpsc::UnboundedReceiver<Line> {
    spawn_reader(normalize)
}

/// Like `spawn_line_reader`, but keeps case and inner spacing for free text
pub fn spawn_text_reader() -> mpsc::UnboundedReceiver<String> {
    spawn_reader(|line| line.trim().to_string())
}

fn spawn_reader(map: fn(&str) -> String) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(map(&line)).is_err() {
                break;
            }
        }
    });
    rx
}

/// Read a single line verbatim, without the line ending. None at EOF.
pub async fn read_raw_line() -> Option<String> {
    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await.ok()?;
    if read == 0 {
        return None;
    }
    Some(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn normalize(line: &str) -> Line {
    line.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_trimmed_and_lowercased() {
        assert_eq!(normalize("  P \n"), "p");
        assert_eq!(normalize("12"), "12");
    }
}
