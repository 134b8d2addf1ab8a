//! Helpers to handle child process stdout/stderr output
//!
//! Output is always piped and always drained, so a child never blocks on a
//! full pipe. Lines are echoed at trace level and forwarded to a channel that
//! readiness detection reads from; once that receiver is dropped, forwarding
//! stops but draining continues until the child closes its pipes.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use shared::{process_trace, ProcessId};

/// Result of waiting for a readiness line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The ready message was seen
    Ready,
    /// Both output streams closed before the ready message appeared
    Exited,
    /// The ready message did not appear in time
    TimedOut,
}

/// Take the piped stdout/stderr of `child` and spawn tasks to consume them
///
/// # Returns
/// Receiver of every output line, in arrival order per stream
pub fn spawn_output_consumers(child: &mut Child, process: &ProcessId) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader(stdout, process.clone(), "stdout", tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader(stderr, process.clone(), "stderr", tx);
    }

    rx
}

fn spawn_line_reader<R>(stream: R, process: ProcessId, stream_name: &'static str, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            // Children are not obliged to print UTF-8
            let line = decode_line(&buf);
            process_trace!(process, "[{}] {}", stream_name, line);
            // Receiver goes away after readiness; keep draining regardless
            let _ = tx.send(line);
        }
    });
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\n' || c == '\r')
        .to_string()
}

/// Wait until a line containing `ready_message` arrives on `lines`
pub async fn wait_for_ready(
    lines: &mut mpsc::UnboundedReceiver<String>,
    ready_message: &str,
    timeout: Duration,
) -> ReadyOutcome {
    let scan = async {
        while let Some(line) = lines.recv().await {
            if line.contains(ready_message) {
                return ReadyOutcome::Ready;
            }
        }
        ReadyOutcome::Exited
    };

    match tokio::time::timeout(timeout, scan).await {
        Ok(outcome) => outcome,
        Err(_) => ReadyOutcome::TimedOut,
    }
}
