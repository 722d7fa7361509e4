// src/supervise/output.rs

//! Merging the miner's stdout and stderr into one line stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Lines buffered between the pipe readers and the console writer.
const LINE_BUFFER: usize = 256;

/// Spawn one reader task per pipe, both feeding the returned receiver.
///
/// The receiver yields `None` once both pipes reach end-of-file. Lines keep
/// their per-pipe order; interleaving across the two pipes follows arrival
/// order. Invalid UTF-8 is replaced rather than ending the stream.
pub fn merge_output(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>(LINE_BUFFER);

    if let Some(stdout) = stdout {
        spawn_line_reader("stdout", stdout, tx.clone());
    }
    if let Some(stderr) = stderr {
        spawn_line_reader("stderr", stderr, tx);
    }

    rx
}

fn spawn_line_reader<R>(stream: &'static str, pipe: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    trace!(stream, "{}", line);
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(stream, error = %e, "read error on miner output; closing stream");
                    break;
                }
            }
        }

        debug!(stream, "miner output stream ended");
    });
}
