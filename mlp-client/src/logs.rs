//! Log line streams
//!
//! A [`LogStream`] is lazy, unbounded and not restartable. When backed by a
//! process, dropping the stream kills that process.

use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::kubectl::classify_failure;

/// Stream of log lines from a job
pub struct LogStream {
    source: LogSource,
}

enum LogSource {
    Process {
        command: String,
        child: Child,
        lines: Split<BufReader<ChildStdout>>,
        stderr: Option<JoinHandle<String>>,
        exhausted: bool,
    },
    Buffered(VecDeque<String>),
}

impl LogStream {
    /// Wraps a spawned process whose stdout carries log lines
    ///
    /// The child must have been spawned with piped stdout and stderr and
    /// with `kill_on_drop` set. Stderr is drained in the background while the
    /// stream is read, so must be called from within a tokio runtime.
    pub fn from_process(command: impl Into<String>, mut child: Child) -> Result<Self> {
        let command = command.into();
        let stdout = child.stdout.take().ok_or_else(|| {
            ClientError::command_failed(&command, "stdout was not captured")
        })?;
        let stderr = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain_stderr(command.clone(), pipe)));

        Ok(Self {
            source: LogSource::Process {
                command,
                child,
                lines: BufReader::new(stdout).split(b'\n'),
                stderr,
                exhausted: false,
            },
        })
    }

    /// A finite stream over already collected lines
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            source: LogSource::Buffered(lines.into_iter().collect()),
        }
    }

    /// Next line, or `None` once the source has closed
    ///
    /// Invalid UTF-8 is replaced rather than rejected. If the backing process
    /// exits non-zero, its stderr is returned as an error after the last line.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        match &mut self.source {
            LogSource::Buffered(lines) => Ok(lines.pop_front()),
            LogSource::Process {
                command,
                child,
                lines,
                stderr,
                exhausted,
            } => {
                if *exhausted {
                    return Ok(None);
                }

                if let Some(raw) = lines.next_segment().await? {
                    return Ok(Some(decode_line(raw)));
                }

                *exhausted = true;
                let status = child.wait().await?;
                debug!("{} exited with {}", command, status);
                if status.success() {
                    return Ok(None);
                }

                let message = match stderr.take() {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                Err(classify_failure(command, &message))
            }
        }
    }

    /// Drains the stream into a vector
    ///
    /// Only terminates for finite sources.
    pub async fn collect(mut self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        while let Some(line) = self.next_line().await? {
            out.push(line);
        }
        Ok(out)
    }
}

/// Decodes one `\n`-terminated segment, dropping a trailing `\r`
fn decode_line(mut raw: Vec<u8>) -> String {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    String::from_utf8_lossy(&raw).into_owned()
}

/// Reads a stderr pipe to the end, logging each line as it arrives
async fn drain_stderr<R>(command: String, pipe: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut collected = String::new();
    let mut lines = BufReader::new(pipe).split(b'\n');
    loop {
        match lines.next_segment().await {
            Ok(Some(raw)) => {
                let line = decode_line(raw);
                debug!("{} stderr: {}", command, line);
                collected.push_str(&line);
                collected.push('\n');
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Failed to read stderr of {}: {}", command, e);
                break;
            }
        }
    }
    collected
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            LogSource::Process { command, .. } => {
                f.debug_struct("LogStream").field("command", command).finish()
            }
            LogSource::Buffered(lines) => f
                .debug_struct("LogStream")
                .field("buffered", &lines.len())
                .finish(),
        }
    }
}
