//! Running external tools with a deadline.

use crate::error::{LedgerError, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a finished external command
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args...` in `cwd`, killing it once `timeout` elapses.
///
/// Stdout and stderr are drained on helper threads so a chatty tool cannot block on a
/// full pipe while we poll. A non-zero exit is an `ExternalTool` error carrying the
/// tail of stderr.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    tracing::debug!(program, ?args, ?cwd, "spawning external tool");
    let mut child = command
        .spawn()
        .map_err(|e| LedgerError::external_tool(program, format!("failed to spawn: {e}")))?;

    let stdout_reader = child.stdout.take().map(spawn_drain);
    let stderr_reader = child.stderr.take().map(spawn_drain);

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(LedgerError::external_tool(
                        program,
                        format!("timed out after {}s", timeout.as_secs()),
                    ));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(LedgerError::external_tool(program, format!("wait error: {e}")));
            }
        }
    };

    let stdout = stdout_reader.map(join_drain).unwrap_or_default();
    let stderr = stderr_reader.map(join_drain).unwrap_or_default();

    if !status.success() {
        return Err(LedgerError::external_tool(
            program,
            format!("exited with {status}: {}", tail(&stderr, 400)),
        ));
    }

    Ok(ToolOutput { stdout, stderr })
}

fn spawn_drain<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_drain(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn tail(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim_end();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed;
    }
    let skip = count - max_chars;
    match trimmed.char_indices().nth(skip) {
        Some((idx, _)) => &trimmed[idx..],
        None => trimmed,
    }
}
