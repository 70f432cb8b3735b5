//! External command-line converters.
//!
//! Converters run as isolated child processes with stdout and stderr
//! captured. A run that outlives its time limit is killed.

use crate::error::{Error, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `program` with `args` and returns its stdout.
///
/// A non-zero exit status fails with [`Error::ExternalTool`] carrying the
/// program's stderr as written. Exceeding `timeout` kills the process and
/// fails with [`Error::Timeout`].
pub fn run_converter<S: AsRef<std::ffi::OsStr>>(program: &str, args: &[S], timeout: Duration) -> Result<String> {
    tracing::debug!(program, ?timeout, "starting external converter");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::ExternalTool {
            tool: program.to_string(),
            message: format!("failed to start: {}", e),
        })?;

    // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            if let Err(e) = child.kill() {
                tracing::warn!(program, "failed to kill converter: {}", e);
            }
            let _ = child.wait();
            return Err(Error::Timeout {
                tool: program.to_string(),
                seconds: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = collect(stdout);
    let stderr = collect(stderr);

    if !status.success() {
        return Err(Error::ExternalTool {
            tool: program.to_string(),
            message: if stderr.trim().is_empty() {
                status.to_string()
            } else {
                stderr
            },
        });
    }

    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
