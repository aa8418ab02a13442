//! CLI-based extractor using an external yt-dlp binary

use super::command::{download_args, resolve_args};
use super::handle::{JobExit, JobHandle, JobSignal};
use super::traits::{Extractor, RunMode};
use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::progress::LineBuffer;
use crate::types::RetrievalRequest;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Extractor that runs an external `yt-dlp` binary
///
/// Arguments go straight to the process as argv; no shell is involved.
///
/// # Examples
///
/// ```no_run
/// use media_relay::extractor::CliExtractor;
/// use std::path::PathBuf;
///
/// // Explicit binary
/// let extractor = CliExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = CliExtractor::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Clone, Debug)]
pub struct CliExtractor {
    binary_path: PathBuf,
    base_args: Vec<String>,
    drain_grace: Duration,
}

impl CliExtractor {
    /// Create an extractor for an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            base_args: Vec::new(),
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Apply leading arguments and drain timing from configuration
    pub fn with_config(mut self, config: &ExtractorConfig) -> Self {
        self.base_args = config.base_args.clone();
        self.drain_grace = config.drain_grace;
        self
    }

    /// Replace the arguments placed before every mode-specific argument
    pub fn with_base_args(mut self, base_args: Vec<String>) -> Self {
        self.base_args = base_args;
        self
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // own process group, so helpers such as ffmpeg die with the tool
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        Error::ExternalTool(format!(
            "failed to execute {}: {}",
            self.binary_path.display(),
            e
        ))
    }
}

#[async_trait]
impl Extractor for CliExtractor {
    async fn start(
        &self,
        request: &RetrievalRequest,
        output_template: &Path,
        mode: RunMode,
        timeout: Duration,
    ) -> Result<JobHandle> {
        let args = download_args(request, output_template, mode);
        let mut child = self
            .command(&args)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        tracing::debug!(
            binary = %self.binary_path.display(),
            pid = child.id(),
            url = request.url(),
            ?mode,
            "extraction process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("stderr was not captured".into()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let readers = [
            tokio::spawn(forward_lines(stdout, tx.clone(), JobSignal::Output)),
            tokio::spawn(forward_lines(stderr, tx.clone(), JobSignal::ErrorOutput)),
        ];

        tokio::spawn(supervise(
            child,
            readers,
            tx,
            cancel.clone(),
            timeout,
            self.drain_grace,
        ));

        Ok(JobHandle::from_parts(rx, cancel))
    }

    async fn resolve_urls(
        &self,
        request: &RetrievalRequest,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let args = resolve_args(request);
        let output = tokio::time::timeout(timeout, self.command(&args).output())
            .await
            .map_err(|_| Error::Timeout {
                seconds: timeout.as_secs(),
            })?
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExtractionFailed {
                code: output.status.code(),
                detail: diagnostic_summary(stderr.lines()),
            });
        }

        let urls: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if urls.is_empty() {
            return Err(Error::ExtractionFailed {
                code: output.status.code(),
                detail: "no URLs returned".to_string(),
            });
        }

        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn binary(&self) -> Option<&Path> {
        Some(&self.binary_path)
    }
}

/// Most useful line of a tool's diagnostic output
///
/// The last `ERROR:` line if there is one, otherwise the last non-empty line.
pub(crate) fn diagnostic_summary<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    let mut last = None;
    let mut last_error = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("ERROR:") {
            last_error = Some(line);
        }
        last = Some(line);
    }

    last_error
        .or(last)
        .unwrap_or("no diagnostic output")
        .to_string()
}

/// Read a pipe and forward each complete line as a signal
///
/// Bytes are decoded only up to the last complete UTF-8 sequence, so a
/// character split across reads is kept for the next read.
async fn forward_lines<R>(
    mut pipe: R,
    tx: mpsc::UnboundedSender<JobSignal>,
    wrap: fn(String) -> JobSignal,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = LineBuffer::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let read = match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                tracing::debug!(error = %e, "extraction output pipe closed with error");
                break;
            }
        };
        pending.extend_from_slice(&buf[..read]);

        let valid = match std::str::from_utf8(&pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
        pending.drain(..valid);

        for line in lines.push(&text) {
            if tx.send(wrap(line)).is_err() {
                return;
            }
        }
    }

    if !pending.is_empty() {
        lines.push(&String::from_utf8_lossy(&pending));
    }
    if let Some(line) = lines.finish() {
        let _ = tx.send(wrap(line));
    }
}

/// Wait for the process to end, then flush readers and send the exit signal
async fn supervise(
    mut child: Child,
    readers: [JoinHandle<()>; 2],
    tx: mpsc::UnboundedSender<JobSignal>,
    cancel: CancellationToken,
    timeout: Duration,
    drain_grace: Duration,
) {
    let group = child.id();

    let exit = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => JobExit::Exited(status.code()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to wait for extraction process");
                JobExit::Exited(None)
            }
        },
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "extraction process timed out, killing it");
            kill(&mut child, group).await;
            JobExit::TimedOut
        }
        _ = cancel.cancelled() => {
            tracing::debug!("extraction job cancelled, killing process");
            kill(&mut child, group).await;
            JobExit::Cancelled
        }
    };

    // Helpers left behind by a tool that exited on its own
    if let Some(pid) = group {
        kill_group(pid);
    }

    // Helpers spawned by the tool can hold the pipes open after it is gone.
    for mut reader in readers {
        if tokio::time::timeout(drain_grace, &mut reader).await.is_err() {
            tracing::debug!("output reader still busy after drain grace, aborting it");
            reader.abort();
        }
    }

    let _ = tx.send(JobSignal::Exit(exit));
}

/// Kill the tool's whole process group, then the tool itself, and reap it
async fn kill(child: &mut Child, group: Option<u32>) {
    if let Some(pid) = group {
        kill_group(pid);
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill extraction process");
    }
}

/// Send SIGKILL to every process in the group led by `pid`
///
/// An empty group is not an error.
#[cfg(unix)]
fn kill_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };

    // SAFETY: killpg only sends a signal and touches no memory; the group id
    // comes from a child spawned with process_group(0), so it names that
    // child's group and nothing else.
    let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if result != 0 {
        let e = std::io::Error::last_os_error();
        if e.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %e, "failed to kill extraction process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}
