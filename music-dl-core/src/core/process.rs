use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::core::progress::{ProgressExtractor, ProgressFn};
use crate::error::{CoreError, Result};
use crate::fs_paths::{AppPaths, DesktopPaths};

const READ_CHUNK: usize = 4096;
const STDERR_TAIL: usize = 2048;

fn enhanced_path() -> Option<String> {
    let bin_dir = DesktopPaths.bin_dir()?;
    let sep = if cfg!(windows) { ";" } else { ":" };
    let current = std::env::var("PATH").unwrap_or_default();
    Some(format!("{}{}{}", bin_dir.display(), sep, current))
}

pub fn command<S: AsRef<OsStr>>(program: S) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);
    if let Some(path) = enhanced_path() {
        cmd.env("PATH", path);
    }
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd.env("PYTHONUTF8", "1");
    cmd
}

pub fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string())
}

/// A process that ran to completion, whatever its exit status.
#[derive(Debug)]
pub struct Finished {
    pub command: String,
    pub status: ExitStatus,
    /// Last non-empty stderr line.
    pub stderr: String,
}

impl Finished {
    pub fn into_result(self) -> Result<()> {
        if self.status.success() {
            return Ok(());
        }
        Err(CoreError::ProcessFailure {
            command: self.command,
            code: self.status.code(),
            stderr: self.stderr,
        })
    }
}

/// Runs `program` to completion, feeding every output chunk from stdout and
/// stderr through `extractor` and reporting hits to `on_progress`.
///
/// The callback fires on the caller's task, in the order chunks were parsed.
/// Exit status 0 is success; anything else (including a spawn error) is a
/// [`CoreError::ProcessFailure`].
pub async fn run(
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
    extractor: Arc<dyn ProgressExtractor>,
    on_progress: &ProgressFn<'_>,
) -> Result<()> {
    run_to_exit(program, args, cwd, extractor, on_progress)
        .await?
        .into_result()
}

/// Like [`run`], but a non-zero exit is returned as a [`Finished`] for the
/// caller to classify. Only spawn and wait errors are `Err`.
pub async fn run_to_exit(
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
    extractor: Arc<dyn ProgressExtractor>,
    on_progress: &ProgressFn<'_>,
) -> Result<Finished> {
    let name = tool_name(program);
    tracing::debug!("running {} {:?}", name, args);

    let mut cmd = command(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| spawn_failure(&name, e))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<f64>();

    let stdout_reader = child
        .stdout
        .take()
        .map(|out| tokio::spawn(pump(out, extractor.clone(), tx.clone())));
    let stderr_reader = child
        .stderr
        .take()
        .map(|err| tokio::spawn(pump(err, extractor.clone(), tx.clone())));
    drop(tx);

    while let Some(pct) = rx.recv().await {
        on_progress(pct);
    }

    if let Some(reader) = stdout_reader {
        let _ = reader.await;
    }
    let stderr_tail = match stderr_reader {
        Some(reader) => reader.await.unwrap_or_default(),
        None => String::new(),
    };

    let status = child.wait().await.map_err(|e| {
        tracing::warn!("{} did not exit cleanly: {}", name, e);
        CoreError::process(&name, None)
    })?;

    if status.success() {
        tracing::debug!("{} finished", name);
    }

    Ok(Finished {
        command: name,
        status,
        stderr: last_line(&stderr_tail),
    })
}

/// Runs `program` and returns its stdout. Used for metadata, listing and
/// search calls whose output is parsed by the caller.
pub async fn capture(program: &Path, args: &[String]) -> Result<String> {
    let name = tool_name(program);
    tracing::debug!("capturing {} {:?}", name, args);

    let output = command(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| spawn_failure(&name, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoreError::ProcessFailure {
            command: name,
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn spawn_failure(name: &str, err: std::io::Error) -> CoreError {
    tracing::warn!("failed to start {}: {}", name, err);
    CoreError::ProcessFailure {
        command: name.to_string(),
        code: None,
        stderr: format!("failed to start: {}", err),
    }
}

async fn pump<R>(
    mut reader: R,
    extractor: Arc<dyn ProgressExtractor>,
    tx: mpsc::UnboundedSender<f64>,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    let mut tail: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        let chunk = String::from_utf8_lossy(&buf[..n]);
        if let Some(pct) = extractor.extract(&chunk) {
            let _ = tx.send(pct);
        }

        tail.extend_from_slice(&buf[..n]);
        if tail.len() > STDERR_TAIL {
            let excess = tail.len() - STDERR_TAIL;
            tail.drain(..excess);
        }
    }

    String::from_utf8_lossy(&tail).to_string()
}

fn last_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .unwrap_or("")
        .to_string()
}
