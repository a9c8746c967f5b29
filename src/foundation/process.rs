use std::{
    io::Read,
    path::Path,
    process::{Command, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::Context as _;

use crate::foundation::error::LapseResult;

/// Whether `program` can be spawned from `PATH`.
///
/// Only spawnability is checked: some tools (older poppler builds) exit non-zero for their
/// version flag.
pub fn is_tool_on_path(program: &str, version_arg: &str) -> bool {
    Command::new(program)
        .arg(version_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

pub fn ensure_dir(path: &Path) -> LapseResult<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory '{}'", path.display()))?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> LapseResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Read a child pipe to the end on a separate thread so the child never blocks on a full pipe.
pub(crate) fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

pub(crate) fn join_drain(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// Like [`join_drain`], but gives up after `grace` and leaves the reader thread behind.
///
/// After a kill, a descendant that escaped the signal can hold the pipe open indefinitely.
pub(crate) fn join_drain_within(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    grace: Duration,
) -> Vec<u8> {
    let Some(handle) = handle else {
        return Vec::new();
    };
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::debug!("pipe still open after kill; abandoning its reader");
            return Vec::new();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    join_drain(Some(handle))
}

/// SIGKILL every process in the group led by `pid`, using the system `kill`.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: u32) {
    let result = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = result {
        tracing::debug!(pid, error = %e, "could not signal process group");
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_process_group(_pid: u32) {}

/// Last few lines of a process stream, for error messages.
pub(crate) fn tail_lossy(bytes: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
