//! Burn orchestrator: writes the ASS document for a request, invokes the
//! external encoder in a scoped scratch directory, and guarantees cleanup
//! on every exit path, including cancellation and timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use lyricburn_core::{builder, segment::Segment, style::StyleDescriptor, Error};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;

use crate::prober::Prober;

const STDERR_TAIL_CAP: usize = 64 * 1024;
const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);

pub struct OrchestratorConfig {
    pub encoder_bin: PathBuf,
    pub fonts_dir: PathBuf,
    pub concurrency: usize,
    pub timeout: Duration,
}

pub struct Orchestrator {
    encoder_bin: PathBuf,
    fonts_dir: PathBuf,
    prober: Prober,
    admission: Arc<Semaphore>,
    timeout: Duration,
}

pub struct BurnRequest<'a> {
    pub source_path: &'a Path,
    pub segments: &'a [Segment],
    pub style: &'a StyleDescriptor,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: OrchestratorConfig, prober: Prober) -> Self {
        Self {
            encoder_bin: config.encoder_bin,
            fonts_dir: config.fonts_dir,
            prober,
            admission: Arc::new(Semaphore::new(config.concurrency.max(1))),
            timeout: config.timeout,
        }
    }

    /// Render the burned MP4 for `request`, returning its bytes. The
    /// scratch directory and any still-running encoder process are
    /// cleaned up on every return path, including the caller dropping
    /// this future mid-flight.
    #[tracing::instrument(skip(self, request), fields(source = %request.source_path.display()))]
    pub async fn burn(&self, request: BurnRequest<'_>) -> Result<Vec<u8>, Error> {
        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|_| Error::Cancelled)?;

        let workdir = TempDir::new()?;
        let (play_res_x, play_res_y) = self.prober.probe(request.source_path).await;

        let document = builder::build_document(request.segments, request.style, play_res_x, play_res_y)?;
        let subs_path = workdir.path().join("subs.ass");
        tokio::fs::write(&subs_path, document).await?;

        let out_path = workdir.path().join("out.mp4");
        let child = self.spawn_encoder(request.source_path, &subs_path, &out_path)?;
        let mut guard = ChildGuard::new(child);

        let result = tokio::time::timeout(self.timeout, wait_with_stderr_tail(guard.child_mut())).await;

        match result {
            Err(_elapsed) => {
                terminate_gracefully(guard.child_mut()).await;
                Err(Error::Timeout)
            }
            Ok(Err(io_error)) => Err(Error::from(io_error)),
            Ok(Ok((status, stderr_tail))) => {
                if !status.success() {
                    return Err(Error::render_failed(stderr_tail));
                }
                tokio::fs::read(&out_path).await.map_err(Error::from)
            }
        }
        // `workdir` drops here regardless of which branch returned, removing
        // the scratch directory unconditionally.
    }

    fn spawn_encoder(&self, source: &Path, subs_path: &Path, out_path: &Path) -> Result<Child, Error> {
        let filter = format!(
            "subtitles={}:fontsdir={}",
            shell_escape(subs_path),
            shell_escape(&self.fonts_dir),
        );
        Command::new(&self.encoder_bin)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-vf", &filter])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-c:v", "libx264", "-crf", "18", "-preset", "medium"])
            .args(["-c:a", "copy"])
            .args(["-movflags", "+faststart"])
            .arg(out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::from)
    }
}

fn shell_escape(path: &Path) -> String {
    path.display().to_string().replace(':', r"\:")
}

async fn wait_with_stderr_tail(child: &mut Child) -> std::io::Result<(std::process::ExitStatus, String)> {
    let mut stderr = child.stderr.take();
    let mut buf = Vec::new();
    if let Some(pipe) = stderr.as_mut() {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    let status = child.wait().await?;
    let tail_start = buf.len().saturating_sub(STDERR_TAIL_CAP);
    Ok((status, String::from_utf8_lossy(&buf[tail_start..]).into_owned()))
}

/// SIGTERM now, SIGKILL after the grace period if it hasn't exited.
async fn terminate_gracefully(child: &mut Child) {
    if let Some(pid) = child.id() {
        // Safety: pid is the live child's own pid, owned by this call's caller.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
    let exited = tokio::time::timeout(KILL_GRACE_PERIOD, child.wait()).await;
    if exited.is_err() {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

/// Ensures the child process is not left running when this orchestrator
/// call ends, whatever the reason. On an ordinary return the child has
/// already exited and this is a no-op; on cancellation (the `burn()`
/// future dropped mid-flight) it hands the still-running child to a
/// detached task that runs the same graceful SIGTERM-then-SIGKILL
/// sequence the timeout path uses, rather than killing it outright.
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn child_mut(&mut self) -> &mut Child {
        self.child.as_mut().expect("child present for guard lifetime")
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else { return };
        if !matches!(child.try_wait(), Ok(None)) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { terminate_gracefully(&mut child).await });
            }
            Err(_) => {
                let _ = child.start_kill();
            }
        }
    }
}
