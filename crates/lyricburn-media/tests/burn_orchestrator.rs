//! Exercises `Orchestrator::burn` against fake `ENCODER_BIN`/`PROBE_BIN`
//! shell scripts instead of a real ffmpeg/ffprobe binary, covering the
//! success, failure, timeout, and cancellation exit paths plus the
//! admission semaphore.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lyricburn_core::style::StyleDescriptor;
use lyricburn_media::{BurnRequest, Orchestrator, OrchestratorConfig, Prober};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn fake_probe(dir: &Path) -> Prober {
    let script = write_script(
        dir,
        "probe.sh",
        r#"echo '{"streams":[{"width":1920,"height":1080}]}'"#,
    );
    Prober::new(script)
}

fn orchestrator(dir: &Path, encoder: PathBuf, timeout: Duration, concurrency: usize) -> Orchestrator {
    Orchestrator::new(
        OrchestratorConfig {
            encoder_bin: encoder,
            fonts_dir: dir.join("fonts"),
            concurrency,
            timeout,
        },
        fake_probe(dir),
    )
}

fn empty_request<'a>(source: &'a Path, style: &'a StyleDescriptor) -> BurnRequest<'a> {
    BurnRequest {
        source_path: source,
        segments: &[],
        style,
    }
}

#[tokio::test]
async fn burn_returns_encoder_output_on_success() {
    let fixture = TempDir::new().unwrap();
    let encoder = write_script(
        fixture.path(),
        "encoder.sh",
        r#"for last; do true; done
printf 'fake-mp4-bytes' > "$last""#,
    );
    let orch = orchestrator(fixture.path(), encoder, Duration::from_secs(5), 2);
    let source = fixture.path().join("source.mp4");
    std::fs::write(&source, b"source").unwrap();
    let style = StyleDescriptor::default();

    let bytes = orch.burn(empty_request(&source, &style)).await.unwrap();
    assert_eq!(bytes, b"fake-mp4-bytes");
}

#[tokio::test]
async fn burn_surfaces_stderr_tail_on_nonzero_exit() {
    let fixture = TempDir::new().unwrap();
    let encoder = write_script(
        fixture.path(),
        "encoder.sh",
        r#"echo "boom: invalid filter graph" 1>&2
exit 1"#,
    );
    let orch = orchestrator(fixture.path(), encoder, Duration::from_secs(5), 2);
    let source = fixture.path().join("source.mp4");
    std::fs::write(&source, b"source").unwrap();
    let style = StyleDescriptor::default();

    let error = orch.burn(empty_request(&source, &style)).await.unwrap_err();
    match error {
        lyricburn_core::Error::RenderFailed { stderr_tail } => {
            assert!(stderr_tail.contains("boom: invalid filter graph"));
        }
        other => panic!("expected RenderFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn burn_times_out_when_encoder_hangs() {
    let fixture = TempDir::new().unwrap();
    let encoder = write_script(fixture.path(), "encoder.sh", "sleep 5");
    let orch = orchestrator(fixture.path(), encoder, Duration::from_millis(200), 2);
    let source = fixture.path().join("source.mp4");
    std::fs::write(&source, b"source").unwrap();
    let style = StyleDescriptor::default();

    let error = orch.burn(empty_request(&source, &style)).await.unwrap_err();
    assert!(matches!(error, lyricburn_core::Error::Timeout));
}

#[tokio::test]
async fn cancelling_burn_sends_sigterm_before_killing() {
    let fixture = TempDir::new().unwrap();
    // Traps SIGTERM and records it before exiting, rather than relying on
    // the default signal disposition (immediate death with no trace).
    let encoder = write_script(
        fixture.path(),
        "encoder.sh",
        r#"DIR="$(dirname "$0")"
trap 'echo terminated > "$DIR/terminated.marker"; exit 0' TERM
sleep 30"#,
    );
    let orch = std::sync::Arc::new(orchestrator(fixture.path(), encoder, Duration::from_secs(30), 2));
    let source = fixture.path().join("source.mp4");
    std::fs::write(&source, b"source").unwrap();

    let task_orch = orch.clone();
    let source_for_task = source.clone();
    let handle = tokio::spawn(async move {
        let style = StyleDescriptor::default();
        let _ = task_orch.burn(empty_request(&source_for_task, &style)).await;
    });

    // Give the encoder time to install its trap, then cancel mid-flight.
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort();
    let _ = handle.await;

    // The detached termination task runs SIGTERM asynchronously; give it
    // a moment to land before checking the marker the trap writes.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let marker = fixture.path().join("terminated.marker");
    assert!(marker.exists(), "encoder should have received SIGTERM, not just SIGKILL");
}

#[tokio::test]
async fn admission_semaphore_serializes_requests_at_concurrency_one() {
    let fixture = TempDir::new().unwrap();
    let encoder = write_script(
        fixture.path(),
        "encoder.sh",
        r#"DIR="$(dirname "$0")"
date +%s%N >> "$DIR/timeline"
sleep 0.3
date +%s%N >> "$DIR/timeline"
for last; do true; done
printf 'ok' > "$last""#,
    );
    let orch = orchestrator(fixture.path(), encoder, Duration::from_secs(5), 1);
    let source = fixture.path().join("source.mp4");
    std::fs::write(&source, b"source").unwrap();
    let style = StyleDescriptor::default();

    let (first, second) = tokio::join!(
        orch.burn(empty_request(&source, &style)),
        orch.burn(empty_request(&source, &style)),
    );
    first.unwrap();
    second.unwrap();

    let timeline = std::fs::read_to_string(fixture.path().join("timeline")).unwrap();
    let marks: Vec<u128> = timeline.lines().map(|l| l.trim().parse().unwrap()).collect();
    assert_eq!(marks.len(), 4);
    // Serialized: [start1, end1, start2, end2] — end of the first run
    // must precede the start of the second, never interleaved.
    assert!(marks[1] <= marks[2], "requests ran concurrently despite concurrency=1: {marks:?}");
}
