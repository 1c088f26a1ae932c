//! PlayRes prober: resolves a source video's native width/height by
//! shelling out to an external media-probing binary (ffprobe-compatible).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use lyricburn_core::Error;
use serde::Deserialize;
use tokio::process::Command;

const FALLBACK_WIDTH: u32 = 1920;
const FALLBACK_HEIGHT: u32 = 1080;

pub struct Prober {
    probe_bin: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

impl Prober {
    #[must_use]
    pub fn new(probe_bin: PathBuf) -> Self {
        Self { probe_bin }
    }

    /// Resolve `(width, height)` for `video_path`. Falls back to parsing
    /// the raw stdout for width/height tokens, then to a fixed default,
    /// rather than failing the whole burn over a probe quirk.
    #[tracing::instrument(skip(self), fields(video_path = %video_path.as_ref().display()))]
    pub async fn probe(&self, video_path: impl AsRef<Path>) -> (u32, u32) {
        match self.run_probe(video_path.as_ref()).await {
            Ok(Some(dims)) => dims,
            Ok(None) => {
                tracing::warn!("probe produced no stream dimensions, using fallback");
                (FALLBACK_WIDTH, FALLBACK_HEIGHT)
            }
            Err(error) => {
                tracing::warn!(%error, "probe invocation failed, using fallback");
                (FALLBACK_WIDTH, FALLBACK_HEIGHT)
            }
        }
    }

    async fn run_probe(&self, video_path: &Path) -> Result<Option<(u32, u32)>, Error> {
        let output = Command::new(&self.probe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(video_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Ok(parse_textual_dims(&String::from_utf8_lossy(&output.stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<ProbeOutput>(&stdout) {
            Ok(parsed) => {
                let dims = parsed
                    .streams
                    .into_iter()
                    .find_map(|stream| Some((stream.width?, stream.height?)));
                Ok(dims.or_else(|| parse_textual_dims(&stdout)))
            }
            Err(_) => Ok(parse_textual_dims(&stdout)),
        }
    }
}

/// Best-effort fallback: look for a `WIDTHxHEIGHT` token in free text.
fn parse_textual_dims(text: &str) -> Option<(u32, u32)> {
    text.split(|c: char| !c.is_ascii_digit() && c != 'x')
        .find_map(|token| {
            let (w, h) = token.split_once('x')?;
            Some((w.parse().ok()?, h.parse().ok()?))
        })
}
