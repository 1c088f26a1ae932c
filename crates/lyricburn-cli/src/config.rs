//! Process-wide configuration, read once at startup from the environment.

use std::path::PathBuf;
use std::time::Duration;

pub struct Environment {
    pub database_url: String,
    pub data_root: PathBuf,
    pub fonts_dir: PathBuf,
    pub encoder_bin: PathBuf,
    pub probe_bin: PathBuf,
    pub burn_concurrency: usize,
    pub burn_timeout: Duration,
}

impl Environment {
    /// Read configuration from the process environment, applying the
    /// documented defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_root = env_path("DATA_ROOT", PathBuf::from("./data"));
        let fonts_dir = std::env::var("FONTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_root.join("fonts"));

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| data_root.join("lyricburn.db").display().to_string()),
            fonts_dir,
            data_root,
            encoder_bin: env_path("ENCODER_BIN", PathBuf::from("ffmpeg")),
            probe_bin: env_path("PROBE_BIN", PathBuf::from("ffprobe")),
            burn_concurrency: env_usize("BURN_CONCURRENCY", 2),
            burn_timeout: Duration::from_secs(env_usize("BURN_TIMEOUT_S", 180) as u64),
        })
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fonts_dir_defaults_under_data_root() {
        // SAFETY: test runs single-threaded w.r.t. this env var; no other
        // test in this process reads DATA_ROOT/FONTS_DIR.
        std::env::remove_var("FONTS_DIR");
        std::env::set_var("DATA_ROOT", "/tmp/lyricburn-test-data");
        let env = Environment::from_env().unwrap();
        assert_eq!(env.fonts_dir, PathBuf::from("/tmp/lyricburn-test-data/fonts"));
        std::env::remove_var("DATA_ROOT");
    }
}
