//! Fake extraction tool and orchestrator helpers
//!
//! The fake tool is a POSIX shell script run as `/bin/sh <script> <args>`.
//! It understands the arguments the crate passes to yt-dlp: `-o <template>`,
//! `--get-url` and `--audio-format <ext>`.

use media_relay::{Config, Quality, RetrievalOrchestrator, RetrievalRequest};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Argument parsing shared by every script
const PRELUDE: &str = r#"#!/bin/sh
out=""
resolve=0
ext=mp4
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    --get-url) resolve=1 ;;
    --audio-format) ext="$2"; shift ;;
  esac
  shift
done
base=$(printf '%s' "$out" | sed 's/\.%(ext)s$//')
"#;

/// Download that reports progress, merges and leaves the artifact behind
pub const DOWNLOAD_OK: &str = r#"
printf 'partial' > "$base.part"
echo "[youtube] abc: Downloading webpage"
echo "[download]  10.0% of 16.00B at 1.00KiB/s ETA 00:01"
echo "[download]  50.0% of 16.00B at 1.00KiB/s ETA 00:01"
echo "[download] 100.0% of 16.00B at 1.00KiB/s ETA 00:00"
echo "[Merger] Merging formats into \"$base.$ext\""
rm -f "$base.part"
printf 'fake media bytes' > "$base.$ext"
exit 0
"#;

/// Download that fails after writing a partial file
pub const DOWNLOAD_FAIL: &str = r#"
printf 'partial' > "$base.part"
echo "[download]   5.0% of 16.00B at 1.00KiB/s ETA 00:09"
echo "ERROR: [youtube] abc: Video unavailable" >&2
exit 1
"#;

/// Download that claims success without producing the artifact
pub const DOWNLOAD_NO_ARTIFACT: &str = r#"
echo "[download] 100.0% of 16.00B at 1.00KiB/s ETA 00:00"
exit 0
"#;

/// Download that never finishes on its own
pub const DOWNLOAD_HANG: &str = r#"
printf 'partial' > "$base.part"
echo "[download]   1.0% of 16.00B at 1.00KiB/s ETA 01:00"
exec sleep 30
"#;

/// Download that leaves a background helper writing under the stem, then hangs
///
/// Mirrors yt-dlp handing a merge to ffmpeg: the helper outlives a kill of the
/// tool alone.
pub const DOWNLOAD_HANG_WITH_HELPER: &str = r#"
printf 'partial' > "$base.part"
( sleep 2; printf 'merged' > "$base.temp.mp4" ) &
echo "[download]   1.0% of 16.00B at 1.00KiB/s ETA 01:00"
exec sleep 30
"#;

/// URL resolution that succeeds with two URLs
pub const RESOLVE_OK: &str = r#"
echo "https://cdn.example/video.mp4"
echo "https://cdn.example/audio.m4a"
exit 0
"#;

/// URL resolution that fails
pub const RESOLVE_FAIL: &str = r#"
echo "ERROR: Unsupported URL: https://example.com/nothing" >&2
exit 1
"#;

/// A fake tool plus the directories it works in
pub struct FakeTool {
    /// Keeps the script and the artifact directory alive
    pub dir: TempDir,
    /// The generated script
    pub script: PathBuf,
}

impl FakeTool {
    /// Write a script with the given download and resolve behavior
    pub fn new(download: &str, resolve: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-yt-dlp.sh");
        let body = format!(
            "{PRELUDE}if [ \"$resolve\" = 1 ]; then\n{resolve}\nfi\n{download}"
        );
        std::fs::write(&script, body).unwrap();
        Self { dir, script }
    }

    /// Where artifacts are written
    pub fn artifacts(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    /// Configuration that runs this script instead of yt-dlp
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.extractor.binary_path = Some(PathBuf::from("/bin/sh"));
        config.extractor.search_path = false;
        config.extractor.base_args = vec![self.script.to_string_lossy().into_owned()];
        config.extractor.direct_timeout = Duration::from_secs(10);
        config.extractor.progressive_timeout = Duration::from_secs(10);
        config.extractor.drain_grace = Duration::from_millis(500);
        config.storage.temp_dir = self.artifacts();
        config.jobs.shutdown_timeout = Duration::from_secs(5);
        config
    }

    /// Orchestrator over this script, after `configure` tweaks the config
    pub fn orchestrator(&self, configure: impl FnOnce(&mut Config)) -> RetrievalOrchestrator {
        let mut config = self.config();
        configure(&mut config);
        RetrievalOrchestrator::new(config).unwrap()
    }

    /// Files still present in the artifact directory
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        leftover_files(&self.artifacts())
    }
}

/// Files in `dir`, empty if the directory does not exist
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// A request for a video at 720p
pub fn video_request() -> RetrievalRequest {
    RetrievalRequest::new("https://www.youtube.com/watch?v=abc", Quality::Height(720), false)
        .unwrap()
}

/// A request for the audio track
pub fn audio_request() -> RetrievalRequest {
    RetrievalRequest::new("https://www.youtube.com/watch?v=abc", Quality::Best, true).unwrap()
}

/// Poll until the orchestrator reports no active jobs
pub async fn wait_for_idle(orchestrator: &RetrievalOrchestrator, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if orchestrator.active_jobs() == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
