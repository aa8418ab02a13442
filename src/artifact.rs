//! Temporary artifact storage
//!
//! Every job writes into the store's directory under a stem nobody else can
//! hold: wall-clock millis, a process-wide counter and a random suffix. The
//! tool may leave intermediates next to the final file (`.part`, `.ytdl`,
//! per-format `.f137.mp4`), so cleanup works on the stem, not a single path.

use crate::error::{Error, Result};
use crate::types::MediaKind;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Where one job's artifact will live
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPath {
    dir: PathBuf,
    stem: String,
    kind: MediaKind,
}

impl ArtifactPath {
    /// Unique stem, also used as the job id in logs
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Kind of artifact expected
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Output template handed to the extraction tool
    ///
    /// The tool substitutes `%(ext)s` with the extension it ends up writing.
    pub fn output_template(&self) -> PathBuf {
        self.dir.join(format!("{}.%(ext)s", self.stem))
    }

    /// Path of the finished artifact
    pub fn final_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.stem, self.kind.extension()))
    }

    /// Whether a directory entry belongs to this artifact
    fn owns(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.stem.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Temporary artifact store
///
/// Owns the naming scheme and the one-shot read-and-delete of finished files.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Make sure the directory exists
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Reserve a fresh, collision-free artifact location
    pub fn allocate(&self, kind: MediaKind) -> ArtifactPath {
        let millis = chrono::Utc::now().timestamp_millis();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let suffix: u32 = rand::thread_rng().r#gen();

        ArtifactPath {
            dir: self.dir.clone(),
            stem: format!("media_{}_{}_{:08x}", millis, sequence, suffix),
            kind,
        }
    }

    /// Whether a file exists at `path`
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Size of the file at `path`
    pub async fn size(&self, path: &Path) -> Result<u64> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read the whole artifact and delete it
    ///
    /// A missing file fails with [`Error::NotFound`] without touching the
    /// filesystem further. Once the bytes are in hand, a failed delete is only
    /// logged: the caller's data wins over tidy cleanup.
    pub async fn finalize(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(?path, error = %e, "failed to delete artifact after reading it");
        } else {
            debug!(?path, size = bytes.len(), "artifact served and deleted");
        }

        Ok(bytes)
    }

    /// Delete every file that belongs to an artifact, returning how many went
    pub async fn purge(&self, artifact: &ArtifactPath) -> usize {
        let mut entries = match tokio::fs::read_dir(&artifact.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = ?artifact.dir, error = %e, "failed to scan artifact directory");
                }
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = ?artifact.dir, error = %e, "failed to read artifact directory entry");
                    break;
                }
            };

            if !artifact.owns(&entry.file_name().to_string_lossy()) {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "failed to remove artifact file")
                }
            }
        }

        if removed > 0 {
            debug!(stem = artifact.stem(), removed, "purged artifact files");
        }
        removed
    }

    /// Blocking variant of [`purge`](Self::purge) for use in `Drop`
    pub fn purge_blocking(&self, artifact: &ArtifactPath) -> usize {
        let Ok(entries) = std::fs::read_dir(&artifact.dir) else {
            return 0;
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| artifact.owns(&entry.file_name().to_string_lossy()))
            .filter(|entry| match std::fs::remove_file(entry.path()) {
                Ok(()) => true,
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = ?entry.path(), error = %e, "failed to remove artifact file");
                    }
                    false
                }
            })
            .count()
    }
}
