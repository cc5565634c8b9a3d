//! Object URLs backed by temporary files
//!
//! Each blob is written to its own file under a private scratch directory
//! and exposed as a `file://` URL. Revoking deletes the file; dropping the
//! store removes the directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::application::ports::{ObjectUrl, ObjectUrlError, ObjectUrlStore};
use crate::domain::recording::AudioBlob;

const SCHEME: &str = "file://";

const DIR_PREFIX: &str = "voicenote-";

/// Strip the `file://` scheme, if present
pub fn path_from_url(url: &str) -> Option<&Path> {
    url.strip_prefix(SCHEME).map(Path::new)
}

pub struct TempFileUrlStore {
    dir: TempDir,
    next: AtomicU64,
    live: Mutex<HashSet<PathBuf>>,
}

impl TempFileUrlStore {
    /// Store in a fresh, owner-only directory under the system temp dir
    pub fn new() -> Result<Self, ObjectUrlError> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir()
            .map_err(|e| ObjectUrlError(e.to_string()))?;
        Ok(Self::with_dir(dir))
    }

    /// Store in a fresh directory created inside `parent`
    pub fn in_dir(parent: impl AsRef<Path>) -> Result<Self, ObjectUrlError> {
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| ObjectUrlError(e.to_string()))?;
        Ok(Self::with_dir(dir))
    }

    fn with_dir(dir: TempDir) -> Self {
        debug!(dir = %dir.path().display(), "Blob directory created");
        Self {
            dir,
            next: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Number of URLs created and not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

impl ObjectUrlStore for TempFileUrlStore {
    fn create(&self, blob: &AudioBlob) -> Result<ObjectUrl, ObjectUrlError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        let path = self
            .dir()
            .join(format!("blob-{id}.{}", blob.mime_type().extension()));
        fs::write(&path, blob.data()).map_err(|e| ObjectUrlError(e.to_string()))?;

        if let Ok(mut live) = self.live.lock() {
            live.insert(path.clone());
        }
        debug!(path = %path.display(), size = blob.size_bytes(), "Object URL created");
        Ok(ObjectUrl::new(format!("{SCHEME}{}", path.display())))
    }

    fn revoke(&self, url: &ObjectUrl) {
        let Some(path) = path_from_url(url.as_str()) else {
            return;
        };
        let known = self
            .live
            .lock()
            .map(|mut live| live.remove(path))
            .unwrap_or(false);
        if !known {
            return;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!(error = %e, path = %path.display(), "Failed to remove blob file");
        }
    }
}
