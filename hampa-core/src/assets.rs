//! Image asset registry and asynchronous validation.
//!
//! Validation is fire-and-forget. Each request carries an id from
//! [`ImageRequests`]; only a result for the latest id may be shown.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors from validating an image.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Image key \"{0}\" is not registered")]
    UnknownKey(String),

    #[error("Image {key} not found at {path}: {source}")]
    Missing {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image {key} at {path} is not a file")]
    NotAFile { key: String, path: PathBuf },
}

/// Image keys mapped to file names relative to the asset directory.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The images the bundled story refers to.
    pub fn builtin() -> Self {
        Self::new()
            .with_entry("BANYU_ROOM_MORNING", "banyu_room_morning.jpg")
            .with_entry("BANYU_ROOM_STAY_IN_BED", "banyu_room_stay_in_bed.jpg")
            .with_entry("PHONE_SCREEN", "phone_screen.jpg")
            .with_entry("KITCHEN_MORNING", "kitchen_morning.jpg")
            .with_entry("RUANG_MAKAN", "ruang_makan.jpg")
            .with_entry("KAMPUS", "kampus.jpg")
            .with_entry("JEMBATAN_MALAM", "jembatan_malam.jpg")
            .with_entry("TERMINAL_BUS", "terminal_bus.jpg")
    }

    pub fn with_entry(mut self, key: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.entries.insert(key.into(), file.into());
        self
    }

    pub fn path(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Summary of a preload pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub total: usize,
    /// Keys that failed, sorted.
    pub failed: Vec<String>,
}

/// Checks that registered images exist on disk.
#[derive(Debug, Clone)]
pub struct AssetValidator {
    registry: Arc<AssetRegistry>,
    root: PathBuf,
}

impl AssetValidator {
    pub fn new(registry: AssetRegistry, root: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(registry),
            root: root.into(),
        }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` to an existing file.
    pub async fn validate(&self, key: &str) -> Result<PathBuf, AssetError> {
        let file = self.registry.path(key).ok_or_else(|| {
            tracing::warn!(key, "Image key not registered");
            AssetError::UnknownKey(key.to_string())
        })?;
        let path = self.root.join(file);

        let metadata = tokio::fs::metadata(&path).await.map_err(|source| {
            tracing::error!(key, path = %path.display(), "Failed to load image");
            AssetError::Missing {
                key: key.to_string(),
                path: path.clone(),
                source,
            }
        })?;

        if !metadata.is_file() {
            return Err(AssetError::NotAFile {
                key: key.to_string(),
                path,
            });
        }

        tracing::debug!(key, path = %path.display(), "Image validated");
        Ok(path)
    }

    /// Validate every registered image concurrently.
    pub async fn preload_all(&self) -> PreloadReport {
        let keys: Vec<&str> = self.registry.keys().collect();
        let results = join_all(keys.iter().map(|key| self.validate(key))).await;

        let failed: Vec<String> = keys
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.is_err())
            .map(|(key, _)| key.to_string())
            .collect();

        let report = PreloadReport {
            loaded: keys.len() - failed.len(),
            total: keys.len(),
            failed,
        };
        tracing::info!(
            loaded = report.loaded,
            total = report.total,
            "Image preload complete"
        );
        report
    }
}

// ============================================================================
// Request Tracking
// ============================================================================

/// Result of one validation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCheck {
    pub request_id: u64,
    pub key: String,
    /// Resolved file, or `None` if validation failed.
    pub path: Option<PathBuf>,
}

impl ImageCheck {
    pub fn is_ok(&self) -> bool {
        self.path.is_some()
    }
}

/// Monotonic request ids for image validation.
#[derive(Debug, Default)]
pub struct ImageRequests {
    latest: AtomicU64,
}

impl ImageRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id, superseding every earlier one.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    pub fn is_latest(&self, request_id: u64) -> bool {
        request_id == self.latest()
    }

    /// Pass `check` through only if it answers the latest request.
    pub fn accept(&self, check: ImageCheck) -> Option<ImageCheck> {
        if self.is_latest(check.request_id) {
            Some(check)
        } else {
            tracing::debug!(
                request_id = check.request_id,
                latest = self.latest(),
                key = %check.key,
                "Dropping stale image check"
            );
            None
        }
    }
}

/// Validate `key` in the background and send the result to `tx`.
pub fn spawn_validation(
    validator: AssetValidator,
    request_id: u64,
    key: impl Into<String>,
    tx: mpsc::UnboundedSender<ImageCheck>,
) -> JoinHandle<()> {
    let key = key.into();
    tokio::spawn(async move {
        let path = validator.validate(&key).await.ok();
        // The receiver may be gone if the UI has shut down.
        let _ = tx.send(ImageCheck {
            request_id,
            key,
            path,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn validator_with(files: &[&str]) -> (TempDir, AssetValidator) {
        let dir = TempDir::new().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"jpg").unwrap();
        }
        let validator = AssetValidator::new(AssetRegistry::builtin(), dir.path());
        (dir, validator)
    }

    #[test]
    fn test_builtin_registry() {
        let registry = AssetRegistry::builtin();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.path("KAMPUS"), Some(Path::new("kampus.jpg")));
        assert!(!registry.contains("MISSING"));
    }

    #[test]
    fn test_builtin_registry_covers_story_images() {
        let registry = AssetRegistry::builtin();
        let story = crate::story::StoryGraph::builtin().unwrap();
        for key in story.image_keys() {
            assert!(registry.contains(key), "unregistered image {key}");
        }
    }

    #[tokio::test]
    async fn test_validate_existing_and_missing() {
        let (_dir, validator) = validator_with(&["kampus.jpg"]);

        let path = validator.validate("KAMPUS").await.unwrap();
        assert!(path.ends_with("kampus.jpg"));

        assert!(matches!(
            validator.validate("PHONE_SCREEN").await,
            Err(AssetError::Missing { .. })
        ));
        assert!(matches!(
            validator.validate("NOPE").await,
            Err(AssetError::UnknownKey(_))
        ));
    }

    #[tokio::test]
    async fn test_preload_reports_counts() {
        let (_dir, validator) = validator_with(&["kampus.jpg", "terminal_bus.jpg"]);
        let report = validator.preload_all().await;

        assert_eq!(report.loaded, 2);
        assert_eq!(report.total, 8);
        assert_eq!(report.failed.len(), 6);
        assert!(report.failed.contains(&"PHONE_SCREEN".to_string()));
    }

    #[test]
    fn test_requests_drop_stale_results() {
        let requests = ImageRequests::new();
        let first = requests.issue();
        let second = requests.issue();
        assert!(second > first);

        let stale = ImageCheck {
            request_id: first,
            key: "KAMPUS".to_string(),
            path: None,
        };
        let fresh = ImageCheck {
            request_id: second,
            key: "KITCHEN_MORNING".to_string(),
            path: Some(PathBuf::from("kitchen_morning.jpg")),
        };

        assert_eq!(requests.accept(stale), None);
        assert_eq!(requests.accept(fresh.clone()), Some(fresh));
    }

    #[tokio::test]
    async fn test_spawned_validation_reports_through_channel() {
        let (_dir, validator) = validator_with(&["kampus.jpg"]);
        let requests = ImageRequests::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let old = requests.issue();
        spawn_validation(validator.clone(), old, "KAMPUS", tx.clone());
        let new = requests.issue();
        spawn_validation(validator, new, "PHONE_SCREEN", tx);

        let mut accepted = Vec::new();
        while let Some(check) = rx.recv().await {
            if let Some(check) = requests.accept(check) {
                accepted.push(check);
            }
        }

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].key, "PHONE_SCREEN");
        assert!(!accepted[0].is_ok());
    }
}
