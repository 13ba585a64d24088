use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use model::schematic::{Snapshot, SnapshotMetadata};
use model::Snowflake;
use tokio::fs;
use tracing::{debug, warn};

use super::{parse_identifier, SnapshotListing, SnapshotStore};
use crate::error::StoreError;

/// A directory of `<source id>.json` documents.
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, source_id: Snowflake) -> PathBuf {
        self.dir.join(format!("{}.json", source_id))
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn list(&self) -> Result<Vec<SnapshotListing>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listings = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            // Only files that `load` can find again are listed
            let identifier = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if parse_identifier(stem).is_ok() => stem.to_owned(),
                _ => continue,
            };

            // A broken file should not hide the rest of the listing
            let raw = match fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot");
                    continue;
                }
            };

            match serde_json::from_slice::<SnapshotMetadata>(&raw) {
                Ok(metadata) => listings.push(SnapshotListing {
                    identifier,
                    exported_at: metadata.exported_at,
                    source_id: metadata.source_id,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot"),
            }
        }

        listings.sort_by(|a, b| b.exported_at.cmp(&a.exported_at));
        Ok(listings)
    }

    async fn load(&self, identifier: &str) -> Result<Snapshot, StoreError> {
        let path = self.path_of(parse_identifier(identifier)?);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(identifier.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            identifier: identifier.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<String, StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_of(snapshot.source_id);
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&path, json).await?;

        debug!(path = %path.display(), "Saved snapshot");
        Ok(snapshot.source_id.to_string())
    }
}
