//! Post persistence
//!
//! Each persona owns a directory tree:
//!
//! ```text
//! <root>/<persona_id>/
//! ├── posts/<YYYYmmdd_HHMMSS>_<id8>.json
//! └── media/<YYYYmmdd_HHMMSS>_<id8>_<modality>.<ext>
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backend::Modality;
use crate::content::Post;
use crate::error::{Error, Result};

const POSTS_DIR: &str = "posts";
const MEDIA_DIR: &str = "media";

/// Where a persisted post ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPost {
    pub record_path: PathBuf,
    pub media: BTreeMap<Modality, PathBuf>,
}

/// Destination for assembled posts
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Place the post's media at final paths and write its record.
    async fn persist(&self, post: &Post) -> Result<PersistedPost>;
}

// ─────────────────────────────────────────────────────────────────
// File Store
// ─────────────────────────────────────────────────────────────────

/// Stores posts as JSON records plus media files for one persona.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted directly at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store for `persona_id` under the output root
    pub fn for_persona(root: &Path, persona_id: &str) -> Self {
        Self::new(root.join(persona_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.dir.join(POSTS_DIR)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.dir.join(MEDIA_DIR)
    }

    /// File stem shared by a post's record and media
    fn stem(post: &Post) -> String {
        format!("{}_{}", post.created_at().format("%Y%m%d_%H%M%S"), post.short_id())
    }

    async fn ensure_dir(path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| Error::persistence(path, e))
    }
}

/// Move a file, copying across filesystems when a rename is not possible.
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(from = %from.display(), error = %e, "Rename failed, copying instead");
            tokio::fs::copy(from, to).await?;
            if let Err(e) = tokio::fs::remove_file(from).await {
                warn!(path = %from.display(), error = %e, "Could not remove staged file");
            }
            Ok(())
        }
    }
}

/// Remove files left behind by a post that could not be stored.
async fn discard(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Discarded media"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not discard media"),
        }
    }
}

impl FileStore {
    /// Move staged media to final paths, recording each one in `placed` as it lands.
    async fn place_media(
        &self,
        post: &Post,
        stem: &str,
        placed: &mut BTreeMap<Modality, PathBuf>,
    ) -> Result<()> {
        let staged: Vec<(Modality, PathBuf)> =
            post.media().map(|(m, p)| (m, p.to_path_buf())).collect();
        if staged.is_empty() {
            return Ok(());
        }

        let media_dir = self.media_dir();
        Self::ensure_dir(&media_dir).await?;
        for (modality, from) in staged {
            let ext = from
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(modality.extension())
                .to_string();
            let to = media_dir.join(format!("{}_{}.{}", stem, modality, ext));
            move_file(&from, &to)
                .await
                .map_err(|e| Error::persistence(&to, e))?;
            placed.insert(modality, to);
        }
        Ok(())
    }

    async fn write_record(
        &self,
        post: &Post,
        stem: &str,
        media: &BTreeMap<Modality, PathBuf>,
    ) -> Result<PathBuf> {
        let posts_dir = self.posts_dir();
        Self::ensure_dir(&posts_dir).await?;
        let record_path = posts_dir.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(&post.to_record(media))?;
        tokio::fs::write(&record_path, json)
            .await
            .map_err(|e| Error::persistence(&record_path, e))?;
        Ok(record_path)
    }
}

#[async_trait]
impl PostStore for FileStore {
    /// On failure no media from the post is left behind, staged or moved.
    async fn persist(&self, post: &Post) -> Result<PersistedPost> {
        let stem = Self::stem(post);

        let mut media = BTreeMap::new();
        let written = match self.place_media(post, &stem, &mut media).await {
            Ok(()) => self.write_record(post, &stem, &media).await,
            Err(e) => Err(e),
        };
        let record_path = match written {
            Ok(path) => path,
            Err(e) => {
                let leftovers: Vec<PathBuf> = media
                    .into_values()
                    .chain(post.media().map(|(_, p)| p.to_path_buf()))
                    .collect();
                discard(&leftovers).await;
                return Err(e);
            }
        };

        debug!(
            post_id = %post.id(),
            record = %record_path.display(),
            media = media.len(),
            "Post persisted"
        );
        Ok(PersistedPost { record_path, media })
    }
}
