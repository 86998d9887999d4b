use crate::config::WaypostPaths;
use crate::database::models::PhotoRecord;
use crate::database::repositories::{PhotoRepository, PostRepository};
use crate::database::Database;
use anyhow::{anyhow, Context, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct PhotoService {
    database: Database,
    paths: WaypostPaths,
}

impl PhotoService {
    pub fn new(database: Database, paths: WaypostPaths) -> Self {
        Self { database, paths }
    }

    pub async fn save_photo(&self, input: SavePhotoInput) -> Result<PhotoView> {
        let kind = sniff_image(&input.data)?;

        if let Some(post_id) = &input.post_id {
            self.ensure_post_exists(post_id)?;
        }

        let photo_id = Uuid::new_v4().to_string();
        let stored_name = format!("{photo_id}.{}", kind.extension());
        let relative_path = format!("photos/{stored_name}");
        let absolute_path = self.paths.base.join(&relative_path);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create photo directory {}", parent.display())
            })?;
        }
        fs::write(&absolute_path, &input.data)
            .await
            .with_context(|| format!("failed to write photo to {}", absolute_path.display()))?;

        let mut hasher = Hasher::new();
        hasher.update(&input.data);
        let checksum = format!("blake3:{}", hasher.finalize().to_hex());

        let record = PhotoRecord {
            id: photo_id,
            post_id: input.post_id,
            path: relative_path,
            original_name: input.original_name.as_deref().map(sanitize_filename),
            mime: Some(kind.mime_type().to_string()),
            size_bytes: Some(input.data.len() as i64),
            checksum: Some(checksum),
        };

        self.database
            .with_repositories(|repos| repos.photos().attach(&record))?;

        Ok(PhotoView::from_record(record))
    }

    pub fn list_post_photos(&self, post_id: &str) -> Result<Vec<PhotoView>> {
        self.database.with_repositories(|repos| {
            let photos = repos.photos().list_for_post(post_id)?;
            Ok(photos.into_iter().map(PhotoView::from_record).collect())
        })
    }

    pub async fn prepare_download(&self, id: &str) -> Result<Option<PhotoDownload>> {
        let record = self
            .database
            .with_repositories(|repos| repos.photos().get(id))?;
        let Some(record) = record else {
            return Ok(None);
        };
        let absolute_path = self.paths.base.join(&record.path);
        if fs::metadata(&absolute_path).await.is_err() {
            tracing::warn!(path = %absolute_path.display(), "photo missing on disk");
            return Ok(None);
        }
        Ok(Some(PhotoDownload {
            metadata: PhotoView::from_record(record),
            absolute_path,
        }))
    }

    fn ensure_post_exists(&self, post_id: &str) -> Result<()> {
        self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Err(anyhow!("post not found"));
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct SavePhotoInput {
    pub post_id: Option<String>,
    pub original_name: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoView {
    pub id: String,
    pub post_id: Option<String>,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone)]
pub struct PhotoDownload {
    pub metadata: PhotoView,
    pub absolute_path: PathBuf,
}

impl PhotoView {
    pub(crate) fn from_record(record: PhotoRecord) -> Self {
        Self {
            download_url: format!("/photos/{}", record.id),
            id: record.id,
            post_id: record.post_id,
            original_name: record.original_name,
            mime: record.mime,
            size_bytes: record.size_bytes,
            checksum: record.checksum,
        }
    }
}

/// Checks upload bytes before any row is written, so a rejected photo
/// never leaves partial state behind. Trusts the bytes over the
/// declared content type.
pub fn sniff_image(data: &[u8]) -> Result<infer::Type> {
    if data.is_empty() {
        return Err(anyhow!("photo data may not be empty"));
    }
    let kind = infer::get(data)
        .ok_or_else(|| anyhow!("unrecognized file content, only images are accepted"))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(anyhow!("only image uploads are accepted"));
    }
    Ok(kind)
}

fn sanitize_filename(name: &str) -> String {
    std::path::Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
