use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Uploads one image under `folder` and returns its public URL.
pub async fn store_image(
    storage: &dyn StorageClient,
    folder: &str,
    img: UploadItem,
) -> anyhow::Result<String> {
    anyhow::ensure!(!img.body.is_empty(), "empty image upload");

    let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
    let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let key = format!("{}/{}-{}.{}", folder, stamp, Uuid::new_v4(), ext);
    storage
        .put_object(&key, img.body, &img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    debug!(%key, "image stored");
    Ok(storage.public_url(&key))
}

/// Deletes the object behind `url`. URLs that do not belong to our bucket are
/// skipped with a warning.
pub async fn delete_image(storage: &dyn StorageClient, url: &str) -> anyhow::Result<()> {
    let Some(key) = storage.key_from_url(url) else {
        warn!(%url, "image url is not ours; skipping delete");
        return Ok(());
    };
    storage
        .delete_object(&key)
        .await
        .with_context(|| format!("delete_object {}", key))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}
