pub mod auth;
pub mod cars;
pub mod extract;
pub mod health;
pub mod images;

use axum::extract::Multipart;

use crate::error::Result;
use crate::services::media_service::UploadedImage;

/// Collects the files sent under `field`, skipping every other part.
pub(crate) async fn files_named(mut multipart: Multipart, field: &str) -> Result<Vec<UploadedImage>> {
    let mut files = Vec::new();
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }
        let Some(file_name) = part.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = part.content_type().map(str::to_string);
        let data = part.bytes().await?;
        if file_name.is_empty() && data.is_empty() {
            continue;
        }
        files.push(UploadedImage {
            file_name,
            content_type,
            data,
        });
    }
    Ok(files)
}
