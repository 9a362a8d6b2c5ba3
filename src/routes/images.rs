use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
};

use crate::{dto::car_dto::ImageUploadResponse, error::Result, routes::files_named, AppState};

#[utoipa::path(
    post,
    path = "/api/images/upload",
    responses(
        (status = 200, description = "Images stored", body = Json<ImageUploadResponse>),
        (status = 400, description = "No images, too many, or not an image")
    )
)]
#[axum::debug_handler]
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let files = files_named(multipart, "images").await?;
    let image_urls = state.car_service.upload_images(files).await?;
    tracing::info!(count = image_urls.len(), "Uploaded listing images");
    Ok(Json(ImageUploadResponse {
        success: true,
        message: "Images uploaded successfully".to_string(),
        image_urls,
    }))
}
