// ABOUTME: HTTP request handlers for local images and registry search
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::containers_handlers::{acquire, json_body, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use dockyard_config::defaults::IMAGE_SEARCH_LIMIT;
use dockyard_provisioning::{available_images, find_image};
use dockyard_runtime::{ImageSearchResult, ImageSummary};

/// GET /images
pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<ImageSummary>>> {
    let lease = acquire(&state).await?;
    let images = lease
        .list_images()
        .await
        .map_err(|e| ApiError::runtime("Failed to list images", e))?;

    Ok(Json(images))
}

#[derive(Deserialize)]
pub struct PullImageRequest {
    #[serde(default)]
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct PullImageResponse {
    pub message: String,
    pub image: String,
}

/// POST /images/pull
pub async fn pull_image(
    State(state): State<AppState>,
    payload: Result<Json<PullImageRequest>, JsonRejection>,
) -> ApiResult<Json<PullImageResponse>> {
    let request = json_body(payload)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Image name is required".to_string()));
    }

    let image = match request.tag.as_deref().map(str::trim) {
        Some(tag) if !tag.is_empty() => format!("{}:{}", name, tag),
        _ => name.to_string(),
    };

    let lease = acquire(&state).await?;
    info!("Pulling image {}", image);
    lease
        .pull_image(&image)
        .await
        .map_err(|e| ApiError::runtime(format!("Failed to pull image {}", image), e))?;

    Ok(Json(PullImageResponse {
        message: format!("Image {} pulled successfully", image),
        image,
    }))
}

/// Forced removal by reference, falling back to a search of local images
///
/// DELETE /images/{id}
pub async fn delete_image(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let lease = acquire(&state).await?;

    match lease.remove_image(&ident, true).await {
        Ok(()) => {
            return Ok(Json(MessageResponse {
                message: format!("Image {} deleted", ident),
            }))
        }
        Err(e) if e.is_unreachable() => return Err(ApiError::runtime("Failed to delete image", e)),
        Err(e) => debug!("Direct removal of {} failed, searching: {}", ident, e),
    }

    let images = lease
        .list_images()
        .await
        .map_err(|e| ApiError::runtime("Failed to list images", e))?;

    let Some(image) = find_image(&images, &ident) else {
        return Err(ApiError::ImageNotFound {
            ident,
            available: available_images(&images),
        });
    };

    info!("Deleting image {} matched by {}", image.id, ident);
    lease
        .remove_image(&image.id, true)
        .await
        .map_err(|e| ApiError::runtime("Failed to delete image", e))?;

    Ok(Json(MessageResponse {
        message: format!("Image {} deleted", ident),
    }))
}

#[derive(Serialize)]
pub struct SearchImagesResponse {
    pub results: Vec<ImageSearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET /images/search/{term}
pub async fn search_images(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<Json<SearchImagesResponse>> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Search term is required".to_string()));
    }

    let lease = acquire(&state).await?;
    let results = lease
        .search_images(term, IMAGE_SEARCH_LIMIT)
        .await
        .map_err(|e| ApiError::runtime("Failed to search images", e))?;

    let message = results
        .is_empty()
        .then(|| "No images found".to_string());

    Ok(Json(SearchImagesResponse { results, message }))
}
