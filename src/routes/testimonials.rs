/**
 * Testimonial Routes
 * Public listing; creation and deletion are admin-curated
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Testimonial;
use crate::routes::auth::{authorize, ADMIN_ONLY};
use crate::routes::{db_pool, internal_error, ApiError, SuccessResponse};

/// Placeholder profile image for testimonials submitted without one
pub const DEFAULT_TESTIMONIAL_IMAGE: &str = "https://via.placeholder.com/50";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonialRequest {
    pub name: String,
    pub role: String,
    pub quote: String,
    pub image: Option<String>,
}

/// GET /api/testimonials - Public list of testimonials
pub async fn list_testimonials() -> Result<Json<Vec<Testimonial>>, ApiError> {
    let pool = db_pool()?;

    let testimonials = sqlx::query_as::<_, Testimonial>(
        "SELECT id, name, role, quote, image, created_at FROM testimonials ORDER BY created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error listing testimonials", e))?;

    Ok(Json(testimonials))
}

/// POST /api/testimonials - Add a testimonial (admin only)
pub async fn create_testimonial(
    headers: HeaderMap,
    Json(payload): Json<CreateTestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    authorize(&headers, ADMIN_ONLY)?;

    if payload.name.trim().is_empty()
        || payload.role.trim().is_empty()
        || payload.quote.trim().is_empty()
    {
        return Err(ApiError::validation("Name, role and quote are required"));
    }

    let pool = db_pool()?;

    let image = payload
        .image
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TESTIMONIAL_IMAGE.to_string());

    let testimonial = sqlx::query_as::<_, Testimonial>(
        r#"INSERT INTO testimonials (name, role, quote, image, created_at)
           VALUES ($1, $2, $3, $4, now())
           RETURNING id, name, role, quote, image, created_at"#,
    )
    .bind(payload.name.trim())
    .bind(payload.role.trim())
    .bind(payload.quote.trim())
    .bind(&image)
    .fetch_one(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error creating testimonial", e))?;

    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// DELETE /api/testimonials/{id} - Remove a testimonial (admin only)
pub async fn delete_testimonial(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&headers, ADMIN_ONLY)?;
    let pool = db_pool()?;

    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
        .map_err(|e| internal_error("Database error deleting testimonial", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Testimonial not found"));
    }

    Ok(Json(SuccessResponse { success: true }))
}
