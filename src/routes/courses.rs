/**
 * Course Routes
 * Catalog CRUD: reads for any authenticated account, mutations admin-only
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::db::models::{Course, Lesson};
use crate::routes::auth::{authorize, ADMIN_ONLY, ANY_ROLE};
use crate::routes::{db_pool, internal_error, ApiError, SuccessResponse};

// ============================================================================
// Validation
// ============================================================================

/// Closed set of course levels
pub const VALID_LEVELS: &[&str] = &["Beginner", "Intermediate", "Advanced"];

/// Placeholder used when a course is created without an image URL
pub const DEFAULT_COURSE_IMAGE: &str = "https://via.placeholder.com/600x400";

fn is_valid_level(level: &str) -> bool {
    VALID_LEVELS.contains(&level)
}

fn validate_level(level: &str) -> Result<(), ApiError> {
    if !is_valid_level(level) {
        return Err(ApiError::validation(
            "Level must be Beginner, Intermediate, or Advanced",
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation("Price must be a non-negative number"));
    }
    Ok(())
}

/// Validate lesson shape and sanitize any embedded text content;
/// returns the cleaned lessons with ordering preserved.
fn validate_lessons(lessons: Vec<Lesson>) -> Result<Vec<Lesson>, ApiError> {
    lessons
        .into_iter()
        .map(|lesson| {
            if lesson.title.trim().is_empty() || lesson.video_url.trim().is_empty() {
                return Err(ApiError::validation(
                    "Lessons must include a title and videoUrl",
                ));
            }
            if lesson.duration <= 0 {
                return Err(ApiError::validation(
                    "Lesson duration must be a positive number of minutes",
                ));
            }
            Ok(Lesson {
                // Lesson text may be rendered into the storefront DOM;
                // strip anything ammonia considers unsafe on the way in.
                content: lesson.content.map(|c| ammonia::clean(&c)),
                ..lesson
            })
        })
        .collect()
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub instructor: String,
    pub level: String,
    pub duration: String,
    pub image: Option<String>,
    pub lessons: Option<Vec<Lesson>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub instructor: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub image: Option<String>,
    pub lessons: Option<Vec<Lesson>>,
}

/// Full course response (single-course reads and mutations)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub instructor: String,
    pub level: String,
    pub duration: String,
    pub image: String,
    pub syllabus: Vec<String>,
    pub lessons: Vec<Lesson>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course summary (list view): lessons collapsed to a syllabus of titles,
/// enrollment set excluded.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub instructor: String,
    pub level: String,
    pub duration: String,
    pub image: String,
    pub syllabus: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListResponse {
    pub courses: Vec<CourseSummary>,
    pub total: usize,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        let syllabus = course.lessons.0.iter().map(|l| l.title.clone()).collect();
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            instructor: course.instructor,
            level: course.level,
            duration: course.duration,
            image: course.image,
            syllabus,
            lessons: course.lessons.0,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

const COURSE_COLUMNS: &str = "id, title, description, price, instructor, level, duration, image, \
                              lessons, students_enrolled, created_at, updated_at";

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/courses - List the catalog (any authenticated role)
pub async fn list_courses(headers: HeaderMap) -> Result<Json<CourseListResponse>, ApiError> {
    authorize(&headers, ANY_ROLE)?;
    let pool = db_pool()?;

    let rows = sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses ORDER BY created_at DESC",
        COURSE_COLUMNS
    ))
    .fetch_all(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error listing courses", e))?;

    let courses: Vec<CourseSummary> = rows
        .into_iter()
        .map(|c| CourseSummary {
            id: c.id,
            title: c.title,
            description: c.description,
            price: c.price,
            instructor: c.instructor,
            level: c.level,
            duration: c.duration,
            image: c.image,
            syllabus: c.lessons.0.iter().map(|l| l.title.clone()).collect(),
        })
        .collect();

    let total = courses.len();
    Ok(Json(CourseListResponse { courses, total }))
}

/// GET /api/courses/{id} - Fetch a single course (any authenticated role)
pub async fn get_course(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseResponse>, ApiError> {
    authorize(&headers, ANY_ROLE)?;
    let pool = db_pool()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE id = $1",
        COURSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error fetching course", e))?
    .ok_or_else(|| ApiError::not_found("Course does not exist"))?;

    Ok(Json(course.into()))
}

/// POST /api/courses - Create a course (admin only)
pub async fn create_course(
    headers: HeaderMap,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    authorize(&headers, ADMIN_ONLY)?;

    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.instructor.trim().is_empty()
        || payload.duration.trim().is_empty()
    {
        return Err(ApiError::validation(
            "Title, description, instructor, level and duration are required",
        ));
    }
    validate_level(&payload.level)?;
    validate_price(payload.price)?;
    let lessons = validate_lessons(payload.lessons.unwrap_or_default())?;

    let pool = db_pool()?;

    let image = payload
        .image
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COURSE_IMAGE.to_string());

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"INSERT INTO courses
               (title, description, price, instructor, level, duration, image,
                lessons, students_enrolled, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{{}}', now(), now())
           RETURNING {}"#,
        COURSE_COLUMNS
    ))
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(payload.price)
    .bind(payload.instructor.trim())
    .bind(&payload.level)
    .bind(payload.duration.trim())
    .bind(&image)
    .bind(SqlJson(lessons))
    .fetch_one(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error creating course", e))?;

    tracing::info!("Course created: {} ({})", course.title, course.id);

    Ok((StatusCode::CREATED, Json(course.into())))
}

/// PUT /api/courses/{id} - Partial update of a course (admin only)
pub async fn update_course(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    authorize(&headers, ADMIN_ONLY)?;

    // Fields that are present get the same checks as on create.
    for (field, value) in [
        ("Title", &payload.title),
        ("Description", &payload.description),
        ("Instructor", &payload.instructor),
        ("Duration", &payload.duration),
    ] {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(ApiError::validation(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
    }
    if let Some(level) = &payload.level {
        validate_level(level)?;
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    let new_lessons = match payload.lessons {
        Some(lessons) => Some(validate_lessons(lessons)?),
        None => None,
    };

    let pool = db_pool()?;

    let existing = sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE id = $1",
        COURSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error fetching course", e))?
    .ok_or_else(|| ApiError::not_found("Course does not exist"))?;

    let title = payload
        .title
        .map(|t| t.trim().to_string())
        .unwrap_or(existing.title);
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let instructor = payload
        .instructor
        .map(|i| i.trim().to_string())
        .unwrap_or(existing.instructor);
    let level = payload.level.unwrap_or(existing.level);
    let duration = payload
        .duration
        .map(|d| d.trim().to_string())
        .unwrap_or(existing.duration);
    // An explicit blank image falls back to the placeholder, as on create.
    let image = payload
        .image
        .map(|i| {
            let i = i.trim().to_string();
            if i.is_empty() {
                DEFAULT_COURSE_IMAGE.to_string()
            } else {
                i
            }
        })
        .unwrap_or(existing.image);
    let lessons = new_lessons.unwrap_or(existing.lessons.0);

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"UPDATE courses
           SET title = $1, description = $2, price = $3, instructor = $4,
               level = $5, duration = $6, image = $7, lessons = $8, updated_at = now()
           WHERE id = $9
           RETURNING {}"#,
        COURSE_COLUMNS
    ))
    .bind(title.trim())
    .bind(description.trim())
    .bind(price)
    .bind(&instructor)
    .bind(&level)
    .bind(&duration)
    .bind(&image)
    .bind(SqlJson(lessons))
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error updating course", e))?;

    tracing::info!("Course updated: {}", course.id);

    Ok(Json(course.into()))
}

/// DELETE /api/courses/{id} - Remove a course (admin only)
pub async fn delete_course(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authorize(&headers, ADMIN_ONLY)?;
    let pool = db_pool()?;

    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
        .map_err(|e| internal_error("Database error deleting course", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Course does not exist"));
    }

    tracing::info!("Course deleted: {}", id);

    Ok(Json(SuccessResponse { success: true }))
}
