/**
 * Admin Routes
 * Registration and login restricted to role=admin
 */
use axum::{extract::ConnectInfo, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::routes::auth::{
    authenticate, check_rate_limit, create_access_token, hash_password, is_valid_email, Role,
    MIN_PASSWORD_LEN,
};
use crate::routes::{db_pool, internal_error, is_unique_violation, ApiError};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Optional, but must be "admin" when present; this endpoint never
    /// creates student accounts.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthResponse {
    pub token: String,
    pub role: Role,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/register
/// Create an admin account and return a token for it
pub async fn register(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<AdminRegisterRequest>,
) -> Result<(StatusCode, Json<AdminAuthResponse>), ApiError> {
    check_rate_limit(&addr.ip().to_string()).await?;

    if payload.name.trim().is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Name, email, and password are required"));
    }
    if let Some(role) = &payload.role {
        if role != "admin" {
            return Err(ApiError::validation(
                "This endpoint is for admin registration only",
            ));
        }
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    let pool = db_pool()?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(&payload.email)
            .fetch_optional(pool.as_ref())
            .await
            .map_err(|e| internal_error("Database error checking existing account", e))?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email already in use"));
    }

    let password_hash = hash_password(payload.password).await?;
    let email = payload.email.to_lowercase();

    let (account_id,): (Uuid,) = sqlx::query_as(
        r#"INSERT INTO users (email, name, password_hash, role, created_at, updated_at)
           VALUES ($1, $2, $3, 'admin', now(), now())
           RETURNING id"#,
    )
    .bind(&email)
    .bind(payload.name.trim())
    .bind(&password_hash)
    .fetch_one(pool.as_ref())
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Email already in use")
        } else {
            internal_error("Failed to create admin account", e)
        }
    })?;

    let token = create_access_token(&account_id.to_string(), &email, Role::Admin)?;

    tracing::info!("Admin account registered: {}", email);

    Ok((
        StatusCode::CREATED,
        Json(AdminAuthResponse {
            token,
            role: Role::Admin,
        }),
    ))
}

/// POST /api/admin/login
/// Authenticate and reject any account whose role is not admin
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminAuthResponse>, ApiError> {
    check_rate_limit(&addr.ip().to_string()).await?;

    let (id, email, _name, role) = authenticate(&payload.email, &payload.password).await?;

    if role != Role::Admin {
        return Err(ApiError::forbidden("Access denied. Admins only."));
    }

    let token = create_access_token(&id.to_string(), &email, role)?;

    tracing::info!("Successful admin login: {}", email);

    Ok(Json(AdminAuthResponse { token, role }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn admin_router() -> Router {
        Router::new()
            .route("/api/admin/register", post(register))
            .route("/api/admin/login", post(login))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    async fn post_json(app: Router, uri: &str, json: &impl serde::Serialize) -> StatusCode {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_register_rejects_non_admin_role() {
        let status = post_json(
            admin_router(),
            "/api/admin/register",
            &AdminRegisterRequest {
                name: "Admin".to_string(),
                email: "admin@x.com".to_string(),
                password: "secret1".to_string(),
                role: Some("student".to_string()),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_missing_fields_returns_bad_request() {
        let status = post_json(
            admin_router(),
            "/api/admin/register",
            &AdminRegisterRequest {
                name: "".to_string(),
                email: "admin@x.com".to_string(),
                password: "secret1".to_string(),
                role: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_short_password_returns_bad_request() {
        let status = post_json(
            admin_router(),
            "/api/admin/register",
            &AdminRegisterRequest {
                name: "Admin".to_string(),
                email: "admin@x.com".to_string(),
                password: "a".repeat(MIN_PASSWORD_LEN - 1),
                role: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_empty_credentials_returns_bad_request() {
        let status = post_json(
            admin_router(),
            "/api/admin/login",
            &AdminLoginRequest {
                email: "".to_string(),
                password: "".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
