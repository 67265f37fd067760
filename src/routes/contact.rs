/**
 * Contact Routes
 * Messages are owned by the existing account matching the submitted email
 */
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::is_valid_email;
use crate::routes::{db_pool, internal_error, ApiError};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub message: String,
}

/// POST /api/contact
/// Store a contact message against the account registered under the
/// submitted email; senders without an account are told to register first.
pub async fn submit_message(
    Json(payload): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    if payload.name.trim().is_empty()
        || payload.email.is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(ApiError::validation("All fields are required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Invalid email format"));
    }

    let pool = db_pool()?;

    let account: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(&payload.email)
            .fetch_optional(pool.as_ref())
            .await
            .map_err(|e| internal_error("Database error resolving contact account", e))?;

    let (account_id,) = account
        .ok_or_else(|| ApiError::not_found("Account not found. Please register first."))?;

    sqlx::query(
        r#"INSERT INTO contact_messages (user_id, name, email, message, created_at)
           VALUES ($1, $2, $3, $4, now())"#,
    )
    .bind(account_id)
    .bind(payload.name.trim())
    .bind(&payload.email)
    .bind(payload.message.trim())
    .execute(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error storing contact message", e))?;

    tracing::info!("Contact message stored for account {}", account_id);

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            message: "Your message has been sent successfully.".to_string(),
        }),
    ))
}
