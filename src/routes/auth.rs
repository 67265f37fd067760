/**
 * Authentication Routes
 * JWT issuance/verification, the role gate, and account endpoints
 */
use axum::{
    extract::{ConnectInfo, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::routes::{db_pool, internal_error, is_unique_violation, ApiError, SuccessResponse};

// ============================================================================
// Configuration
// ============================================================================

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

lazy_static::lazy_static! {
    /// Signing keys derived from JWT_SECRET. There is deliberately no
    /// fallback value: `run()` refuses to start when the secret is absent,
    /// and token operations reached without it fail as a config error.
    static ref JWT_KEYS: Option<JwtKeys> = std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| JwtKeys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });

    /// Valid email shape: one @, no whitespace, dotted domain
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Rate limit storage (IP -> last request timestamp)
    pub static ref RATE_LIMIT: Arc<RwLock<HashMap<String, i64>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Access token expiry in minutes
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 60;

/// Minimum accepted password length
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// Rate limit window in seconds (1 request per IP per window for auth endpoints)
#[allow(dead_code)]
const RATE_LIMIT_WINDOW_SECS: i64 = 60;

// ============================================================================
// Roles and claims
// ============================================================================

/// Closed set of account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Any authenticated account
pub const ANY_ROLE: &[Role] = &[Role::Student, Role::Admin];

/// Administrators only
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,  // Account ID
    pub email: String,
    pub role: Role,
    pub exp: i64, // Expiry timestamp
    pub iat: i64, // Issued at timestamp
}

/// Why a presented token was rejected. `Expired` is kept distinct so
/// clients can prompt a re-login instead of treating the credential as junk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
    /// No signing secret configured; startup normally refuses this state.
    MissingSecret,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::BadSignature => write!(f, "bad token signature"),
            TokenError::Expired => write!(f, "expired token"),
            TokenError::MissingSecret => write!(f, "token signing secret not configured"),
        }
    }
}

// ============================================================================
// Token issuer / verifier
// ============================================================================

/// Mint a signed access token binding {account id, email, role},
/// expiring one hour after issuance.
pub fn create_access_token(account_id: &str, email: &str, role: Role) -> Result<String, ApiError> {
    let keys = JWT_KEYS.as_ref().ok_or_else(|| {
        tracing::error!("JWT_SECRET is not configured; refusing to issue a token");
        ApiError::Internal
    })?;

    let now = Utc::now();
    let exp = now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES);

    let claims = Claims {
        sub: account_id.to_string(),
        email: email.to_string(),
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| internal_error("Failed to sign access token", e))
}

/// Verify and decode an access token. Pure: signature + expiry check only,
/// no storage lookups.
pub fn verify_access_token(token: &str) -> Result<Claims, TokenError> {
    let keys = JWT_KEYS.as_ref().ok_or(TokenError::MissingSecret)?;

    // No clock-skew leeway: a token past its expiry is rejected immediately.
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        })
}

// ============================================================================
// Role gate
// ============================================================================

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Admit the request only when a valid token is present and its embedded
/// role is in `allowed`. Role is read from the token, not re-fetched from
/// the store, so a role change takes effect only once the old token expires
/// (at most one hour).
pub fn authorize(headers: &HeaderMap, allowed: &[Role]) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| ApiError::unauthenticated("Authorization required"))?;

    let claims = verify_access_token(&token).map_err(|e| match e {
        TokenError::Expired => ApiError::unauthenticated("Token expired. Please log in again."),
        TokenError::MissingSecret => {
            tracing::error!("JWT_SECRET is not configured; cannot verify tokens");
            ApiError::Internal
        }
        _ => ApiError::unauthenticated("Invalid token"),
    })?;

    if !allowed.contains(&claims.role) {
        return Err(ApiError::forbidden("Access denied. Insufficient role."));
    }

    Ok(claims)
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Hash a password off the async executor; bcrypt is intentionally CPU-bound.
pub(crate) async fn hash_password(password: String) -> Result<String, ApiError> {
    match tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST)).await {
        Ok(Ok(hashed)) => Ok(hashed),
        Ok(Err(e)) => Err(internal_error("Failed to hash password", e)),
        Err(e) => Err(internal_error("spawn_blocking panic during hash", e)),
    }
}

/// Compare a candidate password against a stored bcrypt hash off the executor.
pub(crate) async fn verify_password(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Check rate limit for an IP.
///
/// Also removes stale entries from the map on every write so the HashMap
/// does not grow without bound as unique IPs accumulate over time.
pub(crate) async fn check_rate_limit(ip: &str) -> Result<(), ApiError> {
    #[cfg(test)]
    {
        let _ = ip;
        Ok(()) // Bypass in tests so validation and credentials are exercised
    }

    #[cfg(not(test))]
    {
        let now = Utc::now().timestamp();
        let mut limits = RATE_LIMIT.write().await;

        // Evict all entries whose window has already expired.
        // This keeps memory proportional to the number of *active* IPs rather
        // than the total number of unique IPs seen since startup.
        limits.retain(|_, last| now - *last < RATE_LIMIT_WINDOW_SECS);

        if let Some(last_request) = limits.get(ip) {
            if now - last_request < RATE_LIMIT_WINDOW_SECS {
                return Err(ApiError::TooManyRequests(
                    "Too many requests. Please try again later.".to_string(),
                ));
            }
        }

        limits.insert(ip.to_string(), now);
        Ok(())
    }
}

/// Shared credential check used by user and admin login. Returns the
/// account's (id, email, name, role) on success.
pub(crate) async fn authenticate(
    email: &str,
    password: &str,
) -> Result<(Uuid, String, String, Role), ApiError> {
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }
    if !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email format"));
    }

    let pool = db_pool()?;

    let row = sqlx::query_as::<_, (Uuid, String, String, String, String)>(
        r#"SELECT id, email, name, password_hash, role
           FROM users
           WHERE LOWER(email) = LOWER($1)"#,
    )
    .bind(email)
    .fetch_optional(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error during login", e))?;

    let (id, email, name, password_hash, role) = row.ok_or_else(|| {
        tracing::warn!("Login attempt for unknown account");
        ApiError::unauthenticated("Invalid credentials")
    })?;

    if !verify_password(password.to_string(), password_hash).await {
        tracing::warn!("Failed login attempt for: {}", email);
        return Err(ApiError::unauthenticated("Invalid credentials"));
    }

    let role: Role = role
        .parse()
        .map_err(|_| internal_error("Stored role outside the closed set", &role))?;

    Ok((id, email, name, role))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Account info returned to the storefront
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
/// Register a new student account
pub async fn signup(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    check_rate_limit(&addr.ip().to_string()).await?;

    if payload.email.is_empty() || payload.name.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email, name and password are required"));
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
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = hash_password(payload.password).await?;
    let email = payload.email.to_lowercase();

    let (account_id,): (Uuid,) = sqlx::query_as(
        r#"INSERT INTO users (email, name, password_hash, role, created_at, updated_at)
           VALUES ($1, $2, $3, 'student', now(), now())
           RETURNING id"#,
    )
    .bind(&email)
    .bind(payload.name.trim())
    .bind(&password_hash)
    .fetch_one(pool.as_ref())
    .await
    .map_err(|e| {
        // Two signups can race the pre-check; the unique key settles it.
        if is_unique_violation(&e) {
            ApiError::conflict("Email already registered")
        } else {
            internal_error("Failed to create account", e)
        }
    })?;

    tracing::info!("Account registered: {}", email);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            account_id,
            email,
            name: payload.name.trim().to_string(),
        }),
    ))
}

/// POST /api/auth/login
/// Authenticate an account and return a one-hour access token
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    check_rate_limit(&addr.ip().to_string()).await?;

    let (id, email, name, role) = authenticate(&payload.email, &payload.password).await?;
    let token = create_access_token(&id.to_string(), &email, role)?;

    tracing::info!("Successful login for account: {}", email);

    Ok(Json(LoginResponse {
        token,
        role,
        user: UserInfo {
            account_id: id,
            email,
            name,
            role,
        },
    }))
}

/// GET /api/users/profile
/// Return the authenticated account's details from the store
pub async fn profile(headers: HeaderMap) -> Result<Json<ProfileResponse>, ApiError> {
    let claims = authorize(&headers, ANY_ROLE)?;
    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthenticated("Invalid token"))?;

    let pool = db_pool()?;

    let row = sqlx::query_as::<_, (Uuid, String, String, String, DateTime<Utc>)>(
        "SELECT id, email, name, role, created_at FROM users WHERE id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool.as_ref())
    .await
    .map_err(|e| internal_error("Database error fetching profile", e))?;

    let (id, email, name, role, created_at) =
        row.ok_or_else(|| ApiError::not_found("Account not found"))?;
    let role: Role = role
        .parse()
        .map_err(|_| internal_error("Stored role outside the closed set", &role))?;

    Ok(Json(ProfileResponse {
        account_id: id,
        email,
        name,
        role,
        created_at,
    }))
}

/// PATCH /api/users/profile
/// Update the authenticated account's display name and/or password
pub async fn update_profile(
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let claims = authorize(&headers, ANY_ROLE)?;
    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthenticated("Invalid token"))?;

    if payload.name.is_none() && payload.password.is_none() {
        return Err(ApiError::validation("Nothing to update"));
    }
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Name must not be empty"));
        }
    }
    if let Some(password) = &payload.password {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
    }

    let pool = db_pool()?;

    let existing = sqlx::query_as::<_, (String,)>("SELECT name FROM users WHERE id = $1")
        .bind(account_id)
        .fetch_optional(pool.as_ref())
        .await
        .map_err(|e| internal_error("Database error fetching account", e))?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or(existing.0);

    if let Some(password) = payload.password {
        let password_hash = hash_password(password).await?;
        sqlx::query(
            "UPDATE users SET name = $1, password_hash = $2, updated_at = now() WHERE id = $3",
        )
        .bind(&name)
        .bind(&password_hash)
        .bind(account_id)
        .execute(pool.as_ref())
        .await
        .map_err(|e| internal_error("Failed to update account", e))?;
    } else {
        sqlx::query("UPDATE users SET name = $1, updated_at = now() WHERE id = $2")
            .bind(&name)
            .bind(account_id)
            .execute(pool.as_ref())
            .await
            .map_err(|e| internal_error("Failed to update account", e))?;
    }

    Ok(Json(UserInfo {
        account_id,
        email: claims.email,
        name,
        role: claims.role,
    }))
}

/// DELETE /api/users/{id}
/// Delete an account: self-service, or any account for administrators
pub async fn delete_account(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let claims = authorize(&headers, ANY_ROLE)?;

    if claims.role != Role::Admin && claims.sub != id.to_string() {
        return Err(ApiError::forbidden(
            "Access denied. You may only delete your own account.",
        ));
    }

    let pool = db_pool()?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
        .map_err(|e| internal_error("Failed to delete account", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Account not found"));
    }

    tracing::info!("Account deleted: {}", id);

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn ensure_test_secret() {
        std::env::set_var("JWT_SECRET", "unit-test-secret");
    }

    fn auth_router() -> Router {
        Router::new()
            .route("/api/auth/signup", post(signup))
            .route("/api/auth/login", post(login))
            .route("/api/users/profile", get(profile))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[test]
    fn test_issue_then_verify_returns_claims_unchanged() {
        ensure_test_secret();
        let token = create_access_token("account-1", "a@x.com", Role::Student).unwrap();
        let claims = verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_EXPIRY_MINUTES * 60);
    }

    #[test]
    fn test_verify_expired_token_fails_with_expired() {
        ensure_test_secret();
        let now = Utc::now();
        let claims = Claims {
            sub: "account-1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Student,
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert_eq!(verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_token_just_past_expiry_fails_without_grace_window() {
        ensure_test_secret();
        let now = Utc::now();
        // Expired only seconds ago; a default leeway would still accept it.
        let claims = Claims {
            sub: "account-1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Student,
            exp: (now - Duration::seconds(30)).timestamp(),
            iat: (now - Duration::minutes(61)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert_eq!(verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_tampered_token_fails_with_bad_signature() {
        ensure_test_secret();
        let now = Utc::now();
        let claims = Claims {
            sub: "account-1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Admin,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();
        assert_eq!(verify_access_token(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_verify_garbage_fails_with_malformed() {
        ensure_test_secret();
        assert_eq!(
            verify_access_token("not-a-token-at-all"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_authorize_student_token_against_admin_gate_is_forbidden() {
        ensure_test_secret();
        let token = create_access_token("account-1", "a@x.com", Role::Student).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());

        let err = authorize(&headers, ADMIN_ONLY).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        // The same token passes the any-role gate with claims intact.
        let claims = authorize(&headers, ANY_ROLE).unwrap();
        assert_eq!(claims.role, Role::Student);
    }

    #[test]
    fn test_authorize_without_header_is_unauthenticated() {
        ensure_test_secret();
        let err = authorize(&HeaderMap::new(), ANY_ROLE).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn test_authorize_expired_token_is_unauthenticated() {
        ensure_test_secret();
        let now = Utc::now();
        let claims = Claims {
            sub: "account-1".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Admin,
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());

        let err = authorize(&headers, ADMIN_ONLY).unwrap_err();
        let status = err.into_response().status();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@no-dot"));
    }

    #[tokio::test]
    async fn test_signup_missing_fields_returns_bad_request() {
        ensure_test_secret();
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/signup",
            &SignupRequest {
                email: "a@x.com".to_string(),
                name: "".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signup_short_password_returns_bad_request() {
        ensure_test_secret();
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/signup",
            &SignupRequest {
                email: "a@x.com".to_string(),
                name: "Student".to_string(),
                password: "abc".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        ensure_test_secret();
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        ensure_test_secret();
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "no-at-sign".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_without_database_returns_service_unavailable() {
        ensure_test_secret();
        let (status, _) = post_json(
            auth_router(),
            "/api/auth/login",
            &LoginRequest {
                email: "a@x.com".to_string(),
                password: "secret1".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_profile_without_token_returns_unauthorized() {
        ensure_test_secret();
        let req = Request::get("/api/users/profile")
            .body(Body::empty())
            .unwrap();
        let res = auth_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
