/**
 * Payment Routes
 * Simulated UPI confirmation: status derived from elapsed time per transaction
 */
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::routes::auth::{authorize, ANY_ROLE};
use crate::routes::ApiError;
use crate::AppState;

/// Seconds a transaction stays pending before the simulation reports it
/// completed (stand-in for a gateway callback).
const DEFAULT_CONFIRMATION_SECS: u64 = 10;

/// Derived status of a payment transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// Seam for payment confirmation. The simulated ledger below is the only
/// implementation; a real gateway integration replaces it here without
/// touching the role gate or token logic.
pub trait PaymentGateway: Send + Sync {
    fn check_status(&self, transaction_id: &str) -> PaymentStatus;
}

/// In-memory transaction ledger. A transaction is created on its first
/// status check and reported completed once the confirmation window has
/// elapsed. State lives for the process lifetime only; a restart forgets
/// all transactions.
pub struct SimulatedGateway {
    threshold: Duration,
    transactions: Mutex<HashMap<String, Instant>>,
}

impl SimulatedGateway {
    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            threshold,
            transactions: Mutex::new(HashMap::new()),
        }
    }

    /// Threshold from PAYMENT_CONFIRMATION_SECS, defaulting to 10 seconds.
    pub fn from_env() -> Self {
        let secs = std::env::var("PAYMENT_CONFIRMATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONFIRMATION_SECS);
        Self::with_threshold(Duration::from_secs(secs))
    }

    /// Number of transactions currently tracked.
    pub fn transaction_count(&self) -> usize {
        self.transactions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl PaymentGateway for SimulatedGateway {
    fn check_status(&self, transaction_id: &str) -> PaymentStatus {
        // The lock spans lookup and insert, so racing first checks for one
        // id settle on a single creation time. Instant never goes backwards,
        // which keeps pending -> completed one-directional.
        let created_at = {
            let mut transactions = self
                .transactions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *transactions
                .entry(transaction_id.to_string())
                .or_insert_with(Instant::now)
        };

        if created_at.elapsed() > self.threshold {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
}

/// GET /api/payments/status/{transaction_id}
/// Any authenticated account may poll; the gate alone decides admission.
pub async fn payment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    authorize(&headers, ANY_ROLE)?;

    if transaction_id.trim().is_empty() {
        return Err(ApiError::validation("Transaction id is required"));
    }

    let status = state.payments.check_status(&transaction_id);
    tracing::debug!("Payment status for {}: {:?}", transaction_id, status);

    Ok(Json(PaymentStatusResponse { status }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::{create_access_token, Role};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn payment_router(gateway: Arc<SimulatedGateway>) -> Router {
        Router::new()
            .route("/api/payments/status/{transaction_id}", get(payment_status))
            .with_state(AppState { payments: gateway })
    }

    fn student_bearer() -> String {
        std::env::set_var("JWT_SECRET", "unit-test-secret");
        let token = create_access_token(
            "7b02e6da-9a4f-4c3b-9f6e-1e2a3b4c5d6e",
            "a@x.com",
            Role::Student,
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    #[test]
    fn test_fresh_transaction_is_pending_on_repeated_checks() {
        let gateway = SimulatedGateway::with_threshold(Duration::from_secs(10));
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Pending);
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Pending);
        assert_eq!(gateway.transaction_count(), 1);
    }

    #[test]
    fn test_distinct_transactions_are_independent() {
        let gateway = SimulatedGateway::with_threshold(Duration::from_secs(10));
        gateway.check_status("TXN_1");
        gateway.check_status("TXN_2");
        assert_eq!(gateway.transaction_count(), 2);
    }

    #[tokio::test]
    async fn test_transaction_completes_after_threshold_and_never_reverts() {
        let gateway = SimulatedGateway::with_threshold(Duration::from_millis(30));
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Pending);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Completed);

        // Monotonic: once completed, later checks stay completed.
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Completed);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(gateway.check_status("TXN_1"), PaymentStatus::Completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_checks_create_exactly_one_record() {
        let gateway = Arc::new(SimulatedGateway::with_threshold(Duration::from_secs(10)));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(
                async move { gateway.check_status("TXN_RACE") },
            ));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), PaymentStatus::Pending);
        }
        assert_eq!(gateway.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_status_endpoint_without_token_returns_unauthorized() {
        let gateway = Arc::new(SimulatedGateway::with_threshold(Duration::from_secs(10)));
        let req = Request::get("/api/payments/status/TXN_1")
            .body(Body::empty())
            .unwrap();
        let res = payment_router(gateway).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_endpoint_returns_pending_for_fresh_transaction() {
        let gateway = Arc::new(SimulatedGateway::with_threshold(Duration::from_secs(10)));
        let req = Request::get("/api/payments/status/TXN_1")
            .header("authorization", student_bearer())
            .body(Body::empty())
            .unwrap();
        let res = payment_router(gateway.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: PaymentStatusResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, PaymentStatus::Pending);
        assert_eq!(gateway.transaction_count(), 1);
    }
}
