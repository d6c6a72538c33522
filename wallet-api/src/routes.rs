//! HTTP routes for the wallet core
//!
//! Handlers are thin: extract identity and payload, call the matching
//! settlement service, map the result. Every money-moving decision lives in
//! `wallet-settlement`; nothing here reads or writes the store directly
//! except the balance view.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use wallet_ledger::{OrderId, UserId, WalletStore};
use wallet_provider::WebhookEvent;
use wallet_settlement::{DepositService, EscrowCoordinator, ReviewAction, SettlementProcessor};

use crate::error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Underlying store (balance reads)
    pub store: Arc<WalletStore>,
    /// Deposit initiation
    pub deposits: Arc<DepositService>,
    /// Admin review and webhook confirmation
    pub processor: Arc<SettlementProcessor>,
    /// Escrow release
    pub escrow: Arc<EscrowCoordinator>,
    /// Service name reported by /health
    pub service_name: String,
}

/// Build the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/deposits", post(initiate_deposit))
        .route("/wallet-requests/:id/settle", post(settle_request))
        .route("/orders/:id/release-escrow", post(release_escrow))
        .route("/webhooks/provider", post(provider_webhook))
        .route("/users/:id/balance", get(user_balance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn caller_identity(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(UserId::new)
        .ok_or(ApiError::MissingIdentity)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": state.service_name}))
}

#[derive(Deserialize)]
struct DepositBody {
    amount: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DepositResponse {
    reference: String,
    redemption_instructions: String,
    amount: u64,
    expires_at: chrono::DateTime<chrono::Utc>,
    status: String,
}

async fn initiate_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DepositBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = caller_identity(&headers)?;
    let initiation = state.deposits.initiate(user_id, body.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(DepositResponse {
            reference: initiation.reference.to_string(),
            redemption_instructions: initiation.redemption_instructions,
            amount: initiation.amount,
            expires_at: initiation.expires_at,
            status: initiation.status.as_str().to_string(),
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleBody {
    action: ReviewAction,
    admin_notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponse {
    status: String,
    entry_reference: Option<String>,
}

async fn settle_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<SettleBody>,
) -> Result<Json<SettleResponse>, ApiError> {
    let admin = caller_identity(&headers)?;
    let outcome = state
        .processor
        .review(request_id, body.action, admin, body.admin_notes)
        .await?;
    Ok(Json(SettleResponse {
        status: outcome.status.as_str().to_string(),
        entry_reference: outcome.entry_reference.map(|r| r.to_string()),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseBody {
    buyer_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseResponse {
    amount_released: u64,
    fee_deducted: u64,
    already_processed: bool,
}

async fn release_escrow(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(body): Json<ReleaseBody>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let release = state
        .escrow
        .release(&OrderId::new(order_id), &UserId::new(body.buyer_id))
        .await?;
    Ok(Json(ReleaseResponse {
        amount_released: release.amount_released,
        fee_deducted: release.fee_deducted,
        already_processed: release.already_processed,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookResponse {
    reference: String,
    status: String,
    already_settled: bool,
}

async fn provider_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let outcome = state.processor.confirm_webhook(&event).await?;
    Ok(Json(WebhookResponse {
        reference: outcome.reference.to_string(),
        status: outcome.status.as_str().to_string(),
        already_settled: outcome.already_settled,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    user_id: String,
    balance: i64,
    pending_credit: u64,
}

async fn user_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user = UserId::new(user_id);
    let balance = state
        .store
        .balance(&user)
        .map_err(wallet_settlement::Error::from)?;
    let pending_credit = state
        .store
        .pending_credit(&user)
        .map_err(wallet_settlement::Error::from)?;
    Ok(Json(BalanceResponse {
        user_id: user.to_string(),
        balance,
        pending_credit,
    }))
}
