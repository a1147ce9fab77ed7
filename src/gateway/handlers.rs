//! HTTP handlers
//!
//! Thin adapters: decode the request, call the engine with the caller
//! identity, wrap the result in the response envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use validator::Validate;

use super::state::AppState;
use super::types::{
    ApiError, ApiResponse, ApiResult, CategoryApiData, DailySpendApiData, HealthResponse,
    HistoryQuery, PageApiData, SummaryApiData, TransferApiData, TransferApiRequest, ok,
};
use crate::account::{Currency, Iban};
use crate::identity::CallerIdentity;
use crate::money::parse_amount;
use crate::transfer::{PageRequest, TransferError, TransferFilter, TransferRequest};

/// Execute a transfer
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = TransferApiRequest,
    responses(
        (status = 200, description = "Transfer completed", body = TransferApiData),
        (status = 400, description = "Invalid request or unsupported currency"),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller does not own the sender account"),
        (status = 422, description = "Insufficient funds, limit exceeded or inactive account"),
        (status = 503, description = "Account busy")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(req): Json<TransferApiRequest>,
) -> ApiResult<TransferApiData> {
    req.validate()?;
    let amount = req.amount.to_decimal()?;
    let sender = Iban::new(&req.sender_iban).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let receiver =
        Iban::new(&req.receiver_iban).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut request = TransferRequest::new(sender.as_str(), receiver.as_str(), amount);
    if let Some(code) = req.currency.as_deref().filter(|c| !c.trim().is_empty()) {
        let currency: Currency = code
            .parse()
            .map_err(|e: String| ApiError::from(TransferError::Unsupported(e)))?;
        request = request.with_currency(currency);
    }
    if let Some(description) = req.description {
        request = request.with_description(description);
    }

    let view = state.coordinator.transfer(request, &caller).await?;
    ok(view.into())
}

/// Transfers in or out of an account, newest first
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{iban}/transfers",
    params(
        ("iban" = String, Path, description = "Account IBAN"),
        ("page" = Option<u32>, Query, description = "Zero-based page"),
        ("size" = Option<u32>, Query, description = "Page size, 1-100"),
        ("min_amount" = Option<String>, Query, description = "Inclusive lower bound"),
        ("max_amount" = Option<String>, Query, description = "Inclusive upper bound"),
        ("start" = Option<String>, Query, description = "RFC 3339 start time"),
        ("end" = Option<String>, Query, description = "RFC 3339 end time")
    ),
    responses(
        (status = 200, description = "One page of transfers"),
        (status = 403, description = "Caller may not view this account")
    ),
    tag = "Account"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(iban): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<PageApiData<TransferApiData>> {
    let bound = |raw: &Option<String>| -> Result<_, ApiError> {
        raw.as_deref()
            .map(parse_amount)
            .transpose()
            .map_err(|e| ApiError::bad_request(format!("Invalid amount bound: {}", e)))
    };
    let filter = TransferFilter {
        min_amount: bound(&query.min_amount)?,
        max_amount: bound(&query.max_amount)?,
        start: query.start,
        end: query.end,
    };
    let page = PageRequest::new(
        query.page.unwrap_or(0),
        query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
    );

    let result = state
        .queries
        .filter_history(&iban, &filter, page, &caller)
        .await?;
    ok(result.into())
}

/// Sent, received and count totals
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{iban}/summary",
    params(("iban" = String, Path, description = "Account IBAN")),
    responses((status = 200, description = "Account totals", body = SummaryApiData)),
    tag = "Account"
)]
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(iban): Path<String>,
) -> ApiResult<SummaryApiData> {
    let summary = state.queries.summary(&iban, &caller).await?;
    ok(summary.into())
}

/// Outgoing volume per spending category
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{iban}/categories",
    params(("iban" = String, Path, description = "Account IBAN")),
    responses((status = 200, description = "Category shares", body = [CategoryApiData])),
    tag = "Account"
)]
pub async fn get_categories(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(iban): Path<String>,
) -> ApiResult<Vec<CategoryApiData>> {
    let rows = state.queries.category_breakdown(&iban, &caller).await?;
    ok(rows.into_iter().map(CategoryApiData::from).collect())
}

/// Outgoing totals per day over the last week
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{iban}/weekly-trend",
    params(("iban" = String, Path, description = "Account IBAN")),
    responses((status = 200, description = "Daily totals", body = [DailySpendApiData])),
    tag = "Account"
)]
pub async fn get_weekly_trend(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(iban): Path<String>,
) -> ApiResult<Vec<DailySpendApiData>> {
    let days = state.queries.weekly_trend(&iban, &caller).await?;
    ok(days.into_iter().map(DailySpendApiData::from).collect())
}

/// Rendered receipt document
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}/receipt",
    params(("id" = i64, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Receipt document", content_type = "text/plain"),
        (status = 404, description = "Transfer not found"),
        (status = 503, description = "Receipt generation unavailable")
    ),
    tag = "Transfer"
)]
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let receipt = state.receipts.receipt(id, &caller).await?;
    let disposition = format!(
        "attachment; filename=\"receipt-{}.txt\"",
        receipt.reference_code
    );
    Ok((
        [
            (header::CONTENT_TYPE, receipt.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        receipt.bytes,
    )
        .into_response())
}

/// Health check endpoint
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms, store}}
/// - Unhealthy: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    if let Some(db) = &state.pg_db
        && let Err(e) = db.health_check().await
    {
        tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: super::types::error_codes::SERVICE_UNAVAILABLE,
                msg: "unavailable".to_string(),
                data: None,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            store: state.store_name().to_string(),
        })),
    )
}
