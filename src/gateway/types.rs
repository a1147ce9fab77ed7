//! API request/response types and error codes
//!
//! - `ApiResponse<T>`: unified `{code, msg, data}` envelope
//! - `ApiError`: error half of every handler result
//! - request and response DTOs; amounts travel as decimal strings

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::money::{format_amount, parse_amount};
use crate::transfer::{
    CategoryShare, DailySpend, ErrorKind, Page, TransferError, TransferSummary, TransferView,
};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_ARGUMENT: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const LIMIT_EXCEEDED: i32 = 1003;
    pub const INVALID_STATE: i32 = 1004;
    pub const UNSUPPORTED: i32 = 1005;

    // Auth errors (2xxx)
    pub const MISSING_IDENTITY: i32 = 2001;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;
    pub const CONFLICT: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_ARGUMENT,
            msg,
        )
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            error_codes::MISSING_IDENTITY,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> Result<T, Self> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.msg));
        (self.status, body).into_response()
    }
}

fn api_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidArgument => error_codes::INVALID_ARGUMENT,
        ErrorKind::InsufficientFunds => error_codes::INSUFFICIENT_FUNDS,
        ErrorKind::LimitExceeded => error_codes::LIMIT_EXCEEDED,
        ErrorKind::InvalidState => error_codes::INVALID_STATE,
        ErrorKind::Unsupported => error_codes::UNSUPPORTED,
        ErrorKind::Forbidden => error_codes::FORBIDDEN,
        ErrorKind::NotFound => error_codes::NOT_FOUND,
        ErrorKind::Conflict => error_codes::CONFLICT,
        ErrorKind::ServiceUnavailable => error_codes::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => error_codes::INTERNAL_ERROR,
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let kind = e.kind();
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let msg = if kind == ErrorKind::Internal {
            // Storage details stay in the logs
            tracing::error!(error = %e, "Request failed with internal error");
            "Internal server error".to_string()
        } else {
            e.to_string()
        };
        Self::new(status, api_code(kind), msg)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::bad_request(e.to_string())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Amount as a JSON string (`"10.50"`) or number (`10.5`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    pub fn to_decimal(&self) -> Result<Decimal, ApiError> {
        let raw = match self {
            AmountInput::Text(s) => s.clone(),
            AmountInput::Number(n) => n.to_string(),
        };
        parse_amount(&raw).map_err(|e| ApiError::bad_request(format!("Invalid amount: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TransferApiRequest {
    #[validate(length(min = 1, max = 42, message = "sender_iban is required"))]
    #[schema(example = "DE89370400440532013000")]
    pub sender_iban: String,
    #[validate(length(min = 1, max = 42, message = "receiver_iban is required"))]
    #[schema(example = "NL91ABNA0417164300")]
    pub receiver_iban: String,
    #[schema(value_type = String, example = "125.50")]
    pub amount: AmountInput,
    #[schema(example = "EUR")]
    pub currency: Option<String>,
    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,
}

/// History query string; amount bounds are decimal strings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferApiData {
    pub id: i64,
    pub external_id: Uuid,
    pub reference_code: String,
    pub sender_iban: String,
    pub receiver_iban: String,
    #[schema(example = "125.50")]
    pub amount: String,
    pub currency: String,
    pub transfer_type: String,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransferView> for TransferApiData {
    fn from(view: TransferView) -> Self {
        Self {
            id: view.id,
            external_id: view.external_id,
            reference_code: view.reference_code,
            sender_iban: view.sender_iban,
            receiver_iban: view.receiver_iban,
            amount: format_amount(view.amount),
            currency: view.currency.as_str().to_string(),
            transfer_type: view.transfer_type.as_str().to_string(),
            status: view.status.as_str().to_string(),
            description: view.description,
            created_at: view.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageApiData<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl From<Page<TransferView>> for PageApiData<TransferApiData> {
    fn from(page: Page<TransferView>) -> Self {
        let page = page.map(TransferApiData::from);
        Self {
            items: page.items,
            page: page.page,
            size: page.size,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryApiData {
    pub total_sent: String,
    pub total_received: String,
    pub count: u64,
}

impl From<TransferSummary> for SummaryApiData {
    fn from(summary: TransferSummary) -> Self {
        Self {
            total_sent: format_amount(summary.total_sent),
            total_received: format_amount(summary.total_received),
            count: summary.count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryApiData {
    #[schema(example = "Rent")]
    pub category: String,
    pub amount: String,
    /// Share of outgoing volume, 0-100
    pub percentage: String,
}

impl From<CategoryShare> for CategoryApiData {
    fn from(share: CategoryShare) -> Self {
        Self {
            category: share.category.label().to_string(),
            amount: format_amount(share.amount),
            percentage: format_amount(share.percentage),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailySpendApiData {
    pub date: NaiveDate,
    pub total_amount: String,
}

impl From<DailySpend> for DailySpendApiData {
    fn from(day: DailySpend) -> Self {
        Self {
            date: day.date,
            total_amount: format_amount(day.total_amount),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
    /// `postgres` or `memory`
    pub store: String,
}
