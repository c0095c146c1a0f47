//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use ledger_types::{
    AccountSummary, DomainError, ErrorClass, LedgerError, LedgerStore, PaymentResponse,
    TransferRequest,
};

use crate::LedgerService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<S: LedgerStore> {
    pub service: LedgerService<S>,
}

/// Wrapper to implement IntoResponse for LedgerError (orphan rule workaround).
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match (&self.0, self.0.class()) {
            (LedgerError::Input(DomainError::AccountNotFound(_)), _) => StatusCode::NOT_FOUND,
            (_, ErrorClass::Input) => StatusCode::BAD_REQUEST,
            (_, ErrorClass::Internal) => {
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            (_, ErrorClass::Fatal) => {
                tracing::error!(alarm = true, error = %self.0, "request failed fatally");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.0.public_message(),
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint. Reports 503 once the ledger has halted.
pub async fn health<S: LedgerStore>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    if state.service.is_healthy() {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "healthy" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "halted" })),
        )
    }
}

/// List all accounts.
#[tracing::instrument(skip(state))]
pub async fn list_accounts<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.service.list_accounts().await?;
    let summaries: Vec<AccountSummary> = accounts.iter().map(AccountSummary::from).collect();
    Ok(Json(summaries))
}

/// Transfer money between accounts.
///
/// A body that does not decode as a `TransferRequest` is answered like any
/// other input error rather than with the extractor's plain-text rejection.
#[tracing::instrument(skip_all)]
pub async fn transfer<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        LedgerError::Input(DomainError::InvalidRequest(rejection.body_text()))
    })?;
    let payment = state
        .service
        .transfer(&req.from, &req.to, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// Payments of one account, split into sent and received.
#[tracing::instrument(skip(state))]
pub async fn payments<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(identifier): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.service.payments(&identifier).await?;
    Ok(Json(history))
}

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
