//! OpenAPI document for the HTTP API.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use ledger_types::dto::{
    AccountSummary, PaymentEntry, PaymentHistory, PaymentResponse, TransferRequest,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"})),
        (status = 503, description = "Ledger halted after a failed rollback", body = inline(serde_json::Value), example = json!({"status": "halted"}))
    )
)]
async fn health() {}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "List of accounts", body = Vec<AccountSummary>),
        (status = 500, description = "Internal error")
    )
)]
async fn list_accounts() {}

/// Payments of one account, split into sent and received
#[utoipa::path(
    get,
    path = "/api/accounts/{identifier}/payments",
    tag = "accounts",
    params(
        ("identifier" = String, Path, description = "Account identifier")
    ),
    responses(
        (status = 200, description = "Payment history", body = PaymentHistory),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal error")
    )
)]
async fn payments() {}

/// Transfer money between two accounts of the same currency
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer committed", body = PaymentResponse),
        (status = 400, description = "Malformed body, non-positive amount, currency mismatch or insufficient funds"),
        (status = 404, description = "One or both accounts not found"),
        (status = 500, description = "Internal error")
    )
)]
async fn transfer() {}

/// OpenAPI documentation for the Ledger API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledger Service API",
        version = "1.0.0",
        description = "Single-currency account ledger. Transfers debit one account, credit another and record exactly one payment, atomically.",
        license(name = "MIT"),
    ),
    paths(health, list_accounts, payments, transfer),
    components(schemas(
        AccountSummary,
        TransferRequest,
        PaymentResponse,
        PaymentEntry,
        PaymentHistory,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Account listing and payment history"),
        (name = "transfers", description = "Money movement"),
    )
)]
pub struct ApiDoc;
