use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::super::domain::{
    Actor, ContractDecision, ContractId, PaymentId, Role, UserId, VerificationDecision,
};
use super::accounting::{AccountingError, PaymentRequest};
use super::lifecycle::{LifecycleError, NewContract};
use super::repository::{ContractRepository, EmailNotifier, PaymentRepository, RepositoryError, UserRepository};
use super::service::{CreditService, CreditServiceError};

/// Router builder exposing the contract and credit-report endpoints.
///
/// Caller identity travels in the `x-actor-id` / `x-actor-role` headers;
/// the session collaborator that authenticates them sits in front of this
/// router and is out of scope here.
pub fn credit_router<U, C, P, N>(service: Arc<CreditService<U, C, P, N>>) -> Router
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/credit/contracts",
            post(create_contract_handler::<U, C, P, N>),
        )
        .route(
            "/api/v1/credit/contracts/:contract_id",
            get(contract_statement_handler::<U, C, P, N>),
        )
        .route(
            "/api/v1/credit/contracts/:contract_id/decision",
            post(decide_contract_handler::<U, C, P, N>),
        )
        .route(
            "/api/v1/credit/contracts/:contract_id/payments",
            post(record_payment_handler::<U, C, P, N>),
        )
        .route(
            "/api/v1/credit/payments/:payment_id/verification",
            post(verify_payment_handler::<U, C, P, N>),
        )
        .route(
            "/api/v1/credit/retailers/:retailer_id/report",
            get(credit_report_handler::<U, C, P, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub(crate) decision: ContractDecision,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordPaymentBody {
    #[serde(flatten)]
    pub(crate) request: PaymentRequest,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerificationBody {
    pub(crate) decision: VerificationDecision,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AsOfQuery {
    #[serde(default)]
    pub(crate) as_of: Option<NaiveDate>,
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty());
    let role = headers
        .get("x-actor-role")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_role);

    match (id, role) {
        (Some(id), Some(role)) => Ok(Actor {
            user_id: UserId(id.to_string()),
            role,
        }),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "error": "x-actor-id and x-actor-role headers are required",
                "kind": "authorization",
            })),
        )
            .into_response()),
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "supplier" => Some(Role::Supplier),
        "retailer" => Some(Role::Retailer),
        "admin" => Some(Role::Admin),
        _ => None,
    }
}

fn default_today(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| Local::now().date_naive())
}

/// Every service error kind maps to a distinct status and `kind` label so
/// the caller can tell *why* an action was rejected.
fn error_response(error: CreditServiceError) -> Response {
    let (status, kind) = match &error {
        CreditServiceError::WrongRole { .. }
        | CreditServiceError::NotParty(_)
        | CreditServiceError::PartyRole { .. } => (StatusCode::FORBIDDEN, "authorization"),
        CreditServiceError::UnknownUser(_) => (StatusCode::NOT_FOUND, "not_found"),
        CreditServiceError::Lifecycle(LifecycleError::Validation(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "validation")
        }
        CreditServiceError::Lifecycle(LifecycleError::InvalidTransition { .. }) => {
            (StatusCode::CONFLICT, "invalid_transition")
        }
        CreditServiceError::Accounting(AccountingError::Overpayment { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "overpayment")
        }
        CreditServiceError::Accounting(AccountingError::AlreadyDecided(_)) => {
            (StatusCode::CONFLICT, "invalid_transition")
        }
        CreditServiceError::Accounting(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        CreditServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        CreditServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, "conflict")
        }
        CreditServiceError::Repository(RepositoryError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "store")
        }
    };

    let payload = json!({
        "error": error.to_string(),
        "kind": kind,
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_contract_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<NewContract>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.create_contract(&actor, input) {
        Ok(contract) => (StatusCode::CREATED, axum::Json(contract)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn contract_statement_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    Path(contract_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let as_of = default_today(query.as_of);
    match service.contract_statement(&actor, &ContractId(contract_id), as_of) {
        Ok(statement) => (StatusCode::OK, axum::Json(statement)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decide_contract_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    Path(contract_id): Path<String>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let today = default_today(body.today);
    match service.decide_contract(&actor, &ContractId(contract_id), body.decision, today) {
        Ok(contract) => (StatusCode::OK, axum::Json(contract)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_payment_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    Path(contract_id): Path<String>,
    axum::Json(body): axum::Json<RecordPaymentBody>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let today = default_today(body.today);
    match service.record_payment(&actor, &ContractId(contract_id), body.request, today) {
        Ok(payment) => (StatusCode::ACCEPTED, axum::Json(payment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_payment_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
    axum::Json(body): axum::Json<VerificationBody>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let today = default_today(body.today);
    match service.verify_payment(&actor, &PaymentId(payment_id), body.decision, today) {
        Ok(payment) => (StatusCode::OK, axum::Json(payment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn credit_report_handler<U, C, P, N>(
    State(service): State<Arc<CreditService<U, C, P, N>>>,
    headers: HeaderMap,
    Path(retailer_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let as_of = default_today(query.as_of);
    match service.credit_report(&actor, &UserId(retailer_id), as_of) {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(error) => error_response(error),
    }
}
