use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, Caller, Role};
use super::repository::{
    AffiliateDirectory, ApplicationRepository, NotificationPublisher, RepositoryError,
};
use super::service::{CreditApplicationService, ServiceError, SubmitRequest};

/// Router builder exposing the credit workflow endpoints. Identity arrives
/// as resolved claims in `x-user-*` headers injected by the upstream
/// gateway; token validation is not this service's concern.
pub fn credit_router<R, D, N>(service: Arc<CreditApplicationService<R, D, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/credit-applications",
            post(submit_handler::<R, D, N>).get(list_all_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/me",
            get(list_mine_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/:id",
            get(get_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/:id/evaluate",
            post(evaluate_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/:id/approve",
            post(approve_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/:id/reject",
            post(reject_handler::<R, D, N>),
        )
        .route(
            "/api/v1/credit-applications/:id/cancel",
            post(cancel_handler::<R, D, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    pub(crate) reason: String,
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let user_id = header("x-user-id").filter(|value| !value.is_empty());
    let role = header("x-user-role").and_then(|raw| Role::from_str(&raw).ok());

    match (user_id, role) {
        (Some(user_id), Some(role)) => {
            let username = header("x-user-name").unwrap_or_else(|| user_id.clone());
            Ok(Caller {
                user_id,
                username,
                role,
            })
        }
        _ => {
            let payload = json!({
                "kind": "unauthorized",
                "error": "missing or invalid x-user-id / x-user-role headers",
            });
            Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
        }
    }
}

fn error_response(err: ServiceError) -> Response {
    let (status, kind) = match &err {
        ServiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        ServiceError::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid_state"),
        ServiceError::ConcurrentModification(_) => (StatusCode::CONFLICT, "concurrent_modification"),
        ServiceError::Repository(RepositoryError::Conflict) => (StatusCode::CONFLICT, "conflict"),
        ServiceError::Repository(RepositoryError::Unavailable(_))
        | ServiceError::Directory(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };

    let payload = json!({
        "kind": kind,
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.submit(&caller, request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_all_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.list_all(&caller) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_mine_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.list_mine(&caller) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.get(&caller, &ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.evaluate(&caller, &ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.approve(&caller, &ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<RejectRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.reject(&caller, &ApplicationId(id), &request.reason) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn cancel_handler<R, D, N>(
    State(service): State<Arc<CreditApplicationService<R, D, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.cancel(&caller, &ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}
