//! REST API handlers.
//!
//! One generic handler set serves every resource kind; the coordinator
//! in the extracted state decides which kind that is. Responses use a
//! uniform JSON envelope.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mooring_coordinator::{Coordinator, CoordinatorError, Strategy};
use mooring_core::{Middleware, MiddlewareType, MiddlewareVersion, Record};
use mooring_store::{CatalogueStore, MiddlewareStore};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
pub struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(err: &CoordinatorError) -> impl IntoResponse {
    (
        status_for(err),
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
}

/// Map coordinator failures to HTTP statuses. Orchestrator errors are
/// upstream failures, except a not-found which keeps its meaning.
pub(crate) fn status_for(err: &CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
        CoordinatorError::AlreadyExists(_) => StatusCode::CONFLICT,
        CoordinatorError::MustCreateFirst(_) => StatusCode::CONFLICT,
        CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
        CoordinatorError::Cluster(e) if e.is_not_found() => StatusCode::NOT_FOUND,
        CoordinatorError::Cluster(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::Serialize(_) | CoordinatorError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /api/v1/{kind}
pub async fn list<S>(State(coordinator): State<Arc<Coordinator<S>>>) -> impl IntoResponse
where
    S: Strategy + 'static,
    S::Record: Serialize,
{
    match coordinator.find_all().await {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET /api/v1/{kind}/:id
pub async fn get<S>(
    State(coordinator): State<Arc<Coordinator<S>>>,
    Path(id): Path<i64>,
) -> impl IntoResponse
where
    S: Strategy + 'static,
    S::Record: Serialize,
{
    match coordinator.find_by_id(id).await {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/v1/{kind}
pub async fn create<S>(
    State(coordinator): State<Arc<Coordinator<S>>>,
    Json(record): Json<S::Record>,
) -> impl IntoResponse
where
    S: Strategy + 'static,
    S::Record: Serialize + DeserializeOwned,
{
    match coordinator.add(record).await {
        Ok(declared) => (StatusCode::CREATED, ApiResponse::ok(declared)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// PUT /api/v1/{kind}/:id
pub async fn update<S>(
    State(coordinator): State<Arc<Coordinator<S>>>,
    Path(id): Path<i64>,
    Json(mut record): Json<S::Record>,
) -> impl IntoResponse
where
    S: Strategy + 'static,
    S::Record: Serialize + DeserializeOwned,
{
    record.set_id(id);
    match coordinator.update(record).await {
        Ok(updated) => ApiResponse::ok(updated).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE /api/v1/{kind}/:id
pub async fn remove<S>(
    State(coordinator): State<Arc<Coordinator<S>>>,
    Path(id): Path<i64>,
) -> impl IntoResponse
where
    S: Strategy + 'static,
    S::Record: Serialize,
{
    match coordinator.delete(id).await {
        Ok(()) => ApiResponse::ok("deleted").into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

// ── Middleware-specific routes ────────────────────────────────────

/// GET /api/v1/middlewares
pub async fn list_middlewares(State(state): State<ApiState>) -> impl IntoResponse {
    match state.middlewares.find_all().await {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/v1/middlewares
///
/// The catalogue owns the image: when the descriptor names a version,
/// the version's image reference replaces whatever the caller sent.
pub async fn create_middleware(
    State(state): State<ApiState>,
    Json(mut middleware): Json<Middleware>,
) -> impl IntoResponse {
    if middleware.version_id > 0 {
        match state.catalogue.image_for_version(middleware.version_id).await {
            Ok(image) => middleware.image = image,
            Err(e) => return error_response(&e.into()).into_response(),
        }
    }
    match state.middlewares.add(middleware).await {
        Ok(declared) => (StatusCode::CREATED, ApiResponse::ok(declared)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET /api/v1/middlewares/by-type/:type_id
pub async fn list_middlewares_by_type(
    State(store): State<Arc<MiddlewareStore>>,
    Path(type_id): Path<i64>,
) -> impl IntoResponse {
    match store.find_all_by_type_id(type_id).await {
        Ok(middlewares) => ApiResponse::ok(middlewares).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

// ── Middleware catalogue ──────────────────────────────────────────

/// GET /api/v1/middleware-types
pub async fn list_middleware_types(
    State(store): State<Arc<CatalogueStore>>,
) -> impl IntoResponse {
    match store.find_all_types().await {
        Ok(types) => ApiResponse::ok(types).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// POST /api/v1/middleware-types
pub async fn create_middleware_type(
    State(store): State<Arc<CatalogueStore>>,
    Json(entry): Json<MiddlewareType>,
) -> impl IntoResponse {
    let id = match store.insert_type(&entry).await {
        Ok(id) => id,
        Err(e) => return error_response(&e.into()).into_response(),
    };
    match store.find_type_by_id(id).await {
        Ok(created) => (StatusCode::CREATED, ApiResponse::ok(created)).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// GET /api/v1/middleware-types/:id
pub async fn get_middleware_type(
    State(store): State<Arc<CatalogueStore>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match store.find_type_by_id(id).await {
        Ok(entry) => ApiResponse::ok(entry).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// PUT /api/v1/middleware-types/:id (name and logo only; versions are
/// managed through the versions routes)
pub async fn update_middleware_type(
    State(store): State<Arc<CatalogueStore>>,
    Path(id): Path<i64>,
    Json(mut entry): Json<MiddlewareType>,
) -> impl IntoResponse {
    entry.id = id;
    if let Err(e) = store.update_type(&entry).await {
        return error_response(&e.into()).into_response();
    }
    match store.find_type_by_id(id).await {
        Ok(updated) => ApiResponse::ok(updated).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// DELETE /api/v1/middleware-types/:id
pub async fn delete_middleware_type(
    State(store): State<Arc<CatalogueStore>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match store.delete_type(id).await {
        Ok(()) => ApiResponse::ok("deleted").into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// GET /api/v1/middleware-types/:id/versions
pub async fn list_middleware_versions(
    State(store): State<Arc<CatalogueStore>>,
    Path(type_id): Path<i64>,
) -> impl IntoResponse {
    match store.find_versions_by_type(type_id).await {
        Ok(versions) => ApiResponse::ok(versions).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

/// POST /api/v1/middleware-types/:id/versions
pub async fn create_middleware_version(
    State(store): State<Arc<CatalogueStore>>,
    Path(type_id): Path<i64>,
    Json(mut version): Json<MiddlewareVersion>,
) -> impl IntoResponse {
    version.type_id = type_id;
    let id = match store.insert_version(&version).await {
        Ok(id) => id,
        Err(e) => return error_response(&e.into()).into_response(),
    };
    match store.find_version_by_id(id).await {
        Ok(created) => (StatusCode::CREATED, ApiResponse::ok(created)).into_response(),
        Err(e) => error_response(&e.into()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_cluster::ClusterError;

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&CoordinatorError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CoordinatorError::AlreadyExists("volume ns/x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CoordinatorError::MustCreateFirst("volume ns/x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CoordinatorError::NotFound("volume 3".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&CoordinatorError::Cluster(ClusterError::Api {
                status: 404,
                message: "gone".into()
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&CoordinatorError::Cluster(ClusterError::Transport(
                "refused".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }
}
