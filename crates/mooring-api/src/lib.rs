//! mooring-api — REST API for the Mooring control plane.
//!
//! Each resource kind gets the same CRUD surface under `/api/v1`:
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/{kind}` | List declared resources |
//! | POST | `/api/v1/{kind}` | Declare a resource |
//! | GET | `/api/v1/{kind}/:id` | Get one resource |
//! | PUT | `/api/v1/{kind}/:id` | Update a resource |
//! | DELETE | `/api/v1/{kind}/:id` | Retract a resource |
//!
//! Kinds: `workloads`, `middlewares`, `services`, `routes`, `volumes`.
//! Middlewares additionally expose `GET /api/v1/middlewares/by-type/:id`,
//! and the middleware catalogue lives under `/api/v1/middleware-types`
//! (type CRUD plus `/{id}/versions`). When a declared middleware names a
//! catalogue version, its container image is resolved from the catalogue.

pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mooring_coordinator::{
    Coordinator, MiddlewareStrategy, RouteStrategy, ServiceStrategy, Strategy, VolumeStrategy,
    WorkloadStrategy,
};
use mooring_store::{CatalogueStore, MiddlewareStore};

/// Shared state for API handlers: one coordinator per resource kind.
#[derive(Clone)]
pub struct ApiState {
    pub workloads: Arc<Coordinator<WorkloadStrategy>>,
    pub middlewares: Arc<Coordinator<MiddlewareStrategy>>,
    pub services: Arc<Coordinator<ServiceStrategy>>,
    pub routes: Arc<Coordinator<RouteStrategy>>,
    pub volumes: Arc<Coordinator<VolumeStrategy>>,
    /// Direct store handle for the by-type query.
    pub middleware_store: Arc<MiddlewareStore>,
    /// Middleware type/version catalogue.
    pub catalogue: Arc<CatalogueStore>,
}

fn kind_router<S>(coordinator: Arc<Coordinator<S>>) -> Router
where
    S: Strategy + 'static,
    S::Record: Serialize + DeserializeOwned + 'static,
{
    Router::new()
        .route("/", get(handlers::list::<S>).post(handlers::create::<S>))
        .route(
            "/{id}",
            get(handlers::get::<S>)
                .put(handlers::update::<S>)
                .delete(handlers::remove::<S>),
        )
        .with_state(coordinator)
}

/// Middleware routes diverge from the generic shape: create resolves
/// the image from the catalogue, and the by-type query reads the store
/// directly.
fn middleware_router(state: &ApiState) -> Router {
    Router::new()
        .route(
            "/{id}",
            get(handlers::get::<MiddlewareStrategy>)
                .put(handlers::update::<MiddlewareStrategy>)
                .delete(handlers::remove::<MiddlewareStrategy>),
        )
        .with_state(state.middlewares.clone())
        .route(
            "/",
            get(handlers::list_middlewares)
                .post(handlers::create_middleware)
                .with_state(state.clone()),
        )
        .route(
            "/by-type/{type_id}",
            get(handlers::list_middlewares_by_type).with_state(state.middleware_store.clone()),
        )
}

fn catalogue_router(store: Arc<CatalogueStore>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_middleware_types).post(handlers::create_middleware_type),
        )
        .route(
            "/{id}",
            get(handlers::get_middleware_type)
                .put(handlers::update_middleware_type)
                .delete(handlers::delete_middleware_type),
        )
        .route(
            "/{id}/versions",
            get(handlers::list_middleware_versions).post(handlers::create_middleware_version),
        )
        .with_state(store)
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1/workloads", kind_router(state.workloads.clone()))
        .nest("/api/v1/middlewares", middleware_router(&state))
        .nest(
            "/api/v1/middleware-types",
            catalogue_router(state.catalogue.clone()),
        )
        .nest("/api/v1/services", kind_router(state.services.clone()))
        .nest("/api/v1/routes", kind_router(state.routes.clone()))
        .nest("/api/v1/volumes", kind_router(state.volumes))
}
