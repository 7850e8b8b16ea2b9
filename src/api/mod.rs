use axum::{
    Router, middleware,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, CredentialStore, SeaOrmUserService, UserService};

pub mod auth;
mod error;
mod observability;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

pub async fn create_app_state(
    config: &Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let credentials = CredentialStore::from_config(&config.admin, &config.security)?;
    let user_service = SeaOrmUserService::new(store.clone(), config.security.clone());

    Ok(Arc::new(AppState {
        store,
        auth_service: Arc::new(credentials),
        user_service: Arc::new(user_service),
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

/// Request pipeline, outermost first: HTTP trace span, request tracking
/// (span, metrics, wide event), Basic auth on the `/users` routes, handler.
pub fn router(state: Arc<AppState>) -> Router {
    let protected_routes = create_protected_router(state.clone());

    Router::new()
        .merge(protected_routes)
        .route("/metrics", get(observability::get_metrics))
        .route("/health", get(system::health))
        .with_state(state)
        .layer(middleware::from_fn(observability::track_requests))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", put(users::update_user).delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
