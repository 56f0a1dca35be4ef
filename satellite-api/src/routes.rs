//! Router assembly.

use axum::{middleware::from_fn_with_state, routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::serve;
use crate::state::AppState;

/// Prefix reserved for admin procedures; never served as content.
pub const RPC_PREFIX: &str = "/_/rpc";

/// Admin procedures behind the `X-API-Key` gate.
pub fn rpc_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/DomainService.SetDomain", post(admin::set_domain))
        .route("/SettingsService.SetAuth", post(admin::set_auth))
        .route("/SettingsService.SetStorage", post(admin::set_storage))
        .route("/BasicAuthService.AddUser", post(admin::add_user))
        .fallback(admin::unknown_procedure)
        .layer(from_fn_with_state(state, admin::require_admin_key))
}

/// Full application: admin RPC under [`RPC_PREFIX`], file serving for
/// everything else.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(RPC_PREFIX, rpc_router(state.clone()))
        .fallback(serve::serve_file)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
