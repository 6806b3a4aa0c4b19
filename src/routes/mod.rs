//! Router assembly: public resources, membership, admin-only resources, common routes.

mod common;

pub use common::common_routes;

use crate::auth::require_admin;
use crate::domain::News;
use crate::handlers::dto::{
    AccountDtoConversion, CountryDtoConversion, EventLogDtoConversion, NewsDtoConversion, PermissionDtoConversion,
};
use crate::handlers::{account_permission, membership, news, Operations, ResourceController};
use crate::resource::PagingService;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Routes under the API root, without state.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let news_service: Arc<dyn PagingService<News>> = state.news.clone();

    let public = Router::new()
        .merge(
            ResourceController::new(state.countries.resources(), CountryDtoConversion, Operations::ALL)
                .router::<AppState>("/countries"),
        )
        .merge(
            ResourceController::new(state.event_logs.resources(), EventLogDtoConversion, Operations::READ_ONLY)
                .router::<AppState>("/event-logs"),
        )
        .merge(ResourceController::new(news_service, NewsDtoConversion, Operations::ALL).router::<AppState>("/news"))
        .route("/news/:id/draft", post(news::mark_as_draft))
        .route("/news/:id/validate", post(news::mark_as_validated))
        .route("/news/:id/publish", post(news::mark_as_published))
        .route("/membership/signup", post(membership::sign_up))
        .route("/membership/activate/:account_id/:token", post(membership::activate))
        .route("/membership/password/new", post(membership::new_password))
        .route(
            "/membership/password/reset/:account_id/:token",
            post(membership::reset_password),
        );

    let admin = Router::new()
        .merge(
            ResourceController::new(state.accounts.resources(), AccountDtoConversion, Operations::READ_DELETE)
                .router::<AppState>("/accounts"),
        )
        .merge(
            ResourceController::new(state.permissions.resources(), PermissionDtoConversion, Operations::ALL)
                .router::<AppState>("/permissions"),
        )
        .route("/accounts/:id/permissions", get(account_permission::list))
        .route(
            "/accounts/:id/permissions/:permission_id",
            put(account_permission::grant).delete(account_permission::revoke),
        )
        .route_layer(middleware::from_fn_with_state(state.membership.clone(), require_admin));

    public.merge(admin)
}

/// The whole application: common routes at the root, API under the configured root path.
pub fn app(state: AppState) -> Router {
    let api = api_routes(&state);
    let root = state.config.api_root_path.clone();
    let api = if root.is_empty() {
        api
    } else {
        Router::new().nest(&root, api)
    };
    Router::new()
        .merge(common_routes())
        .merge(api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
