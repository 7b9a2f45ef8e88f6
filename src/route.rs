use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::{handler::*, middleware::mw_require_auth, AppState};

// Everything above route_layer is behind the auth middleware
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route(
            "/todos",
            get(get_todos).post(create_todo).delete(delete_todos),
        )
        .route(
            "/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/", get(health_checker_handler))
        .with_state(app_state)
}
