use axum::{
    routing::{delete, get, post, put},
    Router,
};
use hearth_core::config::HearthConfig;
use hearth_store::{ShoppingStore, TaskStore, UserStore};
use std::sync::Arc;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: HearthConfig,
    pub tasks: TaskStore,
    pub shopping: ShoppingStore,
    pub users: UserStore,
}

impl AppState {
    pub fn new(
        config: HearthConfig,
        tasks: TaskStore,
        shopping: ShoppingStore,
        users: UserStore,
    ) -> Self {
        Self {
            config,
            tasks,
            shopping,
            users,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/tasks", get(crate::http::tasks::list).post(crate::http::tasks::create))
        .route(
            "/tasks/{id}",
            put(crate::http::tasks::update).delete(crate::http::tasks::remove),
        )
        .route("/tasks/{id}/toggle", post(crate::http::tasks::toggle))
        .route(
            "/categories",
            get(crate::http::tasks::list_categories).post(crate::http::tasks::create_category),
        )
        .route(
            "/shopping",
            get(crate::http::shopping::list).post(crate::http::shopping::add),
        )
        .route("/shopping/{id}", delete(crate::http::shopping::remove))
        .route("/shopping/{id}/toggle", post(crate::http::shopping::toggle))
        .route(
            "/shopping/clear-checked",
            post(crate::http::shopping::clear_checked),
        )
        .route(
            "/users",
            get(crate::http::users::list).post(crate::http::users::register),
        )
        .route(
            "/invites",
            get(crate::http::users::list_invites).post(crate::http::users::mint_invite),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
