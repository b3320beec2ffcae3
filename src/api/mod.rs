// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::{agents, changes, documents, mentions, projects, tasks};

/// Builds the full application router over a connected pool
///
/// Used by `main` and by the integration tests, so both always exercise
/// the same surface.
pub fn router(pool: SqlitePool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(agents::health_check))
        // Agent routes
        .route("/api/agents/register", post(agents::register))
        .route("/api/agents", get(agents::list_agents))
        .route(
            "/api/agents/:id",
            get(agents::get_agent).delete(agents::delete_agent),
        )
        // Project hierarchy routes
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/api/projects/:id",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/api/projects/:id/epics", get(projects::list_epics))
        .route(
            "/api/projects/:id/documents",
            get(documents::list_project_documents),
        )
        .route("/api/epics", post(projects::create_epic))
        .route("/api/epics/:id/features", get(projects::list_features))
        .route("/api/features", post(projects::create_feature))
        .route("/api/features/:id/tasks", get(tasks::list_feature_tasks))
        // Task routes
        .route("/api/tasks", post(tasks::create_task))
        .route("/api/tasks/next", get(tasks::next_task))
        .route("/api/tasks/reclaim", post(tasks::reclaim_locks))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/:id/lock", post(tasks::lock_task))
        .route("/api/tasks/:id/status", put(tasks::update_status))
        .route("/api/tasks/:id/comment", post(tasks::comment_task))
        .route("/api/tasks/:id/changelog", get(tasks::task_changelog))
        // Document routes
        .route("/api/documents", post(documents::create_document))
        .route("/api/documents/:id", get(documents::get_document))
        // Mention routes
        .route("/api/mentions", get(mentions::get_mentions))
        .route("/api/mentions/:id/read", post(mentions::mark_read))
        // Change feed
        .route("/api/changes", get(changes::poll_changes))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(pool)
}
