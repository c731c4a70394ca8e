use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, comments, moderation, relations, threads};
use crate::state::AppState;

/// Builds the full route table over `state`.
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;

    let thread_routes = Router::new()
        .route("/threads", get(threads::list_threads).post(threads::create_thread))
        .route(
            "/threads/{thread_id}",
            get(threads::get_thread).put(threads::update_thread).delete(threads::delete_thread),
        )
        .route("/threads/{thread_id}/like", post(threads::like_thread).delete(threads::unlike_thread))
        .route("/threads/{thread_id}/comments", get(comments::list_comments).post(comments::post_comment))
        .route("/threads/{thread_id}/follow", post(relations::follow_thread).delete(relations::unfollow_thread))
        .route("/threads/{thread_id}/follow/seen", post(relations::mark_seen))
        .route(
            "/threads/{thread_id}/bookmark",
            post(relations::bookmark_thread).delete(relations::unbookmark_thread),
        );

    let admin_routes = Router::new()
        .route("/admin/reports", get(moderation::list_reports))
        .route("/admin/reports/stats", get(moderation::report_stats))
        .route("/admin/users/{user_id}", delete(moderation::delete_user))
        .route("/admin/users/{user_id}/suspend", post(moderation::suspend_user))
        .route("/admin/users/{user_id}/unsuspend", post(moderation::unsuspend_user));

    Router::new()
        .route("/health", get(accounts::health))
        .route("/topics", get(accounts::list_topics).post(accounts::create_topic))
        .route("/topics/{topic_id}", get(accounts::get_topic))
        .route("/users", post(accounts::create_user))
        .route("/users/{user_id}", get(accounts::get_user))
        .route("/comments/{comment_id}", put(comments::update_comment).delete(comments::delete_comment))
        .route("/me/follows", get(relations::my_follows))
        .route("/me/bookmarks", get(relations::my_bookmarks))
        .route("/reports", post(moderation::create_report))
        .merge(thread_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
