use axum::routing::get;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Routes mounted at `/analytics`.
///
/// ```text
/// GET    /{user_id}?period=     stored history, filtered by period
/// POST   /{user_id}             fetch and append fresh snapshots
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{user_id}",
        get(analytics::history).post(analytics::refresh),
    )
}
