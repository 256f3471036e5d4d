use axum::routing::get;
use axum::Router;

use crate::handlers::user_settings;
use crate::state::AppState;

/// Routes mounted at `/user-settings`.
///
/// ```text
/// GET    /{user_id}     read user settings
/// PUT    /{user_id}     replace user settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{user_id}",
        get(user_settings::get).put(user_settings::update),
    )
}
