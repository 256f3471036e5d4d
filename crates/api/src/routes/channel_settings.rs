use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::channel_settings;
use crate::state::AppState;

/// Routes mounted at `/channel-settings`.
///
/// ```text
/// GET    /                               every settings document
/// GET    /presets/{user_id}              presets + the user's channels
/// GET    /names-and-dates/{user_id}      channel names + next upload
/// GET    /{user_id}                      one user's settings
/// PUT    /{user_id}                      replace a channel
/// POST   /{user_id}                      add a channel from its URL
/// DELETE /{user_id}/{channel_key}        remove a channel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(channel_settings::list))
        .route("/presets/{user_id}", get(channel_settings::presets))
        .route(
            "/names-and-dates/{user_id}",
            get(channel_settings::names_and_dates),
        )
        .route(
            "/{user_id}",
            get(channel_settings::get_by_user)
                .put(channel_settings::update)
                .post(channel_settings::add),
        )
        .route("/{user_id}/{channel_key}", delete(channel_settings::delete))
}
