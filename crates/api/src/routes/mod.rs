pub mod analytics;
pub mod auth;
pub mod channel_settings;
pub mod health;
pub mod maker;
pub mod user_settings;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                     login (public)
///
/// /channel-settings                               every settings document
/// /channel-settings/presets/{user_id}             presets + user's channels
/// /channel-settings/names-and-dates/{user_id}     names + next upload
/// /channel-settings/{user_id}                     get, replace channel, add channel
/// /channel-settings/{user_id}/{channel_key}       remove channel
///
/// /user-settings/{user_id}                        get, replace
///
/// /maker/create-videos                            admit job
/// /maker/job-status/{job_id}                      poll job
///
/// /analytics/{user_id}                            history, refresh
/// ```
///
/// Everything except `/auth/login` requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/channel-settings", channel_settings::router())
        .nest("/user-settings", user_settings::router())
        .nest("/maker", maker::router())
        .nest("/analytics", analytics::router())
}
