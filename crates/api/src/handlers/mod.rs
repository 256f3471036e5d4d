pub mod analytics;
pub mod auth;
pub mod channel_settings;
pub mod maker;
pub mod user_settings;
