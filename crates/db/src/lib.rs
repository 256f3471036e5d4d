//! Settings persistence for tubedeck.
//!
//! [`SettingsStore`] is the seam the HTTP layer talks to. Production uses
//! [`MongoSettingsStore`]; tests and seed-file development runs use
//! [`MemorySettingsStore`].

pub mod memory;
pub mod mongo;
pub mod store;

pub use memory::MemorySettingsStore;
pub use mongo::{MigrationReport, MongoSettingsStore};
pub use store::{Credentials, SettingsStore, UpdateOutcome};

use mongodb::bson::doc;
use mongodb::{Client, Database};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Invalid extended JSON: {0}")]
    ExtJson(#[from] mongodb::bson::extjson::de::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Invalid seed data: {0}")]
    Seed(String),
}

/// Connect to MongoDB and return a handle to `database`.
pub async fn connect(uri: &str, database: &str) -> Result<Database, DbError> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(database))
}

/// Round-trip a `ping` command to verify the server is reachable.
pub async fn health_check(db: &Database) -> Result<(), DbError> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}
