use frameproof_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
