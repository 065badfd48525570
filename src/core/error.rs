use thiserror::Error;

/// Centralized error types for the application
///
/// Storage adapters, the conversation handlers and the lifecycle scheduler all
/// report failures through this enum. The conversation layer maps the
/// user-facing variants (`NotFound`, `InvalidInput`, `MissingAttachment`,
/// `StaleCorrelation`) to replies; everything else ends up as an apology at
/// the dispatch boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Telegram file download errors
    #[error("File download error: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A save lost the race against a concurrent update of the same record
    #[error("{entity} #{id} was modified concurrently, please try again")]
    Conflict { entity: &'static str, id: i64 },

    /// Referenced user/animal/shelter/volunteer is absent
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed user-supplied data (phone, e-mail, empty text)
    #[error("{0}")]
    InvalidInput(String),

    /// A photo was expected but the message carried none
    #[error("a photo attachment was expected")]
    MissingAttachment,

    /// A reply references an unknown or already answered question
    #[error("no open question for message {0}")]
    StaleCorrelation(i32),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for `AppError::NotFound` with a formatted subject.
    pub fn not_found(subject: impl Into<String>) -> Self {
        AppError::NotFound(subject.into())
    }
}
