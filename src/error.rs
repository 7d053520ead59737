use thiserror::Error;

/// Failure classes for calls against the marketplace API.
///
/// The split matters to callers: `Auth` is fatal and never retried,
/// `NotFound` is final for one identifier form but the caller may try the
/// alternate form, `Unavailable` is transient and retried inside the
/// gateway with bounded backoff.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("marketplace rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("{resource} {id} not found upstream")]
    NotFound { resource: &'static str, id: String },

    #[error("marketplace unavailable: {reason}")]
    Unavailable { reason: String },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::Auth { .. })
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("no session recorded for trip {0}")]
    UnknownTrip(String),

    #[error("no resolved offer matches quote {0}")]
    UnknownQuote(String),

    #[error("{0}")]
    InvalidRequest(String),
}
