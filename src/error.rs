use thiserror::Error;

#[derive(Debug, Error)]
pub enum KudosError {
    #[error("not signed in")]
    AuthRequired,

    #[error("auth failed for {service}: {message}")]
    AuthFailed { service: String, message: String },

    #[error("rate limited by {service}")]
    RateLimited { service: String },

    #[error("upstream error from {service}: {message}")]
    Upstream {
        service: String,
        message: String,
        status: Option<u16>,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("record not found or not owned by the current user: {id}")]
    NotOwner { id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl KudosError {
    /// Extract collaborator name from structured error variants.
    /// Returns None for variants that don't carry service context.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::AuthFailed { service, .. } => Some(service),
            Self::RateLimited { service } => Some(service),
            Self::Upstream { service, .. } => Some(service),
            _ => None,
        }
    }

    /// True for validation-class failures caught before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Produce a sanitized error message safe for returning to clients.
    /// Does not leak internal URLs, tokens, or upstream error bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "not signed in — call `login` first".to_string(),
            Self::AuthFailed { service, message } => {
                format!("authentication failed for {service}: {message}")
            }
            Self::RateLimited { service } => {
                format!("rate limited by {service} — try again shortly")
            }
            Self::Upstream {
                service, message, ..
            } => {
                format!("upstream error from {service}: {message}")
            }
            Self::SchemaParse(_) => "failed to parse collaborator response".to_string(),
            Self::NotOwner { .. } => "record not found, or you don't own it".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Request(_) => "request to collaborator failed".to_string(),
            Self::Other(msg) => msg.clone(),
        }
    }
}
