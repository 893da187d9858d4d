use thiserror::Error;

/// Failures of a model-backed agent, worded for the user.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(
        "No Anthropic API key configured. Set ANTHROPIC_API_KEY to use the anthropic agent."
    )]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit: {0}")]
    RateLimit(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from Anthropic: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => AgentError::Authentication(message),
            429 => AgentError::RateLimit(message),
            500..=599 => AgentError::Server { status, message },
            _ => AgentError::Api { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AgentError::from_status(401, String::new()),
            AgentError::Authentication(_)
        ));
        assert!(matches!(
            AgentError::from_status(429, String::new()),
            AgentError::RateLimit(_)
        ));
        assert_eq!(
            AgentError::from_status(529, "overloaded".to_string()).to_string(),
            "Server error (529): overloaded"
        );
        assert_eq!(
            AgentError::from_status(400, "bad model".to_string()).to_string(),
            "API error 400: bad model"
        );
    }
}
