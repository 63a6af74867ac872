//! Auth configuration types

use crate::types::StringMap;

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// API key sent in a header
    ApiKey {
        /// Header name
        header_name: String,
        /// Prefix to add before the value (e.g., "Token ")
        prefix: Option<String>,
        /// The API key value
        value: String,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: StringMap,
    },
}

impl AuthConfig {
    /// Bearer auth from an optional token; empty or missing means no auth
    pub fn bearer_or_none(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => Self::Bearer {
                token: token.trim().to_string(),
            },
            _ => Self::None,
        }
    }

    /// Whether any credential is configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
