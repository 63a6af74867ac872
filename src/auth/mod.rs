//! Authentication module
//!
//! Supports: Bearer token, API key header, custom headers
//!
//! The `Authenticator` applies the configured credential to every
//! outgoing request. Loading and validating the credential happens
//! upstream (CLI flag or environment).

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;

#[cfg(test)]
mod tests;
