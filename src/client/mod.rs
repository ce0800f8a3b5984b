//! HTTP adapters for the management service
//!
//! [`RestClient`] implements the resource port against `/rest/v1`;
//! [`PasswordGrantAuthenticator`] implements the login port against the
//! identity provider the service advertises.

mod auth;
mod rest;

pub use auth::PasswordGrantAuthenticator;
pub use rest::{classify_response, decode_body, RestClient};

use crate::error::Result;
use std::time::Duration;

/// Path prefix of the resource API
pub const REST_API_VERSION: &str = "/rest/v1";
/// Discovery endpoint naming the identity provider
pub const AUTH_SVC_INFO: &str = "/info/authsvcinfo";
/// Header carrying the caller's membership id
pub const MEMBERSHIP_HEADER: &str = "Membership";

/// Transport settings shared by both adapters
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    /// Accept self-signed certificates on appliance endpoints
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            accept_invalid_certs: false,
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}
