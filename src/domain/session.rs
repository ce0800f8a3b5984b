//! Session credentials
//!
//! Credentials are an explicit value: loaded from the credential store at
//! the start of an invocation, handed to every remote call as a
//! [`Session`], and replaced wholesale when the dispatcher logs in again.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Keys the engine writes back to the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    SessionToken,
}

impl CredentialKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::SessionToken => "session_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the credential store persists between invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Management service base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Membership (tenant) identifier sent with every call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<String>,
    /// Bearer token from the last successful login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Fuse client configuration naming the local mount point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuse_conf: Option<PathBuf>,
}

/// Full credential set for one invocation
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    pub membership_id: String,
    pub username: String,
    pub password: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Combine stored settings with the user's login
    pub fn new(stored: StoredCredentials, username: &str, password: &str) -> Result<Self> {
        let base_url = non_empty(stored.url)
            .ok_or_else(|| Error::Configuration("no valid REST server address found".into()))?;
        let membership_id = non_empty(stored.membership_id)
            .ok_or_else(|| Error::Configuration("no valid membership id found".into()))?;
        if username.is_empty() {
            return Err(Error::Configuration("no valid user id found".into()));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            membership_id,
            username: username.to_string(),
            password: password.to_string(),
            session_token: non_empty(stored.session_token),
        })
    }

    /// Session handed to the resource client
    pub fn session(&self) -> Session {
        Session {
            base_url: self.base_url.clone(),
            membership_id: self.membership_id.clone(),
            token: self.session_token.clone(),
        }
    }

    /// Replace the session token after a login
    pub fn with_token(mut self, token: String) -> Self {
        self.session_token = Some(token);
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("membership_id", &self.membership_id)
            .field("username", &self.username)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection parameters for a single remote call
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub base_url: String,
    pub membership_id: String,
    pub token: Option<String>,
}

impl Session {
    /// Bearer token, or a session-expired error when none has been issued
    pub fn bearer(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::MissingSessionToken)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("membership_id", &self.membership_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
