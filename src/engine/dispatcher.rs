//! Session-aware dispatch
//!
//! Runs a handler's execute step and, when the failure means the session
//! is no longer valid, logs in once, persists the new token and replays the
//! operation. A second session failure is returned to the caller.

use crate::domain::ports::{Authenticator, CredentialStore, ResourceClient};
use crate::domain::session::{CredentialKey, Credentials};
use crate::engine::poller::PollPolicy;
use crate::error::Result;
use crate::handlers::{ExecutionContext, OperationHandler, Outcome};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

/// Executes handlers for one invocation with one set of credentials
pub struct Dispatcher<'a> {
    client: &'a dyn ResourceClient,
    authenticator: &'a dyn Authenticator,
    store: &'a dyn CredentialStore,
    credentials: Credentials,
    poll: PollPolicy,
    fuse_conf: Option<PathBuf>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        client: &'a dyn ResourceClient,
        authenticator: &'a dyn Authenticator,
        store: &'a dyn CredentialStore,
        credentials: Credentials,
        poll: PollPolicy,
        fuse_conf: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            authenticator,
            store,
            credentials,
            poll,
            fuse_conf,
        }
    }

    /// Credentials currently in use, including any refreshed token
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Execute with at most one re-authentication
    pub async fn dispatch<H: OperationHandler>(
        &mut self,
        handler: &H,
        resource: &H::Resource,
    ) -> Result<Outcome> {
        let mut attempt = Attempt::First;

        loop {
            let session = self.credentials.session();
            let ctx = ExecutionContext {
                client: self.client,
                session: &session,
                poll: &self.poll,
                fuse_conf: self.fuse_conf.as_deref(),
            };

            match handler.execute(resource, &ctx).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt == Attempt::First && e.is_session_expired() => {
                    warn!(
                        "{} {}: session rejected ({}), logging in again",
                        handler.operation(),
                        handler.kind(),
                        e
                    );
                    self.reauthenticate().await?;
                    attempt = Attempt::Retried;
                }
                Err(e) => {
                    error!("{} {} failed: {}", handler.operation(), handler.kind(), e);
                    return Err(e);
                }
            }
        }
    }

    async fn reauthenticate(&mut self) -> Result<()> {
        let token = self
            .authenticator
            .login(
                &self.credentials.base_url,
                &self.credentials.username,
                &self.credentials.password,
            )
            .await?;

        self.store.save(CredentialKey::SessionToken, &token)?;
        self.credentials = self.credentials.clone().with_token(token);

        info!("Session refreshed for user {}", self.credentials.username);
        Ok(())
    }
}
