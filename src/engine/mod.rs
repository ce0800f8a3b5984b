//! Volume Engine
//!
//! Entry point for one invocation: route the command-line tokens to a
//! handler, build and validate its resource, then dispatch it with the
//! stored credentials.
//!
//! ```text
//! tokens ──► Router ──► Command::run ──► make_resource ──► validate
//!                                             │
//!                            Dispatcher ◄─────┘
//!                                │  execute ──► ResourceClient
//!                                │  session expired? login once, replay
//!                                ▼
//!                             Outcome ──► DisplayContent
//! ```

pub mod dispatcher;
pub mod poller;
pub mod router;

pub use dispatcher::Dispatcher;
pub use poller::{reconcile, PollPolicy};
pub use router::Router;

use crate::domain::display::DisplayContent;
use crate::domain::model::{Operation, ResourceKind};
use crate::domain::ports::{Authenticator, CredentialStore, ResourceClient};
use crate::domain::session::Credentials;
use crate::error::Result;
use crate::handlers::{login_from_args, parse_args, ArgMap, Outcome};
use crate::output::OutputFormat;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one invocation, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub kind: ResourceKind,
    pub operation: Operation,
    pub format: OutputFormat,
    pub outcome: Outcome,
}

impl Response {
    pub fn display(&self) -> DisplayContent {
        self.outcome.display(self.operation)
    }

    pub fn render(&self) -> Result<String> {
        crate::output::render(&self.display(), self.format)
    }
}

/// Owns the adapters shared by every command
pub struct Engine {
    client: Arc<dyn ResourceClient>,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn CredentialStore>,
    poll: PollPolicy,
    router: Router,
}

impl Engine {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client,
            authenticator,
            store,
            poll: PollPolicy::default(),
            router: Router::new(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Run `<kind> <operation> key=value...`
    pub async fn execute<S: AsRef<str>>(
        &self,
        kind: &str,
        operation: &str,
        args: &[S],
    ) -> Result<Response> {
        let command = self.router.route(kind, operation)?;
        let args = parse_args(args)?;
        let format = OutputFormat::from_args(&args)?;
        let (kind, operation) = command.key();

        info!("Executing {} {}", operation, kind);
        let outcome = command.run(&args, self).await?;
        debug!("{} {} completed", operation, kind);

        Ok(Response {
            kind,
            operation,
            format,
            outcome,
        })
    }

    /// Load stored settings and combine them with the login in `args`
    pub(crate) fn dispatcher(&self, args: &ArgMap) -> Result<Dispatcher<'_>> {
        let (username, password) = login_from_args(args)?;
        let stored = self.store.load()?;
        let fuse_conf = stored.fuse_conf.clone();
        let credentials = Credentials::new(stored, &username, &password)?;

        Ok(Dispatcher::new(
            self.client.as_ref(),
            self.authenticator.as_ref(),
            self.store.as_ref(),
            credentials,
            self.poll,
            fuse_conf,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryCredentialStore;
    use crate::domain::model::{VolumeFlavor, VolumeState};
    use crate::domain::remote::RemoteVolume;
    use crate::domain::session::{CredentialKey, StoredCredentials};
    use crate::error::Error;
    use crate::testing::{FakeAuthenticator, FakeClient};
    use assert_matches::assert_matches;

    fn stored(token: Option<&str>) -> StoredCredentials {
        StoredCredentials {
            url: Some("https://metal.example.com".into()),
            membership_id: Some("m-1".into()),
            session_token: token.map(String::from),
            fuse_conf: None,
        }
    }

    fn engine(
        client: &Arc<FakeClient>,
        auth: &Arc<FakeAuthenticator>,
        store: &Arc<InMemoryCredentialStore>,
    ) -> Engine {
        Engine::new(client.clone(), auth.clone(), store.clone())
    }

    fn volume(state: VolumeState) -> RemoteVolume {
        RemoteVolume {
            id: "v1".into(),
            name: "vol1".into(),
            flavor_id: "f1".into(),
            capacity: 100,
            state: Some(state),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_volume_with_expired_session() {
        let client = Arc::new(FakeClient::default());
        {
            let mut state = client.state();
            state.flavors = vec![VolumeFlavor {
                id: "f1".into(),
                name: "std".into(),
            }];
            state.created_volume = Some(volume(VolumeState::Pending));
            state
                .volume_gets
                .extend([volume(VolumeState::Pending), volume(VolumeState::Allocated)]);
            state.failures.push_back(Error::TokenExpired);
        }
        let auth = Arc::new(FakeAuthenticator::new("fresh"));
        let store = Arc::new(InMemoryCredentialStore::new(stored(Some("stale"))));

        let response = engine(&client, &auth, &store)
            .execute(
                "volume",
                "create",
                &[
                    "name=vol1",
                    "capacity=100",
                    "location_id=loc1",
                    "flavor_name=std",
                    "username=alice",
                    "password=pw",
                ],
            )
            .await
            .unwrap();

        assert_eq!(auth.logins(), 1);
        assert_eq!(store.get(CredentialKey::SessionToken).as_deref(), Some("fresh"));
        assert_eq!(response.format, OutputFormat::Table);

        let content = response.display();
        assert_eq!(
            content.header,
            vec!["NAME", "ID", "FLAVOR_ID", "CAPACITY", "STATUS", "STATE"]
        );
        assert_eq!(content.rows, vec![vec!["vol1", "v1", "f1", "100", "", "allocated"]]);
    }

    #[tokio::test]
    async fn test_argument_errors_precede_credential_loading() {
        let client = Arc::new(FakeClient::default());
        let auth = Arc::new(FakeAuthenticator::new("fresh"));
        let store = Arc::new(InMemoryCredentialStore::new(StoredCredentials::default()));

        let result = engine(&client, &auth, &store)
            .execute("volume", "get", &["username=alice", "password=pw"])
            .await;

        assert_matches!(
            result,
            Err(Error::Argument(msg)) if msg.contains("'volume_id' is missing")
        );
        assert!(client.state().calls.is_empty());

        let result = engine(&client, &auth, &store)
            .execute("volume", "get", &["volume_id=v1", "username=alice", "password=pw"])
            .await;
        assert_matches!(result, Err(Error::Configuration(_)));
        assert!(client.state().calls.is_empty());
    }

    #[tokio::test]
    async fn test_json_format_and_unknown_format() {
        let client = Arc::new(FakeClient::default());
        client.state().flavors = vec![VolumeFlavor {
            id: "f1".into(),
            name: "std".into(),
        }];
        let auth = Arc::new(FakeAuthenticator::new("fresh"));
        let store = Arc::new(InMemoryCredentialStore::new(stored(Some("tok"))));
        let engine = engine(&client, &auth, &store);

        let response = engine
            .execute("volume-flavor", "list", &["format=json", "username=a", "password=p"])
            .await
            .unwrap();
        assert_eq!(response.format, OutputFormat::Json);
        assert!(response.render().unwrap().contains("\"NAME\": \"std\""));

        let result = engine
            .execute("volume-flavor", "list", &["format=yaml", "username=a", "password=p"])
            .await;
        assert_matches!(result, Err(Error::Argument(_)));
    }

    #[tokio::test]
    async fn test_unsupported_pair_touches_nothing() {
        let client = Arc::new(FakeClient::default());
        let auth = Arc::new(FakeAuthenticator::new("fresh"));
        let store = Arc::new(InMemoryCredentialStore::new(stored(None)));

        let result = engine(&client, &auth, &store)
            .execute("volume-flavor", "delete", &["username=a", "password=p"])
            .await;

        assert_matches!(result, Err(Error::UnsupportedOperation { .. }));
        assert!(client.state().calls.is_empty());
        assert_eq!(auth.logins(), 0);
    }
}
