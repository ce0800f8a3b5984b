//! Metal Volumes - Volume and Attachment Client
//!
//! Drives a remote block-storage management service from the command line:
//! volumes, volume attachments and volume flavors, each through a uniform
//! make / validate / execute pipeline with one-shot session recovery and
//! polling until the remote resource settles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         CLI (metal-volumes)                          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │   Router ──► Handler (kind × operation) ──► Dispatcher               │
//! │                      │                         │  re-auth once       │
//! │                      ▼                         ▼                     │
//! │                 Poller (reconcile)       Authenticator               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │   ResourceClient (REST /rest/v1)     CredentialStore (TOML file)     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Resource model, wire types, session values and ports
//! - [`handlers`]: One handler per resource kind and operation
//! - [`engine`]: Routing, session-aware dispatch and reconciliation
//! - [`client`]: HTTP adapters for the management service
//! - [`config`]: Credential store and fuse client settings
//! - [`output`]: Table and JSON rendering
//! - [`error`]: Error types and handling

pub mod client;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod output;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpConfig, PasswordGrantAuthenticator, RestClient};
pub use config::{FileCredentialStore, InMemoryCredentialStore};
pub use domain::{
    Authenticator, CredentialStore, DisplayContent, Operation, ResourceClient, ResourceKind,
    Volume, VolumeAttachment, VolumeFlavor,
};
pub use engine::{Engine, PollPolicy, Response};
pub use error::{Error, Recovery, Result};
pub use handlers::{OperationHandler, Outcome};
pub use output::OutputFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
