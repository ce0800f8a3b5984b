//! Operation Handlers
//!
//! One handler type per {resource kind, operation}. Each follows the same
//! three steps: build a typed resource from raw `key=value` arguments,
//! validate it for the operation, then execute it against the resource
//! client. Handlers for state-changing operations reconcile through the
//! poller before returning.

pub mod attachment;
pub mod flavor;
pub mod volume;

pub use attachment::{
    CreateVolumeAttachmentHandler, DeleteVolumeAttachmentHandler, GetVolumeAttachmentHandler,
    ListVolumeAttachmentHandler,
};
pub use flavor::ListVolumeFlavorHandler;
pub use volume::{CreateVolumeHandler, DeleteVolumeHandler, GetVolumeHandler, ListVolumeHandler};

use crate::domain::display::DisplayContent;
use crate::domain::model::{Operation, ResourceKind, Volume, VolumeAttachment, VolumeFlavor};
use crate::domain::ports::ResourceClient;
use crate::domain::session::Session;
use crate::engine::poller::PollPolicy;
use crate::engine::Engine;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Raw command-line arguments keyed by name
pub type ArgMap = BTreeMap<String, String>;

pub const FORMAT_KEY: &str = "format";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

// =============================================================================
// Argument Parsing
// =============================================================================

/// Split `key=value` tokens into an argument map
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<ArgMap> {
    let mut map = ArgMap::new();
    for arg in args {
        let arg = arg.as_ref().trim();
        match arg.split_once('=') {
            Some((key, value)) => {
                map.insert(key.to_string(), value.to_string());
            }
            None => {
                return Err(Error::Argument(format!(
                    "value for key {} is not provided",
                    arg
                )))
            }
        }
    }
    Ok(map)
}

/// Keys accepted by one {kind, operation}
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Keys that must be present, checked in this order
    pub required: &'static [&'static str],
    /// Keys that may be present
    pub optional: &'static [&'static str],
}

impl ArgSpec {
    fn accepts(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }

    /// Reject unknown keys (in sorted order) then missing required keys
    /// (in declaration order).
    pub fn check(&self, kind: ResourceKind, operation: Operation, args: &ArgMap) -> Result<()> {
        let failure = |reason: String| {
            Error::Argument(format!(
                "{} {} failed with error: {}",
                operation,
                kind_label(kind),
                reason
            ))
        };

        if let Some(key) = args.keys().find(|key| !self.accepts(key)) {
            return Err(failure(format!("Invalid argument {}", key)));
        }

        if let Some(key) = self.required.iter().find(|key| !args.contains_key(**key)) {
            return Err(failure(format!(
                "Argument '{}' is missing. For usage, execute '{} {}' command",
                key,
                crate::NAME,
                kind
            )));
        }

        Ok(())
    }
}

fn kind_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Volume => "volume",
        ResourceKind::VolumeAttachment => "volume attachment",
        ResourceKind::VolumeFlavor => "volume flavor",
    }
}

/// Pull the login out of the argument map
pub fn login_from_args(args: &ArgMap) -> Result<(String, String)> {
    for key in [PASSWORD_KEY, USERNAME_KEY] {
        match args.get(key) {
            Some(value) if value.is_empty() => {
                return Err(Error::Argument(format!(
                    "argument '{}' value is missing",
                    key
                )))
            }
            Some(_) => {}
            None => return Err(Error::Argument(format!("argument '{}' is missing", key))),
        }
    }
    Ok((args[USERNAME_KEY].clone(), args[PASSWORD_KEY].clone()))
}

/// Presence check used by validation rules
pub(crate) fn require(present: bool, message: impl FnOnce() -> String) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(Error::Validation(message()))
    }
}

/// Absence check used by validation rules
pub(crate) fn forbid(set: bool, message: impl FnOnce() -> String) -> Result<()> {
    require(!set, message)
}

// =============================================================================
// Handler Contract
// =============================================================================

/// A resource that can be built from raw arguments and checked per operation
pub trait RequestResource: Sized + Send + Sync + fmt::Debug {
    fn from_args(operation: Operation, args: &ArgMap) -> Result<Self>;

    fn validate(&self, operation: Operation) -> Result<()>;
}

/// Everything an execution needs for one attempt
pub struct ExecutionContext<'a> {
    pub client: &'a dyn ResourceClient,
    pub session: &'a Session,
    pub poll: &'a PollPolicy,
    pub fuse_conf: Option<&'a Path>,
}

/// Result of an executed operation, tagged by resource shape
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Volume(Volume),
    Volumes(Vec<Volume>),
    Attachment(VolumeAttachment),
    Attachments(Vec<VolumeAttachment>),
    Flavors(Vec<VolumeFlavor>),
}

impl Outcome {
    /// Tabulate for the operation that produced it
    pub fn display(&self, operation: Operation) -> DisplayContent {
        match self {
            Outcome::Volume(v) => DisplayContent::from_item(v, operation),
            Outcome::Volumes(vs) => DisplayContent::from_items(vs, operation),
            Outcome::Attachment(a) => DisplayContent::from_item(a, operation),
            Outcome::Attachments(all) => DisplayContent::from_items(all, operation),
            Outcome::Flavors(fs) => DisplayContent::from_items(fs, operation),
        }
    }
}

/// One {resource kind, operation} implementation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    type Resource: RequestResource;

    fn kind(&self) -> ResourceKind;

    fn operation(&self) -> Operation;

    fn make_resource(&self, args: &ArgMap) -> Result<Self::Resource> {
        debug!("{} {} args: {:?}", self.operation(), self.kind(), args.keys());
        Self::Resource::from_args(self.operation(), args)
    }

    fn validate_resource(&self, resource: &Self::Resource) -> Result<()> {
        resource.validate(self.operation())
    }

    async fn execute(
        &self,
        resource: &Self::Resource,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Outcome>;
}

/// Type-erased handler as stored in the router table
#[async_trait]
pub trait Command: Send + Sync {
    /// Routing key this command is registered under
    fn key(&self) -> (ResourceKind, Operation);

    async fn run(&self, args: &ArgMap, engine: &Engine) -> Result<Outcome>;
}

#[async_trait]
impl<H: OperationHandler> Command for H {
    fn key(&self) -> (ResourceKind, Operation) {
        (self.kind(), self.operation())
    }

    async fn run(&self, args: &ArgMap, engine: &Engine) -> Result<Outcome> {
        let resource = self.make_resource(args)?;
        self.validate_resource(&resource)?;

        let mut dispatcher = engine.dispatcher(args)?;
        dispatcher.dispatch(self, &resource).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const CREATE_ARGS: ArgSpec = ArgSpec {
        required: &["name", "capacity", "username", "password"],
        optional: &["format"],
    };

    fn args(pairs: &[(&str, &str)]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let map = parse_args(&["name=vol1", " capacity=10 ", "note=a=b"]).unwrap();
        assert_eq!(map["name"], "vol1");
        assert_eq!(map["capacity"], "10");
        assert_eq!(map["note"], "a=b");

        assert_matches!(parse_args(&["name"]), Err(Error::Argument(msg)) if msg.contains("name"));
    }

    #[test]
    fn test_unknown_keys_reported_in_sorted_order() {
        let map = args(&[
            ("zeta", "1"),
            ("alpha", "1"),
            ("name", "v"),
            ("capacity", "1"),
            ("username", "u"),
            ("password", "p"),
        ]);
        let err = CREATE_ARGS
            .check(ResourceKind::Volume, Operation::Create, &map)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "create volume failed with error: Invalid argument alpha"
        );
    }

    #[test]
    fn test_missing_keys_reported_in_declaration_order() {
        let map = args(&[("username", "u")]);
        let err = CREATE_ARGS
            .check(ResourceKind::Volume, Operation::Create, &map)
            .unwrap_err();
        assert_matches!(&err, Error::Argument(msg) if msg.contains("'name' is missing"));

        let map = args(&[("name", "v"), ("capacity", "1"), ("username", "u"), ("password", "p")]);
        assert!(CREATE_ARGS.check(ResourceKind::Volume, Operation::Create, &map).is_ok());
    }

    #[test]
    fn test_login_from_args() {
        let map = args(&[("username", "alice"), ("password", "pw")]);
        assert_eq!(
            login_from_args(&map).unwrap(),
            ("alice".to_string(), "pw".to_string())
        );

        let map = args(&[("username", "alice"), ("password", "")]);
        assert_matches!(
            login_from_args(&map),
            Err(Error::Argument(msg)) if msg.contains("value is missing")
        );

        let map = args(&[("password", "pw")]);
        assert_matches!(
            login_from_args(&map),
            Err(Error::Argument(msg)) if msg.contains("'username'")
        );
    }
}
