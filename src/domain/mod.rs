//! Domain types and ports

pub mod display;
pub mod model;
pub mod ports;
pub mod remote;
pub mod session;

pub use display::{DisplayContent, TableDisplay};
pub use model::{
    AttachmentState, CapacityPool, FsConfig, Operation, ResourceKind, Volume, VolumeAttachment,
    VolumeFlavor, VolumeState,
};
pub use ports::{Authenticator, CredentialStore, ResourceClient};
pub use session::{CredentialKey, Credentials, Session, StoredCredentials};
