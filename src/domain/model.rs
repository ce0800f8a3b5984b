//! Domain Model
//!
//! Resource values as the operator sees them, plus the operation and
//! resource-kind selectors that thread through the handler contract.
//! Each resource kind has one pure mapping per operation from the remote
//! wire shape (see [`crate::domain::remote`]) to its domain shape.

use crate::domain::remote::{RemoteVolume, RemoteVolumeAttachment};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Operations & Resource Kinds
// =============================================================================

/// Operation requested against a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Get,
    Delete,
    List,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Get,
        Operation::Delete,
        Operation::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnsupportedOperation {
                kind: "sub-command",
                token: s.to_string(),
            })
    }
}

/// Kind of remotely managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Volume,
    VolumeAttachment,
    VolumeFlavor,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Volume,
        ResourceKind::VolumeAttachment,
        ResourceKind::VolumeFlavor,
    ];

    /// Token used on the command line
    pub fn token(&self) -> &'static str {
        match self {
            ResourceKind::Volume => "volume",
            ResourceKind::VolumeAttachment => "volume-attachment",
            ResourceKind::VolumeFlavor => "volume-flavor",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.token() == s)
            .ok_or_else(|| Error::UnsupportedOperation {
                kind: "resource type",
                token: s.to_string(),
            })
    }
}

// =============================================================================
// Resource States
// =============================================================================

/// Lifecycle state reported for a volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VolumeState {
    Pending,
    Allocating,
    Allocated,
    Visible,
    Deleting,
    Deleted,
    Failed,
    /// A state this client does not know about
    Other(String),
}

impl VolumeState {
    pub fn as_str(&self) -> &str {
        match self {
            VolumeState::Pending => "pending",
            VolumeState::Allocating => "allocating",
            VolumeState::Allocated => "allocated",
            VolumeState::Visible => "visible",
            VolumeState::Deleting => "deleting",
            VolumeState::Deleted => "deleted",
            VolumeState::Failed => "failed",
            VolumeState::Other(s) => s,
        }
    }
}

impl From<String> for VolumeState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => VolumeState::Pending,
            "allocating" => VolumeState::Allocating,
            "allocated" => VolumeState::Allocated,
            "visible" => VolumeState::Visible,
            "deleting" => VolumeState::Deleting,
            "deleted" => VolumeState::Deleted,
            "failed" => VolumeState::Failed,
            _ => VolumeState::Other(s),
        }
    }
}

impl From<VolumeState> for String {
    fn from(state: VolumeState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state reported for a volume attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttachmentState {
    New,
    Pending,
    Ready,
    Deleting,
    Deleted,
    Failed,
    Other(String),
}

impl AttachmentState {
    pub fn as_str(&self) -> &str {
        match self {
            AttachmentState::New => "new",
            AttachmentState::Pending => "pending",
            AttachmentState::Ready => "ready",
            AttachmentState::Deleting => "deleting",
            AttachmentState::Deleted => "deleted",
            AttachmentState::Failed => "failed",
            AttachmentState::Other(s) => s,
        }
    }
}

impl From<String> for AttachmentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "new" => AttachmentState::New,
            "pending" => AttachmentState::Pending,
            "ready" => AttachmentState::Ready,
            "deleting" => AttachmentState::Deleting,
            "deleted" => AttachmentState::Deleted,
            "failed" => AttachmentState::Failed,
            _ => AttachmentState::Other(s),
        }
    }
}

impl From<AttachmentState> for String {
    fn from(state: AttachmentState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Volume
// =============================================================================

/// A storage volume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub volume_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub flavor_id: String,
    pub flavor_name: String,
    /// Size in GiB
    pub capacity: u64,
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<VolumeState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mount_path: String,
}

impl Volume {
    /// Shape a remote volume for the operation that fetched it.
    ///
    /// Listings carry no capacity or status; deletions carry only identity
    /// and state.
    pub fn from_remote(remote: &RemoteVolume, operation: Operation) -> Self {
        match operation {
            Operation::Create | Operation::Get => Self {
                name: remote.name.clone(),
                volume_id: remote.id.clone(),
                flavor_id: remote.flavor_id.clone(),
                capacity: remote.capacity,
                location_id: remote.location_id.clone(),
                state: remote.state.clone(),
                status: remote.status.clone(),
                ..Default::default()
            },
            Operation::List => Self {
                name: remote.name.clone(),
                volume_id: remote.id.clone(),
                flavor_id: remote.flavor_id.clone(),
                state: remote.state.clone(),
                ..Default::default()
            },
            Operation::Delete => Self {
                volume_id: remote.id.clone(),
                state: remote.state.clone(),
                ..Default::default()
            },
        }
    }
}

// =============================================================================
// Volume Attachment
// =============================================================================

/// Filesystem access details handed out with a ready attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FsConfig {
    #[serde(rename = "UserName", default)]
    pub user_name: String,
    #[serde(rename = "StorageID", default)]
    pub storage_id: String,
    #[serde(rename = "Ticket", default)]
    pub ticket: String,
    #[serde(rename = "TicketExpiryTime", default)]
    pub ticket_expiry_time: String,
    #[serde(rename = "Permissions", default)]
    pub permissions: Vec<String>,
}

/// An attachment of a volume to the caller's host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub name: String,
    pub volume_id: String,
    pub attachment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AttachmentState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_config: Option<FsConfig>,
}

impl VolumeAttachment {
    /// Shape a remote attachment for the operation that fetched it
    pub fn from_remote(remote: &RemoteVolumeAttachment, operation: Operation) -> Self {
        match operation {
            Operation::Create | Operation::Get => Self {
                name: remote.name.clone(),
                attachment_id: remote.id.clone(),
                volume_id: remote.volume_id.clone(),
                state: remote.state.clone(),
                fs_config: remote.fs_config.clone(),
            },
            Operation::List => Self {
                name: remote.name.clone(),
                attachment_id: remote.id.clone(),
                volume_id: remote.volume_id.clone(),
                state: remote.state.clone(),
                fs_config: None,
            },
            Operation::Delete => Self {
                attachment_id: remote.id.clone(),
                state: remote.state.clone(),
                ..Default::default()
            },
        }
    }
}

// =============================================================================
// Volume Flavor & Capacity Pool
// =============================================================================

/// A class of volume offered by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeFlavor {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Resolve a flavor name to its identifier
pub fn find_flavor_id<'a>(flavors: &'a [VolumeFlavor], flavor_name: &str) -> Result<&'a str> {
    flavors
        .iter()
        .find(|flavor| flavor.name == flavor_name)
        .map(|flavor| flavor.id.as_str())
        .ok_or_else(|| Error::NotFound {
            kind: "Volume flavor",
            field: "name",
            value: flavor_name.to_string(),
        })
}

/// A backing capacity pool; maps flavors onto a storage cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPool {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "arrayCapacityPoolID", default)]
    pub cluster_name: String,
    #[serde(rename = "volumeFlavors", default)]
    pub volume_flavors: Vec<String>,
}
