//! Remote API wire types
//!
//! JSON shapes exchanged with the management service. Field names follow
//! the service's PascalCase schema; absent fields decode to defaults so
//! that only a structurally foreign body is treated as undecodable.

use crate::domain::model::{AttachmentState, FsConfig, VolumeState};
use serde::{Deserialize, Serialize};

/// Protocol requested for every attachment this client creates
pub const ATTACHMENT_PROTOCOL: &str = "fuse";

/// Volume as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteVolume {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "FlavorID", default)]
    pub flavor_id: String,
    #[serde(rename = "Capacity", default)]
    pub capacity: u64,
    #[serde(rename = "LocationID", default)]
    pub location_id: String,
    #[serde(rename = "State", default)]
    pub state: Option<VolumeState>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

/// Body of a volume create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVolume {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    #[serde(rename = "FlavorID")]
    pub flavor_id: String,
    #[serde(rename = "Capacity")]
    pub capacity: u64,
    #[serde(rename = "LocationID")]
    pub location_id: String,
}

/// Volume attachment as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteVolumeAttachment {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "VolumeID", default)]
    pub volume_id: String,
    #[serde(rename = "State", default)]
    pub state: Option<AttachmentState>,
    #[serde(rename = "FSConfig", default)]
    pub fs_config: Option<FsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    #[serde(rename = "Protocol")]
    pub protocol: String,
}

/// Body of a volume attachment create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVolumeAttachment {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "VolumeID")]
    pub volume_id: String,
    #[serde(rename = "Protocol")]
    pub protocol: ProtocolParameters,
}

impl NewVolumeAttachment {
    pub fn new(name: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume_id: volume_id.into(),
            protocol: ProtocolParameters {
                protocol: ATTACHMENT_PROTOCOL.to_string(),
            },
        }
    }
}

/// Error body carried by non-success responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "Message", alias = "message", default)]
    pub message: String,
}

// =============================================================================
// Authentication
// =============================================================================

/// Discovery document naming the identity provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthServiceInfo {
    #[serde(default)]
    pub auth_url: String,
    #[serde(default)]
    pub auth_client_id: String,
    #[serde(default)]
    pub auth_audience: String,
}

/// Password-realm grant request
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub audience: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub scope: &'a str,
    pub realm: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_remote_volume() {
        let body = r#"{"ID":"v1","Name":"vol1","FlavorID":"f1","Capacity":100,
            "LocationID":"loc1","State":"pending","Status":"ok","Extra":true}"#;
        let volume: RemoteVolume = serde_json::from_str(body).unwrap();
        assert_eq!(volume.id, "v1");
        assert_eq!(volume.capacity, 100);
        assert_eq!(volume.state, Some(VolumeState::Pending));
    }

    #[test]
    fn test_new_attachment_uses_fuse() {
        let body = serde_json::to_value(NewVolumeAttachment::new("att", "v1")).unwrap();
        assert_eq!(body["Protocol"]["Protocol"], "fuse");
        assert_eq!(body["VolumeID"], "v1");
    }

    #[test]
    fn test_error_body_accepts_either_case() {
        let upper: ErrorBody = serde_json::from_str(r#"{"Message":"quota exceeded"}"#).unwrap();
        let lower: ErrorBody = serde_json::from_str(r#"{"message":"quota exceeded"}"#).unwrap();
        assert_eq!(upper.message, lower.message);
    }
}
