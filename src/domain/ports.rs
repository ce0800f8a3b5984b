//! Domain Ports - Core trait definitions for the volume engine
//!
//! These traits define the boundaries between the engine and external systems.
//! Adapters implement these traits to provide concrete functionality; tests
//! substitute scripted in-memory implementations.

use crate::domain::model::{CapacityPool, VolumeFlavor};
use crate::domain::remote::{NewVolume, NewVolumeAttachment, RemoteVolume, RemoteVolumeAttachment};
use crate::domain::session::{CredentialKey, Session, StoredCredentials};
use crate::error::Result;
use async_trait::async_trait;

// =============================================================================
// Resource Client Port
// =============================================================================

/// Create/Get/Delete/List against the remote management API.
///
/// Every call is authenticated independently with the supplied session.
/// Implementations never retry and never poll.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn create_volume(&self, session: &Session, volume: &NewVolume) -> Result<RemoteVolume>;

    async fn get_volume(&self, session: &Session, volume_id: &str) -> Result<RemoteVolume>;

    async fn delete_volume(&self, session: &Session, volume_id: &str) -> Result<()>;

    async fn list_volumes(&self, session: &Session) -> Result<Vec<RemoteVolume>>;

    async fn create_volume_attachment(
        &self,
        session: &Session,
        attachment: &NewVolumeAttachment,
    ) -> Result<RemoteVolumeAttachment>;

    async fn get_volume_attachment(
        &self,
        session: &Session,
        attachment_id: &str,
    ) -> Result<RemoteVolumeAttachment>;

    async fn delete_volume_attachment(&self, session: &Session, attachment_id: &str) -> Result<()>;

    async fn list_volume_attachments(
        &self,
        session: &Session,
    ) -> Result<Vec<RemoteVolumeAttachment>>;

    async fn list_volume_flavors(&self, session: &Session) -> Result<Vec<VolumeFlavor>>;

    async fn list_capacity_pools(&self, session: &Session) -> Result<Vec<CapacityPool>>;

    async fn get_capacity_pool(&self, session: &Session, pool_id: &str) -> Result<CapacityPool>;
}

// =============================================================================
// Authentication Port
// =============================================================================

/// Exchanges a username and password for a fresh session token
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, base_url: &str, username: &str, password: &str) -> Result<String>;
}

// =============================================================================
// Credential Store Port
// =============================================================================

/// Persistent home of the service settings and the session token.
///
/// Implementations serialize their own access so that one store can be
/// shared between concurrent engine callers.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<StoredCredentials>;

    fn save(&self, key: CredentialKey, value: &str) -> Result<()>;
}
