//! Scripted in-memory adapters for unit tests

use crate::domain::model::{CapacityPool, VolumeFlavor};
use crate::domain::ports::{Authenticator, ResourceClient};
use crate::domain::remote::{NewVolume, NewVolumeAttachment, RemoteVolume, RemoteVolumeAttachment};
use crate::domain::session::Session;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

/// Canned responses and a call log
#[derive(Debug, Default)]
pub struct FakeState {
    pub flavors: Vec<VolumeFlavor>,
    pub volumes: Vec<RemoteVolume>,
    pub attachments: Vec<RemoteVolumeAttachment>,
    pub pools: Vec<CapacityPool>,
    pub created_volume: Option<RemoteVolume>,
    pub created_attachment: Option<RemoteVolumeAttachment>,
    /// Successive `get_volume` answers; the last one repeats
    pub volume_gets: VecDeque<RemoteVolume>,
    /// Successive `get_volume_attachment` answers; the last one repeats
    pub attachment_gets: VecDeque<RemoteVolumeAttachment>,
    /// Errors returned, in order, by the next authenticated calls
    pub failures: VecDeque<Error>,
    pub calls: Vec<&'static str>,
    pub tokens_seen: Vec<Option<String>>,
    pub volume_requests: Vec<NewVolume>,
    pub attachment_requests: Vec<NewVolumeAttachment>,
}

#[derive(Debug, Default)]
pub struct FakeClient {
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == name).count()
    }

    fn enter(&self, name: &'static str, session: &Session) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock();
        state.calls.push(name);
        state.tokens_seen.push(session.token.clone());
        session.bearer()?;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        Ok(state)
    }
}

fn not_found(operation: &str) -> Error {
    Error::RemoteCall {
        operation: operation.to_string(),
        status: 404,
        message: "not found".into(),
    }
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl ResourceClient for FakeClient {
    async fn create_volume(&self, session: &Session, volume: &NewVolume) -> Result<RemoteVolume> {
        let mut state = self.enter("create_volume", session)?;
        state.volume_requests.push(volume.clone());
        state
            .created_volume
            .clone()
            .ok_or_else(|| not_found("Create volume"))
    }

    async fn get_volume(&self, session: &Session, _volume_id: &str) -> Result<RemoteVolume> {
        let mut state = self.enter("get_volume", session)?;
        next(&mut state.volume_gets).ok_or_else(|| not_found("Get volume"))
    }

    async fn delete_volume(&self, session: &Session, _volume_id: &str) -> Result<()> {
        self.enter("delete_volume", session).map(|_| ())
    }

    async fn list_volumes(&self, session: &Session) -> Result<Vec<RemoteVolume>> {
        Ok(self.enter("list_volumes", session)?.volumes.clone())
    }

    async fn create_volume_attachment(
        &self,
        session: &Session,
        attachment: &NewVolumeAttachment,
    ) -> Result<RemoteVolumeAttachment> {
        let mut state = self.enter("create_volume_attachment", session)?;
        state.attachment_requests.push(attachment.clone());
        state
            .created_attachment
            .clone()
            .ok_or_else(|| not_found("Create volume attachment"))
    }

    async fn get_volume_attachment(
        &self,
        session: &Session,
        _attachment_id: &str,
    ) -> Result<RemoteVolumeAttachment> {
        let mut state = self.enter("get_volume_attachment", session)?;
        next(&mut state.attachment_gets).ok_or_else(|| not_found("Get volume attachment"))
    }

    async fn delete_volume_attachment(
        &self,
        session: &Session,
        _attachment_id: &str,
    ) -> Result<()> {
        self.enter("delete_volume_attachment", session).map(|_| ())
    }

    async fn list_volume_attachments(
        &self,
        session: &Session,
    ) -> Result<Vec<RemoteVolumeAttachment>> {
        Ok(self.enter("list_volume_attachments", session)?.attachments.clone())
    }

    async fn list_volume_flavors(&self, session: &Session) -> Result<Vec<VolumeFlavor>> {
        Ok(self.enter("list_volume_flavors", session)?.flavors.clone())
    }

    async fn list_capacity_pools(&self, session: &Session) -> Result<Vec<CapacityPool>> {
        Ok(self.enter("list_capacity_pools", session)?.pools.clone())
    }

    async fn get_capacity_pool(&self, session: &Session, pool_id: &str) -> Result<CapacityPool> {
        let state = self.enter("get_capacity_pool", session)?;
        state
            .pools
            .iter()
            .find(|pool| pool.id == pool_id)
            .cloned()
            .ok_or_else(|| not_found("Get capacity pool"))
    }
}

/// Issues a fixed token, or always fails
#[derive(Debug)]
pub struct FakeAuthenticator {
    token: Option<String>,
    logins: AtomicU32,
}

impl FakeAuthenticator {
    pub fn new(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            logins: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            token: None,
            logins: AtomicU32::new(0),
        }
    }

    pub fn logins(&self) -> u32 {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn login(&self, _base_url: &str, _username: &str, _password: &str) -> Result<String> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.token
            .clone()
            .ok_or_else(|| Error::Authentication("invalid username or password".into()))
    }
}
