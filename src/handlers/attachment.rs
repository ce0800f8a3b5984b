//! Volume attachment handlers

use super::{
    forbid, require, ArgMap, ArgSpec, ExecutionContext, OperationHandler, Outcome,
    RequestResource,
};
use crate::domain::model::{AttachmentState, Operation, ResourceKind, VolumeAttachment};
use crate::domain::remote::{NewVolumeAttachment, RemoteVolumeAttachment};
use crate::engine::poller::reconcile;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

const CREATE_ARGS: ArgSpec = ArgSpec {
    required: &["name", "volume_id", "username", "password"],
    optional: &["format"],
};

const BY_ID_ARGS: ArgSpec = ArgSpec {
    required: &["attachment_id", "username", "password"],
    optional: &["format"],
};

const LIST_ARGS: ArgSpec = ArgSpec {
    required: &["username", "password"],
    optional: &["format"],
};

impl RequestResource for VolumeAttachment {
    fn from_args(operation: Operation, args: &ArgMap) -> Result<Self> {
        let spec = match operation {
            Operation::Create => CREATE_ARGS,
            Operation::Get | Operation::Delete => BY_ID_ARGS,
            Operation::List => LIST_ARGS,
        };
        spec.check(ResourceKind::VolumeAttachment, operation, args)?;

        let value = |key: &str| args.get(key).cloned().unwrap_or_default();
        Ok(VolumeAttachment {
            name: value("name"),
            volume_id: value("volume_id"),
            attachment_id: value("attachment_id"),
            ..Default::default()
        })
    }

    fn validate(&self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Create => {
                require(!self.name.is_empty(), || {
                    "invalid value of volume attachment name is provided".into()
                })?;
                require(!self.volume_id.is_empty(), || "volume ID is not provided".into())
            }
            Operation::Get | Operation::Delete => {
                require(!self.attachment_id.is_empty(), || {
                    "volume attachment ID is not provided".into()
                })?;
                forbid(!self.name.is_empty(), || "attachment name is not supported".into())?;
                forbid(!self.volume_id.is_empty(), || "volume_id is not supported".into())
            }
            Operation::List => {
                forbid(!self.attachment_id.is_empty(), || {
                    "attachment_id is not supported".into()
                })?;
                forbid(!self.name.is_empty(), || {
                    "volume attachment name is not supported".into()
                })?;
                forbid(!self.volume_id.is_empty(), || "volume_id is not supported".into())
            }
        }
    }
}

fn is_ready(a: &RemoteVolumeAttachment) -> bool {
    a.state == Some(AttachmentState::Ready)
}

fn is_deleted(a: &RemoteVolumeAttachment) -> bool {
    a.state == Some(AttachmentState::Deleted)
}

/// Attach over fuse, then wait for `ready`
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateVolumeAttachmentHandler;

#[async_trait]
impl OperationHandler for CreateVolumeAttachmentHandler {
    type Resource = VolumeAttachment;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeAttachment
    }

    fn operation(&self) -> Operation {
        Operation::Create
    }

    async fn execute(
        &self,
        attachment: &VolumeAttachment,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Outcome> {
        let request = NewVolumeAttachment::new(&attachment.name, &attachment.volume_id);
        let created = ctx
            .client
            .create_volume_attachment(ctx.session, &request)
            .await?;
        info!(
            "Volume attachment {} created for volume {}",
            created.id, attachment.volume_id
        );

        let id = created.id.clone();
        let settled = reconcile(
            ctx.poll,
            "Create volume attachment",
            created,
            is_ready,
            || ctx.client.get_volume_attachment(ctx.session, &id),
        )
        .await?;

        Ok(Outcome::Attachment(VolumeAttachment::from_remote(
            &settled,
            Operation::Create,
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GetVolumeAttachmentHandler;

#[async_trait]
impl OperationHandler for GetVolumeAttachmentHandler {
    type Resource = VolumeAttachment;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeAttachment
    }

    fn operation(&self) -> Operation {
        Operation::Get
    }

    async fn execute(
        &self,
        attachment: &VolumeAttachment,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Outcome> {
        let remote = ctx
            .client
            .get_volume_attachment(ctx.session, &attachment.attachment_id)
            .await?;
        Ok(Outcome::Attachment(VolumeAttachment::from_remote(
            &remote,
            Operation::Get,
        )))
    }
}

/// Detach, then wait for `deleted`
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteVolumeAttachmentHandler;

#[async_trait]
impl OperationHandler for DeleteVolumeAttachmentHandler {
    type Resource = VolumeAttachment;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeAttachment
    }

    fn operation(&self) -> Operation {
        Operation::Delete
    }

    async fn execute(
        &self,
        attachment: &VolumeAttachment,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Outcome> {
        let id = &attachment.attachment_id;
        ctx.client.delete_volume_attachment(ctx.session, id).await?;
        info!("Volume attachment {} deletion requested", id);

        let pending = RemoteVolumeAttachment {
            id: id.clone(),
            state: Some(AttachmentState::Deleting),
            ..Default::default()
        };
        let settled = reconcile(
            ctx.poll,
            "Delete volume attachment",
            pending,
            is_deleted,
            || ctx.client.get_volume_attachment(ctx.session, id),
        )
        .await?;

        Ok(Outcome::Attachment(VolumeAttachment::from_remote(
            &settled,
            Operation::Delete,
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ListVolumeAttachmentHandler;

#[async_trait]
impl OperationHandler for ListVolumeAttachmentHandler {
    type Resource = VolumeAttachment;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeAttachment
    }

    fn operation(&self) -> Operation {
        Operation::List
    }

    async fn execute(
        &self,
        _attachment: &VolumeAttachment,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Outcome> {
        let remote = ctx.client.list_volume_attachments(ctx.session).await?;
        Ok(Outcome::Attachments(
            remote
                .iter()
                .map(|a| VolumeAttachment::from_remote(a, Operation::List))
                .collect(),
        ))
    }
}
