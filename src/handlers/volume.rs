//! Volume handlers

use super::{
    forbid, require, ArgMap, ArgSpec, ExecutionContext, OperationHandler, Outcome,
    RequestResource,
};
use crate::config::read_fuse_mount_point;
use crate::domain::model::{
    find_flavor_id, CapacityPool, Operation, ResourceKind, Volume, VolumeState,
};
use crate::domain::remote::{NewVolume, RemoteVolume};
use crate::engine::poller::reconcile;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const CREATE_ARGS: ArgSpec = ArgSpec {
    required: &["name", "capacity", "location_id", "flavor_name", "username", "password"],
    optional: &["description", "format"],
};

const BY_ID_ARGS: ArgSpec = ArgSpec {
    required: &["volume_id", "username", "password"],
    optional: &["format"],
};

const LIST_ARGS: ArgSpec = ArgSpec {
    required: &["username", "password"],
    optional: &["format"],
};

/// Directory prefix of a visible volume under its cluster
const MOUNT_DIR_PREFIX: &str = "cdc-vol-AV.";

fn arg(args: &ArgMap, key: &str) -> String {
    args.get(key).cloned().unwrap_or_default()
}

impl RequestResource for Volume {
    fn from_args(operation: Operation, args: &ArgMap) -> Result<Self> {
        match operation {
            Operation::Create => {
                CREATE_ARGS.check(ResourceKind::Volume, operation, args)?;
                let capacity = arg(args, "capacity");
                let capacity = capacity.trim().parse::<u64>().map_err(|_| {
                    Error::Argument(format!(
                        "create volume failed with error: invalid value of capacity '{}' is provided",
                        capacity
                    ))
                })?;
                Ok(Volume {
                    name: arg(args, "name"),
                    description: arg(args, "description"),
                    capacity,
                    location_id: arg(args, "location_id"),
                    flavor_name: arg(args, "flavor_name"),
                    ..Default::default()
                })
            }
            Operation::Get | Operation::Delete => {
                BY_ID_ARGS.check(ResourceKind::Volume, operation, args)?;
                Ok(Volume {
                    volume_id: arg(args, "volume_id"),
                    ..Default::default()
                })
            }
            Operation::List => {
                LIST_ARGS.check(ResourceKind::Volume, operation, args)?;
                Ok(Volume::default())
            }
        }
    }

    fn validate(&self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Create => {
                require(!self.name.is_empty(), || {
                    "invalid value of volume name is provided".into()
                })?;
                require(!self.flavor_name.is_empty(), || {
                    "invalid value of volume flavor_name is provided".into()
                })?;
                require(self.capacity > 0, || {
                    "invalid value of volume capacity is provided".into()
                })?;
                require(!self.location_id.is_empty(), || {
                    "invalid value of volume location_id is provided".into()
                })
            }
            Operation::Get | Operation::Delete => {
                require(!self.volume_id.is_empty(), || "volume ID is not provided".into())?;
                self.reject_create_fields()
            }
            Operation::List => {
                forbid(!self.volume_id.is_empty(), || "volume_id is not required".into())?;
                self.reject_create_fields()
            }
        }
    }
}

impl Volume {
    /// Fields only a create request may carry
    fn reject_create_fields(&self) -> Result<()> {
        forbid(!self.flavor_name.is_empty(), || "flavor_name is not supported".into())?;
        forbid(self.capacity != 0, || "capacity is not supported".into())?;
        forbid(!self.location_id.is_empty(), || "location_id is not supported".into())?;
        forbid(!self.description.is_empty(), || "description is not supported".into())?;
        forbid(!self.name.is_empty(), || "volume name is not supported".into())
    }
}

fn is_allocated(v: &RemoteVolume) -> bool {
    v.state == Some(VolumeState::Allocated)
}

fn is_deleted(v: &RemoteVolume) -> bool {
    v.state == Some(VolumeState::Deleted)
}

// =============================================================================
// Handlers
// =============================================================================

/// Resolve the flavor, create, then wait for `allocated`
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateVolumeHandler;

#[async_trait]
impl OperationHandler for CreateVolumeHandler {
    type Resource = Volume;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    fn operation(&self) -> Operation {
        Operation::Create
    }

    async fn execute(&self, volume: &Volume, ctx: &ExecutionContext<'_>) -> Result<Outcome> {
        let flavors = ctx.client.list_volume_flavors(ctx.session).await?;
        let flavor_id = find_flavor_id(&flavors, &volume.flavor_name)?;

        let request = NewVolume {
            name: volume.name.clone(),
            description: volume.description.clone(),
            flavor_id: flavor_id.to_string(),
            capacity: volume.capacity,
            location_id: volume.location_id.clone(),
        };
        let created = ctx.client.create_volume(ctx.session, &request).await?;
        info!("Volume {} created with id {}", created.name, created.id);

        let id = created.id.clone();
        let settled = reconcile(ctx.poll, "Create volume", created, is_allocated, || {
            ctx.client.get_volume(ctx.session, &id)
        })
        .await?;

        Ok(Outcome::Volume(Volume::from_remote(&settled, Operation::Create)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GetVolumeHandler;

#[async_trait]
impl OperationHandler for GetVolumeHandler {
    type Resource = Volume;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    fn operation(&self) -> Operation {
        Operation::Get
    }

    async fn execute(&self, volume: &Volume, ctx: &ExecutionContext<'_>) -> Result<Outcome> {
        let remote = ctx.client.get_volume(ctx.session, &volume.volume_id).await?;
        Ok(Outcome::Volume(Volume::from_remote(&remote, Operation::Get)))
    }
}

/// Delete, then wait for `deleted`
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteVolumeHandler;

#[async_trait]
impl OperationHandler for DeleteVolumeHandler {
    type Resource = Volume;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    fn operation(&self) -> Operation {
        Operation::Delete
    }

    async fn execute(&self, volume: &Volume, ctx: &ExecutionContext<'_>) -> Result<Outcome> {
        ctx.client.delete_volume(ctx.session, &volume.volume_id).await?;
        info!("Volume {} deletion requested", volume.volume_id);

        let pending = RemoteVolume {
            id: volume.volume_id.clone(),
            state: Some(VolumeState::Deleting),
            ..Default::default()
        };
        let settled = reconcile(ctx.poll, "Delete volume", pending, is_deleted, || {
            ctx.client.get_volume(ctx.session, &volume.volume_id)
        })
        .await?;

        Ok(Outcome::Volume(Volume::from_remote(&settled, Operation::Delete)))
    }
}

/// List volumes with their local mount paths
#[derive(Debug, Default, Clone, Copy)]
pub struct ListVolumeHandler;

#[async_trait]
impl OperationHandler for ListVolumeHandler {
    type Resource = Volume;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    fn operation(&self) -> Operation {
        Operation::List
    }

    async fn execute(&self, _volume: &Volume, ctx: &ExecutionContext<'_>) -> Result<Outcome> {
        let remote = ctx.client.list_volumes(ctx.session).await?;
        let mut volumes: Vec<Volume> = remote
            .iter()
            .map(|v| Volume::from_remote(v, Operation::List))
            .collect();

        if let Some(mount_point) = mount_point(ctx) {
            resolve_mount_paths(ctx, &mount_point, &mut volumes).await?;
        }

        Ok(Outcome::Volumes(volumes))
    }
}

// =============================================================================
// Mount Paths
// =============================================================================

fn mount_point(ctx: &ExecutionContext<'_>) -> Option<String> {
    let path = ctx.fuse_conf?;
    match read_fuse_mount_point(path) {
        Ok(Some(mount_point)) => Some(mount_point),
        Ok(None) => {
            warn!("No fuse mount point configured in {}", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read fuse configuration {}: {}", path.display(), e);
            None
        }
    }
}

async fn resolve_mount_paths(
    ctx: &ExecutionContext<'_>,
    mount_point: &str,
    volumes: &mut [Volume],
) -> Result<()> {
    let pools = ctx.client.list_capacity_pools(ctx.session).await?;
    let mut clusters: HashMap<String, String> = HashMap::new();

    for volume in volumes.iter_mut() {
        let Some(pool) = pool_for_flavor(&pools, &volume.flavor_id) else {
            debug!("No capacity pool serves flavor {}", volume.flavor_id);
            continue;
        };

        let cluster = match clusters.get(&pool.id) {
            Some(cluster) => cluster.clone(),
            None => {
                let detail = ctx.client.get_capacity_pool(ctx.session, &pool.id).await?;
                clusters.insert(pool.id.clone(), detail.cluster_name.clone());
                detail.cluster_name
            }
        };

        if volume.state == Some(VolumeState::Visible) {
            volume.mount_path = mount_path(mount_point, &cluster, &volume.volume_id);
        }
    }
    Ok(())
}

fn pool_for_flavor<'a>(pools: &'a [CapacityPool], flavor_id: &str) -> Option<&'a CapacityPool> {
    pools
        .iter()
        .find(|pool| pool.volume_flavors.iter().any(|f| f == flavor_id))
}

/// `<mount point>/<cluster>/cdc-vol-AV.<id without dashes, last 4 chars dropped>`
pub fn mount_path(mount_point: &str, cluster: &str, volume_id: &str) -> String {
    let compact: Vec<char> = volume_id.chars().filter(|c| *c != '-').collect();
    let keep = compact.len().saturating_sub(4);
    let suffix: String = compact[..keep].iter().collect();
    format!(
        "{}/{}/{}{}",
        mount_point.trim_end_matches('/'),
        cluster,
        MOUNT_DIR_PREFIX,
        suffix
    )
}
