//! Volume flavor handlers

use super::{forbid, ArgMap, ArgSpec, ExecutionContext, OperationHandler, Outcome, RequestResource};
use crate::domain::model::{Operation, ResourceKind, VolumeFlavor};
use crate::error::{Error, Result};
use async_trait::async_trait;

const LIST_ARGS: ArgSpec = ArgSpec {
    required: &["username", "password"],
    optional: &["format"],
};

impl RequestResource for VolumeFlavor {
    fn from_args(operation: Operation, args: &ArgMap) -> Result<Self> {
        match operation {
            Operation::List => {
                LIST_ARGS.check(ResourceKind::VolumeFlavor, operation, args)?;
                Ok(VolumeFlavor::default())
            }
            other => Err(Error::UnsupportedOperation {
                kind: "sub-command",
                token: other.to_string(),
            }),
        }
    }

    fn validate(&self, _operation: Operation) -> Result<()> {
        forbid(!self.id.is_empty() || !self.name.is_empty(), || {
            "id and/or name is not supported".into()
        })
    }
}

/// Flavors are read-only; only listing is offered
#[derive(Debug, Default, Clone, Copy)]
pub struct ListVolumeFlavorHandler;

#[async_trait]
impl OperationHandler for ListVolumeFlavorHandler {
    type Resource = VolumeFlavor;

    fn kind(&self) -> ResourceKind {
        ResourceKind::VolumeFlavor
    }

    fn operation(&self) -> Operation {
        Operation::List
    }

    async fn execute(&self, _flavor: &VolumeFlavor, ctx: &ExecutionContext<'_>) -> Result<Outcome> {
        let flavors = ctx.client.list_volume_flavors(ctx.session).await?;
        Ok(Outcome::Flavors(flavors))
    }
}
