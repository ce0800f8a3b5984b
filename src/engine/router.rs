//! Command routing
//!
//! Static table from {resource kind, operation} to the handler that serves
//! it. Unknown tokens and unsupported pairs are rejected before any
//! argument is inspected.

use crate::domain::model::{Operation, ResourceKind};
use crate::error::{Error, Result};
use crate::handlers::{
    Command, CreateVolumeAttachmentHandler, CreateVolumeHandler, DeleteVolumeAttachmentHandler,
    DeleteVolumeHandler, GetVolumeAttachmentHandler, GetVolumeHandler, ListVolumeAttachmentHandler,
    ListVolumeFlavorHandler, ListVolumeHandler,
};
use std::collections::BTreeMap;

pub struct Router {
    table: BTreeMap<(ResourceKind, Operation), Box<dyn Command>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let commands: Vec<Box<dyn Command>> = vec![
            Box::new(CreateVolumeHandler),
            Box::new(GetVolumeHandler),
            Box::new(DeleteVolumeHandler),
            Box::new(ListVolumeHandler),
            Box::new(CreateVolumeAttachmentHandler),
            Box::new(GetVolumeAttachmentHandler),
            Box::new(DeleteVolumeAttachmentHandler),
            Box::new(ListVolumeAttachmentHandler),
            Box::new(ListVolumeFlavorHandler),
        ];

        Self {
            table: commands.into_iter().map(|c| (c.key(), c)).collect(),
        }
    }

    /// Look up the handler for command-line tokens
    pub fn route(&self, kind: &str, operation: &str) -> Result<&dyn Command> {
        let kind: ResourceKind = kind.parse()?;
        let operation: Operation = operation.parse()?;
        self.get(kind, operation)
    }

    pub fn get(&self, kind: ResourceKind, operation: Operation) -> Result<&dyn Command> {
        self.table
            .get(&(kind, operation))
            .map(|c| c.as_ref())
            .ok_or_else(|| Error::UnsupportedOperation {
                kind: "sub-command",
                token: format!("{} for {}", operation, kind),
            })
    }

    /// Operations available for a resource kind
    pub fn operations(&self, kind: ResourceKind) -> Vec<Operation> {
        self.table
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, op)| *op)
            .collect()
    }
}
