//! Normalized tabular view of operation results
//!
//! The renderer only ever sees a [`DisplayContent`]; which columns appear
//! is fixed per resource kind and operation.

use crate::domain::model::{Operation, Volume, VolumeAttachment, VolumeFlavor};
use serde::Serialize;

/// Ordered column headers plus stringified rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayContent {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayContent {
    /// Tabulate a single resource
    pub fn from_item<T: TableDisplay>(item: &T, operation: Operation) -> Self {
        Self::from_items(std::slice::from_ref(item), operation)
    }

    /// Tabulate a sequence of resources under one header
    pub fn from_items<T: TableDisplay>(items: &[T], operation: Operation) -> Self {
        Self {
            header: T::headers(operation).iter().map(|h| h.to_string()).collect(),
            rows: items.iter().map(|item| item.row(operation)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resources that can be shown as a table row
pub trait TableDisplay {
    fn headers(operation: Operation) -> &'static [&'static str];
    fn row(&self, operation: Operation) -> Vec<String>;
}

fn or_empty<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

impl TableDisplay for Volume {
    fn headers(operation: Operation) -> &'static [&'static str] {
        match operation {
            Operation::Create | Operation::Get => {
                &["NAME", "ID", "FLAVOR_ID", "CAPACITY", "STATUS", "STATE"]
            }
            Operation::List => &["NAME", "ID", "MOUNT_PATH"],
            Operation::Delete => &["ID", "STATE"],
        }
    }

    fn row(&self, operation: Operation) -> Vec<String> {
        match operation {
            Operation::Create | Operation::Get => vec![
                self.name.clone(),
                self.volume_id.clone(),
                self.flavor_id.clone(),
                self.capacity.to_string(),
                or_empty(self.status.as_ref()),
                or_empty(self.state.as_ref()),
            ],
            Operation::List => vec![
                self.name.clone(),
                self.volume_id.clone(),
                self.mount_path.clone(),
            ],
            Operation::Delete => vec![self.volume_id.clone(), or_empty(self.state.as_ref())],
        }
    }
}

impl TableDisplay for VolumeAttachment {
    fn headers(operation: Operation) -> &'static [&'static str] {
        match operation {
            Operation::Create | Operation::List => &["NAME", "ID", "VOLUME_ID", "STATE"],
            Operation::Get => &[
                "NAME",
                "ID",
                "VOLUME_ID",
                "STATE",
                "STORAGE_ID",
                "USER_NAME",
                "TICKET",
                "TICKET_EXPIRY_TIME",
            ],
            Operation::Delete => &["ID", "STATE"],
        }
    }

    fn row(&self, operation: Operation) -> Vec<String> {
        let mut row = match operation {
            Operation::Delete => {
                return vec![self.attachment_id.clone(), or_empty(self.state.as_ref())]
            }
            _ => vec![
                self.name.clone(),
                self.attachment_id.clone(),
                self.volume_id.clone(),
                or_empty(self.state.as_ref()),
            ],
        };

        if operation == Operation::Get {
            let fs = self.fs_config.clone().unwrap_or_default();
            row.extend([fs.storage_id, fs.user_name, fs.ticket, fs.ticket_expiry_time]);
        }
        row
    }
}

impl TableDisplay for VolumeFlavor {
    fn headers(_operation: Operation) -> &'static [&'static str] {
        &["NAME", "ID"]
    }

    fn row(&self, _operation: Operation) -> Vec<String> {
        vec![self.name.clone(), self.id.clone()]
    }
}
