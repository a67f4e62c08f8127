//! State-change events published by a [`Registry`](crate::Registry).

use crate::instance::InstanceId;
use crate::json::LeakStatus;

/// One applied registry mutation.
///
/// Events are enqueued while the registry lock is held, so every subscriber
/// sees them in the order the mutations were applied. `status` is the
/// aggregate status right after the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered {
        type_name: String,
        id: InstanceId,
        current_count: usize,
        status: LeakStatus,
    },
    Deregistered {
        type_name: String,
        id: InstanceId,
        current_count: usize,
        status: LeakStatus,
    },
    MaxAllowedChanged {
        type_name: String,
        max_allowed: i64,
        status: LeakStatus,
    },
}

impl RegistryEvent {
    pub fn type_name(&self) -> &str {
        match self {
            RegistryEvent::Registered { type_name, .. }
            | RegistryEvent::Deregistered { type_name, .. }
            | RegistryEvent::MaxAllowedChanged { type_name, .. } => type_name,
        }
    }

    pub fn status(&self) -> LeakStatus {
        match self {
            RegistryEvent::Registered { status, .. }
            | RegistryEvent::Deregistered { status, .. }
            | RegistryEvent::MaxAllowedChanged { status, .. } => *status,
        }
    }
}
