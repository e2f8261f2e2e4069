use serde::{Deserialize, Serialize};

use super::{Conversation, ConversationId, Message, MessageId};

/// Confirmation phase of a locally held record, orthogonal to its
/// domain status: `Pending` until the repository acknowledges the
/// write, `Confirmed` once it appears in a repository snapshot,
/// `Failed` when the write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Pending,
    Confirmed,
    Failed,
}

/// A record paired with its confirmation phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracked<T> {
    pub value: T,
    pub sync: SyncState,
}

impl<T> Tracked<T> {
    pub fn pending(value: T) -> Self {
        Self {
            value,
            sync: SyncState::Pending,
        }
    }

    pub fn confirmed(value: T) -> Self {
        Self {
            value,
            sync: SyncState::Confirmed,
        }
    }

    pub fn failed(value: T) -> Self {
        Self {
            value,
            sync: SyncState::Failed,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.sync == SyncState::Confirmed
    }
}

/// Identity used to match local records against repository snapshots.
pub trait Identified {
    type Id: Copy + PartialEq;

    fn identity(&self) -> Self::Id;
}

impl Identified for Message {
    type Id = MessageId;

    fn identity(&self) -> MessageId {
        self.id
    }
}

impl Identified for Conversation {
    type Id = ConversationId;

    fn identity(&self) -> ConversationId {
        self.id
    }
}

/// Merge a repository snapshot into local state. The snapshot is
/// authoritative for every record it contains; local entries that have
/// not been confirmed yet (optimistic writes still in flight, or writes
/// that failed and are shown in place) are retained in their original
/// order after the snapshot.
pub fn reconcile<T: Identified + Clone>(local: &[Tracked<T>], snapshot: Vec<T>) -> Vec<Tracked<T>> {
    let mut next: Vec<Tracked<T>> = snapshot.into_iter().map(Tracked::confirmed).collect();

    for entry in local {
        if entry.is_confirmed() {
            continue;
        }
        let already_present = next
            .iter()
            .any(|t| t.value.identity() == entry.value.identity());
        if !already_present {
            next.push(entry.clone());
        }
    }

    next
}
