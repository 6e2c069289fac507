//! Pending ANCS operations.
//!
//! The peer handles one Control Point request at a time, and Data Source
//! fragments carry no request id, so all outbound work is serialized: one
//! op in flight, the rest waiting here in arrival order.
//!
//! The queue only holds *pending* ops.  When the client is idle a pushed op
//! is started at once and never enters the list; the client tracks the
//! in-flight op itself.  A pending (uid, kind) pair appears at most once.

use std::collections::VecDeque;

use log::debug;

use crate::protocol::{ActionId, CategoryId, EventFlags, NotificationUid};

/// One unit of outbound work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOp {
    /// Fetch a notification's attributes (and, on a cache miss, its app name).
    FetchAttributes {
        uid: NotificationUid,
        flags: EventFlags,
        category: CategoryId,
    },
    /// Invoke a positive or negative action on a notification.
    PerformAction {
        uid: NotificationUid,
        action: ActionId,
    },
}

/// Discriminant used for de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    FetchAttributes,
    PerformAction,
}

impl QueueOp {
    pub fn uid(&self) -> NotificationUid {
        match *self {
            Self::FetchAttributes { uid, .. } | Self::PerformAction { uid, .. } => uid,
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Self::FetchAttributes { .. } => OpKind::FetchAttributes,
            Self::PerformAction { .. } => OpKind::PerformAction,
        }
    }

    fn same_key(&self, other: &Self) -> bool {
        self.uid() == other.uid() && self.kind() == other.kind()
    }
}

/// Outcome of [`OperationQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// An op with the same (uid, kind) is already pending; dropped.
    Duplicate,
}

/// FIFO of pending ops with (uid, kind) uniqueness.  Grows with demand;
/// only duplicates are ever refused.
pub struct OperationQueue {
    pending: VecDeque<QueueOp>,
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationQueue {
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Whether an op with the same (uid, kind) is pending.
    pub fn contains(&self, op: &QueueOp) -> bool {
        self.pending.iter().any(|p| p.same_key(op))
    }

    /// Append to the tail unless a duplicate is pending.
    pub fn enqueue(&mut self, op: QueueOp) -> PushOutcome {
        if self.contains(&op) {
            debug!("Queue: dropping duplicate {:?} for uid {}", op.kind(), op.uid());
            return PushOutcome::Duplicate;
        }
        self.pending.push_back(op);
        PushOutcome::Queued
    }

    /// Take the oldest pending op.
    pub fn dequeue(&mut self) -> Option<QueueOp> {
        self.pending.pop_front()
    }

    /// Drop pending fetches for `uid` (the peer removed the notification).
    /// Pending actions are kept; the peer answers them with an error.
    pub fn remove_fetches(&mut self, uid: NotificationUid) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|op| !(op.kind() == OpKind::FetchAttributes && op.uid() == uid));
        before - self.pending.len()
    }

    /// Discard everything.  Returns how many ops were dropped.
    pub fn reset(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueOp> {
        self.pending.iter()
    }
}
