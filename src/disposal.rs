// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Deferred destruction of GPU resources.

A texture cannot free its handles when asked to, because work already submitted to the
GPU may still reference them.  Instead it hands a cleanup action to a
[`DisposalScheduler`], which is whatever part of the host knows when that work has drained.

[`DisposalQueue`] is the stock scheduler: a drain queue that runs nothing until someone with
that knowledge calls [`DisposalQueue::drain`] (or hands a [`DisposalBatch`] to the device, as
[`crate::WgpuDevice::drain_disposals_when_idle`] does).
*/

use std::fmt::{Debug, Formatter};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// The cleanup work for one resource.  Runs at most once.
pub type DisposalAction = Box<dyn FnOnce() + Send + 'static>;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

/// Identifies which resource a queued [`DisposalAction`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerToken {
    id: u64,
    label: String,
}

impl OwnerToken {
    pub fn new(label: impl Into<String>) -> Self {
        OwnerToken {
            id: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/**
The authority that knows when GPU work referencing a resource has drained.

Implementations must run each action exactly once, and only after every submission that
could reference the owner's resources has completed.
*/
pub trait DisposalScheduler: Send + Sync {
    fn schedule_disposal(&self, action: DisposalAction, owner: OwnerToken);
}

struct PendingDisposal {
    owner: OwnerToken,
    action: DisposalAction,
}

/// A set of disposals taken out of a [`DisposalQueue`], to be run later as one unit.
pub struct DisposalBatch {
    pending: Vec<PendingDisposal>,
}

impl DisposalBatch {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Runs every action, in the order they were scheduled.  Returns how many ran.
    pub fn run(self) -> usize {
        let count = self.pending.len();
        for pending in self.pending {
            logwise::trace_sync!(
                "disposing {owner}",
                owner = logwise::privacy::LogIt(&pending.owner)
            );
            (pending.action)();
        }
        count
    }
}

impl Debug for DisposalBatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.pending.iter().map(|p| &p.owner))
            .finish()
    }
}

/// A FIFO of scheduled disposals that runs nothing on its own.
#[derive(Default)]
pub struct DisposalQueue {
    pending: Mutex<Vec<PendingDisposal>>,
}

impl DisposalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingDisposal>> {
        // actions never run under this lock, so a poisoned queue is still consistent
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_pending(&self, owner: &OwnerToken) -> bool {
        self.lock().iter().any(|p| p.owner == *owner)
    }

    /// Removes everything scheduled so far without running it.
    pub fn take_batch(&self) -> DisposalBatch {
        DisposalBatch {
            pending: std::mem::take(&mut *self.lock()),
        }
    }

    /// Runs everything scheduled so far.  Returns how many actions ran.
    ///
    /// The caller asserts that the GPU no longer references any of the queued resources.
    pub fn drain(&self) -> usize {
        self.take_batch().run()
    }
}

impl DisposalScheduler for DisposalQueue {
    fn schedule_disposal(&self, action: DisposalAction, owner: OwnerToken) {
        self.lock().push(PendingDisposal { owner, action });
    }
}

impl Debug for DisposalQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn nothing_runs_until_drained() {
        let queue = DisposalQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let move_ran = ran.clone();
        let owner = OwnerToken::new("a");
        queue.schedule_disposal(
            Box::new(move || {
                move_ran.fetch_add(1, Ordering::SeqCst);
            }),
            owner.clone(),
        );
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(queue.is_pending(&owner));
        assert_eq!(queue.drain(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn batches_run_in_schedule_order() {
        let queue = DisposalQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.schedule_disposal(Box::new(move || order.lock().unwrap().push(i)), OwnerToken::new(format!("{i}")));
        }
        let batch = queue.take_batch();
        assert_eq!(batch.len(), 3);
        assert!(queue.is_empty());
        // scheduled after the batch was taken, so not part of it
        let late = order.clone();
        queue.schedule_disposal(Box::new(move || late.lock().unwrap().push(99)), OwnerToken::new("late"));
        assert_eq!(batch.run(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn owner_tokens_are_distinct() {
        let a = OwnerToken::new("same");
        let b = OwnerToken::new("same");
        assert_ne!(a, b);
        assert_eq!(a.label(), b.label());
    }
}
