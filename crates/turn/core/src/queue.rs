//! Per-phase FIFO of pending actions.

use std::collections::VecDeque;

use crate::action::{ActionInfo, QueuedAction};
use crate::phase::Phase;

/// Ordered queue of actions bound to one phase.
///
/// Order is insertion order: no priorities, no reordering. Actions leave
/// through [`PhaseQueue::dequeue`] exactly once and are never put back.
pub struct PhaseQueue<W> {
    phase: Phase,
    items: VecDeque<QueuedAction<W>>,
    dequeued: u64,
}

impl<W> PhaseQueue<W> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            items: VecDeque::new(),
            dequeued: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Appends at the tail, even while the phase is draining.
    pub fn enqueue(&mut self, action: QueuedAction<W>) {
        debug_assert_eq!(action.info.phase, self.phase);
        self.items.push_back(action);
    }

    /// Removes and returns the head.
    pub fn dequeue(&mut self) -> Option<QueuedAction<W>> {
        let head = self.items.pop_front()?;
        self.dequeued += 1;
        Some(head)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of actions consumed from this queue so far.
    pub fn dequeued(&self) -> u64 {
        self.dequeued
    }

    /// Identities of the pending actions, head first.
    pub fn pending(&self) -> impl Iterator<Item = &ActionInfo> {
        self.items.iter().map(|queued| &queued.info)
    }

    /// Removes every pending action without running it.
    pub fn drain(&mut self) -> Vec<QueuedAction<W>> {
        self.items.drain(..).collect()
    }
}

impl<W> std::fmt::Debug for PhaseQueue<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseQueue")
            .field("phase", &self.phase)
            .field("pending", &self.items.len())
            .field("dequeued", &self.dequeued)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionId, from_fn};
    use crate::Suspension;

    fn queued(id: u64, name: &str) -> QueuedAction<()> {
        QueuedAction {
            info: ActionInfo {
                id: ActionId(id),
                name: name.to_string(),
                phase: Phase::Move,
            },
            action: Box::new(from_fn::<(), _>(name, |_| Ok(Suspension::Done))),
        }
    }

    #[test]
    fn dequeues_in_insertion_order() {
        let mut queue = PhaseQueue::new(Phase::Move);
        queue.enqueue(queued(1, "a"));
        queue.enqueue(queued(2, "b"));
        queue.enqueue(queued(3, "c"));

        let names: Vec<_> = queue.pending().map(|info| info.name.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert_eq!(queue.dequeue().unwrap().info.id, ActionId(1));
        queue.enqueue(queued(4, "d"));
        assert_eq!(queue.dequeue().unwrap().info.id, ActionId(2));
        assert_eq!(queue.dequeue().unwrap().info.id, ActionId(3));
        assert_eq!(queue.dequeue().unwrap().info.id, ActionId(4));
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.dequeued(), 4);
    }

    #[test]
    fn drain_empties_without_counting_as_dequeued() {
        let mut queue = PhaseQueue::new(Phase::Move);
        queue.enqueue(queued(1, "a"));
        queue.enqueue(queued(2, "b"));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.dequeued(), 0);
    }
}
