//! Per-turn state: seeds and the turn context.

use std::time::Duration;

use crate::action::{Action, ActionInfo, BoxedAction, QueuedAction};
use crate::phase::{Phase, PhaseOrder, Side};
use crate::queue::PhaseQueue;

/// Initial actions for a new turn, supplied by the driver.
///
/// Entries keep their insertion order per phase. Phases may be left empty.
pub struct TurnSeed<W> {
    side: Side,
    entries: Vec<(Phase, BoxedAction<W>)>,
}

impl<W> TurnSeed<W> {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, phase: Phase, action: impl Action<W> + 'static) -> Self {
        self.push(phase, action);
        self
    }

    pub fn push(&mut self, phase: Phase, action: impl Action<W> + 'static) {
        self.entries.push((phase, Box::new(action)));
    }

    pub fn push_boxed(&mut self, phase: Phase, action: BoxedAction<W>) {
        self.entries.push((phase, action));
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First phase named by the seed that `order` does not run.
    pub(crate) fn first_unknown_phase(&self, order: &PhaseOrder) -> Option<Phase> {
        self.entries
            .iter()
            .map(|(phase, _)| *phase)
            .find(|phase| !order.contains(*phase))
    }

    pub(crate) fn into_entries(self) -> Vec<(Phase, BoxedAction<W>)> {
        self.entries
    }
}

impl<W> std::fmt::Debug for TurnSeed<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnSeed")
            .field("side", &self.side)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Mutable state scoped to one turn.
///
/// Created by the scheduler when a turn starts and dropped when the last
/// phase drains (or the turn is cancelled). Holds one queue for every phase
/// in the scheduler's phase order, all present from the start of the turn.
pub struct TurnContext<W> {
    number: u64,
    side: Side,
    order: PhaseOrder,
    queues: Vec<PhaseQueue<W>>,
    active: usize,
    current: Option<ActionInfo>,
    jump_request: Option<Phase>,
    started_at: Duration,
    started_tick: u64,
}

impl<W> TurnContext<W> {
    pub(crate) fn new(
        number: u64,
        side: Side,
        order: PhaseOrder,
        started_at: Duration,
        started_tick: u64,
    ) -> Self {
        let queues = order.iter().map(PhaseQueue::new).collect();
        Self {
            number,
            side,
            order,
            queues,
            active: 0,
            current: None,
            jump_request: None,
            started_at,
            started_tick,
        }
    }

    /// Monotonic turn counter, starting at 1.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn phases(&self) -> &PhaseOrder {
        &self.order
    }

    pub fn active_phase(&self) -> Phase {
        self.queues[self.active].phase()
    }

    /// Position of the active phase within the phase order.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Action currently holding control (running or suspended).
    pub fn current_action(&self) -> Option<&ActionInfo> {
        self.current.as_ref()
    }

    /// Phase jump waiting to be applied at the end of the current step.
    pub fn pending_jump(&self) -> Option<Phase> {
        self.jump_request
    }

    /// Game time at which the turn started.
    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn queue(&self, phase: Phase) -> Option<&PhaseQueue<W>> {
        self.order.index_of(phase).map(|index| &self.queues[index])
    }

    pub fn queue_len(&self, phase: Phase) -> usize {
        self.queue(phase).map_or(0, PhaseQueue::len)
    }

    pub fn is_empty(&self, phase: Phase) -> bool {
        self.queue_len(phase) == 0
    }

    /// Identities pending in `phase`, head first.
    pub fn pending(&self, phase: Phase) -> Vec<&ActionInfo> {
        self.queue(phase)
            .map(|queue| queue.pending().collect())
            .unwrap_or_default()
    }

    /// Total number of pending actions across all phases.
    pub fn pending_total(&self) -> usize {
        self.queues.iter().map(PhaseQueue::len).sum()
    }

    /// True when `phase` is before the active phase.
    pub fn has_passed(&self, phase: Phase) -> bool {
        phase < self.active_phase()
    }

    pub(crate) fn started_tick(&self) -> u64 {
        self.started_tick
    }

    pub(crate) fn queue_mut(&mut self, phase: Phase) -> Option<&mut PhaseQueue<W>> {
        self.order
            .index_of(phase)
            .map(|index| &mut self.queues[index])
    }

    pub(crate) fn active_queue_mut(&mut self) -> &mut PhaseQueue<W> {
        &mut self.queues[self.active]
    }

    /// Moves to the next phase. Returns false when the active phase was the last.
    pub(crate) fn advance_phase(&mut self) -> bool {
        if self.active + 1 < self.queues.len() {
            self.active += 1;
            true
        } else {
            false
        }
    }

    /// Jumps forward to `target`, returning the queues of every skipped phase
    /// (the previously active phase included) in phase order.
    pub(crate) fn jump_to(&mut self, target: Phase) -> Vec<(Phase, Vec<QueuedAction<W>>)> {
        let Some(target_index) = self.order.index_of(target) else {
            return Vec::new();
        };
        debug_assert!(target_index > self.active);

        let skipped = self.queues[self.active..target_index]
            .iter_mut()
            .map(|queue| (queue.phase(), queue.drain()))
            .collect();
        self.active = target_index;
        skipped
    }

    pub(crate) fn set_current(&mut self, info: Option<ActionInfo>) {
        self.current = info;
    }

    pub(crate) fn set_jump_request(&mut self, target: Phase) {
        self.jump_request = Some(target);
    }

    pub(crate) fn take_jump_request(&mut self) -> Option<Phase> {
        self.jump_request.take()
    }
}

impl<W> std::fmt::Debug for TurnContext<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnContext")
            .field("number", &self.number)
            .field("side", &self.side)
            .field("active_phase", &self.active_phase())
            .field("queues", &self.queues)
            .field("current", &self.current)
            .finish()
    }
}
