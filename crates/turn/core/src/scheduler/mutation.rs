//! Schedule mutations shared by the scheduler API and [`crate::ActionContext`].
//!
//! Both entry points must validate and record rejections identically, so the
//! checks live here and operate on the disjoint pieces of scheduler state.

use std::time::Duration;

use tracing::{debug, info, trace};

use crate::action::{ActionId, ActionInfo, BoxedAction, QueuedAction};
use crate::diagnostic::{DiagnosticCause, Journal, Site};
use crate::error::SchedulingError;
use crate::event::TurnEvent;
use crate::phase::Phase;
use crate::turn::TurnContext;

pub(crate) fn site<W>(turn: &TurnContext<W>, at: Duration) -> Site {
    Site {
        turn: Some(turn.number()),
        phase: Some(turn.active_phase()),
        at,
    }
}

/// Validates and appends `action` to `phase`'s queue.
///
/// A rejected action still consumes an id so its diagnostic can name it; the
/// action itself is dropped.
pub(crate) fn enqueue<W>(
    turn: &mut TurnContext<W>,
    journal: &mut Journal,
    now: Duration,
    phase: Phase,
    action: BoxedAction<W>,
) -> Result<ActionId, SchedulingError> {
    let info = ActionInfo {
        id: journal.allocate_id(),
        name: action.name().to_string(),
        phase,
    };
    let site = site(turn, now);

    if !turn.phases().contains(phase) {
        return Err(journal.reject(site, Some(info), SchedulingError::UnknownPhase { phase }));
    }
    if turn.has_passed(phase) {
        let active = turn.active_phase();
        return Err(journal.reject(
            site,
            Some(info),
            SchedulingError::PhaseAlreadyPassed {
                target: phase,
                active,
            },
        ));
    }

    let id = info.id;
    let turn_number = turn.number();
    match turn.queue_mut(phase) {
        Some(queue) => {
            trace!(
                target: "turn_core::scheduler",
                turn = turn_number,
                action = %info,
                position = queue.len(),
                "enqueued"
            );
            queue.enqueue(QueuedAction { info, action });
            Ok(id)
        }
        None => Err(journal.reject(site, Some(info), SchedulingError::UnknownPhase { phase })),
    }
}

/// Checks that `target` is a phase of this turn strictly after the active one.
pub(crate) fn validate_jump<W>(
    turn: &TurnContext<W>,
    journal: &mut Journal,
    now: Duration,
    target: Phase,
) -> Result<(), SchedulingError> {
    let site = site(turn, now);
    if !turn.phases().contains(target) {
        return Err(journal.reject(site, None, SchedulingError::UnknownPhase { phase: target }));
    }

    let active = turn.active_phase();
    if target <= active {
        return Err(journal.reject(
            site,
            None,
            SchedulingError::InvalidPhaseJump { target, active },
        ));
    }
    Ok(())
}

/// Moves the turn to `target`, discarding everything queued in between.
///
/// Every discarded action gets one diagnostic; every bypassed phase (the one
/// that was active included) gets one [`TurnEvent::PhaseSkipped`].
pub(crate) fn apply_jump<W>(
    turn: &mut TurnContext<W>,
    journal: &mut Journal,
    now: Duration,
    target: Phase,
) {
    let from = turn.active_phase();
    let site = site(turn, now);
    let number = turn.number();

    let mut discarded_total = 0;
    for (phase, discarded) in turn.jump_to(target) {
        let count = discarded.len();
        discarded_total += count;
        for queued in discarded {
            journal.record(
                site,
                Some(queued.info),
                DiagnosticCause::DiscardedByPhaseJump { from, to: target },
            );
        }
        debug!(
            target: "turn_core::scheduler",
            turn = number,
            phase = %phase,
            discarded = count,
            "phase skipped"
        );
        journal.emit(TurnEvent::PhaseSkipped {
            turn: number,
            phase,
            discarded: count,
        });
    }

    info!(
        target: "turn_core::scheduler",
        turn = number,
        from = %from,
        to = %target,
        discarded = discarded_total,
        "phase jump"
    );
    journal.emit(TurnEvent::PhaseEntered {
        turn: number,
        phase: target,
    });
}
