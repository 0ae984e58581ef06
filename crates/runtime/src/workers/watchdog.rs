//! Stuck-suspension detection.

use std::time::Duration;

use tokio::time::Instant;
use turn_core::{ActionId, SuspensionInfo};

use crate::events::WatchdogReport;

/// Watches the suspended slot and reports actions that hold it too long.
///
/// An action that keeps re-suspending (e.g. polling an effect that never
/// finishes) counts as one continuous hold. Time is measured on the wall
/// clock (tokio's, so paused test time works), not game time: a paused game
/// still counts as stalled.
#[derive(Debug)]
pub(crate) struct Watchdog {
    threshold: Option<Duration>,
    watched: Option<Watched>,
}

#[derive(Debug)]
struct Watched {
    action: ActionId,
    since: Instant,
    reported: bool,
}

impl Watchdog {
    pub fn new(threshold: Option<Duration>) -> Self {
        Self {
            threshold,
            watched: None,
        }
    }

    /// Observes the current suspension; returns a report the first time the
    /// suspended action exceeds the threshold.
    pub fn observe(
        &mut self,
        turn: Option<u64>,
        suspension: Option<&SuspensionInfo>,
        now: Instant,
    ) -> Option<WatchdogReport> {
        let threshold = self.threshold?;
        let Some(suspension) = suspension else {
            self.watched = None;
            return None;
        };

        let same = self
            .watched
            .as_ref()
            .is_some_and(|watched| watched.action == suspension.action.id);
        if !same {
            self.watched = Some(Watched {
                action: suspension.action.id,
                since: now,
                reported: false,
            });
            return None;
        }

        let watched = self.watched.as_mut()?;
        let stalled_for = now.saturating_duration_since(watched.since);
        if watched.reported || stalled_for < threshold {
            return None;
        }
        watched.reported = true;

        Some(WatchdogReport {
            turn,
            action: suspension.action.clone(),
            wake: suspension.wake,
            stalled_for,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turn_core::{ActionInfo, Phase, Wake};

    fn suspension(id: u64, since_tick: u64) -> SuspensionInfo {
        SuspensionInfo {
            action: ActionInfo {
                id: ActionId(id),
                name: "AwaitInput".into(),
                phase: Phase::Move,
            },
            wake: Wake::AfterTick(since_tick),
            since_tick,
            since: Duration::ZERO,
        }
    }

    #[test]
    fn reports_once_per_stuck_action() {
        let mut watchdog = Watchdog::new(Some(Duration::from_secs(2)));
        let start = Instant::now();
        let stuck = suspension(7, 3);

        assert!(watchdog.observe(Some(1), Some(&stuck), start).is_none());
        assert!(
            watchdog
                .observe(Some(1), Some(&stuck), start + Duration::from_secs(1))
                .is_none()
        );

        let report = watchdog
            .observe(Some(1), Some(&stuck), start + Duration::from_secs(3))
            .expect("threshold exceeded");
        assert_eq!(report.action.id, ActionId(7));
        assert_eq!(report.stalled_for, Duration::from_secs(3));

        assert!(
            watchdog
                .observe(Some(1), Some(&stuck), start + Duration::from_secs(9))
                .is_none()
        );

        // Re-suspending on a later tick is still the same hold.
        let polled = suspension(7, 40);
        assert!(
            watchdog
                .observe(Some(1), Some(&polled), start + Duration::from_secs(10))
                .is_none()
        );
    }

    #[test]
    fn polling_action_is_reported() {
        let mut watchdog = Watchdog::new(Some(Duration::from_secs(1)));
        let start = Instant::now();

        for tick in 1..=4u64 {
            let at = start + Duration::from_millis(400 * tick);
            let report = watchdog.observe(Some(2), Some(&suspension(3, tick)), at);
            assert_eq!(report.is_some(), tick == 4, "tick {tick}");
        }

        // The next action starts a fresh watch.
        let next = start + Duration::from_secs(5);
        assert!(watchdog.observe(Some(2), Some(&suspension(4, 9)), next).is_none());
        assert!(watchdog.observe(Some(2), None, next).is_none());
    }

    #[test]
    fn disabled_without_threshold() {
        let mut watchdog = Watchdog::new(None);
        let stuck = suspension(1, 1);
        let start = Instant::now();
        assert!(watchdog.observe(None, Some(&stuck), start).is_none());
        assert!(
            watchdog
                .observe(None, Some(&stuck), start + Duration::from_secs(3600))
                .is_none()
        );
    }
}
