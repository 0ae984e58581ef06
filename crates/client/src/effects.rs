//! Headless effect player.
//!
//! Stands in for the presentation layer: each effect "plays" for a fixed
//! number of scheduler frames.
use std::collections::HashMap;

use tracing::trace;
use turn_core::{EffectHandle, EffectPlayer, EffectRequest};

#[derive(Debug, Default)]
pub struct PolledEffects {
    polls: u32,
    next: u64,
    frame: u64,
    /// Frame at which each playing effect finishes.
    playing: HashMap<EffectHandle, u64>,
    played: u64,
}

impl PolledEffects {
    /// Effects finish `polls` frames after they start.
    pub fn new(polls: u32) -> Self {
        Self {
            polls,
            ..Self::default()
        }
    }

    /// Effects started so far.
    pub fn played(&self) -> u64 {
        self.played
    }

    /// Effects started but not yet expired.
    pub fn in_flight(&self) -> usize {
        self.playing.len()
    }

    fn expire(&mut self) {
        let frame = self.frame;
        self.playing.retain(|_, finishes_at| *finishes_at > frame);
    }
}

impl EffectPlayer for PolledEffects {
    fn play(&mut self, request: &EffectRequest) -> EffectHandle {
        self.expire();

        self.next += 1;
        self.played += 1;
        let handle = EffectHandle(self.next);
        let finishes_at = self.frame + u64::from(self.polls);
        if finishes_at > self.frame {
            self.playing.insert(handle, finishes_at);
        }

        trace!(
            target: "tactics::effects",
            effect = %request.name,
            anchor = ?request.anchor,
            handle = handle.0,
            finishes_at,
            "effect started"
        );
        handle
    }

    fn is_finished(&self, handle: EffectHandle) -> bool {
        self.playing
            .get(&handle)
            .is_none_or(|&finishes_at| self.frame >= finishes_at)
    }

    fn advance_frame(&mut self) {
        self.frame += 1;
        self.expire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finishes_after_configured_frames() {
        let mut effects = PolledEffects::new(3);
        let handle = effects.play(&EffectRequest::new("slash"));

        assert!(!effects.is_finished(handle));
        effects.advance_frame();
        effects.advance_frame();
        assert!(!effects.is_finished(handle));
        effects.advance_frame();
        assert!(effects.is_finished(handle));
        assert!(effects.is_finished(handle));
    }

    #[test]
    fn repeated_checks_do_not_hasten_completion() {
        let mut effects = PolledEffects::new(2);
        let handle = effects.play(&EffectRequest::new("slash"));

        for _ in 0..10 {
            assert!(!effects.is_finished(handle));
        }
        effects.advance_frame();
        assert!(!effects.is_finished(handle));
        effects.advance_frame();
        assert!(effects.is_finished(handle));
    }

    #[test]
    fn zero_polls_and_unknown_handles_are_finished() {
        let mut effects = PolledEffects::new(0);
        let handle = effects.play(&EffectRequest::new("blink"));

        assert!(effects.is_finished(handle));
        assert!(effects.is_finished(EffectHandle(99)));
        assert_eq!(effects.played(), 1);
        assert_eq!(effects.in_flight(), 0);
    }

    #[test]
    fn unpolled_effects_expire() {
        let mut effects = PolledEffects::new(4);

        // Skipped effects are started but never checked again.
        for _ in 0..1000 {
            effects.play(&EffectRequest::new("strike"));
            effects.advance_frame();
        }

        assert_eq!(effects.played(), 1000);
        assert!(effects.in_flight() <= 4, "{} in flight", effects.in_flight());
    }

    #[test]
    fn effects_started_in_one_frame_expire_together() {
        let mut effects = PolledEffects::new(2);
        for _ in 0..50 {
            effects.play(&EffectRequest::new("enemy_move"));
        }
        assert_eq!(effects.in_flight(), 50);

        effects.advance_frame();
        effects.advance_frame();
        assert_eq!(effects.in_flight(), 0);
    }
}
