//! Collaborator interfaces consumed by actions.
//!
//! The scheduler owns none of these systems. It stores the session's
//! implementations and lends them to each running step through
//! [`crate::ActionContext`]:
//!
//! - [`EffectPlayer`]: fire-and-await visual effects
//! - [`OverrideProvider`]: debug flags that actions consult
//!
//! World state is not abstracted here: it is the `W` type parameter that the
//! session passes to every [`crate::TurnScheduler::tick`].

/// Handle to an effect started through [`EffectPlayer::play`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle(pub u64);

/// Grid coordinate an effect is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Request to play a named effect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRequest {
    pub name: String,
    pub anchor: Option<Anchor>,
}

impl EffectRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anchor: None,
        }
    }

    #[must_use]
    pub fn at(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// Presentation layer that plays effects and reports when they finish.
pub trait EffectPlayer: Send {
    fn play(&mut self, request: &EffectRequest) -> EffectHandle;

    /// Returns true once the effect has run to completion.
    ///
    /// Unknown handles count as finished. Must not change player state.
    fn is_finished(&self, handle: EffectHandle) -> bool;

    /// Called once at the start of every scheduler tick during a turn.
    fn advance_frame(&mut self) {}
}

impl<T: EffectPlayer + ?Sized> EffectPlayer for Box<T> {
    fn play(&mut self, request: &EffectRequest) -> EffectHandle {
        (**self).play(request)
    }

    fn is_finished(&self, handle: EffectHandle) -> bool {
        (**self).is_finished(handle)
    }

    fn advance_frame(&mut self) {
        (**self).advance_frame()
    }
}

/// Effect player for headless sessions: every effect completes immediately.
#[derive(Debug, Default)]
pub struct NullEffects {
    next: u64,
}

impl EffectPlayer for NullEffects {
    fn play(&mut self, _request: &EffectRequest) -> EffectHandle {
        self.next += 1;
        EffectHandle(self.next)
    }

    fn is_finished(&self, _handle: EffectHandle) -> bool {
        true
    }
}

/// Debug/override switches consulted by actions.
///
/// The scheduler never interprets these flags itself.
pub trait OverrideProvider: Send {
    /// Timed waits (e.g. player input timers) should never expire.
    fn infinite_timer(&self) -> bool {
        false
    }

    /// Presentation waits should be skipped.
    fn force_skip(&self) -> bool {
        false
    }

    /// Damage against the player should be ignored.
    fn invincible(&self) -> bool {
        false
    }
}

impl<T: OverrideProvider + ?Sized> OverrideProvider for Box<T> {
    fn infinite_timer(&self) -> bool {
        (**self).infinite_timer()
    }

    fn force_skip(&self) -> bool {
        (**self).force_skip()
    }

    fn invincible(&self) -> bool {
        (**self).invincible()
    }
}

/// Plain override flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugFlags {
    pub infinite_timer: bool,
    pub force_skip: bool,
    pub invincible: bool,
}

impl OverrideProvider for DebugFlags {
    fn infinite_timer(&self) -> bool {
        self.infinite_timer
    }

    fn force_skip(&self) -> bool {
        self.force_skip
    }

    fn invincible(&self) -> bool {
        self.invincible
    }
}
