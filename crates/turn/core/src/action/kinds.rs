//! Reusable action kinds.

use std::marker::PhantomData;
use std::time::Duration;

use super::{Action, ActionContext, StepResult, Suspension};
use crate::env::{EffectHandle, EffectRequest};

/// Action backed by a closure that is called once per step.
pub struct FnAction<W, F> {
    name: String,
    step: F,
    _world: PhantomData<fn(&mut W)>,
}

/// Wraps a closure as a named action.
///
/// The closure is called on every step and decides its own suspension, so a
/// one-shot closure simply returns `Ok(Suspension::Done)`.
pub fn from_fn<W, F>(name: &str, step: F) -> FnAction<W, F>
where
    F: FnMut(&mut ActionContext<'_, W>) -> StepResult + Send,
{
    FnAction {
        name: name.to_string(),
        step,
        _world: PhantomData,
    }
}

impl<W, F> Action<W> for FnAction<W, F>
where
    F: FnMut(&mut ActionContext<'_, W>) -> StepResult + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult {
        (self.step)(ctx)
    }
}

/// Waits for a span of game time, then finishes.
///
/// A delay marked as a [`Delay::timer`] is a gameplay timer (e.g. an input
/// countdown) and never expires while the `infinite_timer` override is set.
#[derive(Clone, Debug)]
pub struct Delay {
    duration: Duration,
    started: bool,
    gameplay_timer: bool,
}

impl Delay {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: false,
            gameplay_timer: false,
        }
    }

    pub fn timer(duration: Duration) -> Self {
        Self {
            gameplay_timer: true,
            ..Self::new(duration)
        }
    }
}

impl<W> Action<W> for Delay {
    fn name(&self) -> &str {
        if self.gameplay_timer { "Timer" } else { "Delay" }
    }

    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult {
        if !self.started {
            self.started = true;
            if self.duration.is_zero() {
                return Ok(Suspension::Done);
            }
            return Ok(Suspension::ContinueAfter(self.duration));
        }

        if self.gameplay_timer && ctx.overrides().infinite_timer() {
            return Ok(Suspension::Continue);
        }

        Ok(Suspension::Done)
    }
}

/// Plays an effect and waits until the effect player reports it finished.
///
/// With the `force_skip` override set the effect is still fired, but the
/// action finishes without waiting for it.
#[derive(Clone, Debug)]
pub struct PlayEffect {
    request: EffectRequest,
    handle: Option<EffectHandle>,
}

impl PlayEffect {
    pub fn new(request: EffectRequest) -> Self {
        Self {
            request,
            handle: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(EffectRequest::new(name))
    }

    pub fn request(&self) -> &EffectRequest {
        &self.request
    }
}

impl<W> Action<W> for PlayEffect {
    fn name(&self) -> &str {
        "PlayEffect"
    }

    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult {
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = ctx.effects_mut().play(&self.request);
                self.handle = Some(handle);
                handle
            }
        };

        if ctx.overrides().force_skip() || ctx.effects().is_finished(handle) {
            Ok(Suspension::Done)
        } else {
            Ok(Suspension::Continue)
        }
    }
}
