//! Composite action running children back to back.

use std::collections::VecDeque;

use super::{Action, ActionContext, BoxedAction, StepResult, Suspension};

/// Runs child actions one after another inside a single queue slot.
///
/// # Semantics
///
/// - Children run strictly in order; a child is only started after the
///   previous one reached `Done`
/// - Children that finish synchronously are chained within the same step
/// - A child's suspension becomes the sequence's suspension
/// - If a child fails, the sequence fails and the remaining children are
///   dropped without running
///
/// Unlike enqueueing the children separately, nothing else from the phase
/// queue can run between them.
pub struct Sequence<W> {
    name: String,
    children: VecDeque<BoxedAction<W>>,
}

impl<W> Sequence<W> {
    pub fn new(name: impl Into<String>, children: Vec<BoxedAction<W>>) -> Self {
        Self {
            name: name.into(),
            children: children.into(),
        }
    }

    #[must_use]
    pub fn then(mut self, child: impl Action<W> + 'static) -> Self {
        self.children.push_back(Box::new(child));
        self
    }

    pub fn remaining(&self) -> usize {
        self.children.len()
    }
}

impl<W> Action<W> for Sequence<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut ActionContext<'_, W>) -> StepResult {
        while let Some(child) = self.children.front_mut() {
            match child.step(ctx)? {
                Suspension::Done => {
                    self.children.pop_front();
                }
                pending => return Ok(pending),
            }
        }
        Ok(Suspension::Done)
    }
}
