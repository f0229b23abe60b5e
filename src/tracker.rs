//! Blocking lifecycle state tracker
//!
//! Holds one current state and lets other threads block until a specific state
//! is published. The tracker itself enforces no transition graph; attach a
//! `TransitionPolicy` and use `try_transition` to opt into validation.
//!
//! Waiters are registered as tickets under the same lock `transition` takes.
//! A transition marks every ticket whose target equals the new state as
//! satisfied before releasing the lock, so a waiter registered when the state
//! becomes `S` observes `S` even if the state moves on before it is scheduled.
//! Targets that were skipped, or passed before registration, never satisfy
//! the ticket.

use std::collections::HashSet;
use std::fmt;

use parking_lot::{Condvar, Mutex};

use crate::error::{LifecycleError, Result};
use crate::phase::{Phase, TransitionPolicy};

struct Inner<S> {
    state: S,
    next_ticket: u64,
    pending: Vec<(u64, S)>,
    satisfied: HashSet<u64>,
}

/// Current-state holder with blocking waits on exact states
pub struct LifecycleTracker<S = Phase> {
    inner: Mutex<Inner<S>>,
    changed: Condvar,
    policy: Option<Box<dyn TransitionPolicy<S>>>,
}

impl<S> LifecycleTracker<S>
where
    S: Clone + PartialEq + fmt::Debug,
{
    /// Create a tracker starting at `S::default()`
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::with_initial(S::default())
    }

    /// Create a tracker starting at `initial`
    pub fn with_initial(initial: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                next_ticket: 0,
                pending: Vec::new(),
                satisfied: HashSet::new(),
            }),
            changed: Condvar::new(),
            policy: None,
        }
    }

    /// Attach a policy consulted by `try_transition`
    pub fn with_policy(mut self, policy: impl TransitionPolicy<S> + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> S {
        self.inner.lock().state.clone()
    }

    /// Number of threads currently blocked in `wait_for_state`
    pub fn waiter_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Set the state unconditionally and wake every blocked waiter
    pub fn transition(&self, new_state: S) {
        let mut inner = self.inner.lock();
        self.publish(&mut inner, new_state);
    }

    /// Set the state if the attached policy allows the edge.
    ///
    /// Without a policy this behaves like `transition`. A rejected edge leaves
    /// the state and all waiters untouched.
    pub fn try_transition(&self, new_state: S) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(policy) = &self.policy {
            if !policy.allows(&inner.state, &new_state) {
                return Err(LifecycleError::InvalidTransition {
                    from: format!("{:?}", inner.state),
                    to: format!("{:?}", new_state),
                });
            }
        }
        self.publish(&mut inner, new_state);
        Ok(())
    }

    /// Block until the tracker is in `target`, then return it.
    ///
    /// Returns immediately if the current state already equals `target`.
    /// Blocks forever if `target` is never published after this call.
    pub fn wait_for_state(&self, target: S) -> S {
        let mut inner = self.inner.lock();
        if inner.state == target {
            return target;
        }

        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.pending.push((ticket, target.clone()));
        log::trace!("Waiter {} registered for {:?}", ticket, target);

        while !inner.satisfied.remove(&ticket) {
            self.changed.wait(&mut inner);
        }
        target
    }

    fn publish(&self, inner: &mut Inner<S>, new_state: S) {
        let previous = std::mem::replace(&mut inner.state, new_state);
        let woken = inner.pending.len();

        let Inner {
            state,
            pending,
            satisfied,
            ..
        } = inner;
        pending.retain(|(ticket, target)| {
            if *target == *state {
                satisfied.insert(*ticket);
                false
            } else {
                true
            }
        });

        log::debug!(
            "Lifecycle transition {:?} -> {:?} (woke {} waiters, {} satisfied)",
            previous,
            state,
            woken,
            woken - pending.len()
        );
        self.changed.notify_all();
    }
}

impl<S> Default for LifecycleTracker<S>
where
    S: Clone + PartialEq + fmt::Debug + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug> fmt::Debug for LifecycleTracker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LifecycleTracker")
            .field("state", &inner.state)
            .field("waiters", &inner.pending.len())
            .field("has_policy", &self.policy.is_some())
            .finish()
    }
}
