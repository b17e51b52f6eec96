// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance lifecycle state machine.
//!
//! ```text
//! Created -> Initialized -> Activated -> Processing
//!                 ^             |  ^          |
//!                 +-------------+  +----------+
//! any live state -> Destroyed
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

use clapshim_core::ShimError;
use strum::{Display, IntoStaticStr};

/// Where an instance is in its lifecycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum LifecycleState {
    Created = 0,
    Initialized = 1,
    Activated = 2,
    Processing = 3,
    Destroyed = 4,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Created,
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Activated,
            3 => LifecycleState::Processing,
            _ => LifecycleState::Destroyed,
        }
    }

    /// Every state before destruction.
    pub fn is_live(self) -> bool {
        self != LifecycleState::Destroyed
    }
}

/// A host call that the state machine constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Call {
    Init,
    Activate,
    StartProcessing,
    StopProcessing,
    Deactivate,
    Reset,
    Process,
    Destroy,
}

impl Call {
    /// State the call moves to when issued from `from`, or `None` when the
    /// call is not valid there. Calls that keep the state return `from`.
    pub fn target(self, from: LifecycleState) -> Option<LifecycleState> {
        use LifecycleState::*;
        match (self, from) {
            (Call::Init, Created) => Some(Initialized),
            (Call::Activate, Initialized) => Some(Activated),
            (Call::StartProcessing, Activated) => Some(Processing),
            (Call::StopProcessing, Processing) => Some(Activated),
            (Call::Deactivate, Activated) => Some(Initialized),
            (Call::Reset, state) if state.is_live() => Some(state),
            (Call::Process, Processing) => Some(Processing),
            (Call::Destroy, state) if state.is_live() => Some(Destroyed),
            _ => None,
        }
    }
}

/// Atomic lifecycle cell owned by one instance.
#[derive(Debug)]
pub struct Lifecycle(AtomicU8);

impl Default for Lifecycle {
    fn default() -> Self {
        Self(AtomicU8::new(LifecycleState::Created as u8))
    }
}

impl Lifecycle {
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Validate `call` against the current state.
    ///
    /// Returns the state to commit once the module call has succeeded.
    /// Nothing changes until [`Lifecycle::commit`].
    pub fn check(&self, call: Call) -> Result<LifecycleState, ShimError> {
        let state = self.state();
        call.target(state).ok_or_else(|| ShimError::InvalidTransition {
            call: call.into(),
            state: state.to_string(),
        })
    }

    /// Record a successful transition.
    pub fn commit(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Whether `call` is valid now. Allocation-free, for the audio thread.
    pub fn permits(&self, call: Call) -> bool {
        call.target(self.state()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn table_of_valid_transitions() {
        assert_eq!(Call::Init.target(Created), Some(Initialized));
        assert_eq!(Call::Activate.target(Initialized), Some(Activated));
        assert_eq!(Call::StartProcessing.target(Activated), Some(Processing));
        assert_eq!(Call::StopProcessing.target(Processing), Some(Activated));
        assert_eq!(Call::Deactivate.target(Activated), Some(Initialized));
        assert_eq!(Call::Process.target(Processing), Some(Processing));
        for state in [Created, Initialized, Activated, Processing] {
            assert_eq!(Call::Destroy.target(state), Some(Destroyed));
        }
    }

    #[test]
    fn destroyed_is_terminal() {
        for call in [
            Call::Init,
            Call::Activate,
            Call::StartProcessing,
            Call::StopProcessing,
            Call::Deactivate,
            Call::Reset,
            Call::Process,
            Call::Destroy,
        ] {
            assert_eq!(call.target(Destroyed), None, "{call} after destroy");
        }
    }

    #[test]
    fn permits_follows_the_table() {
        let lifecycle = Lifecycle::default();
        assert!(!lifecycle.permits(Call::Process));
        assert!(lifecycle.permits(Call::Destroy));
        lifecycle.commit(Processing);
        assert!(lifecycle.permits(Call::Process));
        lifecycle.commit(Destroyed);
        assert!(!lifecycle.permits(Call::Process));
        assert!(!lifecycle.permits(Call::Destroy));
    }

    #[test]
    fn reset_keeps_any_live_state() {
        for state in [Created, Initialized, Activated, Processing] {
            assert_eq!(Call::Reset.target(state), Some(state));
        }
        assert_eq!(Call::Reset.target(Destroyed), None);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        assert_eq!(Call::Process.target(Created), None);
        assert_eq!(Call::Process.target(Activated), None);
        assert_eq!(Call::Activate.target(Created), None);
        assert_eq!(Call::Init.target(Initialized), None);
        assert_eq!(Call::Deactivate.target(Processing), None);
        assert_eq!(Call::StartProcessing.target(Initialized), None);
    }

    #[test]
    fn check_does_not_move_the_state() {
        let lifecycle = Lifecycle::default();
        let next = lifecycle.check(Call::Init).unwrap();
        assert_eq!(lifecycle.state(), Created);
        lifecycle.commit(next);
        assert_eq!(lifecycle.state(), Initialized);

        let err = lifecycle.check(Call::Process).unwrap_err();
        assert_eq!(err.to_string(), "process is not valid in state Initialized");
        assert_eq!(lifecycle.state(), Initialized);
    }
}
