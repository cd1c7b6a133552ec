//! Shadow lifecycle state machine
//!
//! `Constructed -> Initializing -> Live -> (Reloading -> Live)* -> Disposing -> Disposed`

use crate::error::{BridgeError, BridgeResult};

/// Current state of a shadow's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowState {
    /// Created by the factory, nothing called yet
    Constructed,
    /// `initialize` ran, waiting for `post_initialize`
    Initializing,
    /// Receiving updates
    Live,
    /// A reload was accepted, waiting for `post_reload`
    Reloading,
    /// Teardown in progress
    Disposing,
    /// Terminal
    Disposed,
}

/// Things that move a shadow between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First initialization hook
    Initialize,
    /// Second initialization hook
    PostInitialize,
    /// Reload chain started
    Reload,
    /// A reload participant returned false
    ReloadVetoed,
    /// Reload completed
    PostReload,
    /// Disposal started
    Dispose,
    /// Disposal finished
    DisposeComplete,
}

impl ShadowState {
    /// Next state for `event`, or an invalid-state error if the transition is illegal
    pub fn transition(self, event: LifecycleEvent) -> BridgeResult<Self> {
        use LifecycleEvent as E;

        let next = match (self, event) {
            (Self::Constructed, E::Initialize) => Self::Initializing,
            (Self::Initializing, E::PostInitialize) => Self::Live,
            (Self::Live, E::Reload) => Self::Reloading,
            (Self::Reloading, E::ReloadVetoed | E::PostReload) => Self::Live,
            (Self::Disposing | Self::Disposed, E::Dispose) | (Self::Disposed, _) => {
                return Err(BridgeError::InvalidState(format!(
                    "{event:?} requested for a disposed shadow"
                )))
            }
            (_, E::Dispose) => Self::Disposing,
            (Self::Disposing, E::DisposeComplete) => Self::Disposed,
            _ => {
                return Err(BridgeError::InvalidState(format!(
                    "{event:?} is not allowed while the shadow is {self:?}"
                )))
            }
        };

        log::trace!("Shadow state {self:?} -> {next:?} on {event:?}");
        Ok(next)
    }

    /// Whether per-frame calls are accepted
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Whether teardown started or finished
    pub const fn is_disposed(self) -> bool {
        matches!(self, Self::Disposing | Self::Disposed)
    }

    /// Fail unless per-frame calls are accepted
    pub fn require_live(self, operation: &str) -> BridgeResult<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(BridgeError::InvalidState(format!(
                "{operation} requires a live shadow, current state is {self:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let mut state = ShadowState::Constructed;
        for event in [
            LifecycleEvent::Initialize,
            LifecycleEvent::PostInitialize,
            LifecycleEvent::Reload,
            LifecycleEvent::PostReload,
            LifecycleEvent::Reload,
            LifecycleEvent::ReloadVetoed,
            LifecycleEvent::Dispose,
            LifecycleEvent::DisposeComplete,
        ] {
            state = state.transition(event).unwrap();
        }
        assert_eq!(state, ShadowState::Disposed);
    }

    #[test]
    fn test_dispose_allowed_from_any_live_state() {
        for state in [
            ShadowState::Constructed,
            ShadowState::Initializing,
            ShadowState::Live,
            ShadowState::Reloading,
        ] {
            assert_eq!(
                state.transition(LifecycleEvent::Dispose).unwrap(),
                ShadowState::Disposing
            );
        }
    }

    #[test]
    fn test_dispose_complete_only_after_dispose() {
        for state in [
            ShadowState::Constructed,
            ShadowState::Initializing,
            ShadowState::Live,
            ShadowState::Reloading,
        ] {
            assert!(state
                .transition(LifecycleEvent::DisposeComplete)
                .unwrap_err()
                .is_invalid_state());
        }
        assert_eq!(
            ShadowState::Disposing
                .transition(LifecycleEvent::DisposeComplete)
                .unwrap(),
            ShadowState::Disposed
        );
        assert!(ShadowState::Disposed
            .transition(LifecycleEvent::DisposeComplete)
            .is_err());
    }

    #[test]
    fn test_disposed_is_terminal() {
        let err = ShadowState::Disposed
            .transition(LifecycleEvent::Initialize)
            .unwrap_err();
        assert!(err.is_invalid_state());
        assert!(ShadowState::Disposing
            .transition(LifecycleEvent::Dispose)
            .is_err());
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(ShadowState::Constructed
            .transition(LifecycleEvent::PostInitialize)
            .is_err());
        assert!(ShadowState::Live
            .transition(LifecycleEvent::PostReload)
            .is_err());
        assert!(ShadowState::Initializing
            .transition(LifecycleEvent::Reload)
            .is_err());
        assert!(ShadowState::Live.require_live("update").is_ok());
        assert!(ShadowState::Reloading.require_live("update").is_err());
    }
}
