//! Configuration readiness states and the atomic cell that publishes them.
//!
//! [`ConfigurationState`] is the service-level judgment of whether loaded
//! configuration is usable. [`StateCell`] holds the single authoritative
//! value and enforces the transition table: `NotStarted -> Loading ->
//! {Succeeded, Failed}`, with `NotStarted` also allowed to jump straight to
//! a terminal state. Terminal states never change.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ConfigGateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationState {
    /// Before any load attempt.
    NotStarted,
    /// Cache populated, content not yet judged.
    Loading,
    /// Configuration loaded and accepted.
    Succeeded,
    /// Configuration loading or validation failed.
    Failed,
}

impl ConfigurationState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Loading | Self::Succeeded | Self::Failed)
                | (Self::Loading, Self::Succeeded | Self::Failed)
        )
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Loading => 1,
            Self::Succeeded => 2,
            Self::Failed => 3,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Loading,
            2 => Self::Succeeded,
            3 => Self::Failed,
            _ => Self::NotStarted,
        }
    }
}

impl fmt::Display for ConfigurationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Loading => write!(f, "loading"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ConfigurationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "loading" => Ok(Self::Loading),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid configuration state: {s}")),
        }
    }
}

/// Lock-free holder for the current [`ConfigurationState`].
#[derive(Debug)]
pub struct StateCell {
    raw: AtomicU8,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(0),
        }
    }

    #[must_use]
    pub fn load(&self) -> ConfigurationState {
        ConfigurationState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move to `next`, returning the previous state.
    ///
    /// Re-setting the current state succeeds without change. Writers racing
    /// on the same cell are serialized by compare-and-swap, so a terminal
    /// state can never be overwritten.
    pub fn transition(
        &self,
        next: ConfigurationState,
    ) -> Result<ConfigurationState, ConfigGateError> {
        let mut current = self.raw.load(Ordering::Acquire);
        loop {
            let from = ConfigurationState::from_u8(current);
            if from == next {
                return Ok(from);
            }
            if !from.can_transition_to(next) {
                return Err(ConfigGateError::InvalidStateTransition { from, to: next });
            }
            match self.raw.compare_exchange(
                current,
                next.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(from),
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConfigurationState::{Failed, Loading, NotStarted, Succeeded};

    #[test]
    fn new_cell_starts_not_started() {
        assert_eq!(StateCell::new().load(), NotStarted);
    }

    #[test]
    fn transition_table() {
        let all = [NotStarted, Loading, Succeeded, Failed];
        let allowed = [
            (NotStarted, Loading),
            (NotStarted, Succeeded),
            (NotStarted, Failed),
            (Loading, Succeeded),
            (Loading, Failed),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_state_is_sticky() {
        let cell = StateCell::new();
        cell.transition(Loading).unwrap();
        assert_eq!(cell.transition(Succeeded).unwrap(), Loading);

        let err = cell.transition(Failed).unwrap_err();
        assert!(matches!(
            err,
            ConfigGateError::InvalidStateTransition {
                from: Succeeded,
                to: Failed
            }
        ));
        assert_eq!(cell.load(), Succeeded);
    }

    #[test]
    fn same_state_is_noop() {
        let cell = StateCell::new();
        cell.transition(Failed).unwrap();
        assert_eq!(cell.transition(Failed).unwrap(), Failed);
    }

    #[test]
    fn loading_cannot_return_to_not_started() {
        let cell = StateCell::new();
        cell.transition(Loading).unwrap();
        assert!(cell.transition(NotStarted).is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for state in [NotStarted, Loading, Succeeded, Failed] {
            assert_eq!(state.to_string().parse::<ConfigurationState>(), Ok(state));
        }
        assert!("ready".parse::<ConfigurationState>().is_err());
    }
}
