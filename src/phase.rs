//! Conventional worker phases and optional transition policies
//!
//! A tracker accepts any ordering of states. `Phase` names the labels workers
//! use in practice and `TransitionPolicy` lets a caller opt into a stricter
//! edge check through `LifecycleTracker::try_transition`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Phase of a worker's life
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Constructed, main loop not entered yet
    #[default]
    New,
    /// Inside the main loop
    Running,
    /// Main loop exited
    Stopped,
}

impl Phase {
    /// All phases in their conventional order
    pub const ALL: [Phase; 3] = [Phase::New, Phase::Running, Phase::Stopped];

    /// Returns true if no further phase follows
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Running => "running",
            Phase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Phase::New),
            "running" => Ok(Phase::Running),
            "stopped" => Ok(Phase::Stopped),
            other => Err(LifecycleError::InvalidPhase(other.to_string())),
        }
    }
}

/// Decides whether an edge between two states is allowed
pub trait TransitionPolicy<S>: Send + Sync {
    fn allows(&self, from: &S, to: &S) -> bool;
}

impl<S, F> TransitionPolicy<S> for F
where
    F: Fn(&S, &S) -> bool + Send + Sync,
{
    fn allows(&self, from: &S, to: &S) -> bool {
        self(from, to)
    }
}

/// Strictly forward phase policy: new -> running -> stopped, with new -> stopped
/// allowed for workers that never start. Repeats and regressions are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOnly;

impl TransitionPolicy<Phase> for ForwardOnly {
    fn allows(&self, from: &Phase, to: &Phase) -> bool {
        matches!(
            (from, to),
            (Phase::New, Phase::Running) | (Phase::Running, Phase::Stopped) | (Phase::New, Phase::Stopped)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_new() {
        assert_eq!(Phase::default(), Phase::New);
    }

    #[test]
    fn test_phase_is_terminal() {
        assert!(!Phase::New.is_terminal());
        assert!(!Phase::Running.is_terminal());
        assert!(Phase::Stopped.is_terminal());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::New.to_string(), "new");
        assert_eq!(Phase::Running.to_string(), "running");
        assert_eq!(Phase::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("running".parse::<Phase>().unwrap(), Phase::Running);
        assert_eq!(" Stopped ".parse::<Phase>().unwrap(), Phase::Stopped);
        let err = "paused".parse::<Phase>().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidPhase(ref s) if s == "paused"));
    }

    #[test]
    fn test_phase_serialization() {
        let yaml = serde_yaml::to_string(&Phase::Running).unwrap();
        assert_eq!(yaml.trim(), "running");
        let parsed: Phase = serde_yaml::from_str("stopped").unwrap();
        assert_eq!(parsed, Phase::Stopped);
    }

    #[test]
    fn test_forward_only_allows_forward_edges() {
        let policy = ForwardOnly;
        assert!(policy.allows(&Phase::New, &Phase::Running));
        assert!(policy.allows(&Phase::Running, &Phase::Stopped));
        assert!(policy.allows(&Phase::New, &Phase::Stopped));
    }

    #[test]
    fn test_forward_only_rejects_regressions_and_repeats() {
        let policy = ForwardOnly;
        assert!(!policy.allows(&Phase::Stopped, &Phase::Running));
        assert!(!policy.allows(&Phase::Running, &Phase::New));
        assert!(!policy.allows(&Phase::Running, &Phase::Running));
        assert!(!policy.allows(&Phase::Stopped, &Phase::Stopped));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |from: &u8, to: &u8| to > from;
        assert!(policy.allows(&1, &2));
        assert!(!policy.allows(&2, &1));
    }
}
