use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// States in the campaign lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignState {
    /// Closed to voters, may be reopened.
    Disabled,
    /// Open for voting.
    Enabled,
    /// Voting is over. Terminal.
    Finalized,
}

impl CampaignState {
    /// Is this campaign accepting ballots?
    pub fn is_open(self) -> bool {
        self == Self::Enabled
    }

    /// The state reached by an administrator toggle, if any.
    pub fn toggled(self) -> Option<Self> {
        match self {
            Self::Disabled => Some(Self::Enabled),
            Self::Enabled => Some(Self::Disabled),
            Self::Finalized => None,
        }
    }

    /// Can a campaign move from this state to `target`?
    ///
    /// Staying in the same state is always permitted. `Disabled -> Finalized`
    /// is only reachable when `finalize_from_disabled` is set.
    pub fn can_transition_to(self, target: Self, finalize_from_disabled: bool) -> bool {
        match (self, target) {
            (Self::Finalized, Self::Finalized) => true,
            (Self::Finalized, _) => false,
            (Self::Disabled, Self::Finalized) => finalize_from_disabled,
            _ => true,
        }
    }
}

impl Default for CampaignState {
    fn default() -> Self {
        Self::Disabled
    }
}

impl Display for CampaignState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Disabled => "disabled",
                Self::Enabled => "enabled",
                Self::Finalized => "finalized",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use CampaignState::*;

    #[test]
    fn toggle_is_reversible_until_finalized() {
        assert_eq!(Disabled.toggled(), Some(Enabled));
        assert_eq!(Enabled.toggled(), Some(Disabled));
        assert_eq!(Finalized.toggled(), None);
    }

    #[test]
    fn finalized_is_terminal() {
        for target in [Disabled, Enabled] {
            assert!(!Finalized.can_transition_to(target, true));
        }
        assert!(Finalized.can_transition_to(Finalized, false));
    }

    #[test]
    fn finalize_from_disabled_is_policy() {
        assert!(Enabled.can_transition_to(Finalized, false));
        assert!(!Disabled.can_transition_to(Finalized, false));
        assert!(Disabled.can_transition_to(Finalized, true));
    }

    #[test]
    fn only_enabled_is_open() {
        assert!(Enabled.is_open());
        assert!(!Disabled.is_open());
        assert!(!Finalized.is_open());
    }
}
