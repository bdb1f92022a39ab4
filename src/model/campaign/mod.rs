use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

mod candidate;
mod state;

pub use candidate::Candidate;
pub use state::CampaignState;

/// Our campaign IDs are integers, allocated in creation order.
pub type CampaignId = u32;
/// Our candidate IDs are integers, unique within their campaign.
pub type CandidateId = u32;
/// Voter IDs come verbatim from the identity provider.
pub type VoterId = String;

/// A single election campaign, owning its candidates and voter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique ID.
    pub id: CampaignId,
    /// Campaign title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Lifecycle state.
    pub state: CampaignState,
    /// Ballots each voter may cast. Currently informational: every voter
    /// gets exactly one ballot.
    pub max_ballots: u32,
    /// Candidates in display order.
    pub candidates: Vec<Candidate>,
    /// Everyone who has already cast their ballot.
    pub voters: BTreeSet<VoterId>,
    /// The ID the next added candidate will receive.
    #[serde(default)]
    pub next_candidate_id: CandidateId,
    /// When the campaign was created.
    pub created_at: DateTime<Utc>,
    /// When the campaign was finalized, if it has been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Create a new campaign with no candidates and no voters.
    pub fn new(
        id: CampaignId,
        title: String,
        description: String,
        max_ballots: u32,
        state: CampaignState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            state,
            max_ballots,
            candidates: Vec::new(),
            voters: BTreeSet::new(),
            next_candidate_id: 1,
            created_at: now,
            finalized_at: (state == CampaignState::Finalized).then_some(now),
        }
    }

    /// Get the candidate with the given ID.
    pub fn candidate(&self, candidate_id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }

    /// Has this voter already used their ballot?
    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.voters.contains(voter_id)
    }

    /// Append a candidate with a fresh ID and zero votes.
    pub fn push_candidate(&mut self, name: String, description: String) -> Result<&Candidate> {
        let id = self.next_candidate_id;
        self.next_candidate_id = self.candidate_id_after(id)?;
        self.candidates.push(Candidate::new(id, name, description));
        Ok(&self.candidates[self.candidates.len() - 1])
    }

    fn candidate_id_after(&self, id: CandidateId) -> Result<CandidateId> {
        id.checked_add(1).ok_or_else(|| {
            Error::Validation(format!("Campaign {} has no candidate IDs left", self.id))
        })
    }

    /// Remove a candidate. Returns whether anything was removed.
    pub fn remove_candidate(&mut self, candidate_id: CandidateId) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id != candidate_id);
        self.candidates.len() != before
    }

    /// Move to a new lifecycle state, stamping `finalized_at` on finalization.
    pub fn set_state(&mut self, target: CampaignState, finalize_from_disabled: bool) -> Result<()> {
        if !self.state.can_transition_to(target, finalize_from_disabled) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        if target == CampaignState::Finalized && self.state != CampaignState::Finalized {
            self.finalized_at = Some(Utc::now());
        }
        self.state = target;
        Ok(())
    }

    /// Record one ballot for `candidate_id` by `voter_id`.
    ///
    /// Leaves the campaign untouched on error.
    pub fn record_ballot(&mut self, candidate_id: CandidateId, voter_id: &str) -> Result<()> {
        if self.has_voted(voter_id) {
            return Err(Error::AlreadyVoted(self.id));
        }
        let campaign_id = self.id;
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
            .ok_or(Error::CandidateNotFound {
                campaign_id,
                candidate_id,
            })?;
        candidate.votes += 1;
        self.voters.insert(voter_id.to_string());
        Ok(())
    }

    /// Bring the candidate ID counter past every existing candidate.
    /// Needed for campaigns loaded from stores written by hand.
    pub(crate) fn repair_candidate_counter(&mut self) -> Result<()> {
        let past_max = match self.candidates.iter().map(|c| c.id).max() {
            Some(max) => self.candidate_id_after(max)?,
            None => 1,
        };
        self.next_candidate_id = self.next_candidate_id.max(past_max);
        Ok(())
    }
}

/// Example test data.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl Campaign {
        /// An enabled campaign with three candidates and no votes.
        pub fn example() -> Self {
            let mut campaign = Self::new(
                1,
                "Board Election".to_string(),
                "Elect the new board of directors".to_string(),
                1,
                CampaignState::Enabled,
            );
            for (name, description) in [
                ("Alice", "Infrastructure"),
                ("Bob", "Sustainability"),
                ("Carol", "Innovation"),
            ] {
                campaign
                    .push_candidate(name.to_string(), description.to_string())
                    .unwrap();
            }
            campaign
        }
    }
}
