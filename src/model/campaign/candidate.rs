use serde::{Deserialize, Serialize};

use super::CandidateId;

/// An option within a campaign that accumulates votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique ID within the owning campaign.
    pub id: CandidateId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Ballots cast for this candidate.
    pub votes: u64,
}

impl Candidate {
    pub fn new(id: CandidateId, name: String, description: String) -> Self {
        Self {
            id,
            name,
            description,
            votes: 0,
        }
    }
}
