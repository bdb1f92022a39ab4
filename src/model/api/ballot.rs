use serde::{Deserialize, Serialize};

use crate::model::campaign::{CandidateId, VoterId};

/// A ballot that the voter wishes to cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    pub candidate_id: CandidateId,
    /// Optional; if given, it must match the authenticated voter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_id: Option<VoterId>,
}

/// Whether the requesting voter has already cast their ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStatus {
    pub has_voted: bool,
}
