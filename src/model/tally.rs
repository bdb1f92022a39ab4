//! Read-only vote totals and percentages for display.

use serde::{Deserialize, Serialize};

use crate::model::campaign::{Campaign, CampaignId, CampaignState, Candidate, CandidateId};

/// Sum of all candidate vote counters.
pub fn total_votes(campaign: &Campaign) -> u64 {
    campaign.candidates.iter().map(|c| c.votes).sum()
}

/// Share of the total held by one candidate, in percent, rounded to one
/// decimal place. Zero when no votes have been cast.
pub fn percentage(candidate: &Candidate, campaign: &Campaign) -> f64 {
    percentage_of(candidate.votes, total_votes(campaign))
}

fn percentage_of(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = votes as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// The tally of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
    pub percentage: f64,
}

/// The full tally of a campaign. Candidates appear in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub campaign_id: CampaignId,
    pub title: String,
    pub state: CampaignState,
    pub total_votes: u64,
    /// Number of distinct voters who have cast a ballot.
    pub voters: u64,
    pub candidates: Vec<CandidateTally>,
}

impl From<&Campaign> for Tally {
    fn from(campaign: &Campaign) -> Self {
        let total = total_votes(campaign);
        let candidates = campaign
            .candidates
            .iter()
            .map(|c| CandidateTally {
                id: c.id,
                name: c.name.clone(),
                votes: c.votes,
                percentage: percentage_of(c.votes, total),
            })
            .collect();
        Self {
            campaign_id: campaign.id,
            title: campaign.title.clone(),
            state: campaign.state,
            total_votes: total,
            voters: campaign.voters.len() as u64,
            candidates,
        }
    }
}
