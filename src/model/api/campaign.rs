use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    campaign::{Campaign, CampaignId, CampaignState, Candidate},
    tally::total_votes,
};

fn default_max_ballots() -> u32 {
    1
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("`{field}` must not be empty")));
    }
    Ok(())
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::Validation(format!("`{field}` must be at least 1")));
    }
    Ok(())
}

/// A request to create a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_ballots")]
    pub max_ballots: u32,
    /// Initial state; only `Disabled` and `Enabled` are accepted.
    #[serde(default)]
    pub state: CampaignState,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_positive("max_ballots", self.max_ballots)?;
        if self.state == CampaignState::Finalized {
            return Err(Error::Validation(
                "Campaigns cannot be created finalized".to_string(),
            ));
        }
        Ok(())
    }
}

/// A partial update to a campaign. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ballots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CampaignState>,
}

impl CampaignPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(max_ballots) = self.max_ballots {
            require_positive("max_ballots", max_ballots)?;
        }
        Ok(())
    }
}

/// A request to add a candidate to a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCandidate {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

/// A campaign as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub state: CampaignState,
    pub max_ballots: u32,
    pub candidates: usize,
    pub total_votes: u64,
}

impl From<&Campaign> for CampaignSummary {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            title: campaign.title.clone(),
            description: campaign.description.clone(),
            state: campaign.state,
            max_ballots: campaign.max_ballots,
            candidates: campaign.candidates.len(),
            total_votes: total_votes(campaign),
        }
    }
}

/// A full campaign, without revealing who has voted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDescription {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub state: CampaignState,
    pub max_ballots: u32,
    pub candidates: Vec<Candidate>,
    pub voter_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl From<&Campaign> for CampaignDescription {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            title: campaign.title.clone(),
            description: campaign.description.clone(),
            state: campaign.state,
            max_ballots: campaign.max_ballots,
            candidates: campaign.candidates.clone(),
            voter_count: campaign.voters.len(),
            created_at: campaign.created_at,
            finalized_at: campaign.finalized_at,
        }
    }
}

impl From<Campaign> for CampaignDescription {
    fn from(campaign: Campaign) -> Self {
        Self::from(&campaign)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl NewCampaign {
        pub fn example() -> Self {
            Self {
                title: "Treasurer".to_string(),
                description: "Elect a treasurer for the coming year".to_string(),
                max_ballots: 1,
                state: CampaignState::Disabled,
            }
        }
    }

    impl NewCandidate {
        pub fn example() -> Self {
            Self {
                name: "Dave".to_string(),
                description: "Fiscal responsibility".to_string(),
            }
        }
    }
}
