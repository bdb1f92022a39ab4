use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{
    api::campaign::{CampaignPatch, NewCampaign, NewCandidate},
    campaign::{Campaign, CampaignId, CampaignState, Candidate, CandidateId},
};

use super::{CampaignStore, Committed};

impl CampaignStore {
    /// Create a campaign with a fresh ID, no candidates and no voters.
    pub async fn create_campaign(&self, spec: NewCampaign) -> Result<Committed<Arc<Campaign>>> {
        spec.validate()?;
        let (campaign, snapshot) = {
            let mut collection = self.collection.write().await;
            let id = collection.allocate_id()?;
            let campaign = Arc::new(Campaign::new(
                id,
                spec.title,
                spec.description,
                spec.max_ballots,
                spec.state,
            ));
            collection.campaigns.insert(id, campaign.clone());
            (campaign, collection.commit())
        };
        info!("Created campaign {} ({})", campaign.id, campaign.state);
        let durable = self.persist(snapshot).await;
        Ok(Committed {
            value: campaign,
            durable,
        })
    }

    /// Merge the given fields into an existing campaign. A new state goes
    /// through the usual lifecycle rules.
    pub async fn update_campaign(
        &self,
        campaign_id: CampaignId,
        patch: CampaignPatch,
    ) -> Result<Committed<Campaign>> {
        patch.validate()?;
        let committed = self
            .modify(campaign_id, |campaign, policy| {
                if let Some(state) = patch.state {
                    campaign.set_state(state, policy.finalize_from_disabled)?;
                }
                if let Some(title) = patch.title {
                    campaign.title = title;
                }
                if let Some(description) = patch.description {
                    campaign.description = description;
                }
                if let Some(max_ballots) = patch.max_ballots {
                    campaign.max_ballots = max_ballots;
                }
                Ok(campaign.clone())
            })
            .await?;
        info!("Updated campaign {campaign_id}");
        Ok(committed)
    }

    /// Delete a campaign along with its candidates and voter set.
    /// Returns whether anything was deleted; a missing campaign is not an error.
    pub async fn delete_campaign(&self, campaign_id: CampaignId) -> Committed<bool> {
        let snapshot = {
            let mut collection = self.collection.write().await;
            if collection.campaigns.remove(&campaign_id).is_none() {
                return Committed {
                    value: false,
                    durable: true,
                };
            }
            collection.commit()
        };
        info!("Deleted campaign {campaign_id}");
        let durable = self.persist(snapshot).await;
        Committed {
            value: true,
            durable,
        }
    }

    /// Append a candidate with zero votes.
    pub async fn add_candidate(
        &self,
        campaign_id: CampaignId,
        spec: NewCandidate,
    ) -> Result<Committed<Candidate>> {
        spec.validate()?;
        let committed = self
            .modify(campaign_id, |campaign, _| {
                Ok(campaign.push_candidate(spec.name, spec.description)?.clone())
            })
            .await?;
        info!(
            "Added candidate {} to campaign {campaign_id}",
            committed.value.id
        );
        Ok(committed)
    }

    /// Remove a candidate. Returns whether anything was removed; a missing
    /// campaign or candidate is not an error.
    pub async fn remove_candidate(
        &self,
        campaign_id: CampaignId,
        candidate_id: CandidateId,
    ) -> Result<Committed<bool>> {
        let nothing = Committed {
            value: false,
            durable: true,
        };
        let snapshot = {
            let mut collection = self.collection.write().await;
            let current = match collection.campaigns.get(&campaign_id) {
                Some(campaign) => campaign,
                None => return Ok(nothing),
            };
            let votes = match current.candidate(candidate_id) {
                Some(candidate) => candidate.votes,
                None => return Ok(nothing),
            };
            if self.policy.protect_voted_candidates && votes > 0 {
                return Err(Error::Validation(format!(
                    "Candidate {candidate_id} already has {votes} vote(s)"
                )));
            }
            let mut updated = Campaign::clone(current);
            updated.remove_candidate(candidate_id);
            collection.campaigns.insert(campaign_id, Arc::new(updated));
            collection.commit()
        };
        info!("Removed candidate {candidate_id} from campaign {campaign_id}");
        let durable = self.persist(snapshot).await;
        Ok(Committed {
            value: true,
            durable,
        })
    }

    /// Flip a campaign between disabled and enabled.
    pub async fn toggle_campaign(&self, campaign_id: CampaignId) -> Result<Committed<CampaignState>> {
        let committed = self
            .modify(campaign_id, |campaign, _| {
                let target = campaign.state.toggled().ok_or(Error::InvalidTransition {
                    from: campaign.state,
                    to: CampaignState::Enabled,
                })?;
                campaign.state = target;
                Ok(target)
            })
            .await?;
        info!("Campaign {campaign_id} is now {}", committed.value);
        Ok(committed)
    }

    /// Close a campaign for good.
    pub async fn finalize_campaign(&self, campaign_id: CampaignId) -> Result<Committed<Campaign>> {
        let committed = self
            .modify(campaign_id, |campaign, policy| {
                if campaign.state == CampaignState::Finalized {
                    return Err(Error::InvalidTransition {
                        from: CampaignState::Finalized,
                        to: CampaignState::Finalized,
                    });
                }
                campaign.set_state(CampaignState::Finalized, policy.finalize_from_disabled)?;
                Ok(campaign.clone())
            })
            .await?;
        info!("Finalized campaign {campaign_id}");
        Ok(committed)
    }
}
