use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        campaign::{CampaignDescription, CampaignPatch, NewCampaign, NewCandidate},
    },
    campaign::{CampaignId, CampaignState, Candidate, CandidateId},
    store::CampaignStore,
};

use super::committed;

pub fn routes() -> Vec<Route> {
    routes![
        create_campaign,
        update_campaign,
        delete_campaign,
        add_candidate,
        remove_candidate,
        toggle_campaign,
        finalize_campaign,
    ]
}

#[post("/campaigns", data = "<spec>", format = "json")]
async fn create_campaign(
    token: AuthToken<Admin>,
    spec: Json<NewCampaign>,
    store: &State<CampaignStore>,
) -> Result<Json<CampaignDescription>> {
    let campaign = committed(store.create_campaign(spec.0).await?);
    debug!("Campaign {} created by {}", campaign.id, token.id);
    Ok(Json(campaign.as_ref().into()))
}

#[patch("/campaigns/<campaign_id>", data = "<patch>", format = "json")]
async fn update_campaign(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    patch: Json<CampaignPatch>,
    store: &State<CampaignStore>,
) -> Result<Json<CampaignDescription>> {
    let campaign = committed(store.update_campaign(campaign_id, patch.0).await?);
    Ok(Json(campaign.into()))
}

#[delete("/campaigns/<campaign_id>")]
async fn delete_campaign(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    store: &State<CampaignStore>,
) -> Json<bool> {
    Json(committed(store.delete_campaign(campaign_id).await))
}

#[post("/campaigns/<campaign_id>/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    spec: Json<NewCandidate>,
    store: &State<CampaignStore>,
) -> Result<Json<Candidate>> {
    let candidate = committed(store.add_candidate(campaign_id, spec.0).await?);
    Ok(Json(candidate))
}

#[delete("/campaigns/<campaign_id>/candidates/<candidate_id>")]
async fn remove_candidate(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    candidate_id: CandidateId,
    store: &State<CampaignStore>,
) -> Result<Json<bool>> {
    let removed = committed(store.remove_candidate(campaign_id, candidate_id).await?);
    Ok(Json(removed))
}

#[post("/campaigns/<campaign_id>/toggle")]
async fn toggle_campaign(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    store: &State<CampaignStore>,
) -> Result<Json<CampaignState>> {
    Ok(Json(committed(store.toggle_campaign(campaign_id).await?)))
}

#[post("/campaigns/<campaign_id>/finalize")]
async fn finalize_campaign(
    _token: AuthToken<Admin>,
    campaign_id: CampaignId,
    store: &State<CampaignStore>,
) -> Result<Json<CampaignDescription>> {
    let campaign = committed(store.finalize_campaign(campaign_id).await?);
    Ok(Json(campaign.into()))
}
