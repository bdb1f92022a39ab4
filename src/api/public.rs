use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::campaign::{CampaignDescription, CampaignSummary},
    campaign::CampaignId,
    store::CampaignStore,
    tally::Tally,
};

pub fn routes() -> Vec<Route> {
    routes![campaigns, campaign, tally]
}

#[get("/campaigns")]
async fn campaigns(store: &State<CampaignStore>) -> Json<Vec<CampaignSummary>> {
    let summaries = store
        .campaigns()
        .await
        .iter()
        .map(|c| CampaignSummary::from(c.as_ref()))
        .collect();
    Json(summaries)
}

#[get("/campaigns/<campaign_id>")]
async fn campaign(
    campaign_id: CampaignId,
    store: &State<CampaignStore>,
) -> Result<Json<CampaignDescription>> {
    let campaign = store.campaign(campaign_id).await?;
    Ok(Json(campaign.as_ref().into()))
}

#[get("/campaigns/<campaign_id>/tally")]
async fn tally(campaign_id: CampaignId, store: &State<CampaignStore>) -> Result<Json<Tally>> {
    Ok(Json(store.tally(campaign_id).await?))
}
