use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{AuthToken, Voter},
        ballot::{BallotSpec, VoteStatus},
    },
    campaign::CampaignId,
    store::CampaignStore,
    tally::Tally,
};

use super::committed;

pub fn routes() -> Vec<Route> {
    routes![vote_status, cast_ballot]
}

#[get("/campaigns/<campaign_id>/ballots/me")]
async fn vote_status(
    token: AuthToken<Voter>,
    campaign_id: CampaignId,
    store: &State<CampaignStore>,
) -> Result<Json<VoteStatus>> {
    let has_voted = store.has_voted(campaign_id, &token.id).await?;
    Ok(Json(VoteStatus { has_voted }))
}

#[post("/campaigns/<campaign_id>/ballots", data = "<ballot>", format = "json")]
async fn cast_ballot(
    token: AuthToken<Voter>,
    campaign_id: CampaignId,
    ballot: Json<BallotSpec>,
    store: &State<CampaignStore>,
) -> Result<Json<Tally>> {
    // The session is the only source of truth for who is voting.
    if let Some(ref voter_id) = ballot.voter_id {
        if voter_id != &token.id {
            return Err(Error::Forbidden(format!(
                "Cannot cast a ballot as '{voter_id}'"
            )));
        }
    }

    let tally = store
        .cast_ballot(campaign_id, ballot.candidate_id, &token.id)
        .await?;
    Ok(Json(committed(tally)))
}
