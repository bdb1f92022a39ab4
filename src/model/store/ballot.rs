use crate::error::{Error, Result};
use crate::model::{
    campaign::{CampaignId, CandidateId},
    tally::Tally,
};

use super::{CampaignStore, Committed};

impl CampaignStore {
    /// Cast one ballot for `candidate_id` on behalf of `voter_id`.
    ///
    /// The voter-set check and the vote increment happen under a single write
    /// lock, so of any number of concurrent attempts by one voter on one
    /// campaign exactly one succeeds.
    pub async fn cast_ballot(
        &self,
        campaign_id: CampaignId,
        candidate_id: CandidateId,
        voter_id: &str,
    ) -> Result<Committed<Tally>> {
        let result = self
            .modify(campaign_id, |campaign, policy| {
                // A repeat ballot is reported as such whatever the state.
                if campaign.has_voted(voter_id) {
                    return Err(Error::AlreadyVoted(campaign_id));
                }
                if policy.enforce_open_state && !campaign.state.is_open() {
                    return Err(Error::CampaignNotOpen {
                        campaign_id,
                        state: campaign.state,
                    });
                }
                campaign.record_ballot(candidate_id, voter_id)?;
                Ok(Tally::from(&*campaign))
            })
            .await;

        match &result {
            Ok(committed) => info!(
                "Ballot cast in campaign {campaign_id} ({} total)",
                committed.value.total_votes
            ),
            Err(e) => debug!("Ballot rejected in campaign {campaign_id}: {e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::tokio;

    use crate::model::{
        campaign::{Campaign, CampaignState},
        store::{tests::store_with, StorePolicy},
        tally::total_votes,
    };

    use super::*;

    #[rocket::async_test]
    async fn scenario() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;

        let tally = store.tally(1).await.unwrap();
        assert_eq!(tally.total_votes, 0);
        assert!(tally.candidates.iter().all(|c| c.percentage == 0.0));

        let tally = store.cast_ballot(1, 1, "v1").await.unwrap().value;
        assert_eq!(tally.candidates[0].votes, 1);
        assert_eq!(tally.total_votes, 1);
        assert_eq!(tally.candidates[0].percentage, 100.0);

        let tally = store.cast_ballot(1, 2, "v2").await.unwrap().value;
        assert_eq!(tally.total_votes, 2);
        assert_eq!(tally.candidates[0].percentage, 50.0);
        assert_eq!(tally.candidates[1].percentage, 50.0);

        let before = store.campaign(1).await.unwrap();
        assert!(matches!(
            store.cast_ballot(1, 3, "v1").await,
            Err(Error::AlreadyVoted(1))
        ));
        assert_eq!(store.campaign(1).await.unwrap(), before);
    }

    #[rocket::async_test]
    async fn second_ballot_always_rejected() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;
        store.cast_ballot(1, 2, "v1").await.unwrap();
        for candidate in [1, 2, 3, 99] {
            assert!(matches!(
                store.cast_ballot(1, candidate, "v1").await,
                Err(Error::AlreadyVoted(1))
            ));
        }
    }

    #[rocket::async_test]
    async fn repeat_ballot_after_closing() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;
        store.cast_ballot(1, 1, "v1").await.unwrap();
        store.finalize_campaign(1).await.unwrap();
        assert!(matches!(
            store.cast_ballot(1, 2, "v1").await,
            Err(Error::AlreadyVoted(1))
        ));
        // Newcomers are still turned away because voting is over.
        assert!(matches!(
            store.cast_ballot(1, 2, "v2").await,
            Err(Error::CampaignNotOpen { .. })
        ));
    }

    #[rocket::async_test]
    async fn unknown_candidate() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;
        assert!(matches!(
            store.cast_ballot(1, 42, "v1").await,
            Err(Error::CandidateNotFound {
                campaign_id: 1,
                candidate_id: 42
            })
        ));
        // The voter keeps their ballot.
        assert!(!store.has_voted(1, "v1").await.unwrap());
        store.cast_ballot(1, 1, "v1").await.unwrap();
    }

    #[rocket::async_test]
    async fn unknown_campaign() {
        let (store, _) = store_with(vec![], StorePolicy::default()).await;
        assert!(matches!(
            store.cast_ballot(1, 1, "v1").await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn closed_campaigns_reject_ballots() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;
        store.finalize_campaign(1).await.unwrap();
        assert!(matches!(
            store.cast_ballot(1, 1, "v1").await,
            Err(Error::CampaignNotOpen {
                campaign_id: 1,
                state: CampaignState::Finalized
            })
        ));

        let mut disabled = Campaign::example();
        disabled.state = CampaignState::Disabled;
        let (store, _) = store_with(vec![disabled], StorePolicy::default()).await;
        assert!(matches!(
            store.cast_ballot(1, 1, "v1").await,
            Err(Error::CampaignNotOpen { .. })
        ));
    }

    #[rocket::async_test]
    async fn unhardened_store_accepts_ballots_when_closed() {
        let policy = StorePolicy {
            enforce_open_state: false,
            ..Default::default()
        };
        let (store, _) = store_with(vec![Campaign::example()], policy).await;
        store.finalize_campaign(1).await.unwrap();
        let tally = store.cast_ballot(1, 1, "v1").await.unwrap().value;
        assert_eq!(tally.total_votes, 1);
        assert_eq!(tally.state, CampaignState::Finalized);
    }

    #[rocket::async_test]
    async fn totals_match_voters() {
        let (store, _) = store_with(vec![Campaign::example()], StorePolicy::default()).await;
        for i in 0..30 {
            let candidate = i % 3 + 1;
            store.cast_ballot(1, candidate, &format!("v{i}")).await.unwrap();
            // Some repeat attempts along the way.
            let _ = store.cast_ballot(1, candidate, &format!("v{}", i / 2)).await;
        }
        let campaign = store.campaign(1).await.unwrap();
        assert_eq!(total_votes(&campaign), campaign.voters.len() as u64);
        assert_eq!(campaign.voters.len(), 30);
    }

    #[test]
    fn concurrent_ballots_same_voter() {
        const ATTEMPTS: usize = 64;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(8)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let (store, _) =
                store_with(vec![Campaign::example()], StorePolicy::default()).await;
            let store = Arc::new(store);
            let barrier = Arc::new(tokio::sync::Barrier::new(ATTEMPTS));

            let handles: Vec<_> = (0..ATTEMPTS)
                .map(|i| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        let candidate = (i % 3) as CandidateId + 1;
                        store.cast_ballot(1, candidate, "v1").await
                    })
                })
                .collect();

            let mut successes = 0;
            let mut already_voted = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => successes += 1,
                    Err(Error::AlreadyVoted(1)) => already_voted += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(successes, 1);
            assert_eq!(already_voted, ATTEMPTS - 1);

            let campaign = store.campaign(1).await.unwrap();
            assert_eq!(total_votes(&campaign), 1);
            assert_eq!(campaign.voters.len(), 1);
        });
    }

    #[test]
    fn concurrent_ballots_many_voters() {
        const VOTERS: usize = 50;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let (store, persistence) =
                store_with(vec![Campaign::example()], StorePolicy::default()).await;
            let store = Arc::new(store);

            let handles: Vec<_> = (0..VOTERS)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        let candidate = (i % 3) as CandidateId + 1;
                        store.cast_ballot(1, candidate, &format!("v{i}")).await
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let campaign = store.campaign(1).await.unwrap();
            assert_eq!(total_votes(&campaign), VOTERS as u64);
            assert_eq!(campaign.voters.len(), VOTERS);

            // The newest state is what ends up stored.
            let saved = persistence.saved().await.unwrap();
            assert_eq!(saved[0].voters.len(), VOTERS);
        });
    }
}
