use mongodb::{bson::doc, options::ReplaceOptions, Client, Collection, Database};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::campaign::{Campaign, CampaignId};

use super::Persistence;

/// Name of the collection holding one document per campaign.
pub const CAMPAIGNS: &str = "campaigns";

/// A campaign as stored in the database, keyed by its ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CampaignDoc {
    #[serde(rename = "_id")]
    id: CampaignId,
    #[serde(flatten)]
    campaign: Campaign,
}

/// Stores each campaign as its own MongoDB document.
#[derive(Debug, Clone)]
pub struct MongoPersistence {
    db: Database,
}

impl MongoPersistence {
    /// Connect to the given server and use the named database.
    pub async fn connect(db_uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(db_uri).await?;
        Ok(Self {
            db: client.database(db_name),
        })
    }

    fn campaigns(&self) -> Collection<CampaignDoc> {
        self.db.collection(CAMPAIGNS)
    }

    async fn collection_exists(&self) -> Result<bool> {
        let names = self.db.list_collection_names(None).await?;
        Ok(names.iter().any(|name| name == CAMPAIGNS))
    }
}

#[rocket::async_trait]
impl Persistence for MongoPersistence {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn load(&self) -> Result<Option<Vec<Campaign>>> {
        if !self.collection_exists().await? {
            return Ok(None);
        }
        let mut campaigns: Vec<Campaign> = self
            .campaigns()
            .find(None, None)
            .await?
            .map_ok(|doc| doc.campaign)
            .try_collect()
            .await?;
        campaigns.sort_by_key(|c| c.id);
        Ok(Some(campaigns))
    }

    async fn save(&self, campaigns: &[Campaign]) -> Result<()> {
        let coll = self.campaigns();

        // Drop anything that has since been deleted.
        let ids: Vec<CampaignId> = campaigns.iter().map(|c| c.id).collect();
        coll.delete_many(doc! { "_id": { "$nin": ids } }, None)
            .await?;

        if campaigns.is_empty() && !self.collection_exists().await? {
            // Record that the store has been initialised, even if empty.
            self.db.create_collection(CAMPAIGNS, None).await?;
        }

        let upsert = ReplaceOptions::builder().upsert(true).build();
        for campaign in campaigns {
            let stored = CampaignDoc {
                id: campaign.id,
                campaign: campaign.clone(),
            };
            coll.replace_one(doc! { "_id": campaign.id }, &stored, upsert.clone())
                .await?;
        }
        Ok(())
    }
}

/// These need a MongoDB server, named by the `MONGODB_URI` environment
/// variable. Without it they pass without touching anything.
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::model::store::{CampaignStore, StorePolicy};

    use super::*;

    /// A fresh database for one test, or `None` if no server is configured.
    async fn scratch_db(test: &str) -> Option<MongoPersistence> {
        let uri = match std::env::var("MONGODB_URI") {
            Ok(uri) => uri,
            Err(_) => {
                warn!("MONGODB_URI not set, skipping {test}");
                return None;
            }
        };
        let persistence = MongoPersistence::connect(&uri, &format!("ballotbox-test-{test}"))
            .await
            .unwrap();
        persistence.db.drop(None).await.unwrap();
        Some(persistence)
    }

    fn campaigns() -> Vec<Campaign> {
        let mut first = Campaign::example();
        first.record_ballot(2, "v1").unwrap();
        let mut second = Campaign::example();
        second.id = 2;
        second.title = "Second".to_string();
        vec![first, second]
    }

    #[rocket::async_test]
    async fn save_then_load() {
        let Some(persistence) = scratch_db("save_then_load").await else {
            return;
        };
        assert_eq!(persistence.load().await.unwrap(), None);

        let campaigns = campaigns();
        persistence.save(&campaigns).await.unwrap();
        assert_eq!(persistence.load().await.unwrap(), Some(campaigns));

        persistence.db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn deleted_campaigns_are_dropped() {
        let Some(persistence) = scratch_db("deleted_campaigns_are_dropped").await else {
            return;
        };
        let mut campaigns = campaigns();
        persistence.save(&campaigns).await.unwrap();

        campaigns.remove(0);
        campaigns[0].title = "Renamed".to_string();
        persistence.save(&campaigns).await.unwrap();
        assert_eq!(persistence.load().await.unwrap(), Some(campaigns));

        persistence.save(&[]).await.unwrap();
        assert_eq!(persistence.load().await.unwrap(), Some(vec![]));

        persistence.db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn emptied_store_is_not_reseeded() {
        let Some(persistence) = scratch_db("emptied_store_is_not_reseeded").await else {
            return;
        };
        let persistence = Arc::new(persistence);

        let store = CampaignStore::open(persistence.clone(), StorePolicy::default(), true)
            .await
            .unwrap();
        assert_eq!(store.campaigns().await.len(), 1);
        assert!(store.delete_campaign(1).await.durable);

        let store = CampaignStore::open(persistence.clone(), StorePolicy::default(), true)
            .await
            .unwrap();
        assert!(store.campaigns().await.is_empty());

        persistence.db.drop(None).await.unwrap();
    }
}
