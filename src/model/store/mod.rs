//! The campaign store: sole owner of all mutable election state.
//!
//! Every mutation clones the affected campaign, edits the clone and swaps it
//! in under the collection-wide write lock, so readers holding an earlier
//! `Arc<Campaign>` keep a consistent snapshot. The new collection is then
//! handed to the persistence adapter after the lock is released.

use std::collections::BTreeMap;
use std::sync::Arc;

use rocket::tokio::sync::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::model::{
    campaign::{Campaign, CampaignId, CampaignState},
    persistence::Persistence,
    tally::Tally,
};

mod admin;
mod ballot;

/// Business rules that differ between deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorePolicy {
    /// Reject ballots for campaigns that are not enabled.
    pub enforce_open_state: bool,
    /// Allow disabled campaigns to be finalized directly.
    pub finalize_from_disabled: bool,
    /// Refuse to remove candidates that have already received votes, which
    /// would break `total votes == voters`.
    pub protect_voted_candidates: bool,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            enforce_open_state: true,
            finalize_from_disabled: false,
            protect_voted_candidates: true,
        }
    }
}

/// The result of a committed mutation.
///
/// The in-memory change always stands; `durable` reports whether the
/// persistence adapter confirmed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub durable: bool,
}

impl<T> Committed<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// The state guarded by the store lock.
struct Collection {
    campaigns: BTreeMap<CampaignId, Arc<Campaign>>,
    next_id: CampaignId,
    /// Bumped on every mutation.
    generation: u64,
}

impl Collection {
    fn new(campaigns: Vec<Campaign>) -> Result<Self> {
        let next_id = match campaigns.iter().map(|c| c.id).max() {
            Some(max) => campaign_id_after(max)?,
            None => 1,
        };
        let campaigns = campaigns
            .into_iter()
            .map(|mut c| {
                c.repair_candidate_counter()?;
                Ok((c.id, Arc::new(c)))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            campaigns,
            next_id,
            generation: 0,
        })
    }

    /// Take the next campaign ID, refusing the last one so the counter
    /// never wraps onto an existing campaign.
    fn allocate_id(&mut self) -> Result<CampaignId> {
        let id = self.next_id;
        self.next_id = campaign_id_after(id)?;
        Ok(id)
    }

    /// Mark a mutation and capture the collection as it now stands.
    fn commit(&mut self) -> Snapshot {
        self.generation += 1;
        Snapshot {
            generation: self.generation,
            campaigns: self.campaigns.values().cloned().collect(),
        }
    }
}

fn campaign_id_after(id: CampaignId) -> Result<CampaignId> {
    id.checked_add(1)
        .ok_or_else(|| Error::Validation("No campaign IDs left".to_string()))
}

/// The collection at a particular generation, ready to be saved.
struct Snapshot {
    generation: u64,
    campaigns: Vec<Arc<Campaign>>,
}

pub struct CampaignStore {
    collection: RwLock<Collection>,
    persistence: Arc<dyn Persistence>,
    /// Generation most recently written by the persistence adapter.
    saved_generation: Mutex<u64>,
    policy: StorePolicy,
}

impl CampaignStore {
    /// Create a store over an already-loaded collection.
    fn new(
        campaigns: Vec<Campaign>,
        persistence: Arc<dyn Persistence>,
        policy: StorePolicy,
    ) -> Result<Self> {
        Ok(Self {
            collection: RwLock::new(Collection::new(campaigns)?),
            persistence,
            saved_generation: Mutex::new(0),
            policy,
        })
    }

    /// Load the collection from `persistence`. If nothing has been stored
    /// yet, start empty, or with the example campaign if `seed` is set.
    pub async fn open(
        persistence: Arc<dyn Persistence>,
        policy: StorePolicy,
        seed: bool,
    ) -> Result<Self> {
        let (campaigns, fresh) = match persistence.load().await? {
            Some(campaigns) => (campaigns, false),
            None if seed => (vec![seed_campaign(1)?], true),
            None => (Vec::new(), true),
        };
        info!(
            "Loaded {} campaign(s) from {} store",
            campaigns.len(),
            persistence.name()
        );
        let store = Self::new(campaigns, persistence, policy)?;
        if fresh {
            let snapshot = store.collection.write().await.commit();
            store.persist(snapshot).await;
        }
        Ok(store)
    }

    /// Name of the backing persistence adapter.
    pub fn persistence_name(&self) -> &'static str {
        self.persistence.name()
    }

    /// All campaigns, in creation order.
    pub async fn campaigns(&self) -> Vec<Arc<Campaign>> {
        self.collection
            .read()
            .await
            .campaigns
            .values()
            .cloned()
            .collect()
    }

    /// A snapshot of a single campaign.
    pub async fn campaign(&self, campaign_id: CampaignId) -> Result<Arc<Campaign>> {
        self.collection
            .read()
            .await
            .campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Campaign {campaign_id}")))
    }

    /// The current tally of a campaign.
    pub async fn tally(&self, campaign_id: CampaignId) -> Result<Tally> {
        let campaign = self.campaign(campaign_id).await?;
        Ok(Tally::from(campaign.as_ref()))
    }

    /// Has this voter already cast their ballot in the campaign?
    pub async fn has_voted(&self, campaign_id: CampaignId, voter_id: &str) -> Result<bool> {
        Ok(self.campaign(campaign_id).await?.has_voted(voter_id))
    }

    /// Apply `mutate` to a copy of the campaign and swap the copy in.
    /// Nothing changes if `mutate` fails.
    async fn modify<T, F>(&self, campaign_id: CampaignId, mutate: F) -> Result<Committed<T>>
    where
        F: FnOnce(&mut Campaign, StorePolicy) -> Result<T>,
    {
        let (value, snapshot) = {
            let mut collection = self.collection.write().await;
            let current = collection
                .campaigns
                .get(&campaign_id)
                .ok_or_else(|| Error::not_found(format!("Campaign {campaign_id}")))?;
            let mut updated = Campaign::clone(current);
            let value = mutate(&mut updated, self.policy)?;
            collection.campaigns.insert(campaign_id, Arc::new(updated));
            (value, collection.commit())
        };
        let durable = self.persist(snapshot).await;
        Ok(Committed { value, durable })
    }

    /// Save a snapshot unless a newer one is already stored.
    async fn persist(&self, snapshot: Snapshot) -> bool {
        let mut saved_generation = self.saved_generation.lock().await;
        if snapshot.generation <= *saved_generation {
            return true;
        }
        let campaigns: Vec<Campaign> = snapshot
            .campaigns
            .iter()
            .map(|c| Campaign::clone(c))
            .collect();
        match self.persistence.save(&campaigns).await {
            Ok(()) => {
                *saved_generation = snapshot.generation;
                true
            }
            Err(e) => {
                error!(
                    "Failed to save generation {} to {} store: {e}",
                    snapshot.generation,
                    self.persistence.name()
                );
                false
            }
        }
    }
}

/// The campaign a brand new deployment starts with.
fn seed_campaign(id: CampaignId) -> Result<Campaign> {
    let mut campaign = Campaign::new(
        id,
        "Elección Junta Directiva 2025".to_string(),
        "Elección de los miembros de la Junta Directiva del Colegio de Ingenieros \
para el período 2025-2027"
            .to_string(),
        1,
        CampaignState::Enabled,
    );
    for (name, description) in [
        ("Ing. Juan Carlos Pérez", "Especialista en Infraestructura"),
        ("Ing. María González", "Experta en Desarrollo Sostenible"),
        ("Ing. Roberto López", "Líder en Innovación Tecnológica"),
    ] {
        campaign.push_candidate(name.to_string(), description.to_string())?;
    }
    Ok(campaign)
}
