use std::io::{Error as IoError, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};

use rocket::tokio::sync::Mutex;

use crate::error::Result;
use crate::model::campaign::Campaign;

use super::Persistence;

/// Volatile persistence, for tests and throwaway instances.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Vec<Campaign>>>,
    failing: AtomicBool,
}

impl MemoryPersistence {
    /// Start with nothing stored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given collection already stored.
    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        Self {
            saved: Mutex::new(Some(campaigns)),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The most recently saved collection.
    pub async fn saved(&self) -> Option<Vec<Campaign>> {
        self.saved.lock().await.clone()
    }
}

#[rocket::async_trait]
impl Persistence for MemoryPersistence {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Option<Vec<Campaign>>> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, campaigns: &[Campaign]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IoError::new(ErrorKind::Other, "memory store is set to fail").into());
        }
        *self.saved.lock().await = Some(campaigns.to_vec());
        Ok(())
    }
}
