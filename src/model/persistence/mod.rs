//! Backing stores for the campaign collection.
//!
//! The store treats these as best-effort: the whole collection is loaded
//! once at launch and saved after every committed mutation.

mod file;
mod memory;
#[cfg(feature = "mongodb-store")]
mod mongo;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;
#[cfg(feature = "mongodb-store")]
pub use mongo::MongoPersistence;

use crate::error::Result;
use crate::model::campaign::Campaign;

/// Somewhere the campaign collection can be loaded from and saved to.
#[rocket::async_trait]
pub trait Persistence: Send + Sync {
    /// A short name for log messages.
    fn name(&self) -> &'static str;

    /// Load the stored collection. `None` means nothing has been stored yet.
    async fn load(&self) -> Result<Option<Vec<Campaign>>>;

    /// Replace the stored collection with `campaigns`.
    async fn save(&self, campaigns: &[Campaign]) -> Result<()>;
}
