use std::io::ErrorKind;
use std::path::PathBuf;

use rocket::{serde::json::serde_json, tokio::fs};

use crate::error::Result;
use crate::model::campaign::Campaign;

use super::Persistence;

/// Stores the whole collection as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[rocket::async_trait]
impl Persistence for FilePersistence {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Option<Vec<Campaign>>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let campaigns = serde_json::from_slice(&raw)?;
        Ok(Some(campaigns))
    }

    async fn save(&self, campaigns: &[Campaign]) -> Result<()> {
        let raw = serde_json::to_vec_pretty(campaigns)?;
        // Write then rename, so a crash never leaves a truncated file behind.
        let temp = self.temp_path();
        fs::write(&temp, raw).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
