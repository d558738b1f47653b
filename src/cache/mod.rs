// src/cache/mod.rs

//! Two-tier file-backed cache for scraped and extracted data.
//!
//! Avoids redundant network fetches (Raw tier) and redundant extraction
//! calls (Processed tier).
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── {region}/
//!     ├── {region}_{key}_Raw.json        # fetched page content
//!     └── {region}_{key}_Processed.json  # extractor candidate records
//! ```
//!
//! Entries are immutable once written except for full overwrite; they are
//! never partially updated. A missing entry reads as `None`, never as an
//! error. A corrupt entry also reads as `None` (with a warning) so a damaged
//! cache degrades to a re-fetch instead of poisoning the run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CandidateEvent, PageContent, UnitKey};

/// Cache tier discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Raw,
    Processed,
}

impl CacheTier {
    fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Raw => "Raw",
            CacheTier::Processed => "Processed",
        }
    }
}

/// On-disk envelope around a cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    region: String,
    key: String,
    payload: T,
    timestamp: DateTime<Utc>,
}

/// Summary counts over the whole cache tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub regions: usize,
    pub raw_files: usize,
    pub processed_files: usize,
}

impl CacheInfo {
    pub fn total_files(&self) -> usize {
        self.raw_files + self.processed_files
    }
}

/// File-backed cache store rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root_dir: PathBuf,
}

impl CacheStore {
    /// Create a cache store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn entry_path(&self, region: &str, key: &UnitKey, tier: CacheTier) -> PathBuf {
        self.root_dir.join(region).join(format!(
            "{}_{}_{}.json",
            region,
            key.cache_key(),
            tier.as_str()
        ))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn write_entry<T: Serialize>(
        &self,
        region: &str,
        key: &UnitKey,
        tier: CacheTier,
        payload: &T,
    ) -> Result<()> {
        let envelope = CacheEnvelope {
            region: region.to_string(),
            key: key.cache_key(),
            payload,
            timestamp: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        let path = self.entry_path(region, key, tier);
        self.write_bytes(&path, &bytes).await
    }

    async fn read_entry<T: DeserializeOwned>(
        &self,
        region: &str,
        key: &UnitKey,
        tier: CacheTier,
    ) -> Result<Option<T>> {
        let path = self.entry_path(region, key, tier);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };

        match serde_json::from_slice::<CacheEnvelope<T>>(&bytes) {
            Ok(envelope) => Ok(Some(envelope.payload)),
            Err(e) => {
                log::warn!(
                    "Corrupt cache entry {} ({}), treating as absent",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Persist raw fetched content for (region, key); overwrites.
    pub async fn put_raw(&self, region: &str, key: &UnitKey, page: &PageContent) -> Result<()> {
        self.write_entry(region, key, CacheTier::Raw, page).await
    }

    /// Load raw fetched content, or `None` if absent.
    pub async fn get_raw(&self, region: &str, key: &UnitKey) -> Result<Option<PageContent>> {
        self.read_entry(region, key, CacheTier::Raw).await
    }

    /// Persist post-extraction candidate records for (region, key); overwrites.
    pub async fn put_processed(
        &self,
        region: &str,
        key: &UnitKey,
        candidates: &[CandidateEvent],
    ) -> Result<()> {
        self.write_entry(region, key, CacheTier::Processed, &candidates)
            .await
    }

    /// Load candidate records, or `None` if absent.
    pub async fn get_processed(
        &self,
        region: &str,
        key: &UnitKey,
    ) -> Result<Option<Vec<CandidateEvent>>> {
        self.read_entry(region, key, CacheTier::Processed).await
    }

    /// True if either tier has an entry for (region, key).
    pub async fn exists(&self, region: &str, key: &UnitKey) -> bool {
        for tier in [CacheTier::Raw, CacheTier::Processed] {
            if tokio::fs::try_exists(self.entry_path(region, key, tier))
                .await
                .unwrap_or(false)
            {
                return true;
            }
        }
        false
    }

    /// Remove entries matching the given scope: all, one region, or one key
    /// within a region.
    pub async fn purge(&self, region: Option<&str>, key: Option<&UnitKey>) -> Result<()> {
        match (region, key) {
            (None, _) => {
                match tokio::fs::remove_dir_all(&self.root_dir).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(AppError::Io(e)),
                }
                Ok(())
            }
            (Some(region), None) => {
                match tokio::fs::remove_dir_all(self.root_dir.join(region)).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(AppError::Io(e)),
                }
                Ok(())
            }
            (Some(region), Some(key)) => {
                for tier in [CacheTier::Raw, CacheTier::Processed] {
                    match tokio::fs::remove_file(self.entry_path(region, key, tier)).await {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(AppError::Io(e)),
                    }
                }
                Ok(())
            }
        }
    }

    /// Count cached files per tier across all regions.
    pub async fn info(&self) -> Result<CacheInfo> {
        let mut info = CacheInfo::default();

        let mut regions = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(info),
            Err(e) => return Err(AppError::Io(e)),
        };

        while let Some(region_entry) = regions.next_entry().await? {
            if !region_entry.file_type().await?.is_dir() {
                continue;
            }
            info.regions += 1;

            let mut files = tokio::fs::read_dir(region_entry.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let name = file.file_name();
                let name = name.to_string_lossy();
                if name.ends_with("_Raw.json") {
                    info.raw_files += 1;
                } else if name.ends_with("_Processed.json") {
                    info.processed_files += 1;
                }
            }
        }

        Ok(info)
    }
}
