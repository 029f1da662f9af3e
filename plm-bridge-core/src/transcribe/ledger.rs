//! The `sources.json` status ledger.
//!
//! Shape: `{ "videos": [ { "url", "status", ... } ], "metadata": { ... } }`.
//! Fields this module does not know about are carried through untouched.
//!
//! There is no locking. Two processes updating the same ledger race, and the
//! last whole-file write wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::TranscribeError;

/// Entry status. Only `pending` and `transcribed` are counted; any other
/// value is kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VideoStatus {
    Pending,
    Transcribed,
    Other(String),
}

impl From<String> for VideoStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => VideoStatus::Pending,
            "transcribed" => VideoStatus::Transcribed,
            _ => VideoStatus::Other(raw),
        }
    }
}

impl From<VideoStatus> for String {
    fn from(status: VideoStatus) -> Self {
        match status {
            VideoStatus::Pending => "pending".to_string(),
            VideoStatus::Transcribed => "transcribed".to_string(),
            VideoStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Empty for draft entries that have no URL yet.
    #[serde(default)]
    pub url: String,
    #[serde(default = "pending")]
    pub status: VideoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn pending() -> VideoStatus {
    VideoStatus::Pending
}

impl VideoSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: VideoStatus::Pending,
            transcript_path: None,
            processed_date: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub processed: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceLedger {
    #[serde(default)]
    pub videos: Vec<VideoSource>,
    #[serde(default)]
    pub metadata: LedgerMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceLedger {
    /// Reads the ledger; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, TranscribeError> {
        if !path.exists() {
            debug!(path = %path.display(), "Ledger file missing, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| TranscribeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| TranscribeError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn find(&self, url: &str) -> Option<&VideoSource> {
        self.videos.iter().find(|v| v.url == url)
    }

    /// Marks the first entry for `url` as transcribed, appending one if none
    /// exists, then recomputes the aggregate counts.
    pub fn mark_transcribed(&mut self, url: &str, transcript_path: &Path, now: DateTime<Local>) {
        let index = match self.videos.iter().position(|v| v.url == url) {
            Some(index) => index,
            None => {
                self.videos.push(VideoSource::new(url));
                self.videos.len() - 1
            }
        };
        let entry = &mut self.videos[index];
        entry.status = VideoStatus::Transcribed;
        entry.transcript_path = Some(transcript_path.display().to_string());
        entry.processed_date = Some(now.to_rfc3339());
        self.refresh_metadata(now);
    }

    pub fn refresh_metadata(&mut self, now: DateTime<Local>) {
        let count = |status: VideoStatus| self.videos.iter().filter(|v| v.status == status).count();
        let processed = count(VideoStatus::Transcribed);
        let pending = count(VideoStatus::Pending);
        self.metadata.processed = processed;
        self.metadata.pending = pending;
        self.metadata.last_updated = Some(now.to_rfc3339());
    }

    /// Rewrites the whole file as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), TranscribeError> {
        let io_err = |source| TranscribeError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| TranscribeError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;
        info!(
            path = %path.display(),
            processed = self.metadata.processed,
            pending = self.metadata.pending,
            "Updated sources ledger"
        );
        Ok(())
    }
}

/// Load, mark, save.
pub fn update_sources(
    ledger_path: &Path,
    url: &str,
    transcript_path: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, TranscribeError> {
    let mut ledger = SourceLedger::load(ledger_path)?;
    ledger.mark_transcribed(url, transcript_path, now);
    ledger.save(ledger_path)?;
    Ok(ledger_path.to_path_buf())
}
