//! Transcription templates for training videos.
//!
//! No media is fetched or transcribed. Given a URL this module produces a
//! markdown skeleton (platform label, placeholder transcript, whatever the
//! pattern scans found) for someone to fill in by hand, saves it under a
//! timestamped name and can record the result in the `sources.json` ledger.

mod extract;
mod ledger;
mod template;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

pub use extract::{extract_sections, for_display, TranscriptSections, DISPLAY_LIMIT, FEATURE_KEYWORDS};
pub use ledger::{update_sources, LedgerMetadata, SourceLedger, VideoSource, VideoStatus};
pub use template::{
    classify_platform, placeholder_transcript, render_markdown, transcript_file_name,
    video_metadata, Platform, VideoMetadata,
};

use crate::error::TranscribeError;

pub const DEFAULT_OUTPUT_DIR: &str = "training/videos/transcripts";
pub const DEFAULT_SOURCES_FILE: &str = "training/videos/raw/sources.json";

#[derive(Debug, Clone)]
pub struct TranscriptOutput {
    pub path: PathBuf,
    pub metadata: VideoMetadata,
    pub sections: TranscriptSections,
}

/// Writes `content` to `<output_dir>/<transcript_file_name>`, creating the
/// directory if needed.
pub fn save_transcript(
    output_dir: &Path,
    url: &str,
    content: &str,
    now: DateTime<Local>,
) -> Result<PathBuf, TranscribeError> {
    std::fs::create_dir_all(output_dir).map_err(|source| TranscribeError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = output_dir.join(transcript_file_name(url, now));
    std::fs::write(&path, content).map_err(|source| TranscribeError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Transcript saved");
    Ok(path)
}

/// Full template run for one URL: metadata, placeholder, scans, render, save.
pub fn generate_template(
    url: &str,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<TranscriptOutput, TranscribeError> {
    info!(url, "Processing video");
    let metadata = video_metadata(url, now);
    let transcript = placeholder_transcript(url, now);
    let sections = extract_sections(&transcript);
    let content = render_markdown(&metadata, &transcript, &sections, now);
    let path = save_transcript(output_dir, url, &content, now)?;
    Ok(TranscriptOutput {
        path,
        metadata,
        sections,
    })
}
