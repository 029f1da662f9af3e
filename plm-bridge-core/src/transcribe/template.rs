//! Markdown skeletons for manual transcription.
//!
//! Nothing here looks at real media. The "transcript" is a fixed placeholder
//! that tells the reader how to fill it in; the rendered document wraps it
//! with whatever the pattern scans found.

use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;

use super::extract::{for_display, TranscriptSections};

const CONSENSUS_HOST: &str = "goconsensus.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Consensus,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Consensus => "consensus",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub url: String,
    pub platform: Platform,
    /// Last path segment, only for recognised platforms.
    pub id: Option<String>,
    pub fetched_at: DateTime<Local>,
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

pub fn classify_platform(url: &str) -> Platform {
    if url.contains(CONSENSUS_HOST) {
        Platform::Consensus
    } else {
        Platform::Unknown
    }
}

pub fn video_metadata(url: &str, now: DateTime<Local>) -> VideoMetadata {
    let platform = classify_platform(url);
    let id = match platform {
        Platform::Consensus => Some(last_segment(url).to_string()),
        Platform::Unknown => None,
    };
    VideoMetadata {
        url: url.to_string(),
        platform,
        id,
        fetched_at: now,
    }
}

pub fn placeholder_transcript(url: &str, now: DateTime<Local>) -> String {
    format!(
        r#"
# Video Transcript

## Metadata
- URL: {url}
- Extracted: {extracted}
- Status: Manual transcription required

## Content
[Manual transcription needed - use one of these methods:]

### Option 1: YouTube Videos
1. Enable captions/subtitles in the video
2. Open the video menu and choose "Show transcript"
3. Copy and paste the transcript here

### Option 2: Audio Extraction
1. Save the audio track with a browser extension
2. Run it through a speech-to-text service
3. Add timestamps for key sections

### Option 3: Manual Transcription
1. Play video at 0.75x speed
2. Document key points with timestamps
3. Focus on:
   - UI demonstrations
   - Commands and shortcuts
   - Workflow steps
   - Technical specifications
   - Best practices mentioned

## Placeholder Sections

### Introduction [00:00 - XX:XX]
[Transcribe introduction]

### Main Content [XX:XX - XX:XX]
[Transcribe main demonstrations]

### Key Features Demonstrated
- Feature 1: [Description]
- Feature 2: [Description]
- Feature 3: [Description]

### Conclusion [XX:XX - XX:XX]
[Transcribe summary and closing]
"#,
        extracted = now.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn format_list(list: &[String], empty: &str, line: impl Fn(&str) -> String) -> String {
    if list.is_empty() {
        return format!("- No {empty} extracted yet");
    }
    for_display(list)
        .iter()
        .map(|entry| line(entry))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_markdown(
    metadata: &VideoMetadata,
    transcript: &str,
    sections: &TranscriptSections,
    now: DateTime<Local>,
) -> String {
    let status = if transcript.is_empty() {
        "Pending"
    } else {
        "Complete"
    };
    let timestamps = format_list(&sections.timestamps, "timestamps", |ts| {
        format!("- [{ts}] [Description]")
    });
    let commands = format_list(&sections.commands, "commands", |cmd| {
        format!("- `{cmd}`: [Description]")
    });
    let features = format_list(&sections.features, "features", |f| format!("- {}", f.trim()));

    format!(
        r#"# Training Video Transcript

## Video Information
- **URL**: {url}
- **Platform**: {platform}
- **Date Accessed**: {accessed}
- **Transcription Status**: {status}

## Summary
[To be added after transcription]

## Key Timestamps
{timestamps}

## Commands & Shortcuts Mentioned
{commands}

## Features Covered
{features}

## Full Transcript
{transcript}

## Applications
[To be analyzed after transcription]

## Action Items
- [ ] Complete transcription
- [ ] Identify relevant features
- [ ] Extract best practices
- [ ] Create practice exercises
- [ ] Document integration points

## Notes
- This is a template for manual transcription
- Add actual content from the video
- Note any compliance-related features

---
*Generated by plm-bridge transcribe*
"#,
        url = metadata.url,
        platform = metadata.platform,
        accessed = now.format("%Y-%m-%d"),
    )
}

fn unsafe_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\-_]").expect("valid filename regex"))
}

/// `<last URL segment, sanitised>_<YYYYmmdd_HHMMSS>.md`
pub fn transcript_file_name(url: &str, now: DateTime<Local>) -> String {
    let safe = unsafe_chars_re().replace_all(last_segment(url), "_");
    format!("{}_{}.md", safe, now.format("%Y%m%d_%H%M%S"))
}
