//! Pattern scans over transcript text.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// How many entries of each list the rendered template shows.
pub const DISPLAY_LIMIT: usize = 10;

/// Words that introduce a feature mention, scanned in this order.
pub const FEATURE_KEYWORDS: [&str; 5] = ["feature", "function", "capability", "tool", "module"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscriptSections {
    /// `H:MM`, `MM:SS` or `H:MM:SS`, without the surrounding brackets.
    pub timestamps: Vec<String>,
    pub commands: Vec<String>,
    pub features: Vec<String>,
}

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d{1,2}:\d{2}(?::\d{2})?)\]").expect("valid timestamp regex"))
}

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[`$]([^`$\n]+)[`$]").expect("valid command regex"))
}

fn feature_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        FEATURE_KEYWORDS
            .iter()
            .map(|kw| Regex::new(&format!(r"(?i){kw}[:\s]+([^.\n]+)")).expect("valid feature regex"))
            .collect()
    })
}

fn captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Runs the three independent scans. Every match is kept, in order of
/// appearance; features are grouped by keyword.
pub fn extract_sections(text: &str) -> TranscriptSections {
    let features = feature_res()
        .iter()
        .flat_map(|re| captures(re, text))
        .collect();

    TranscriptSections {
        timestamps: captures(timestamp_re(), text),
        commands: captures(command_re(), text),
        features,
    }
}

pub fn for_display(list: &[String]) -> &[String] {
    &list[..list.len().min(DISPLAY_LIMIT)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_in_order_of_appearance() {
        let sections = extract_sections("Intro [01:23] then deep dive [1:02:03] done");
        assert_eq!(sections.timestamps, vec!["01:23", "1:02:03"]);
    }

    #[test]
    fn malformed_timestamps_are_skipped() {
        let sections = extract_sections("[123:45] [1:2] (01:23) [00:00]");
        assert_eq!(sections.timestamps, vec!["00:00"]);
    }

    #[test]
    fn display_is_capped_at_ten() {
        let text: String = (0..15).map(|i| format!("[00:{i:02}] ")).collect();
        let sections = extract_sections(&text);
        assert_eq!(sections.timestamps.len(), 15);
        let shown = for_display(&sections.timestamps);
        assert_eq!(shown.len(), DISPLAY_LIMIT);
        assert_eq!(shown[0], "00:00");
        assert_eq!(shown[9], "00:09");
    }

    #[test]
    fn commands_between_backticks_or_dollars() {
        let sections = extract_sections("Run `tc_export -all` or $item_create$ now");
        assert_eq!(sections.commands, vec!["tc_export -all", "item_create"]);
    }

    #[test]
    fn features_grouped_by_keyword_case_insensitively() {
        let text = "Tool: Structure Manager. The FEATURE: BOM compare.\nModule Change Manager";
        let sections = extract_sections(text);
        assert_eq!(
            sections.features,
            vec!["BOM compare", "Structure Manager", "Change Manager"]
        );
    }

    #[test]
    fn empty_text_yields_empty_sections() {
        assert_eq!(extract_sections(""), TranscriptSections::default());
    }
}
