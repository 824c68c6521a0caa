//! Buildable revisions and their presentation order.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

/// One historical, independently buildable snapshot identified by a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    /// The tag name, e.g. `step-3`
    pub tag: String,
    /// Number embedded in the tag; `0` when the tag carries none
    pub ordinal: u64,
    /// Ordinal digits left-padded to two places, e.g. `03`
    pub display_id: String,
    /// One-line annotation, possibly empty
    pub annotation: String,
}

impl Revision {
    /// Parse a tag of the form `<prefix><digits>`.
    ///
    /// A tag without parseable digits gets ordinal `0` and display id `00`
    /// rather than being rejected.
    pub fn from_tag(tag: &str, prefix: &str, annotation: impl Into<String>) -> Self {
        let digits = ordinal_digits(tag, prefix);
        let ordinal = digits
            .as_deref()
            .and_then(|d| d.parse::<u64>().ok())
            .unwrap_or(0);
        let display_id = match digits {
            Some(d) => format!("{:0>2}", d),
            None => "00".to_string(),
        };

        Self {
            tag: tag.to_string(),
            ordinal,
            display_id,
            annotation: annotation.into(),
        }
    }

    /// Human-readable label: `Step 03: Add comments`, or `Step 03` with no annotation.
    pub fn description(&self) -> String {
        if self.annotation.is_empty() {
            format!("Step {}", self.display_id)
        } else {
            format!("Step {}: {}", self.display_id, self.annotation)
        }
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| self.tag.cmp(&other.tag))
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn ordinal_digits(tag: &str, prefix: &str) -> Option<String> {
    let pattern = format!(r"{}(\d+)", regex::escape(prefix));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First paragraph of a commit or tag message collapsed onto one line.
pub fn subject_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
