//! Extraction of `<Artifact ...>...</Artifact>` blocks from assistant output.
//!
//! A block is only reported once both its open and close markers are present,
//! so partial output never yields a half-written artifact.

mod parser;

pub use parser::ArtifactParser;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language reported for blocks that carry no (or an empty) `language` attribute.
pub const DEFAULT_LANGUAGE: &str = "typescript";

pub(crate) const OPEN_MARKER: &str = "<Artifact";
pub(crate) const CLOSE_MARKER: &str = "</Artifact>";

static ARTIFACT_REGEX: OnceLock<Regex> = OnceLock::new();

/// A titled block of generated content embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub title: String,
    pub language: String,
    pub content: String,
}

pub(crate) fn artifact_regex() -> &'static Regex {
    ARTIFACT_REGEX.get_or_init(|| {
        // Attribute values stop at the first quote or line break, so an open
        // marker parses the same way however much text follows it. Content is
        // lazy: the first close marker ends the nearest open block.
        Regex::new(r#"<Artifact title="([^"\n]*)"(?:\s+language="([^"\n]*)")?\s*>([\s\S]*?)</Artifact>"#)
            .expect("Failed to compile artifact regex")
    })
}

impl Artifact {
    pub(crate) fn from_captures(caps: &regex::Captures<'_>) -> Self {
        let title = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let language = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        let content = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        Self {
            title: title.to_string(),
            language: language.to_string(),
            content: content.trim().to_string(),
        }
    }
}

/// Returns every closed artifact block in `text`, left to right.
pub fn extract_artifacts(text: &str) -> Vec<Artifact> {
    artifact_regex()
        .captures_iter(text)
        .map(|caps| Artifact::from_captures(&caps))
        .collect()
}
