//! Shared types used across modules
//!
//! Turns and transcripts are produced by the group chat engine and consumed
//! by the transcript formatter, so they live here to avoid circular
//! dependencies between `agent` and `orchestrator`.

use serde::{Deserialize, Serialize};

use crate::markdown::render_markdown;

/// Who produced a turn in the group chat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The silent participant that injects the opening message
    Submitter,
    /// A panel member whose content came from model inference
    Agent,
}

/// A single attributed message in the discussion.
///
/// Speaker and content are both optional: a record without a speaker is
/// displayed under a generic label, and a record without content is skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Turn {
    pub fn submitted(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Submitter,
            speaker: Some(speaker.into()),
            content: Some(content.into()),
        }
    }

    pub fn spoken(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Agent,
            speaker: Some(speaker.into()),
            content: Some(content.into()),
        }
    }

    /// Content as a string slice, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// True when this turn was produced by the named participant
    pub fn is_from(&self, name: &str) -> bool {
        self.speaker.as_deref() == Some(name)
    }
}

/// Ordered turns of one run
pub type Transcript = Vec<Turn>;

/// One row of the transcript as shown in the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayEntry {
    pub label: String,
    /// Raw Markdown as produced by the speaker
    pub content: String,
    /// `content` rendered for the browser
    #[serde(default)]
    pub content_html: String,
}

impl DisplayEntry {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            label: label.into(),
            content_html: render_markdown(&content),
            content,
        }
    }

    /// Label wrapped for Markdown rendering
    pub fn markdown_label(&self) -> String {
        format!("**{}**", self.label)
    }
}
