//! Group chat engine
//!
//! Runs the multi-party exchange: the submitter posts the opening message,
//! then the model picks a speaker and that speaker replies, until the round
//! limit is reached. The round limit counts every turn, opening included.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::agent::llm::{ChatBackend, ChatMessage, CompletionRequest};
use crate::config::LlmSettings;
use crate::types::{Transcript, Turn};

use super::agent_types::{Panel, Participant};

/// Drives one multi-agent exchange and returns the ordered turns
#[async_trait]
pub trait GroupChatEngine: Send + Sync {
    async fn run(&self, panel: &Panel, opening: &str, max_rounds: u32) -> Result<Transcript>;
}

/// Group chat backed by a chat-completions model for both speaker
/// selection and replies
pub struct LlmGroupChat<B> {
    backend: B,
    settings: LlmSettings,
}

impl<B: ChatBackend> LlmGroupChat<B> {
    pub fn new(backend: B, settings: LlmSettings) -> Self {
        Self { backend, settings }
    }

    /// Ask the model who speaks next; fall back to round-robin when the
    /// answer does not name exactly one participant
    async fn select_speaker<'p>(&self, panel: &'p Panel, transcript: &[Turn]) -> Result<&'p Participant> {
        let last = transcript.last().and_then(|t| t.speaker.as_deref());
        let speakers: Vec<&Participant> = panel.speakers().collect();
        if speakers.len() == 1 {
            return Ok(speakers[0]);
        }

        let messages = selection_messages(&speakers, transcript);
        let reply = self
            .backend
            .complete(CompletionRequest::new(&self.settings, messages))
            .await
            .context("Speaker selection request failed")?;

        let mentioned: Vec<&Participant> = speakers
            .iter()
            .copied()
            .filter(|p| mentions(&reply, p.name()))
            .collect();

        match mentioned.as_slice() {
            [only] => Ok(only),
            _ => {
                let next = round_robin_next(&speakers, last);
                warn!(
                    "Speaker selection returned {:?}; falling back to round-robin ({})",
                    crate::truncate_safe(reply.trim(), 80),
                    next.name()
                );
                Ok(next)
            }
        }
    }

    async fn generate_reply(&self, speaker: &Participant, transcript: &[Turn]) -> Result<String> {
        let messages = reply_messages(speaker, transcript);
        self.backend.complete(CompletionRequest::new(&self.settings, messages)).await
    }
}

#[async_trait]
impl<B: ChatBackend> GroupChatEngine for LlmGroupChat<B> {
    async fn run(&self, panel: &Panel, opening: &str, max_rounds: u32) -> Result<Transcript> {
        let mut transcript = vec![Turn::submitted(panel.submitter().name(), opening)];

        while (transcript.len() as u32) < max_rounds {
            let speaker = self.select_speaker(panel, &transcript).await?;
            debug!("Round {}/{}: {} speaks", transcript.len() + 1, max_rounds, speaker.name());

            let reply = self
                .generate_reply(speaker, &transcript)
                .await
                .with_context(|| format!("{} failed to reply", speaker.name()))?;
            transcript.push(Turn::spoken(speaker.name(), reply));
        }

        info!("Group chat finished with {} turns", transcript.len());
        Ok(transcript)
    }
}

fn selection_messages(speakers: &[&Participant], transcript: &[Turn]) -> Vec<ChatMessage> {
    let names: Vec<&str> = speakers.iter().map(|p| p.name()).collect();
    let roles: String = speakers
        .iter()
        .map(|p| format!("{}: {}", p.name(), p.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut messages = Vec::with_capacity(transcript.len() + 2);
    messages.push(ChatMessage::system(format!(
        "You are in a role play game. The following roles are available:\n{}\n\n\
         Read the following conversation.\n\
         Then select the next role from [{}] to play. Only return the role.",
        roles, names.join(", ")
    )));
    for turn in transcript {
        if turn.text().trim().is_empty() {
            continue;
        }
        messages.push(ChatMessage::user(attributed(turn)));
    }
    messages.push(ChatMessage::user(format!(
        "Read the above conversation. Then select the next role from [{}] to play. Only return the role.",
        names.join(", ")
    )));
    messages
}

/// History as seen by `speaker`: its own turns are assistant messages,
/// everyone else's are user messages prefixed with their name
fn reply_messages(speaker: &Participant, transcript: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 2);
    if !speaker.spec.prompt.trim().is_empty() {
        messages.push(ChatMessage::system(speaker.spec.prompt.clone()));
    }
    for turn in transcript {
        if turn.text().trim().is_empty() {
            continue;
        }
        if turn.is_from(speaker.name()) {
            messages.push(ChatMessage::assistant(turn.text()));
        } else {
            messages.push(ChatMessage::user(attributed(turn)));
        }
    }
    // Chat APIs expect the request to end on a user message
    if messages.last().map(|m| m.role.as_str()) != Some("user") {
        messages.push(ChatMessage::user(format!("{}, please continue the discussion.", speaker.name())));
    }
    messages
}

fn attributed(turn: &Turn) -> String {
    match turn.speaker.as_deref() {
        Some(name) => format!("{}: {}", name, turn.text()),
        None => turn.text().to_string(),
    }
}

/// Next speaker after `last` in panel order; the first speaker when `last`
/// is the submitter or unknown
fn round_robin_next<'p>(speakers: &[&'p Participant], last: Option<&str>) -> &'p Participant {
    let position = last.and_then(|name| speakers.iter().position(|p| p.name() == name));
    match position {
        Some(i) => speakers[(i + 1) % speakers.len()],
        None => speakers[0],
    }
}

/// Whole-word occurrence of `name` in `text`
fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
