//! Panel participants
//!
//! A consultation always has five participants: three specialists, one
//! moderator and the silent submitter that posts the case.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Name of the participant that injects the opening message
pub const SUBMITTER_NAME: &str = "User_Proxy";

/// Lowest accepted round limit
pub const MIN_ROUNDS: u32 = 2;
/// Highest accepted round limit
pub const MAX_ROUNDS: u32 = 10;

/// A configurable agent: display name plus role prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub prompt: String,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

/// Role a participant plays in the group chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRole {
    Specialist,
    /// Synthesizes the final plan
    Moderator,
    /// Posts the opening message and never replies
    Submitter,
}

impl PanelRole {
    /// Whether the engine may pick this participant as a speaker
    pub fn speaks(&self) -> bool {
        !matches!(self, PanelRole::Submitter)
    }

    pub fn display_name(&self) -> &str {
        match self {
            PanelRole::Specialist => "Specialist",
            PanelRole::Moderator => "Moderator",
            PanelRole::Submitter => "Submitter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub spec: AgentSpec,
    pub role: PanelRole,
}

impl Participant {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// First line of the role prompt, used when asking the model to pick a speaker
    pub fn description(&self) -> &str {
        self.spec.prompt.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// The five participants of one run, in group chat order
#[derive(Debug, Clone)]
pub struct Panel {
    participants: Vec<Participant>,
}

impl Panel {
    /// Build the panel; names are trimmed and must be non-empty and unique
    pub fn new(specialists: &[AgentSpec; 3], moderator: &AgentSpec) -> Result<Self> {
        let mut participants = Vec::with_capacity(5);
        participants.push(Participant {
            spec: AgentSpec::new(SUBMITTER_NAME, ""),
            role: PanelRole::Submitter,
        });
        for spec in specialists {
            participants.push(Participant {
                spec: AgentSpec::new(spec.name.trim(), spec.prompt.clone()),
                role: PanelRole::Specialist,
            });
        }
        participants.push(Participant {
            spec: AgentSpec::new(moderator.name.trim(), moderator.prompt.clone()),
            role: PanelRole::Moderator,
        });

        for (i, p) in participants.iter().enumerate() {
            if p.name().is_empty() {
                bail!("{} agent name must not be empty", p.role.display_name());
            }
            if participants[..i].iter().any(|other| other.name() == p.name()) {
                bail!("Agent name '{}' is used by more than one participant", p.name());
            }
        }

        Ok(Self { participants })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participants the engine may select, in round-robin order
    pub fn speakers(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.role.speaks())
    }

    pub fn submitter(&self) -> &Participant {
        // Panel::new always places the submitter first
        &self.participants[0]
    }

    pub fn moderator(&self) -> &Participant {
        &self.participants[self.participants.len() - 1]
    }

    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specialists() -> [AgentSpec; 3] {
        [
            AgentSpec::new("James", "You are Dr. James."),
            AgentSpec::new("David", "You are Dr. David."),
            AgentSpec::new("Jones", "You are Dr. Jones."),
        ]
    }

    #[test]
    fn test_panel_has_five_participants() {
        let panel = Panel::new(&specialists(), &AgentSpec::new("Masoud", "Moderate.")).unwrap();
        assert_eq!(panel.participants().len(), 5);
        assert_eq!(panel.submitter().name(), SUBMITTER_NAME);
        assert_eq!(panel.moderator().name(), "Masoud");
        assert_eq!(panel.speakers().count(), 4);
        assert!(panel.speakers().all(|p| p.role != PanelRole::Submitter));
    }

    #[test]
    fn test_panel_trims_names() {
        let panel = Panel::new(&specialists(), &AgentSpec::new("  Masoud \n", "Moderate.")).unwrap();
        assert_eq!(panel.moderator().name(), "Masoud");
    }

    #[test]
    fn test_panel_rejects_blank_name() {
        let err = Panel::new(&specialists(), &AgentSpec::new("   ", "Moderate.")).unwrap_err();
        assert!(err.to_string().contains("Moderator agent name must not be empty"));
    }

    #[test]
    fn test_panel_rejects_duplicate_names() {
        let err = Panel::new(&specialists(), &AgentSpec::new("James", "Moderate.")).unwrap_err();
        assert!(err.to_string().contains("'James'"));

        let err = Panel::new(&specialists(), &AgentSpec::new(SUBMITTER_NAME, "x")).unwrap_err();
        assert!(err.to_string().contains(SUBMITTER_NAME));
    }

    #[test]
    fn test_description_is_first_non_empty_line() {
        let p = Participant {
            spec: AgentSpec::new("James", "\n  You are Dr. James.\nMore detail."),
            role: PanelRole::Specialist,
        };
        assert_eq!(p.description(), "You are Dr. James.");
    }
}
