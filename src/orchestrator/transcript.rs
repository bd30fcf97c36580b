//! Transcript formatting and final plan extraction
//!
//! Both functions are pure: missing data degrades to an empty list or the
//! fallback string, never to an error.

use crate::types::{DisplayEntry, Turn, TurnRole};

/// Marks the moderator's synthesized plan
pub const FINAL_PLAN_MARKER: &str = "--- FINAL PLAN ---";

/// Header that identifies the case injection in the opening message
pub const SCENARIO_HEADER: &str = "PATIENT SCENARIO";

/// Label for the re-surfaced case text
pub const SCENARIO_LABEL: &str = "Patient Scenario Input";

/// Label for agent turns that carry no speaker name
pub const UNNAMED_SPEAKER_LABEL: &str = "Moderator";

pub const FINAL_PLAN_FALLBACK: &str = "Final plan not generated or found in the conversation.";

/// Build the display rows for a transcript.
///
/// Submitter turns only appear when they carry the case injection, and then
/// show the raw `scenario` instead of the templated opening message.
pub fn format_transcript(transcript: &[Turn], scenario: &str) -> Vec<DisplayEntry> {
    let mut entries = Vec::with_capacity(transcript.len());

    for turn in transcript {
        if turn.role == TurnRole::Submitter {
            if turn.text().contains(SCENARIO_HEADER) {
                entries.push(DisplayEntry::new(SCENARIO_LABEL, scenario));
            }
            continue;
        }

        let content = turn.text().trim();
        if content.is_empty() {
            continue;
        }
        let label = turn.speaker.as_deref().unwrap_or(UNNAMED_SPEAKER_LABEL);
        entries.push(DisplayEntry::new(label, content));
    }

    entries
}

/// Find the moderator's last marked message and strip the marker.
///
/// The check is substring containment: a marker anywhere in the message
/// qualifies, not only at the start.
pub fn extract_final_plan(transcript: &[Turn], moderator: &str) -> String {
    transcript
        .iter()
        .rev()
        .find(|turn| turn.is_from(moderator) && turn.text().contains(FINAL_PLAN_MARKER))
        .map(|turn| turn.text().replace(FINAL_PLAN_MARKER, "").trim().to_string())
        .unwrap_or_else(|| FINAL_PLAN_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::agent_types::SUBMITTER_NAME;

    const SCENARIO: &str = "17-year-old with fever and joint pain.";

    fn opening() -> String {
        format!("Hello team.\n\n--- PATIENT SCENARIO ---\n{}", SCENARIO)
    }

    #[test]
    fn test_scenario_input_surfaced_once_with_raw_text() {
        let transcript = vec![
            Turn::submitted(SUBMITTER_NAME, opening()),
            Turn::submitted(SUBMITTER_NAME, "follow-up without header"),
            Turn::spoken("James", "Consider Lyme disease."),
        ];

        let entries = format_transcript(&transcript, SCENARIO);
        let scenario_rows: Vec<_> = entries.iter().filter(|e| e.label == SCENARIO_LABEL).collect();
        assert_eq!(scenario_rows.len(), 1);
        assert_eq!(scenario_rows[0].content, SCENARIO);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_empty_and_whitespace_turns_dropped() {
        let transcript = vec![
            Turn::spoken("James", ""),
            Turn::spoken("David", "   \n\t"),
            Turn { role: TurnRole::Agent, speaker: Some("Jones".into()), content: None },
            Turn::spoken("Jones", "  Start doxycycline.  "),
        ];

        let entries = format_transcript(&transcript, SCENARIO);
        assert_eq!(entries, vec![DisplayEntry::new("Jones", "Start doxycycline.")]);
    }

    #[test]
    fn test_speakers_labeled_by_name_and_unnamed_as_moderator() {
        let transcript = vec![
            Turn::spoken("David", "Broad differential."),
            Turn { role: TurnRole::Agent, speaker: None, content: Some("Summary.".into()) },
        ];

        let entries = format_transcript(&transcript, SCENARIO);
        assert_eq!(entries[0].label, "David");
        assert_eq!(entries[1].label, UNNAMED_SPEAKER_LABEL);
    }

    #[test]
    fn test_order_preserved() {
        let transcript = vec![
            Turn::submitted(SUBMITTER_NAME, opening()),
            Turn::spoken("James", "one"),
            Turn::spoken("David", "two"),
            Turn::spoken("Masoud", "three"),
        ];
        let labels: Vec<_> = format_transcript(&transcript, SCENARIO)
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec![SCENARIO_LABEL, "James", "David", "Masoud"]);
    }

    #[test]
    fn test_extract_strips_marker_and_whitespace() {
        let transcript = vec![Turn::spoken("Masoud", "--- FINAL PLAN ---\nDiagnosis: X")];
        assert_eq!(extract_final_plan(&transcript, "Masoud"), "Diagnosis: X");
    }

    #[test]
    fn test_extract_prefers_latest_marked_turn() {
        let transcript = vec![
            Turn::spoken("Masoud", "--- FINAL PLAN ---\nDraft"),
            Turn::spoken("James", "I disagree."),
            Turn::spoken("Masoud", "--- FINAL PLAN ---\nRevised"),
            Turn::spoken("Masoud", "Thanks everyone."),
        ];
        assert_eq!(extract_final_plan(&transcript, "Masoud"), "Revised");
    }

    #[test]
    fn test_extract_ignores_marker_from_other_speakers() {
        let transcript = vec![Turn::spoken("James", "--- FINAL PLAN ---\nMine")];
        assert_eq!(extract_final_plan(&transcript, "Masoud"), FINAL_PLAN_FALLBACK);
    }

    #[test]
    fn test_extract_accepts_marker_mid_message() {
        let transcript = vec![Turn::spoken("Masoud", "Here it is.\n--- FINAL PLAN ---\nRest")];
        assert_eq!(extract_final_plan(&transcript, "Masoud"), "Here it is.\n\nRest");
    }

    #[test]
    fn test_extract_fallback_on_empty_transcript() {
        assert_eq!(extract_final_plan(&[], "Masoud"), FINAL_PLAN_FALLBACK);
    }
}
