//! Default panel personalities and sample case
//!
//! These seed the Settings tab and the `consult` command. Every value can be
//! overridden per request.

use serde::Serialize;

use super::agent_types::{AgentSpec, MAX_ROUNDS, MIN_ROUNDS};

pub const DEFAULT_PEDIATRICIAN_NAME: &str = "James";
pub const DEFAULT_PEDIATRICIAN_PROMPT: &str = r#"You are Dr. James, a distinguished Professor of Pediatrics.
Your focus is on child-specific diseases, developmental considerations, and family-centered care.
When analyzing a case, always consider the patient's age, growth, and developmental milestones.
You are cautious with medications and interventions in children.
Your tone is academic, thoughtful, and slightly protective. You must ground your reasoning in pediatric principles."#;

pub const DEFAULT_INTERNIST_NAME: &str = "David";
pub const DEFAULT_INTERNIST_PROMPT: &str = r#"You are Dr. David, a seasoned Professor of Internal Medicine.
You have a deep, systemic understanding of adult diseases, complex comorbidities, and evidence-based medicine.
You approach problems with a broad differential diagnosis and rely heavily on pathophysiology and clinical guidelines for adults.
Your tone is authoritative, analytical, and data-driven."#;

pub const DEFAULT_CLINICIAN_NAME: &str = "Jones";
pub const DEFAULT_CLINICIAN_PROMPT: &str = r#"You are Dr. Jones, a Clinical Professor of Internal Medicine.
You bridge the gap between academic theory and real-world clinical practice.
You are pragmatic, patient-focused, and highly attuned to the practicalities of management, including patient adherence, cost, and side effects.
You often bring a "what would I actually do in the clinic on a busy Monday?" perspective.
Your tone is practical, empathetic, and direct."#;

pub const DEFAULT_MODERATOR_NAME: &str = "Masoud";
pub const DEFAULT_MODERATOR_PROMPT: &str = r#"You are Masoud, the moderator of this medical consultation.
Your role is to guide the discussion, ensure all specialists contribute, and prevent the conversation from getting stuck.
After the experts have presented their views, your primary task is to synthesize their opinions, identify points of consensus and disagreement, and formulate a clear, actionable final plan.
Do not offer your own medical opinions. Your job is to create a coherent summary of the team's conclusion.
When you are ready to write the final plan, you MUST start your entire message with the phrase '--- FINAL PLAN ---' and nothing else.
Format the final plan using clear headings and bullet points for sections like "Diagnosis", "Treatment", and "Follow-up". Ensure the language is easy to understand for a non-medical professional."#;

pub const DEFAULT_SCENARIO: &str = r#"**Patient:** A 17-year-old male.
**Chief Complaint:** Presents with a 5-day history of fever, a rash, and joint pain.
**History of Present Illness:** The fever started 5 days ago, peaking at 103°F (39.4°C). Two days ago, he developed a pink, macular rash on his trunk and limbs. Today, he reports significant pain and swelling in both knees and ankles, making it difficult to walk. He also mentions a sore throat that started a week ago.
**Past Medical History:** Unremarkable, up to date on all immunizations.
**Medications:** Ibuprofen for fever and pain, with partial relief.
**Social History:** High school student, lives with parents, denies smoking, alcohol, or drug use. Recently returned from a camping trip in the northeastern United States two weeks ago."#;

/// Default specialists in panel order: pediatrician, internist, clinician
pub fn default_specialists() -> [AgentSpec; 3] {
    [
        AgentSpec::new(DEFAULT_PEDIATRICIAN_NAME, DEFAULT_PEDIATRICIAN_PROMPT),
        AgentSpec::new(DEFAULT_INTERNIST_NAME, DEFAULT_INTERNIST_PROMPT),
        AgentSpec::new(DEFAULT_CLINICIAN_NAME, DEFAULT_CLINICIAN_PROMPT),
    ]
}

pub fn default_moderator() -> AgentSpec {
    AgentSpec::new(DEFAULT_MODERATOR_NAME, DEFAULT_MODERATOR_PROMPT)
}

/// Titles shown on the Settings tab accordions, in panel order
pub const AGENT_TITLES: [&str; 4] = [
    "Pediatrician",
    "Internal Medicine Professor",
    "Clinical IM Professor",
    "Moderator",
];

/// Everything the UI needs to populate its initial form state
#[derive(Debug, Clone, Serialize)]
pub struct PanelDefaults {
    pub specialists: [AgentSpec; 3],
    pub moderator: AgentSpec,
    pub agent_titles: [&'static str; 4],
    pub patient_scenario: &'static str,
    pub min_rounds: u32,
    pub max_rounds: u32,
    pub default_rounds: u32,
}

impl PanelDefaults {
    pub fn new(default_rounds: u32) -> Self {
        Self {
            specialists: default_specialists(),
            moderator: default_moderator(),
            agent_titles: AGENT_TITLES,
            patient_scenario: DEFAULT_SCENARIO,
            min_rounds: MIN_ROUNDS,
            max_rounds: MAX_ROUNDS,
            default_rounds: default_rounds.clamp(MIN_ROUNDS, MAX_ROUNDS),
        }
    }
}
