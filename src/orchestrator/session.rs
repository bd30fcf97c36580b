//! Consultation session
//!
//! Validates the request, builds the panel, hands the exchange to a
//! [`GroupChatEngine`] and turns the resulting transcript into display rows
//! and a final plan. Failures never escape: they are rendered into the
//! final plan slot with an empty transcript.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::agent::llm::{LlmClient, ProviderConfig};
use crate::config::{LlmSettings, Provider};
use crate::markdown::render_markdown;
use crate::types::{DisplayEntry, Transcript};

use super::agent_types::{AgentSpec, Panel, MAX_ROUNDS, MIN_ROUNDS};
use super::group_chat::{GroupChatEngine, LlmGroupChat};
use super::prompts::{default_moderator, default_specialists};
use super::transcript::{extract_final_plan, format_transcript};

/// Input violations detected before any external call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("**Error: API Key is missing.** Please go to the Settings tab and enter your Google API Key.")]
    MissingApiKey,
    #[error("**Error: Patient Scenario is empty.** Please enter the patient details to start.")]
    EmptyScenario,
    #[error("**Error: Max Conversation Rounds must be between {min} and {max}.** Adjust the slider in the Settings tab.")]
    RoundsOutOfRange { value: i64, min: u32, max: u32 },
}

/// Everything the UI submits for one run
#[derive(Clone, Deserialize)]
pub struct ConsultationRequest {
    #[serde(default)]
    pub api_key: String,
    pub max_rounds: i64,
    #[serde(default)]
    pub patient_scenario: String,
    #[serde(default = "default_specialists")]
    pub specialists: [AgentSpec; 3],
    #[serde(default = "default_moderator")]
    pub moderator: AgentSpec,
}

impl ConsultationRequest {
    /// Request using the default panel
    pub fn with_defaults(api_key: impl Into<String>, max_rounds: i64, patient_scenario: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            max_rounds,
            patient_scenario: patient_scenario.into(),
            specialists: default_specialists(),
            moderator: default_moderator(),
        }
    }

    /// Check preconditions in order; returns the round limit on success
    pub fn validate(&self) -> Result<u32, PreconditionError> {
        if self.api_key.trim().is_empty() {
            return Err(PreconditionError::MissingApiKey);
        }
        if self.patient_scenario.trim().is_empty() {
            return Err(PreconditionError::EmptyScenario);
        }
        if !(i64::from(MIN_ROUNDS)..=i64::from(MAX_ROUNDS)).contains(&self.max_rounds) {
            return Err(PreconditionError::RoundsOutOfRange {
                value: self.max_rounds,
                min: MIN_ROUNDS,
                max: MAX_ROUNDS,
            });
        }
        Ok(self.max_rounds as u32)
    }
}

impl std::fmt::Debug for ConsultationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsultationRequest")
            .field("api_key", &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("max_rounds", &self.max_rounds)
            .field("patient_scenario_len", &self.patient_scenario.len())
            .field("specialists", &self.specialists.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
            .field("moderator", &self.moderator.name)
            .finish()
    }
}

/// Result of one run as returned to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub transcript: Vec<DisplayEntry>,
    /// Markdown plan, or the error message when the run failed
    pub final_plan: String,
    /// `final_plan` rendered for the browser
    #[serde(default)]
    pub final_plan_html: String,
}

impl ConsultationOutcome {
    fn new(run_id: Uuid, started_at: DateTime<Utc>, transcript: Vec<DisplayEntry>, final_plan: String) -> Self {
        Self {
            run_id,
            started_at,
            transcript,
            final_plan_html: render_markdown(&final_plan),
            final_plan,
        }
    }

    fn failed(run_id: Uuid, started_at: DateTime<Utc>, message: String) -> Self {
        Self::new(run_id, started_at, Vec::new(), message)
    }
}

/// Opening message posted by the submitter
pub fn opening_message(moderator: &str, scenario: &str) -> String {
    format!(
        "Hello team. Here is the patient case for today's consultation.\n\
         Please discuss your approaches to diagnosis and management based on your specialties.\n\
         The goal is to arrive at a consensus plan.\n\
         {moderator}, please moderate and provide the final summary plan at the end.\n\
         \n\
         --- PATIENT SCENARIO ---\n\
         {scenario}\n"
    )
}

/// User-facing text for a failed run: error, likely causes, full chain
pub fn diagnostic_message(err: &anyhow::Error, settings: &LlmSettings) -> String {
    let vendor = match settings.provider {
        Provider::Gemini => "Google",
        Provider::OpenRouter => "OpenRouter",
        Provider::Custom => "provider",
    };
    format!(
        "An error occurred: {err:#}\n\n\
         Common issues:\n\
         - Invalid or expired {vendor} API key.\n\
         - Ensure the model name '{model}' is correct and you have access.\n\
         - Network connectivity issues.\n\n\
         Traceback:\n{err:?}",
        model = settings.model,
    )
}

/// Run a consultation against the configured provider.
///
/// The credential from `request` is bound to a client built for this run
/// only; nothing process-wide is touched.
pub async fn run_consultation(
    settings: &LlmSettings,
    http: &reqwest::Client,
    request: &ConsultationRequest,
) -> ConsultationOutcome {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let rounds = match request.validate() {
        Ok(rounds) => rounds,
        Err(e) => {
            info!(%run_id, "Consultation rejected: {:?}", e);
            return ConsultationOutcome::failed(run_id, started_at, e.to_string());
        }
    };

    let provider = match ProviderConfig::from_settings(settings, request.api_key.trim().to_string()) {
        Ok(provider) => provider,
        Err(e) => {
            error!(%run_id, "Provider configuration failed: {:#}", e);
            return ConsultationOutcome::failed(run_id, started_at, diagnostic_message(&e, settings));
        }
    };
    let engine = LlmGroupChat::new(
        LlmClient::with_http_client(http.clone(), provider),
        settings.clone(),
    );

    run_validated(&engine, settings, request, rounds, run_id, started_at).await
}

/// Run a consultation with an explicit engine
pub async fn run_with_engine<E>(
    engine: &E,
    settings: &LlmSettings,
    request: &ConsultationRequest,
) -> ConsultationOutcome
where
    E: GroupChatEngine + ?Sized,
{
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    match request.validate() {
        Ok(rounds) => run_validated(engine, settings, request, rounds, run_id, started_at).await,
        Err(e) => {
            info!(%run_id, "Consultation rejected: {:?}", e);
            ConsultationOutcome::failed(run_id, started_at, e.to_string())
        }
    }
}

async fn run_validated<E>(
    engine: &E,
    settings: &LlmSettings,
    request: &ConsultationRequest,
    rounds: u32,
    run_id: Uuid,
    started_at: DateTime<Utc>,
) -> ConsultationOutcome
where
    E: GroupChatEngine + ?Sized,
{
    let span = tracing::info_span!("consultation", %run_id);
    async move {
        info!("Starting consultation: model={} rounds={}", settings.model, rounds);

        match exchange(engine, request, rounds).await {
            Ok((transcript, moderator)) => {
                let entries = format_transcript(&transcript, &request.patient_scenario);
                let final_plan = extract_final_plan(&transcript, &moderator);
                info!(
                    "Consultation finished: {} turns, {} displayed, {:.1}s",
                    transcript.len(),
                    entries.len(),
                    (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0
                );
                ConsultationOutcome::new(run_id, started_at, entries, final_plan)
            }
            Err(e) => {
                error!("Consultation failed: {:#}", e);
                ConsultationOutcome::failed(run_id, started_at, diagnostic_message(&e, settings))
            }
        }
    }
    .instrument(span)
    .await
}

async fn exchange<E>(engine: &E, request: &ConsultationRequest, rounds: u32) -> Result<(Transcript, String)>
where
    E: GroupChatEngine + ?Sized,
{
    let panel = Panel::new(&request.specialists, &request.moderator)?;
    let opening = opening_message(panel.moderator().name(), &request.patient_scenario);
    let transcript = engine.run(&panel, &opening, rounds).await?;
    Ok((transcript, panel.moderator().name().to_string()))
}
