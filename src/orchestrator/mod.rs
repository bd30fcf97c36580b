//! Multi-agent consultation orchestration

pub mod agent_types;
pub mod group_chat;
pub mod prompts;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use agent_types::{AgentSpec, Panel, PanelRole, Participant};
pub use group_chat::{GroupChatEngine, LlmGroupChat};
pub use session::{
    run_consultation, run_with_engine, ConsultationOutcome, ConsultationRequest, PreconditionError,
};
pub use transcript::{extract_final_plan, format_transcript};
