//! Clinical Panel - Multi-Agent Clinical Consultation Library
//!
//! Three role-played specialists and a moderator discuss a clinical case:
//! - OpenAI-compatible LLM client (Gemini, OpenRouter, custom endpoints)
//! - Group chat engine with model-driven speaker selection
//! - Transcript formatting, final plan extraction and Markdown rendering
//! - Browser UI and JSON API served with axum
//!
//! # Example
//!
//! ```ignore
//! use clinical_panel::config::Config;
//! use clinical_panel::orchestrator::{run_consultation, ConsultationRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let request = ConsultationRequest::with_defaults("AIza...", 5, "**Patient:** ...");
//!     let outcome = run_consultation(&config.llm, &reqwest::Client::new(), &request).await;
//!     println!("{}", outcome.final_plan);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod markdown;
pub mod types;
pub mod config;
pub mod agent;
pub mod orchestrator;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use agent::llm::{ChatBackend, LlmClient, ProviderConfig};
pub use config::Config;
pub use orchestrator::{
    run_consultation,
    ConsultationOutcome,
    ConsultationRequest,
    GroupChatEngine,
    LlmGroupChat,
};
pub use types::{DisplayEntry, Transcript, Turn, TurnRole};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Multi-Agent Clinical Consultation", NAME, VERSION)
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_safe_respects_char_boundaries() {
        assert_eq!(truncate_safe("hello", 10), "hello");
        assert_eq!(truncate_safe("hello", 3), "hel");
        // '°' is two bytes
        assert_eq!(truncate_safe("39°C", 3), "39");
    }

    #[test]
    fn test_info() {
        assert!(info().contains(VERSION));
    }
}
