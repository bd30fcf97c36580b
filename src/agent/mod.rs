//! Agent module - LLM interaction

pub mod llm;
