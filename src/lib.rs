//! voice-memo: record or upload a voice memo, transcribe it with an external
//! tool, optionally restructure it with an LLM, and save the result as a
//! templated markdown note in a vault folder.

pub mod config;
pub mod llm;
pub mod pipeline;
pub mod templates;
pub mod transcription;
