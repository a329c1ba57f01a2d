//! Core data models for Engine Console
//!
//! The supervised engine process record and the tagged output events that
//! flow from the console to its host.

pub mod engine_process;
pub mod output_event;

// Re-exports for convenience
pub use engine_process::{EngineProcess, ProcessState};
pub use output_event::{Channel, Level, Notice, OutputEvent};
