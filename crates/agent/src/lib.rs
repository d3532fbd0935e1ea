//! Agent Runtime - rule-based scheduling dialogue
//!
//! This crate turns one free-text message into one reply:
//! - Extracts intent, date, time range and title from the text (`extraction`)
//! - Drives the scheduling flow from `tailortalk-core` through availability
//!   lookup or event booking (`runtime`)
//! - Renders the outcome as a fixed-vocabulary reply (`render`)
//!
//! # Key Types
//!
//! - `AgentRuntime` - per-message orchestrator, shared behind an `Arc`
//! - `FieldExtractor` - pluggable text-to-fields boundary
//! - `ResponseRenderer` - outcome-to-text templates
//!
//! # Failure Principle
//!
//! Nothing here returns an error to the caller. Unparseable text degrades to
//! defaults and calendar failures become an apology.

pub mod extraction;
pub mod render;
pub mod runtime;

pub use extraction::{FieldExtractor, RuleBasedExtractor};
pub use render::ResponseRenderer;
pub use runtime::AgentRuntime;
