//! TapAI agent: turns free-form assistant replies into structured loyalty
//! objects and commits them atomically to merchant storage.

// No unsafe, anywhere.
#![deny(unsafe_code)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Every public item must be documented.
#![warn(missing_docs)]
// Naming conventions are enforced.
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
// Results and Options must be handled explicitly.
#![deny(unused_must_use)]
// Clippy discipline.
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::print_stdout)]

/// Client for the external AI assistant service.
pub mod assistant;
/// PIN-gated transactional commit of rewards and programs.
pub mod commit;
/// Conversations, turns, persistence, and the per-conversation state machine.
pub mod conversation;
/// Identifier, error, and configuration types.
pub mod core;
/// Human-readable templates for conditions and limitations.
pub mod display;
/// Reward, banner, and program domain models.
pub mod domain;
/// Content extraction: scanner, classifier, splitter.
pub mod extract;
/// HTTP server and API routes.
pub mod server;
/// Entry helpers to start the TapAI agent.
pub mod start_tapai_agent;
