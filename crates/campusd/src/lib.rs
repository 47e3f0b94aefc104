//! campusd - university assistant daemon.
//!
//! Answers student questions by trying a retrieval-augmented answer
//! over the document index first, judging it with an evaluator, and
//! falling back to a deterministic intent-routing graph over the
//! student-records store when retrieval is not enough.

pub mod config;
pub mod evaluator;
pub mod extract;
pub mod graph;
pub mod handlers;
pub mod intent;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod retrieval;
pub mod routes;
pub mod server;
pub mod store;
