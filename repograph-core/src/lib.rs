//! Repograph core library — entity model, extraction, resolution passes, and store.
//!
//! The main entry point is [`pipeline::BuildPipeline`], which runs the
//! extract → imports → inheritance → references passes over a
//! [`store::GraphStore`].

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod resolve;
pub mod store;
pub mod types;
