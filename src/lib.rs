//! Evidence retrieval and grounded-answer engine.
//!
//! Ingests research papers from external feeds into a persistent,
//! deduplicated corpus, ranks them against free-text health questions with
//! a TF-IDF vector index, and synthesizes answers through an external
//! generative model — refusing, with a fixed fallback, whenever the
//! evidence is too weak to cite.

pub mod context;
pub mod core;
pub mod corpus;
pub mod engine;
pub mod fetch;
pub mod index;
pub mod llm;
pub mod logging;
pub mod retrieve;
pub mod server;
pub mod state;
pub mod synthesis;
