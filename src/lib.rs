//! Clash Royale deck analyzer
//!
//! Fetches players from the upstream API through a staleness-gated cache,
//! deduplicates their decks by content and scores each deck with a
//! rule-based analysis engine.

pub mod analysis;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod database;
pub mod deck_analyzer;
pub mod deck_registry;
pub mod error;
pub mod locks;
pub mod models;
pub mod player_cache;
pub mod provider;

pub use config::Config;
pub use deck_analyzer::DeckAnalyzer;
pub use error::{Error, Result};
