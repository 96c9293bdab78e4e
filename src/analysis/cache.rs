use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::database::{Database, analyses};
use crate::error::Result;
use crate::locks::KeyedLocks;
use crate::models::{AnalysisResult, DeckRecord};

use super::AnalysisEngine;

/// Whether an analysis created at `created_at` can still be served
pub fn is_fresh(created_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now - created_at < window
}

/// Persisted analyses with a freshness window.
///
/// A deck is analyzed at most once per window; older results stay in the
/// history when a newer one is appended.
#[derive(Clone)]
pub struct AnalysisCache {
    database: Database,
    engine: AnalysisEngine,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    locks: KeyedLocks,
}

impl AnalysisCache {
    pub fn new(database: Database, engine: AnalysisEngine, clock: Arc<dyn Clock>, freshness: Duration) -> Self {
        Self {
            database,
            engine,
            clock,
            freshness,
            locks: KeyedLocks::new(),
        }
    }

    /// Returns the deck's latest analysis if it is fresh, otherwise analyzes
    /// the deck and stores the new result.
    ///
    /// # Errors
    /// * `Error::InvalidDeckSize` when the deck does not hold eight cards;
    ///   nothing is stored in that case
    pub async fn get_or_compute_analysis(&self, deck: &DeckRecord) -> Result<AnalysisResult> {
        let _guard = self.locks.lock(&deck.id.to_string()).await;
        let now = self.clock.now();
        let mut conn = self.database.acquire().await?;

        if let Some(latest) = analyses::latest_for_deck(&mut conn, deck.id).await? {
            if is_fresh(latest.created_at, now, self.freshness) {
                debug!("Reusing analysis {} for deck {}", latest.id, deck.id);
                return Ok(latest);
            }
        }

        let assessment = self.engine.analyze(&deck.card_definitions())?;
        let result = analyses::insert(&mut conn, deck.id, &assessment, now).await?;

        info!(
            "Analyzed deck {}: {} ({} strengths, {} weaknesses)",
            deck.id,
            result.assessment.rating,
            result.assessment.strengths.len(),
            result.assessment.weaknesses.len()
        );
        Ok(result)
    }

    pub async fn latest(&self, deck_id: i64) -> Result<Option<AnalysisResult>> {
        let mut conn = self.database.acquire().await?;
        analyses::latest_for_deck(&mut conn, deck_id).await
    }

    /// Every stored analysis of the deck, newest first
    pub async fn history(&self, deck_id: i64) -> Result<Vec<AnalysisResult>> {
        let mut conn = self.database.acquire().await?;
        analyses::history(&mut conn, deck_id).await
    }
}
