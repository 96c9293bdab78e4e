//! Card catalog
//!
//! Read-mostly mapping from upstream card ids to local card definitions.
//! Writes (full sync and lazy imports) are serialized behind one lock;
//! lookups go straight to the database and never wait on it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::database::Database;
use crate::database::cards::{self, UpsertOutcome};
use crate::error::{Error, Result};
use crate::models::{CardDefinition, CardType, CardUsage, ParsedCard, Rarity};
use crate::provider::{GameDataProvider, parse_card_data};

mod roles;

pub use roles::derive_tags;

/// Outcome of a full catalog sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub updated: usize,
    /// Upstream entries without an id
    pub skipped: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.synced + self.updated
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub card_type: Option<CardType>,
    pub rarity: Option<Rarity>,
}

/// Builds the local definition of an upstream card, tags included
pub fn define_card(parsed: &ParsedCard) -> CardDefinition {
    CardDefinition {
        card_id: parsed.card_id,
        name: parsed.name.clone(),
        max_level: parsed.max_level,
        icon_url: parsed.icon_url.clone(),
        elixir_cost: parsed.elixir_cost,
        rarity: parsed.rarity,
        card_type: parsed.card_type,
        tags: derive_tags(&parsed.name),
    }
}

#[derive(Clone)]
pub struct CardCatalog {
    database: Database,
    provider: Arc<dyn GameDataProvider>,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl CardCatalog {
    pub fn new(database: Database, provider: Arc<dyn GameDataProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            database,
            provider,
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Imports every upstream card, updating the ones already present
    pub async fn sync_cards(&self) -> Result<SyncReport> {
        let _guard = self.write_lock.lock().await;

        info!("Syncing card catalog from upstream");
        let raw_cards = self.provider.get_cards().await?;
        let now = self.clock.now();

        let mut report = SyncReport::default();
        let mut tx = self.database.begin().await?;

        for raw in &raw_cards {
            let Some(parsed) = parse_card_data(raw) else {
                report.skipped += 1;
                continue;
            };

            match cards::upsert(&mut tx, &define_card(&parsed), now).await? {
                UpsertOutcome::Inserted => report.synced += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
        }

        tx.commit().await?;

        info!(
            "Card sync complete: {} new, {} updated, {} skipped",
            report.synced, report.updated, report.skipped
        );
        Ok(report)
    }

    pub async fn get_card(&self, card_id: i64) -> Result<CardDefinition> {
        let mut conn = self.database.acquire().await?;
        cards::find(&mut conn, card_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("card {card_id}")))
    }

    pub async fn list_cards(&self, filter: CardFilter) -> Result<Vec<CardDefinition>> {
        let mut conn = self.database.acquire().await?;
        cards::list(&mut conn, filter.card_type, filter.rarity).await
    }

    /// Most-used cards across every stored deck
    pub async fn card_usage_statistics(&self, limit: i64) -> Result<Vec<CardUsage>> {
        let mut conn = self.database.acquire().await?;
        cards::usage_statistics(&mut conn, limit.max(0)).await
    }

    /// Resolves deck cards to catalog definitions, in the order given.
    ///
    /// Cards the catalog has not imported yet are looked up in the upstream
    /// card list and inserted; a card upstream does not list either is
    /// imported from the deck payload itself.
    pub async fn resolve_cards(&self, requested: &[ParsedCard]) -> Result<Vec<CardDefinition>> {
        let mut known = self.lookup(requested).await?;

        if requested.iter().any(|card| !known.contains_key(&card.card_id)) {
            let _guard = self.write_lock.lock().await;

            // A sync may have finished while we waited
            known = self.lookup(requested).await?;
            let missing: Vec<&ParsedCard> = requested
                .iter()
                .filter(|card| !known.contains_key(&card.card_id))
                .collect();

            if !missing.is_empty() {
                self.import_missing(&missing).await?;
                known = self.lookup(requested).await?;
            }
        }

        requested
            .iter()
            .map(|card| {
                known
                    .get(&card.card_id)
                    .cloned()
                    .ok_or_else(|| Error::not_found(format!("card {}", card.card_id)))
            })
            .collect()
    }

    async fn lookup(&self, requested: &[ParsedCard]) -> Result<HashMap<i64, CardDefinition>> {
        let mut conn = self.database.acquire().await?;
        let mut known = HashMap::with_capacity(requested.len());

        for card in requested {
            if known.contains_key(&card.card_id) {
                continue;
            }
            if let Some(definition) = cards::find(&mut conn, card.card_id).await? {
                known.insert(card.card_id, definition);
            }
        }

        Ok(known)
    }

    async fn import_missing(&self, missing: &[&ParsedCard]) -> Result<()> {
        info!("Importing {} cards missing from the catalog", missing.len());

        let upstream: HashMap<i64, ParsedCard> = self
            .provider
            .get_cards()
            .await?
            .iter()
            .filter_map(parse_card_data)
            .map(|card| (card.card_id, card))
            .collect();

        let now = self.clock.now();
        let mut conn = self.database.acquire().await?;

        for card in missing {
            let parsed = match upstream.get(&card.card_id) {
                Some(listed) => listed,
                None => {
                    warn!(
                        "Card {} ({}) is not in the upstream card list, importing from deck data",
                        card.card_id, card.name
                    );
                    *card
                }
            };
            cards::insert_if_absent(&mut conn, &define_card(parsed), now).await?;
        }

        Ok(())
    }
}
