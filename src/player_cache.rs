//! Read-through player cache
//!
//! Players are served from the database while their last fetch is younger
//! than the cache duration, and refreshed from the upstream provider
//! otherwise. Refreshes for the same tag are serialized, so concurrent
//! callers never fetch or write the same player twice.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::database::{Database, decks, players};
use crate::deck_registry::DeckRegistry;
use crate::error::{Error, Result};
use crate::locks::KeyedLocks;
use crate::models::{PlayerPage, PlayerView, normalize_tag};
use crate::provider::{GameDataProvider, RawBattle, parse_player_data};

/// Largest page `get_all_players` will return
pub const MAX_PAGE_SIZE: i64 = 100;

/// Whether a player last fetched at `last_fetched` must be fetched again.
///
/// A record exactly `cache_duration` old is still served from the cache.
pub fn needs_refresh(
    last_fetched: DateTime<Utc>,
    now: DateTime<Utc>,
    cache_duration: Duration,
    force_refresh: bool,
) -> bool {
    force_refresh || now - last_fetched > cache_duration
}

#[derive(Clone)]
pub struct PlayerCache {
    database: Database,
    provider: Arc<dyn GameDataProvider>,
    registry: DeckRegistry,
    clock: Arc<dyn Clock>,
    cache_duration: Duration,
    locks: KeyedLocks,
}

impl PlayerCache {
    pub fn new(
        database: Database,
        provider: Arc<dyn GameDataProvider>,
        registry: DeckRegistry,
        clock: Arc<dyn Clock>,
        cache_duration: Duration,
    ) -> Self {
        Self {
            database,
            provider,
            registry,
            clock,
            cache_duration,
            locks: KeyedLocks::new(),
        }
    }

    /// Returns the player, fetching from upstream when missing, stale or
    /// when `force_refresh` is set.
    ///
    /// The player row and its current deck are written in one transaction.
    /// If the upstream fetch fails the error is returned as is; a stale
    /// cached copy is never handed out in its place.
    ///
    /// # Errors
    /// * `Error::InvalidTag` for malformed tags
    /// * `Error::NotFound` when upstream does not know the tag
    /// * `Error::TransientProvider` on timeouts, 429 and 5xx
    pub async fn get_or_create_player(&self, tag: &str, force_refresh: bool) -> Result<PlayerView> {
        let tag = normalize_tag(tag)?;
        let _guard = self.locks.lock(&tag).await;
        let now = self.clock.now();

        let cached = {
            let mut conn = self.database.acquire().await?;
            players::find_by_tag(&mut conn, &tag).await?
        };

        if let Some(player) = cached {
            if !needs_refresh(player.last_fetched, now, self.cache_duration, force_refresh) {
                debug!("Serving cached player {}", player);
                let mut conn = self.database.acquire().await?;
                let current_deck = self.registry.current_deck(&mut conn, player.id).await?;
                return Ok(PlayerView {
                    player,
                    current_deck,
                    favourite_card: None,
                });
            }
        }

        info!("Fetching player {} from upstream", tag);
        let raw = self.provider.get_player(&tag).await?;
        let data = parse_player_data(&raw);
        let entries = self.registry.prepare_entries(&data.current_deck).await?;

        let mut tx = self.database.begin().await?;
        let player = players::upsert(&mut tx, &tag, &data, now).await?;
        let current_deck = if entries.is_empty() {
            self.registry.current_deck(&mut tx, player.id).await?
        } else {
            Some(self.registry.resolve_deck(&mut tx, player.id, &entries, now).await?)
        };
        tx.commit().await?;

        info!("Stored player {} ({} trophies)", player, player.trophies);
        Ok(PlayerView {
            player,
            current_deck,
            favourite_card: data.favourite_card,
        })
    }

    /// Returns the stored player without contacting upstream
    pub async fn get_player(&self, tag: &str) -> Result<PlayerView> {
        let tag = normalize_tag(tag)?;
        let mut conn = self.database.acquire().await?;

        let player = players::find_by_tag(&mut conn, &tag)
            .await?
            .ok_or_else(|| Error::not_found(format!("player {tag}")))?;
        let current_deck = self.registry.current_deck(&mut conn, player.id).await?;

        Ok(PlayerView {
            player,
            current_deck,
            favourite_card: None,
        })
    }

    /// One page of stored players, highest trophies first
    ///
    /// # Errors
    /// * `Error::InvalidPagination` unless `1 <= limit <= 100` and `offset >= 0`
    pub async fn get_all_players(&self, limit: i64, offset: i64) -> Result<PlayerPage> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(Error::InvalidPagination {
                message: format!("limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"),
            });
        }
        if offset < 0 {
            return Err(Error::InvalidPagination {
                message: format!("offset must not be negative, got {offset}"),
            });
        }

        let mut conn = self.database.acquire().await?;
        let players = players::list_by_trophies(&mut conn, limit, offset).await?;
        let total = players::count(&mut conn).await?;

        Ok(PlayerPage {
            players,
            total,
            limit,
            offset,
        })
    }

    /// Deletes the player together with the decks it created and their analyses
    pub async fn delete_player(&self, tag: &str) -> Result<()> {
        let tag = normalize_tag(tag)?;
        let _guard = self.locks.lock(&tag).await;

        let mut tx = self.database.begin().await?;
        let player = players::find_by_tag(&mut tx, &tag)
            .await?
            .ok_or_else(|| Error::not_found(format!("player {tag}")))?;

        let removed = decks::delete_owned_by(&mut tx, player.id).await?;
        players::delete(&mut tx, player.id).await?;
        tx.commit().await?;

        info!("Deleted player {} and {} decks", player, removed);
        Ok(())
    }

    /// Recent battles straight from upstream; nothing is stored
    pub async fn player_battles(&self, tag: &str) -> Result<Vec<RawBattle>> {
        let tag = normalize_tag(tag)?;
        self.provider.get_player_battles(&tag).await
    }
}
