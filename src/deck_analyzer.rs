use std::sync::Arc;

use tracing::{error, info, warn};

use crate::analysis::{AnalysisCache, AnalysisEngine};
use crate::catalog::{CardCatalog, CardFilter, SyncReport};
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheSettings, Config};
use crate::database::Database;
use crate::deck_registry::DeckRegistry;
use crate::error::{Error, Result};
use crate::models::{
    AnalysisResult, CardDefinition, CardUsage, DeckAnalysisView, PlayerPage, PlayerView,
};
use crate::player_cache::PlayerCache;
use crate::provider::{ClashRoyaleClient, GameDataProvider, RawBattle};

/// Entry point tying the catalog, player cache and analysis cache together
#[derive(Clone)]
pub struct DeckAnalyzer {
    catalog: CardCatalog,
    players: PlayerCache,
    analyses: AnalysisCache,
}

impl DeckAnalyzer {
    pub async fn new(config: &Config) -> Result<Self> {
        let database = Database::new(&config.database_url).await?;
        let provider = ClashRoyaleClient::new(&config.provider)?;

        Ok(Self::from_parts(
            database,
            Arc::new(provider),
            Arc::new(SystemClock),
            &config.cache,
        ))
    }

    pub fn from_parts(
        database: Database,
        provider: Arc<dyn GameDataProvider>,
        clock: Arc<dyn Clock>,
        settings: &CacheSettings,
    ) -> Self {
        let catalog = CardCatalog::new(database.clone(), provider.clone(), clock.clone());
        let registry = DeckRegistry::new(catalog.clone());
        let players = PlayerCache::new(
            database.clone(),
            provider,
            registry,
            clock.clone(),
            settings.player_cache_duration,
        );
        let analyses = AnalysisCache::new(
            database,
            AnalysisEngine::new(settings.thresholds.clone()),
            clock,
            settings.analysis_freshness,
        );

        Self {
            catalog,
            players,
            analyses,
        }
    }

    pub async fn get_or_create_player(&self, tag: &str, force_refresh: bool) -> Result<PlayerView> {
        self.players.get_or_create_player(tag, force_refresh).await
    }

    pub async fn get_player(&self, tag: &str) -> Result<PlayerView> {
        self.players.get_player(tag).await
    }

    pub async fn get_all_players(&self, limit: i64, offset: i64) -> Result<PlayerPage> {
        self.players.get_all_players(limit, offset).await
    }

    pub async fn delete_player(&self, tag: &str) -> Result<()> {
        self.players.delete_player(tag).await
    }

    pub async fn player_battles(&self, tag: &str) -> Result<Vec<RawBattle>> {
        self.players.player_battles(tag).await
    }

    /// Loads the player through the cache and analyzes its current deck,
    /// reusing a fresh analysis when one exists.
    ///
    /// # Errors
    /// * `Error::NotFound` when the player has no current deck
    pub async fn analyze_player_deck(&self, tag: &str) -> Result<DeckAnalysisView> {
        let view = self.players.get_or_create_player(tag, false).await?;
        let deck = view
            .current_deck
            .ok_or_else(|| Error::not_found(format!("current deck of {}", view.player.tag)))?;
        let analysis = self.analyses.get_or_compute_analysis(&deck).await?;

        Ok(DeckAnalysisView {
            player: view.player,
            deck,
            analysis,
        })
    }

    /// Stored analyses of the player's current deck, newest first
    pub async fn analysis_history(&self, tag: &str) -> Result<Vec<AnalysisResult>> {
        let view = self.players.get_player(tag).await?;
        let deck = view
            .current_deck
            .ok_or_else(|| Error::not_found(format!("current deck of {}", view.player.tag)))?;

        self.analyses.history(deck.id).await
    }

    pub async fn sync_cards(&self) -> Result<SyncReport> {
        self.catalog.sync_cards().await
    }

    pub async fn get_card(&self, card_id: i64) -> Result<CardDefinition> {
        self.catalog.get_card(card_id).await
    }

    pub async fn list_cards(&self, filter: CardFilter) -> Result<Vec<CardDefinition>> {
        self.catalog.list_cards(filter).await
    }

    pub async fn card_usage_statistics(&self, limit: i64) -> Result<Vec<CardUsage>> {
        self.catalog.card_usage_statistics(limit).await
    }

    /// Refreshes and analyzes every watched player. A failing tag is logged
    /// and skipped; returns how many players were analyzed.
    pub async fn check_watched_players(&self, tags: &[String]) -> usize {
        let mut analyzed = 0;

        for tag in tags {
            match self.analyze_player_deck(tag).await {
                Ok(view) => {
                    info!(
                        "{}: deck {} rated {}",
                        view.player, view.deck.id, view.analysis.assessment.rating
                    );
                    analyzed += 1;
                }
                Err(e) if e.is_retryable() => {
                    warn!("Upstream unavailable for {}, will retry next run: {}", tag, e);
                }
                Err(e) => {
                    error!("Error analyzing {}: {}", tag, e);
                }
            }
        }

        if analyzed > 0 {
            info!("Analyzed {} of {} watched players", analyzed, tags.len());
        } else if !tags.is_empty() {
            info!("No watched players could be analyzed");
        }

        analyzed
    }
}
