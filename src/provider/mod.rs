//! Upstream game-data provider boundary
//!
//! Raw payloads are deserialized straight into the typed records below and
//! translated into local models by [`parse_player_data`] and
//! [`parse_card_data`]. Nothing past this module sees untyped JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CardType, DEFAULT_MAX_LEVEL, ParsedCard, Rarity};

mod clash_royale;

pub use clash_royale::ClashRoyaleClient;

/// Source of player, battle and card data
#[async_trait]
pub trait GameDataProvider: Send + Sync {
    /// Fetch a player's profile and current deck
    ///
    /// # Arguments
    /// * `tag` - Normalized player tag, including the leading `#`
    ///
    /// # Errors
    /// * `Error::NotFound` if the tag is unknown upstream
    /// * `Error::TransientProvider` on timeouts, 429 and 5xx responses
    async fn get_player(&self, tag: &str) -> Result<RawPlayer>;

    /// Fetch a player's recent battles
    async fn get_player_battles(&self, tag: &str) -> Result<Vec<RawBattle>>;

    /// Fetch every card known upstream
    async fn get_cards(&self) -> Result<Vec<RawCard>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlayer {
    pub tag: String,
    pub name: String,
    pub exp_level: Option<i64>,
    pub trophies: i64,
    pub best_trophies: i64,
    pub wins: i64,
    pub losses: i64,
    pub battle_count: i64,
    pub three_crown_wins: i64,
    pub arena: Option<RawArena>,
    pub clan: Option<RawClan>,
    pub current_deck: Vec<RawCard>,
    pub current_favourite_card: Option<RawCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawArena {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawClan {
    pub tag: Option<String>,
    pub name: Option<String>,
}

/// A card as it appears in the card list or inside a player's deck
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCard {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Only present on deck entries
    pub level: Option<i32>,
    pub max_level: Option<i32>,
    pub elixir_cost: Option<i32>,
    pub rarity: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub icon_urls: Option<RawIconUrls>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIconUrls {
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCardList {
    pub items: Vec<RawCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBattle {
    #[serde(rename = "type")]
    pub battle_type: Option<String>,
    pub battle_time: Option<String>,
    pub game_mode: Option<RawGameMode>,
    pub team: Vec<RawBattleSide>,
    pub opponent: Vec<RawBattleSide>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGameMode {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBattleSide {
    pub tag: Option<String>,
    pub name: Option<String>,
    pub crowns: Option<i64>,
}

/// One slot of a player's current deck as reported upstream
#[derive(Debug, Clone, PartialEq)]
pub struct DeckEntry {
    pub card: ParsedCard,
    pub level: i32,
    pub position: i32,
}

/// Player fields translated from an upstream payload
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub tag: String,
    pub name: String,
    pub trophies: i64,
    pub best_trophies: i64,
    pub wins: i64,
    pub losses: i64,
    pub battle_count: i64,
    pub three_crown_wins: i64,
    pub exp_level: i64,
    pub arena_id: Option<i64>,
    pub arena_name: Option<String>,
    pub clan_name: Option<String>,
    pub clan_tag: Option<String>,
    pub current_deck: Vec<DeckEntry>,
    pub favourite_card: Option<ParsedCard>,
}

/// Translates an upstream card into local card fields.
///
/// Returns `None` when the payload carries no card id. Missing max level
/// defaults to 14; unknown rarity and type names resolve to common and troop.
pub fn parse_card_data(raw: &RawCard) -> Option<ParsedCard> {
    let card_id = raw.id?;

    Some(ParsedCard {
        card_id,
        name: raw.name.clone().unwrap_or_default(),
        max_level: raw.max_level.unwrap_or(DEFAULT_MAX_LEVEL),
        icon_url: raw
            .icon_urls
            .as_ref()
            .and_then(|urls| urls.medium.clone())
            .filter(|url| !url.is_empty()),
        elixir_cost: raw.elixir_cost.unwrap_or(0).clamp(0, 10),
        rarity: raw.rarity.as_deref().map_or(Rarity::Common, Rarity::from_api),
        card_type: raw.card_type.as_deref().map_or(CardType::Troop, CardType::from_api),
    })
}

/// Translates an upstream player payload into local player fields
pub fn parse_player_data(raw: &RawPlayer) -> PlayerData {
    let current_deck = raw
        .current_deck
        .iter()
        .enumerate()
        .filter_map(|(position, card)| {
            parse_card_data(card).map(|parsed| DeckEntry {
                card: parsed,
                level: card.level.unwrap_or(1),
                position: i32::try_from(position).unwrap_or(i32::MAX),
            })
        })
        .collect();

    let arena = raw.arena.clone().unwrap_or_default();
    let clan = raw.clan.clone().unwrap_or_default();

    PlayerData {
        tag: raw.tag.clone(),
        name: raw.name.clone(),
        trophies: raw.trophies,
        best_trophies: raw.best_trophies,
        wins: raw.wins,
        losses: raw.losses,
        battle_count: raw.battle_count,
        three_crown_wins: raw.three_crown_wins,
        exp_level: raw.exp_level.unwrap_or(1),
        arena_id: arena.id,
        arena_name: arena.name,
        clan_name: clan.name,
        clan_tag: clan.tag,
        current_deck,
        favourite_card: raw.current_favourite_card.as_ref().and_then(parse_card_data),
    }
}
