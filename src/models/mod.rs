//! Data models for cards, players, decks and their analyses

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

mod analysis;

pub use analysis::{
    AnalysisResult, Assessment, Metrics, Rating, Severity, Strength, Suggestion, SuggestionKind,
    Weakness,
};

/// Number of cards in a complete deck
pub const DECK_SIZE: usize = 8;

/// Max level assumed when the upstream payload omits one
pub const DEFAULT_MAX_LEVEL: i32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
}

impl Rarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
            Self::Champion => "champion",
        }
    }

    /// Maps an upstream rarity name (`"Champion"`, `"rare"`, ...) onto the
    /// local enum. Unknown names resolve to `Common`.
    pub fn from_api(name: &str) -> Self {
        name.parse().unwrap_or(Self::Common)
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            "champion" => Ok(Self::Champion),
            other => Err(format!("unknown rarity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Troop,
    Spell,
    Building,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Troop => "troop",
            Self::Spell => "spell",
            Self::Building => "building",
        }
    }

    /// Maps an upstream type name onto the local enum. Unknown names resolve to `Troop`.
    pub fn from_api(name: &str) -> Self {
        name.parse().unwrap_or(Self::Troop)
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "troop" => Ok(Self::Troop),
            "spell" => Ok(Self::Spell),
            "building" => Ok(Self::Building),
            other => Err(format!("unknown card type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellWeight {
    #[default]
    None,
    Light,
    Heavy,
}

impl SpellWeight {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Heavy => "heavy",
        }
    }
}

impl FromStr for SpellWeight {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "light" => Ok(Self::Light),
            "heavy" => Ok(Self::Heavy),
            other => Err(format!("unknown spell weight: {other}")),
        }
    }
}

/// Analysis tags derived for a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardTags {
    pub is_win_condition: bool,
    pub is_air_targeting: bool,
    pub is_splash_damage: bool,
    pub is_tank: bool,
    pub spell_weight: SpellWeight,
}

/// A card as known to the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Upstream numeric identifier
    pub card_id: i64,
    pub name: String,
    pub max_level: i32,
    pub icon_url: Option<String>,
    pub elixir_cost: i32,
    pub rarity: Rarity,
    pub card_type: CardType,
    #[serde(flatten)]
    pub tags: CardTags,
}

impl CardDefinition {
    pub fn is_spell(&self) -> bool {
        self.card_type == CardType::Spell
    }
}

/// A player's stored profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerRecord {
    pub id: i64,
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
    pub last_fetched: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One card slot of a stored deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCardEntry {
    pub card: CardDefinition,
    pub level: i32,
    pub position: i32,
}

/// A deduplicated deck, identified by the hash of its card set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckRecord {
    pub id: i64,
    pub deck_hash: String,
    /// Player whose refresh first created this deck
    pub player_id: i64,
    pub avg_elixir: f64,
    /// Whether this deck is the current deck of the player it was loaded for
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    /// Entries ordered by position
    pub cards: Vec<DeckCardEntry>,
}

impl DeckRecord {
    pub fn card_definitions(&self) -> Vec<CardDefinition> {
        self.cards.iter().map(|entry| entry.card.clone()).collect()
    }
}

/// Card fields parsed from an upstream payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCard {
    pub card_id: i64,
    pub name: String,
    pub max_level: i32,
    pub icon_url: Option<String>,
    pub elixir_cost: i32,
    pub rarity: Rarity,
    pub card_type: CardType,
}

/// A player as returned to callers of the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub player: PlayerRecord,
    pub current_deck: Option<DeckRecord>,
    /// Only present right after a fetch from upstream
    pub favourite_card: Option<ParsedCard>,
}

/// One page of stored players, ordered by trophies descending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPage {
    pub players: Vec<PlayerRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckAnalysisView {
    pub player: PlayerRecord,
    pub deck: DeckRecord,
    pub analysis: AnalysisResult,
}

/// A card together with how many stored decks contain it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardUsage {
    pub card: CardDefinition,
    pub usage_count: i64,
}

/// Normalizes a player tag to its canonical `#ALPHANUMERIC` form.
///
/// # Errors
/// * `Error::InvalidTag` if nothing but `#` remains or non-alphanumeric characters are present
pub fn normalize_tag(tag: &str) -> Result<String> {
    let trimmed = tag.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).to_ascii_uppercase();

    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidTag {
            tag: tag.to_string(),
        });
    }

    Ok(format!("#{body}"))
}

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.tag)
    }
}
