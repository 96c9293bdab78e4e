#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use deck_analyzer::DeckAnalyzer;
use deck_analyzer::clock::Clock;
use deck_analyzer::config::CacheSettings;
use deck_analyzer::database::Database;
use deck_analyzer::error::{Error, Result};
use deck_analyzer::provider::{
    GameDataProvider, RawArena, RawBattle, RawBattleSide, RawCard, RawClan, RawIconUrls, RawPlayer,
};

/// (id, name, elixir, rarity, type) for the cards the fixtures use
pub const CARDS: &[(i64, &str, i32, &str, &str)] = &[
    (26_000_000, "Knight", 3, "Common", "Troop"),
    (26_000_001, "Archers", 3, "Common", "Troop"),
    (26_000_003, "Giant", 5, "Rare", "Troop"),
    (26_000_004, "P.E.K.K.A", 7, "Epic", "Troop"),
    (26_000_006, "Balloon", 5, "Epic", "Troop"),
    (26_000_010, "Skeletons", 1, "Common", "Troop"),
    (26_000_011, "Valkyrie", 4, "Rare", "Troop"),
    (26_000_014, "Musketeer", 4, "Rare", "Troop"),
    (26_000_015, "Baby Dragon", 4, "Epic", "Troop"),
    (26_000_017, "Wizard", 5, "Rare", "Troop"),
    (26_000_021, "Hog Rider", 4, "Rare", "Troop"),
    (26_000_030, "Ice Spirit", 1, "Common", "Troop"),
    (26_000_038, "Ice Golem", 2, "Rare", "Troop"),
    (27_000_000, "Cannon", 3, "Common", "Building"),
    (28_000_000, "Fireball", 4, "Rare", "Spell"),
    (28_000_008, "Zap", 2, "Common", "Spell"),
    (28_000_011, "The Log", 2, "Legendary", "Spell"),
];

pub const HOG_CYCLE: [i64; 8] = [
    26_000_021, 26_000_014, 26_000_038, 26_000_010, 26_000_030, 27_000_000, 28_000_000, 28_000_011,
];

pub const GIANT_BEATDOWN: [i64; 8] = [
    26_000_003, 26_000_015, 26_000_011, 26_000_017, 26_000_006, 26_000_000, 28_000_008, 26_000_001,
];

/// No air defense, no splash
pub const GROUND_ONLY: [i64; 8] = [
    26_000_000, 26_000_003, 26_000_004, 26_000_010, 26_000_021, 26_000_038, 27_000_000, 26_000_006,
];

pub fn raw_card(card_id: i64) -> RawCard {
    let (id, name, elixir, rarity, card_type) = CARDS
        .iter()
        .copied()
        .find(|(id, ..)| *id == card_id)
        .unwrap_or_else(|| panic!("no fixture for card {card_id}"));

    RawCard {
        id: Some(id),
        name: Some(name.to_string()),
        level: None,
        max_level: Some(14),
        elixir_cost: Some(elixir),
        rarity: Some(rarity.to_string()),
        card_type: Some(card_type.to_string()),
        icon_urls: Some(RawIconUrls {
            medium: Some(format!("https://cdn.example/{id}.png")),
        }),
    }
}

pub fn raw_player(tag: &str, name: &str, trophies: i64, deck: &[i64]) -> RawPlayer {
    let current_deck: Vec<RawCard> = deck
        .iter()
        .map(|id| RawCard {
            level: Some(11),
            ..raw_card(*id)
        })
        .collect();

    RawPlayer {
        tag: tag.to_string(),
        name: name.to_string(),
        exp_level: Some(13),
        trophies,
        best_trophies: trophies + 100,
        wins: 1200,
        losses: 900,
        battle_count: 2500,
        three_crown_wins: 300,
        arena: Some(RawArena {
            id: Some(54_000_050),
            name: Some("Legendary Arena".to_string()),
        }),
        clan: Some(RawClan {
            tag: Some("#CLAN1".to_string()),
            name: Some("Royal Club".to_string()),
        }),
        current_favourite_card: current_deck.first().cloned(),
        current_deck,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Transient,
    Forbidden,
}

impl Failure {
    fn to_error(self, what: &str) -> Error {
        match self {
            Self::NotFound => Error::not_found(what),
            Self::Transient => Error::transient("upstream returned 503"),
            Self::Forbidden => Error::Provider {
                status: Some(403),
                message: "invalid API key".to_string(),
            },
        }
    }
}

/// In-memory provider counting every upstream call
#[derive(Default)]
pub struct FakeProvider {
    players: Mutex<HashMap<String, RawPlayer>>,
    cards: Mutex<Vec<RawCard>>,
    failure: Mutex<Option<Failure>>,
    player_calls: AtomicUsize,
    card_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_all_cards() -> Self {
        let provider = Self::default();
        provider.set_cards(CARDS.iter().map(|(id, ..)| raw_card(*id)).collect());
        provider
    }

    pub fn set_player(&self, player: RawPlayer) {
        self.players.lock().unwrap().insert(player.tag.clone(), player);
    }

    pub fn set_cards(&self, cards: Vec<RawCard>) {
        *self.cards.lock().unwrap() = cards;
    }

    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn player_calls(&self) -> usize {
        self.player_calls.load(Ordering::SeqCst)
    }

    pub fn card_calls(&self) -> usize {
        self.card_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, what: &str) -> Result<()> {
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error(what)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GameDataProvider for FakeProvider {
    async fn get_player(&self, tag: &str) -> Result<RawPlayer> {
        self.player_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;
        self.check_failure(&format!("player {tag}"))?;

        self.players
            .lock()
            .unwrap()
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("player {tag}")))
    }

    async fn get_player_battles(&self, tag: &str) -> Result<Vec<RawBattle>> {
        self.check_failure(&format!("battles of {tag}"))?;
        Ok(vec![RawBattle {
            battle_type: Some("PvP".to_string()),
            battle_time: Some("20240601T120000.000Z".to_string()),
            game_mode: None,
            team: vec![RawBattleSide {
                tag: Some(tag.to_string()),
                name: None,
                crowns: Some(3),
            }],
            opponent: vec![RawBattleSide::default()],
        }])
    }

    async fn get_cards(&self) -> Result<Vec<RawCard>> {
        self.card_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("cards")?;
        Ok(self.cards.lock().unwrap().clone())
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub analyzer: DeckAnalyzer,
    pub database: Database,
    pub provider: Arc<FakeProvider>,
    pub clock: Arc<ManualClock>,
}

pub async fn harness() -> Harness {
    harness_with(FakeProvider::with_all_cards(), CacheSettings::default()).await
}

pub async fn harness_with(provider: FakeProvider, settings: CacheSettings) -> Harness {
    let database = Database::in_memory().await.unwrap();
    let provider = Arc::new(provider);
    let clock = Arc::new(ManualClock::new());
    let analyzer = DeckAnalyzer::from_parts(database.clone(), provider.clone(), clock.clone(), &settings);

    Harness {
        analyzer,
        database,
        provider,
        clock,
    }
}
