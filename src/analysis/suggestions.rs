//! Card swap suggestions for detected weaknesses

use crate::config::AnalysisThresholds;
use crate::models::{CardDefinition, Metrics, SpellWeight, Suggestion, SuggestionKind};

const AIR_DEFENSE: &[&str] = &[
    "Musketeer",
    "Mega Minion",
    "Archers",
    "Electro Wizard",
    "Baby Dragon",
    "Tesla",
    "Inferno Tower",
];

const SPLASH: &[&str] = &[
    "Valkyrie",
    "Baby Dragon",
    "Wizard",
    "Bomber",
    "Arrows",
    "Fireball",
    "The Log",
];

const HEAVY_SPELLS: &[&str] = &["Fireball", "Rocket", "Lightning", "Poison"];

const LIGHT_SPELLS: &[&str] = &["Zap", "The Log", "Arrows", "Giant Snowball"];

const WIN_CONDITIONS: &[&str] = &["Hog Rider", "Giant", "Royal Giant", "Balloon", "Miner", "Graveyard"];

const CHEAP_CARDS: &[&str] = &["Knight", "Skeletons", "Ice Spirit", "Ice Golem"];

const MAX_ADDITIONS: usize = 3;
const MAX_REMOVALS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    AirTargeting,
    Splash,
    WinCondition,
    LightSpell,
    HeavySpell,
}

impl Role {
    fn covers(self, card: &CardDefinition) -> bool {
        match self {
            Self::AirTargeting => card.tags.is_air_targeting,
            Self::Splash => card.tags.is_splash_damage,
            Self::WinCondition => card.tags.is_win_condition,
            Self::LightSpell => card.tags.spell_weight == SpellWeight::Light,
            Self::HeavySpell => card.tags.spell_weight == SpellWeight::Heavy,
        }
    }
}

/// Roles a deck must not lose by accident; a card that alone covers one of
/// these is never offered for removal.
const ESSENTIAL_ROLES: [Role; 4] = [
    Role::AirTargeting,
    Role::WinCondition,
    Role::LightSpell,
    Role::HeavySpell,
];

/// One suggestion per weakness category, in a fixed order
pub fn generate_suggestions(
    cards: &[CardDefinition],
    metrics: &Metrics,
    thresholds: &AnalysisThresholds,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let mut push = |kind: SuggestionKind, reason: &str, pool: &[&str], role: Role, prefer_spells: bool| {
        let consider_adding = candidates_not_in_deck(cards, pool);
        if !consider_adding.is_empty() {
            suggestions.push(Suggestion {
                kind,
                reason: reason.to_string(),
                consider_adding,
                consider_removing: removal_candidates(cards, role, prefer_spells),
            });
        }
    };

    if metrics.air_targeting_count < thresholds.min_air_defense {
        push(
            SuggestionKind::AddAirDefense,
            "Deck is vulnerable to air attacks",
            AIR_DEFENSE,
            Role::AirTargeting,
            false,
        );
    }

    if metrics.splash_damage_count < thresholds.min_splash {
        push(
            SuggestionKind::AddSplashDamage,
            "Deck struggles against swarm troops",
            SPLASH,
            Role::Splash,
            false,
        );
    }

    if metrics.heavy_spell_count == 0 {
        push(
            SuggestionKind::AddHeavySpell,
            "Need spell to deal with buildings and finish towers",
            HEAVY_SPELLS,
            Role::HeavySpell,
            true,
        );
    }

    if metrics.light_spell_count == 0 {
        push(
            SuggestionKind::AddLightSpell,
            "Need quick response to swarm troops and charging units",
            LIGHT_SPELLS,
            Role::LightSpell,
            true,
        );
    }

    if metrics.win_condition_count < thresholds.min_win_conditions {
        push(
            SuggestionKind::AddWinCondition,
            "Deck needs a reliable way to deal tower damage",
            WIN_CONDITIONS,
            Role::WinCondition,
            false,
        );
    }

    if metrics.avg_elixir > thresholds.high_elixir {
        if let Some(priciest) = most_expensive(cards) {
            suggestions.push(Suggestion {
                kind: SuggestionKind::ReduceElixirCost,
                reason: "Deck cycles too slowly".to_string(),
                consider_adding: candidates_not_in_deck(cards, CHEAP_CARDS),
                consider_removing: vec![priciest.name.clone()],
            });
        }
    }

    suggestions
}

fn in_deck(cards: &[CardDefinition], name: &str) -> bool {
    cards.iter().any(|card| card.name.eq_ignore_ascii_case(name))
}

fn candidates_not_in_deck(cards: &[CardDefinition], pool: &[&str]) -> Vec<String> {
    pool.iter()
        .filter(|name| !in_deck(cards, name))
        .take(MAX_ADDITIONS)
        .map(|name| (*name).to_string())
        .collect()
}

/// Up to two cards to swap out, in deck order with spells first when
/// `prefer_spells` is set.
///
/// Skips cards that already fill `deficient` and any card that is the only
/// one in the deck covering an essential role.
fn removal_candidates(cards: &[CardDefinition], deficient: Role, prefer_spells: bool) -> Vec<String> {
    let sole_provider = |card: &CardDefinition| {
        ESSENTIAL_ROLES
            .iter()
            .any(|role| role.covers(card) && cards.iter().filter(|other| role.covers(other)).count() == 1)
    };

    let (spells, others): (Vec<&CardDefinition>, Vec<&CardDefinition>) = cards
        .iter()
        .filter(|&card| !deficient.covers(card) && !sole_provider(card))
        .partition(|card| prefer_spells && card.is_spell());

    spells
        .into_iter()
        .chain(others)
        .take(MAX_REMOVALS)
        .map(|card| card.name.clone())
        .collect()
}

/// The costliest card; ties go to the earliest slot
fn most_expensive(cards: &[CardDefinition]) -> Option<&CardDefinition> {
    cards.iter().fold(None, |best: Option<&CardDefinition>, card| match best {
        Some(current) if current.elixir_cost >= card.elixir_cost => Some(current),
        _ => Some(card),
    })
}
