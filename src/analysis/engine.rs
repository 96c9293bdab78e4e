use crate::config::AnalysisThresholds;
use crate::deck_registry::average_elixir;
use crate::error::{Error, Result};
use crate::models::{
    Assessment, CardDefinition, DECK_SIZE, Metrics, Rating, Severity, SpellWeight, Strength,
    Weakness,
};

use super::suggestions::generate_suggestions;

/// Rule-based deck evaluator.
///
/// Pure: the verdict depends only on the cards passed in and the thresholds
/// the engine was built with.
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    thresholds: AnalysisThresholds,
}

impl AnalysisEngine {
    pub fn new(thresholds: AnalysisThresholds) -> Self {
        Self { thresholds }
    }

    /// Analyze a complete deck
    ///
    /// # Arguments
    /// * `cards` - The eight cards of the deck, in slot order
    ///
    /// # Errors
    /// * `Error::InvalidDeckSize` unless exactly eight cards are given
    pub fn analyze(&self, cards: &[CardDefinition]) -> Result<Assessment> {
        if cards.len() != DECK_SIZE {
            return Err(Error::InvalidDeckSize {
                expected: DECK_SIZE,
                actual: cards.len(),
            });
        }

        let metrics = calculate_metrics(cards);
        let strengths = self.strengths(&metrics);
        let weaknesses = self.weaknesses(&metrics);
        let suggestions = generate_suggestions(cards, &metrics, &self.thresholds);
        let rating = overall_rating(strengths.len(), &weaknesses);

        Ok(Assessment {
            metrics,
            strengths,
            weaknesses,
            suggestions,
            rating,
        })
    }

    fn strengths(&self, metrics: &Metrics) -> Vec<Strength> {
        let t = &self.thresholds;
        let avg = format_elixir(metrics.avg_elixir);
        let mut strengths = Vec::new();

        if metrics.avg_elixir < t.low_elixir {
            strengths.push(strength(
                "Cycle Speed",
                "Fast Cycle Deck",
                format!(
                    "With an average elixir cost of {avg}, this deck cycles extremely fast, allowing you to quickly return to key cards and apply constant pressure."
                ),
            ));
        }

        if (t.low_elixir..=t.high_elixir).contains(&metrics.avg_elixir) {
            strengths.push(strength(
                "Balance",
                "Well-Balanced Elixir",
                format!(
                    "Average elixir of {avg} provides a good balance between defense and offense without being too heavy or too light."
                ),
            ));
        }

        if metrics.air_targeting_count >= t.min_air_defense.saturating_add(1) {
            strengths.push(strength(
                "Air Defense",
                "Excellent Air Defense",
                format!(
                    "With {} air-targeting cards, this deck is well-equipped to handle aerial threats like Balloon, Lava Hound, and flying troops.",
                    metrics.air_targeting_count
                ),
            ));
        }

        if metrics.splash_damage_count >= t.min_splash {
            strengths.push(strength(
                "Area Damage",
                "Strong Splash Damage",
                format!(
                    "Having {} splash damage cards makes this deck effective against swarm troops like Skeleton Army, Minion Horde, and Goblin Gang.",
                    metrics.splash_damage_count
                ),
            ));
        }

        if metrics.win_condition_count >= t.multiple_win_conditions {
            strengths.push(strength(
                "Win Conditions",
                "Multiple Win Conditions",
                format!(
                    "This deck has {} win conditions, making it unpredictable and harder for opponents to defend against.",
                    metrics.win_condition_count
                ),
            ));
        }

        if metrics.light_spell_count >= 1 && metrics.heavy_spell_count >= 1 {
            strengths.push(strength(
                "Spells",
                "Balanced Spell Suite",
                format!(
                    "Having both light ({}) and heavy ({}) spells provides versatility in dealing with various threats and supporting pushes.",
                    metrics.light_spell_count, metrics.heavy_spell_count
                ),
            ));
        }

        if metrics.tank_count >= t.min_tanks {
            strengths.push(strength(
                "Tank Support",
                "Strong Tank Presence",
                format!(
                    "With {} tanks, this deck can create powerful pushes by protecting support troops and applying sustained pressure.",
                    metrics.tank_count
                ),
            ));
        }

        strengths
    }

    fn weaknesses(&self, metrics: &Metrics) -> Vec<Weakness> {
        let t = &self.thresholds;
        let mut weaknesses = Vec::new();

        if metrics.avg_elixir > t.high_elixir {
            weaknesses.push(weakness(
                "Cycle Speed",
                "Heavy Deck - Slow Cycle",
                format!(
                    "Average elixir of {} makes this deck slow to cycle. You may struggle against faster decks and have difficulty defending when low on elixir.",
                    format_elixir(metrics.avg_elixir)
                ),
                Severity::High,
            ));
        }

        if metrics.air_targeting_count < t.min_air_defense {
            weaknesses.push(weakness(
                "Air Defense",
                "Vulnerable to Air Attacks",
                format!(
                    "Only {} air-targeting card(s) in this deck. You'll struggle against air-heavy decks with Balloon, Lava Hound, or mass flying troops.",
                    metrics.air_targeting_count
                ),
                Severity::High,
            ));
        }

        if metrics.splash_damage_count < t.min_splash {
            weaknesses.push(weakness(
                "Area Damage",
                "Weak Against Swarm Decks",
                format!(
                    "With only {} splash damage card(s), you may struggle to defend against swarm troops like Skeleton Army, Goblin Gang, and Minion Horde.",
                    metrics.splash_damage_count
                ),
                Severity::High,
            ));
        }

        if metrics.heavy_spell_count == 0 {
            weaknesses.push(weakness(
                "Spells",
                "No Heavy Spell",
                "Without a heavy spell (Fireball, Rocket, Lightning, Poison), you'll have difficulty dealing with buildings like X-Bow, Mortar, or Tesla, and may struggle to finish low-HP towers.".to_string(),
                Severity::Medium,
            ));
        }

        if metrics.light_spell_count == 0 {
            weaknesses.push(weakness(
                "Spells",
                "No Light Spell",
                "Without a light spell (Zap, The Log, Arrows, Giant Snowball), you may struggle to counter swarm troops quickly and reset charging units like Prince or Inferno Dragon.".to_string(),
                Severity::Medium,
            ));
        }

        if metrics.win_condition_count < t.min_win_conditions {
            weaknesses.push(weakness(
                "Win Conditions",
                "No Clear Win Condition",
                "This deck lacks a clear win condition. Without a reliable tower-targeting card, you may struggle to deal consistent tower damage.".to_string(),
                Severity::High,
            ));
        }

        if metrics.win_condition_count > t.max_win_conditions {
            weaknesses.push(weakness(
                "Win Conditions",
                "Too Many Win Conditions",
                format!(
                    "Having {} win conditions might make the deck unfocused. Consider replacing one with a support or defensive card.",
                    metrics.win_condition_count
                ),
                Severity::Low,
            ));
        }

        if metrics.total_spells >= t.spell_heavy {
            weaknesses.push(weakness(
                "Spells",
                "Too Spell-Heavy",
                format!(
                    "With {} spells, you may lack troops for defense and counter-pushes. Consider replacing one spell with a versatile troop.",
                    metrics.total_spells
                ),
                Severity::Medium,
            ));
        }

        weaknesses
    }
}

/// Counts every role across the deck. Only light and heavy spells count
/// towards `total_spells`.
pub fn calculate_metrics(cards: &[CardDefinition]) -> Metrics {
    let count = |predicate: fn(&CardDefinition) -> bool| {
        u32::try_from(cards.iter().filter(|&card| predicate(card)).count()).unwrap_or(u32::MAX)
    };

    let light_spell_count = count(|card| card.tags.spell_weight == SpellWeight::Light);
    let heavy_spell_count = count(|card| card.tags.spell_weight == SpellWeight::Heavy);

    Metrics {
        avg_elixir: average_elixir(cards),
        air_targeting_count: count(|card| card.tags.is_air_targeting),
        splash_damage_count: count(|card| card.tags.is_splash_damage),
        win_condition_count: count(|card| card.tags.is_win_condition),
        tank_count: count(|card| card.tags.is_tank),
        light_spell_count,
        heavy_spell_count,
        total_spells: light_spell_count + heavy_spell_count,
    }
}

/// Folds strengths and weighted weaknesses into a rating.
///
/// `net = strengths - weakness_weight / 2`, evaluated on doubled integers so
/// band edges are exact.
pub fn overall_rating(strength_count: usize, weaknesses: &[Weakness]) -> Rating {
    let strengths = i64::try_from(strength_count).unwrap_or(i64::MAX / 2);
    let weight: i64 = weaknesses
        .iter()
        .map(|weakness| i64::from(weakness.severity.weight()))
        .sum();
    let doubled_net = 2 * strengths - weight;

    match doubled_net {
        n if n >= 8 => Rating::Excellent,
        n if n >= 4 => Rating::Good,
        n if n >= 0 => Rating::Average,
        _ => Rating::Poor,
    }
}

fn strength(category: &str, title: &str, description: String) -> Strength {
    Strength {
        category: category.to_string(),
        title: title.to_string(),
        description,
    }
}

fn weakness(category: &str, title: &str, description: String, severity: Severity) -> Weakness {
    Weakness {
        category: category.to_string(),
        title: title.to_string(),
        description,
        severity,
    }
}

/// Always shows at least one decimal: `3.5`, `4.0`, `3.13`
fn format_elixir(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
