//! Content-addressed deck registry
//!
//! Decks are keyed by a SHA-256 digest over their sorted card ids, so the
//! same eight cards always map to the same record no matter the slot order
//! or which player brought them. Each player points at exactly one current
//! deck through the `current_decks` table.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::catalog::CardCatalog;
use crate::database::decks;
use crate::error::{Error, Result};
use crate::models::{CardDefinition, DECK_SIZE, DeckCardEntry, DeckRecord, ParsedCard, round2};
use crate::provider::DeckEntry;

/// Digest of the card-id set; slot order and duplicates do not matter.
pub fn deck_hash<I>(card_ids: I) -> String
where
    I: IntoIterator<Item = i64>,
{
    let sorted: BTreeSet<i64> = card_ids.into_iter().collect();
    let canonical = sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-");

    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Mean elixir cost rounded to two decimals; zero for no cards
#[allow(clippy::cast_precision_loss)]
pub fn average_elixir<'a, I>(cards: I) -> f64
where
    I: IntoIterator<Item = &'a CardDefinition>,
{
    let (total, count) = cards
        .into_iter()
        .fold((0_i64, 0_u32), |(total, count), card| {
            (total + i64::from(card.elixir_cost), count + 1)
        });

    if count == 0 {
        return 0.0;
    }

    round2(total as f64 / f64::from(count))
}

#[derive(Clone)]
pub struct DeckRegistry {
    catalog: CardCatalog,
}

impl DeckRegistry {
    pub fn new(catalog: CardCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves upstream deck slots to catalog cards, importing any the
    /// catalog does not know yet. Repeated cards keep their first slot.
    pub async fn prepare_entries(&self, entries: &[DeckEntry]) -> Result<Vec<DeckCardEntry>> {
        let mut seen = HashSet::with_capacity(entries.len());
        let unique: Vec<&DeckEntry> = entries
            .iter()
            .filter(|entry| seen.insert(entry.card.card_id))
            .collect();

        let requested: Vec<ParsedCard> = unique.iter().map(|entry| entry.card.clone()).collect();
        let definitions = self.catalog.resolve_cards(&requested).await?;

        Ok(unique
            .into_iter()
            .zip(definitions)
            .map(|(entry, card)| DeckCardEntry {
                card,
                level: entry.level,
                position: entry.position,
            })
            .collect())
    }

    /// Finds or creates the deck holding these cards and makes it the
    /// player's current deck.
    ///
    /// Runs on the caller's connection so it can share the transaction that
    /// writes the player. An existing deck is reused as stored: its levels
    /// and positions are not rewritten.
    pub async fn resolve_deck(
        &self,
        conn: &mut SqliteConnection,
        player_id: i64,
        entries: &[DeckCardEntry],
        now: DateTime<Utc>,
    ) -> Result<DeckRecord> {
        if entries.is_empty() {
            return Err(Error::InvalidDeckSize {
                expected: DECK_SIZE,
                actual: 0,
            });
        }

        let hash = deck_hash(entries.iter().map(|entry| entry.card.card_id));
        let avg_elixir = average_elixir(entries.iter().map(|entry| &entry.card));

        let (deck_id, created) =
            decks::insert_if_absent(&mut *conn, player_id, &hash, avg_elixir, entries, now).await?;

        if created {
            info!("Created deck {} ({} cards, avg elixir {})", deck_id, entries.len(), avg_elixir);
        } else {
            debug!("Reusing deck {} for player {}", deck_id, player_id);
        }

        decks::set_current(&mut *conn, player_id, deck_id, now).await?;

        decks::load(conn, deck_id, Some(player_id))
            .await?
            .ok_or_else(|| Error::not_found(format!("deck {deck_id}")))
    }

    /// The player's current deck, if one has been recorded
    pub async fn current_deck(
        &self,
        conn: &mut SqliteConnection,
        player_id: i64,
    ) -> Result<Option<DeckRecord>> {
        match decks::current_deck_id(&mut *conn, player_id).await? {
            Some(deck_id) => decks::load(conn, deck_id, Some(player_id)).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardTags, CardType, Rarity};

    fn card(card_id: i64, elixir_cost: i32) -> CardDefinition {
        CardDefinition {
            card_id,
            name: format!("Card {card_id}"),
            max_level: 14,
            icon_url: None,
            elixir_cost,
            rarity: Rarity::Common,
            card_type: CardType::Troop,
            tags: CardTags::default(),
        }
    }

    #[test]
    fn hash_ignores_slot_order() {
        let ids = [26_000_000, 26_000_001, 26_000_010, 26_000_021, 27_000_000, 28_000_000, 28_000_008, 26_000_038];
        let expected = deck_hash(ids);

        let mut rotated = ids;
        for _ in 0..ids.len() {
            rotated.rotate_left(1);
            assert_eq!(deck_hash(rotated), expected);
        }

        let mut reversed = ids;
        reversed.reverse();
        assert_eq!(deck_hash(reversed), expected);
    }

    #[test]
    fn hash_is_sha256_of_canonical_string() {
        // sha256("1-2-3")
        assert_eq!(
            deck_hash([3, 1, 2, 3]),
            "ba101947992ba0aad0d9074451ee3d37a65d881f7dd01e7ad45b6507c471f286"
        );
    }

    #[test]
    fn different_sets_hash_differently() {
        assert_ne!(deck_hash([1, 2, 3]), deck_hash([1, 2, 4]));
        assert_ne!(deck_hash([12, 3]), deck_hash([1, 23]));
    }

    #[test]
    fn average_elixir_rounds_to_two_decimals() {
        let cards: Vec<CardDefinition> = [2, 2, 3, 3, 4, 4, 5, 5]
            .into_iter()
            .enumerate()
            .map(|(i, cost)| card(i as i64, cost))
            .collect();
        assert!((average_elixir(&cards) - 3.5).abs() < 1e-9);

        let cards: Vec<CardDefinition> = [1, 2, 3, 3, 3, 4, 4, 5]
            .into_iter()
            .enumerate()
            .map(|(i, cost)| card(i as i64, cost))
            .collect();
        // 25 / 8 = 3.125
        assert!((average_elixir(&cards) - 3.13).abs() < 1e-9);

        assert!(average_elixir(std::iter::empty::<&CardDefinition>()).abs() < f64::EPSILON);
    }
}
