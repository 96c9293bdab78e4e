use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::cards::{CARD_COLUMNS, CardRow};
use crate::error::{Error, Result};
use crate::models::{DeckCardEntry, DeckRecord};

#[derive(Debug, FromRow)]
struct DeckRow {
    id: i64,
    deck_hash: String,
    player_id: i64,
    avg_elixir: f64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct EntryRow {
    #[sqlx(flatten)]
    card: CardRow,
    card_level: i64,
    position: i64,
}

pub async fn find_id_by_hash(conn: &mut SqliteConnection, deck_hash: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM decks WHERE deck_hash = ?")
        .bind(deck_hash)
        .fetch_optional(conn)
        .await?;

    Ok(id)
}

/// Loads a deck with its entries in position order.
///
/// `is_current` is reported relative to `viewer`, the player the deck is
/// being loaded for.
pub async fn load(
    conn: &mut SqliteConnection,
    deck_id: i64,
    viewer: Option<i64>,
) -> Result<Option<DeckRecord>> {
    let Some(row) = sqlx::query_as::<_, DeckRow>(
        "SELECT id, deck_hash, player_id, avg_elixir, created_at FROM decks WHERE id = ?",
    )
    .bind(deck_id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let entries = sqlx::query_as::<_, EntryRow>(&format!(
        r"
        SELECT {CARD_COLUMNS}, dc.card_level, dc.position
        FROM deck_cards dc
        JOIN cards c ON c.card_id = dc.card_id
        WHERE dc.deck_id = ?
        ORDER BY dc.position
        "
    ))
    .bind(deck_id)
    .fetch_all(&mut *conn)
    .await?;

    let is_current = match viewer {
        Some(player_id) => current_deck_id(conn, player_id).await? == Some(deck_id),
        None => false,
    };

    Ok(Some(DeckRecord {
        id: row.id,
        deck_hash: row.deck_hash,
        player_id: row.player_id,
        avg_elixir: row.avg_elixir,
        is_current,
        created_at: row.created_at,
        cards: entries
            .into_iter()
            .map(|entry| DeckCardEntry {
                card: entry.card.into(),
                level: i32::try_from(entry.card_level).unwrap_or(1),
                position: i32::try_from(entry.position).unwrap_or(i32::MAX),
            })
            .collect(),
    }))
}

/// Creates the deck and its entries unless a deck with the same hash exists.
///
/// Returns the deck id and whether this call created it. An existing deck
/// is left untouched.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    player_id: i64,
    deck_hash: &str,
    avg_elixir: f64,
    entries: &[DeckCardEntry],
    now: DateTime<Utc>,
) -> Result<(i64, bool)> {
    let result = sqlx::query(
        r"
        INSERT INTO decks (player_id, deck_hash, avg_elixir, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (deck_hash) DO NOTHING
        ",
    )
    .bind(player_id)
    .bind(deck_hash)
    .bind(avg_elixir)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let id = find_id_by_hash(&mut *conn, deck_hash)
            .await?
            .ok_or_else(|| Error::not_found(format!("deck {deck_hash}")))?;
        return Ok((id, false));
    }

    let deck_id = result.last_insert_rowid();
    for entry in entries {
        sqlx::query(
            r"
            INSERT INTO deck_cards (deck_id, card_id, card_level, position)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (deck_id, card_id) DO NOTHING
            ",
        )
        .bind(deck_id)
        .bind(entry.card.card_id)
        .bind(entry.level)
        .bind(entry.position)
        .execute(&mut *conn)
        .await?;
    }

    Ok((deck_id, true))
}

/// Points the player's current deck at `deck_id`, replacing any previous one
/// in the same statement.
pub async fn set_current(
    conn: &mut SqliteConnection,
    player_id: i64,
    deck_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO current_decks (player_id, deck_id, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT (player_id) DO UPDATE SET
            deck_id = excluded.deck_id,
            updated_at = excluded.updated_at
        ",
    )
    .bind(player_id)
    .bind(deck_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn current_deck_id(conn: &mut SqliteConnection, player_id: i64) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT deck_id FROM current_decks WHERE player_id = ?")
        .bind(player_id)
        .fetch_optional(conn)
        .await?;

    Ok(id)
}

/// Number of decks flagged current for the player; never more than one
pub async fn current_deck_count(conn: &mut SqliteConnection, player_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM current_decks WHERE player_id = ?")
        .bind(player_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

/// Removes every deck the player created along with the rows hanging off
/// them: current-deck pointers (the player's own and other players'),
/// analyses and card entries.
pub async fn delete_owned_by(conn: &mut SqliteConnection, player_id: i64) -> Result<u64> {
    sqlx::query(
        r"
        DELETE FROM current_decks
        WHERE player_id = ? OR deck_id IN (SELECT id FROM decks WHERE player_id = ?)
        ",
    )
    .bind(player_id)
    .bind(player_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM deck_analyses WHERE deck_id IN (SELECT id FROM decks WHERE player_id = ?)")
        .bind(player_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM deck_cards WHERE deck_id IN (SELECT id FROM decks WHERE player_id = ?)")
        .bind(player_id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM decks WHERE player_id = ?")
        .bind(player_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
