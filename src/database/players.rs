use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::models::PlayerRecord;
use crate::provider::PlayerData;

pub async fn find_by_tag(conn: &mut SqliteConnection, tag: &str) -> Result<Option<PlayerRecord>> {
    let player = sqlx::query_as::<_, PlayerRecord>("SELECT * FROM players WHERE tag = ?")
        .bind(tag)
        .fetch_optional(conn)
        .await?;

    Ok(player)
}

/// Creates the player or overwrites its profile fields, stamping `last_fetched`.
/// `tag` must already be normalized.
pub async fn upsert(
    conn: &mut SqliteConnection,
    tag: &str,
    data: &PlayerData,
    fetched_at: DateTime<Utc>,
) -> Result<PlayerRecord> {
    let player = sqlx::query_as::<_, PlayerRecord>(
        r"
        INSERT INTO players (tag, name, trophies, best_trophies, wins, losses, battle_count,
                             three_crown_wins, exp_level, arena_id, arena_name, clan_name,
                             clan_tag, last_fetched, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (tag) DO UPDATE SET
            name = excluded.name,
            trophies = excluded.trophies,
            best_trophies = excluded.best_trophies,
            wins = excluded.wins,
            losses = excluded.losses,
            battle_count = excluded.battle_count,
            three_crown_wins = excluded.three_crown_wins,
            exp_level = excluded.exp_level,
            arena_id = excluded.arena_id,
            arena_name = excluded.arena_name,
            clan_name = excluded.clan_name,
            clan_tag = excluded.clan_tag,
            last_fetched = excluded.last_fetched,
            updated_at = excluded.updated_at
        RETURNING *
        ",
    )
    .bind(tag)
    .bind(&data.name)
    .bind(data.trophies)
    .bind(data.best_trophies)
    .bind(data.wins)
    .bind(data.losses)
    .bind(data.battle_count)
    .bind(data.three_crown_wins)
    .bind(data.exp_level)
    .bind(data.arena_id)
    .bind(&data.arena_name)
    .bind(&data.clan_name)
    .bind(&data.clan_tag)
    .bind(fetched_at)
    .bind(fetched_at)
    .bind(fetched_at)
    .fetch_one(conn)
    .await?;

    Ok(player)
}

/// One page of players, highest trophies first
pub async fn list_by_trophies(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<PlayerRecord>> {
    let players = sqlx::query_as::<_, PlayerRecord>(
        "SELECT * FROM players ORDER BY trophies DESC, id LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok(players)
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players")
        .fetch_one(conn)
        .await?;

    Ok(total)
}

pub async fn delete(conn: &mut SqliteConnection, player_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM players WHERE id = ?")
        .bind(player_id)
        .execute(conn)
        .await?;

    Ok(())
}
