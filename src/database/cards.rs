use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::error::Result;
use crate::models::{CardDefinition, CardTags, CardType, CardUsage, Rarity};

/// Card columns, aliased through `c` so joins can reuse them
pub(crate) const CARD_COLUMNS: &str = "c.card_id, c.name, c.max_level, c.icon_url, c.elixir_cost, \
     c.rarity, c.card_type, c.is_win_condition, c.is_air_targeting, c.is_splash_damage, \
     c.is_tank, c.spell_weight";

#[derive(Debug, FromRow)]
pub(crate) struct CardRow {
    card_id: i64,
    name: String,
    max_level: i64,
    icon_url: Option<String>,
    elixir_cost: i64,
    rarity: String,
    card_type: String,
    is_win_condition: bool,
    is_air_targeting: bool,
    is_splash_damage: bool,
    is_tank: bool,
    spell_weight: String,
}

impl From<CardRow> for CardDefinition {
    fn from(row: CardRow) -> Self {
        Self {
            card_id: row.card_id,
            name: row.name,
            max_level: i32::try_from(row.max_level).unwrap_or(i32::MAX),
            icon_url: row.icon_url,
            elixir_cost: i32::try_from(row.elixir_cost).unwrap_or(0),
            rarity: Rarity::from_api(&row.rarity),
            card_type: CardType::from_api(&row.card_type),
            tags: CardTags {
                is_win_condition: row.is_win_condition,
                is_air_targeting: row.is_air_targeting,
                is_splash_damage: row.is_splash_damage,
                is_tank: row.is_tank,
                spell_weight: row.spell_weight.parse().unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub async fn find(conn: &mut SqliteConnection, card_id: i64) -> Result<Option<CardDefinition>> {
    let row = sqlx::query_as::<_, CardRow>(&format!(
        "SELECT {CARD_COLUMNS} FROM cards c WHERE c.card_id = ?"
    ))
    .bind(card_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(CardDefinition::from))
}

/// Inserts the card or refreshes every column of an existing one
pub async fn upsert(
    conn: &mut SqliteConnection,
    card: &CardDefinition,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    let existed = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards WHERE card_id = ?")
        .bind(card.card_id)
        .fetch_one(&mut *conn)
        .await?
        > 0;

    sqlx::query(
        r"
        INSERT INTO cards (card_id, name, max_level, icon_url, elixir_cost, rarity, card_type,
                           is_win_condition, is_air_targeting, is_splash_damage, is_tank,
                           spell_weight, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (card_id) DO UPDATE SET
            name = excluded.name,
            max_level = excluded.max_level,
            icon_url = excluded.icon_url,
            elixir_cost = excluded.elixir_cost,
            rarity = excluded.rarity,
            card_type = excluded.card_type,
            is_win_condition = excluded.is_win_condition,
            is_air_targeting = excluded.is_air_targeting,
            is_splash_damage = excluded.is_splash_damage,
            is_tank = excluded.is_tank,
            spell_weight = excluded.spell_weight,
            updated_at = excluded.updated_at
        ",
    )
    .bind(card.card_id)
    .bind(&card.name)
    .bind(card.max_level)
    .bind(&card.icon_url)
    .bind(card.elixir_cost)
    .bind(card.rarity.as_str())
    .bind(card.card_type.as_str())
    .bind(card.tags.is_win_condition)
    .bind(card.tags.is_air_targeting)
    .bind(card.tags.is_splash_damage)
    .bind(card.tags.is_tank)
    .bind(card.tags.spell_weight.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(if existed {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

/// Inserts the card unless one with the same id is already present.
/// Returns whether a row was written.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    card: &CardDefinition,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO cards (card_id, name, max_level, icon_url, elixir_cost, rarity, card_type,
                           is_win_condition, is_air_targeting, is_splash_damage, is_tank,
                           spell_weight, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (card_id) DO NOTHING
        ",
    )
    .bind(card.card_id)
    .bind(&card.name)
    .bind(card.max_level)
    .bind(&card.icon_url)
    .bind(card.elixir_cost)
    .bind(card.rarity.as_str())
    .bind(card.card_type.as_str())
    .bind(card.tags.is_win_condition)
    .bind(card.tags.is_air_targeting)
    .bind(card.tags.is_splash_damage)
    .bind(card.tags.is_tank)
    .bind(card.tags.spell_weight.as_str())
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Cards ordered by elixir cost then name, optionally filtered
pub async fn list(
    conn: &mut SqliteConnection,
    card_type: Option<CardType>,
    rarity: Option<Rarity>,
) -> Result<Vec<CardDefinition>> {
    let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {CARD_COLUMNS} FROM cards c WHERE 1 = 1"));

    if let Some(card_type) = card_type {
        query.push(" AND c.card_type = ").push_bind(card_type.as_str());
    }
    if let Some(rarity) = rarity {
        query.push(" AND c.rarity = ").push_bind(rarity.as_str());
    }
    query.push(" ORDER BY c.elixir_cost, c.name");

    let rows = query.build_query_as::<CardRow>().fetch_all(conn).await?;
    Ok(rows.into_iter().map(CardDefinition::from).collect())
}

#[derive(Debug, FromRow)]
struct UsageRow {
    #[sqlx(flatten)]
    card: CardRow,
    usage_count: i64,
}

/// Cards appearing in the most stored decks
pub async fn usage_statistics(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<CardUsage>> {
    let rows = sqlx::query_as::<_, UsageRow>(&format!(
        r"
        SELECT {CARD_COLUMNS}, COUNT(dc.id) AS usage_count
        FROM cards c
        JOIN deck_cards dc ON dc.card_id = c.card_id
        GROUP BY c.card_id
        ORDER BY usage_count DESC, c.name
        LIMIT ?
        "
    ))
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CardUsage {
            card: row.card.into(),
            usage_count: row.usage_count,
        })
        .collect())
}
