use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::error::{Error, Result};
use crate::models::{AnalysisResult, Assessment, Metrics, Rating};

#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: i64,
    deck_id: i64,
    avg_elixir: f64,
    air_targeting_count: i64,
    splash_damage_count: i64,
    win_condition_count: i64,
    tank_count: i64,
    light_spell_count: i64,
    heavy_spell_count: i64,
    total_spells: i64,
    strengths: String,
    weaknesses: String,
    suggestions: String,
    overall_rating: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for AnalysisResult {
    type Error = Error;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        let count = |value: i64| u32::try_from(value).unwrap_or(0);
        let rating = row
            .overall_rating
            .parse::<Rating>()
            .map_err(|e: String| Error::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Self {
            id: row.id,
            deck_id: row.deck_id,
            created_at: row.created_at,
            assessment: Assessment {
                metrics: Metrics {
                    avg_elixir: row.avg_elixir,
                    air_targeting_count: count(row.air_targeting_count),
                    splash_damage_count: count(row.splash_damage_count),
                    win_condition_count: count(row.win_condition_count),
                    tank_count: count(row.tank_count),
                    light_spell_count: count(row.light_spell_count),
                    heavy_spell_count: count(row.heavy_spell_count),
                    total_spells: count(row.total_spells),
                },
                strengths: serde_json::from_str(&row.strengths)?,
                weaknesses: serde_json::from_str(&row.weaknesses)?,
                suggestions: serde_json::from_str(&row.suggestions)?,
                rating,
            },
        })
    }
}

/// Most recent analysis of the deck by creation time
pub async fn latest_for_deck(conn: &mut SqliteConnection, deck_id: i64) -> Result<Option<AnalysisResult>> {
    let row = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM deck_analyses WHERE deck_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(deck_id)
    .fetch_optional(conn)
    .await?;

    row.map(AnalysisResult::try_from).transpose()
}

/// Every analysis of the deck, newest first
pub async fn history(conn: &mut SqliteConnection, deck_id: i64) -> Result<Vec<AnalysisResult>> {
    let rows = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM deck_analyses WHERE deck_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(deck_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(AnalysisResult::try_from).collect()
}

/// Appends a new analysis; earlier rows for the deck are kept
pub async fn insert(
    conn: &mut SqliteConnection,
    deck_id: i64,
    assessment: &Assessment,
    created_at: DateTime<Utc>,
) -> Result<AnalysisResult> {
    let metrics = &assessment.metrics;

    let result = sqlx::query(
        r"
        INSERT INTO deck_analyses (deck_id, avg_elixir, air_targeting_count, splash_damage_count,
                                   win_condition_count, tank_count, light_spell_count,
                                   heavy_spell_count, total_spells, strengths, weaknesses,
                                   suggestions, overall_rating, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(deck_id)
    .bind(metrics.avg_elixir)
    .bind(metrics.air_targeting_count)
    .bind(metrics.splash_damage_count)
    .bind(metrics.win_condition_count)
    .bind(metrics.tank_count)
    .bind(metrics.light_spell_count)
    .bind(metrics.heavy_spell_count)
    .bind(metrics.total_spells)
    .bind(serde_json::to_string(&assessment.strengths)?)
    .bind(serde_json::to_string(&assessment.weaknesses)?)
    .bind(serde_json::to_string(&assessment.suggestions)?)
    .bind(assessment.rating.as_str())
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(AnalysisResult {
        id: result.last_insert_rowid(),
        deck_id,
        created_at,
        assessment: assessment.clone(),
    })
}
