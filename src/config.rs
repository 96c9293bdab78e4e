//! Environment-driven configuration
//!
//! Everything is read once at startup and handed to the components that need
//! it. Nothing below the binary looks at process environment on its own.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.clashroyale.com/v1";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:database/decks.db";

/// Connection settings for the upstream game-data provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    /// Upper bound on a single upstream request
    pub timeout: Duration,
}

/// Thresholds the analysis engine evaluates a deck against
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisThresholds {
    pub high_elixir: f64,
    pub low_elixir: f64,
    pub min_air_defense: u32,
    pub min_splash: u32,
    pub min_win_conditions: u32,
    pub max_win_conditions: u32,
    /// Win conditions needed for the "Multiple Win Conditions" strength
    pub multiple_win_conditions: u32,
    /// Tanks needed for the "Strong Tank Presence" strength
    pub min_tanks: u32,
    /// Spell count at which a deck is flagged as spell-heavy
    pub spell_heavy: u32,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            high_elixir: 4.5,
            low_elixir: 3.0,
            min_air_defense: 2,
            min_splash: 2,
            min_win_conditions: 1,
            max_win_conditions: 3,
            multiple_win_conditions: 2,
            min_tanks: 2,
            spell_heavy: 4,
        }
    }
}

/// Freshness windows for cached players and analyses
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub player_cache_duration: chrono::Duration,
    pub analysis_freshness: chrono::Duration,
    pub thresholds: AnalysisThresholds,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            player_cache_duration: chrono::Duration::seconds(300),
            analysis_freshness: chrono::Duration::seconds(3600),
            thresholds: AnalysisThresholds::default(),
        }
    }
}

/// Cron expressions for the background jobs run by the binary
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub catalog_sync: String,
    pub watch: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub database_url: String,
    pub cache: CacheSettings,
    pub schedule: ScheduleConfig,
    /// Player tags refreshed and analyzed on every watch tick
    pub watched_tags: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// * `Error::Configuration` when the API key is missing, a numeric value
    ///   cannot be parsed, a duration is negative or out of range, or an
    ///   elixir threshold is not a finite number
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("CLASH_ROYALE_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::configuration("CLASH_ROYALE_API_KEY must be set"))?;

        let provider = ProviderConfig {
            api_key,
            base_url: lookup("CLASH_ROYALE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_var(&lookup, "CLASH_ROYALE_API_TIMEOUT", 10)?),
        };

        let defaults = AnalysisThresholds::default();
        let thresholds = AnalysisThresholds {
            high_elixir: parse_var(&lookup, "ANALYSIS_HIGH_ELIXIR", defaults.high_elixir)?,
            low_elixir: parse_var(&lookup, "ANALYSIS_LOW_ELIXIR", defaults.low_elixir)?,
            min_air_defense: parse_var(&lookup, "ANALYSIS_MIN_AIR_DEFENSE", defaults.min_air_defense)?,
            min_splash: parse_var(&lookup, "ANALYSIS_MIN_SPLASH", defaults.min_splash)?,
            min_win_conditions: parse_var(
                &lookup,
                "ANALYSIS_MIN_WIN_CONDITIONS",
                defaults.min_win_conditions,
            )?,
            max_win_conditions: parse_var(
                &lookup,
                "ANALYSIS_MAX_WIN_CONDITIONS",
                defaults.max_win_conditions,
            )?,
            multiple_win_conditions: parse_var(
                &lookup,
                "ANALYSIS_MULTIPLE_WIN_CONDITIONS",
                defaults.multiple_win_conditions,
            )?,
            min_tanks: parse_var(&lookup, "ANALYSIS_MIN_TANKS", defaults.min_tanks)?,
            spell_heavy: parse_var(&lookup, "ANALYSIS_SPELL_HEAVY", defaults.spell_heavy)?,
        };

        for (key, value) in [
            ("ANALYSIS_HIGH_ELIXIR", thresholds.high_elixir),
            ("ANALYSIS_LOW_ELIXIR", thresholds.low_elixir),
        ] {
            if !value.is_finite() {
                return Err(Error::configuration(format!("{key} must be a finite number, got {value}")));
            }
        }

        if thresholds.low_elixir > thresholds.high_elixir {
            return Err(Error::configuration(format!(
                "ANALYSIS_LOW_ELIXIR ({}) exceeds ANALYSIS_HIGH_ELIXIR ({})",
                thresholds.low_elixir, thresholds.high_elixir
            )));
        }

        let cache = CacheSettings {
            player_cache_duration: parse_duration(&lookup, "PLAYER_CACHE_DURATION", 300)?,
            analysis_freshness: parse_duration(&lookup, "ANALYSIS_FRESHNESS", 3600)?,
            thresholds,
        };

        let schedule = ScheduleConfig {
            catalog_sync: lookup("CATALOG_SYNC_SCHEDULE").unwrap_or_else(|| "0 0 4 * * *".to_string()),
            watch: lookup("WATCH_SCHEDULE").unwrap_or_else(|| "0 */5 * * * *".to_string()),
        };

        let watched_tags = lookup("WATCHED_PLAYER_TAGS")
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            provider,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            cache,
            schedule,
            watched_tags,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::configuration(format!("{key} has an invalid value: {raw:?}"))),
        None => Ok(default),
    }
}

/// A non-negative window given in whole seconds
fn parse_duration<F>(lookup: &F, key: &str, default: i64) -> Result<chrono::Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: i64 = parse_var(lookup, key, default)?;
    if secs < 0 {
        return Err(Error::configuration(format!("{key} must not be negative, got {secs}")));
    }

    chrono::Duration::try_seconds(secs)
        .ok_or_else(|| Error::configuration(format!("{key} is out of range: {secs}")))
}
