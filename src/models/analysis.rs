use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts derived from the eight cards of a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub avg_elixir: f64,
    pub air_targeting_count: u32,
    pub splash_damage_count: u32,
    pub win_condition_count: u32,
    pub tank_count: u32,
    pub light_spell_count: u32,
    pub heavy_spell_count: u32,
    pub total_spells: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strength {
    pub category: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Weight used when folding weaknesses into the overall rating
    pub fn weight(self) -> u32 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    pub category: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionKind {
    #[serde(rename = "Add Air Defense")]
    AddAirDefense,
    #[serde(rename = "Add Splash Damage")]
    AddSplashDamage,
    #[serde(rename = "Add Heavy Spell")]
    AddHeavySpell,
    #[serde(rename = "Add Light Spell")]
    AddLightSpell,
    #[serde(rename = "Add Win Condition")]
    AddWinCondition,
    #[serde(rename = "Reduce Elixir Cost")]
    ReduceElixirCost,
}

impl SuggestionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::AddAirDefense => "Add Air Defense",
            Self::AddSplashDamage => "Add Splash Damage",
            Self::AddHeavySpell => "Add Heavy Spell",
            Self::AddLightSpell => "Add Light Spell",
            Self::AddWinCondition => "Add Win Condition",
            Self::ReduceElixirCost => "Reduce Elixir Cost",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A proposed card swap addressing one weakness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub reason: String,
    /// Up to three card names not already in the deck
    pub consider_adding: Vec<String>,
    /// Up to two card names from the deck
    pub consider_removing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Average,
    Poor,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::Poor => "poor",
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "average" => Ok(Self::Average),
            "poor" => Ok(Self::Poor),
            other => Err(format!("unknown rating: {other}")),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict produced by the analysis engine for one deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub metrics: Metrics,
    pub strengths: Vec<Strength>,
    pub weaknesses: Vec<Weakness>,
    pub suggestions: Vec<Suggestion>,
    pub rating: Rating,
}

/// A persisted assessment. Newer results supersede older ones without replacing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: i64,
    pub deck_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub assessment: Assessment,
}
