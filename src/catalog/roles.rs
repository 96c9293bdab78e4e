//! Curated role table used to derive analysis tags from card names

use crate::models::{CardTags, SpellWeight};

/// Cards whose primary job is dealing tower damage
const WIN_CONDITIONS: &[&str] = &[
    "Hog Rider",
    "Giant",
    "Royal Giant",
    "Golem",
    "Balloon",
    "Miner",
    "Graveyard",
    "X-Bow",
    "Mortar",
    "Lava Hound",
    "Goblin Barrel",
    "Ram Rider",
    "Battle Ram",
    "Wall Breakers",
    "Royal Hogs",
    "Elixir Golem",
    "Goblin Giant",
    "Electro Giant",
    "Giant Skeleton",
    "Skeleton Barrel",
    "Goblin Drill",
    "Three Musketeers",
];

/// Troops and buildings able to hit flying units
const AIR_TARGETING: &[&str] = &[
    "Archers",
    "Musketeer",
    "Mega Minion",
    "Minions",
    "Minion Horde",
    "Bats",
    "Baby Dragon",
    "Inferno Dragon",
    "Electro Dragon",
    "Skeleton Dragons",
    "Wizard",
    "Ice Wizard",
    "Electro Wizard",
    "Witch",
    "Mother Witch",
    "Princess",
    "Dart Goblin",
    "Spear Goblins",
    "Goblin Gang",
    "Firecracker",
    "Hunter",
    "Executioner",
    "Magic Archer",
    "Flying Machine",
    "Phoenix",
    "Archer Queen",
    "Little Prince",
    "Zappies",
    "Three Musketeers",
    "Ram Rider",
    "Ice Spirit",
    "Electro Spirit",
    "Fire Spirit",
    "Tesla",
    "Inferno Tower",
    "X-Bow",
];

/// Cards dealing area damage, spells included
const SPLASH_DAMAGE: &[&str] = &[
    "Valkyrie",
    "Baby Dragon",
    "Wizard",
    "Ice Wizard",
    "Bomber",
    "Bowler",
    "Executioner",
    "Witch",
    "Mega Knight",
    "Dark Prince",
    "Princess",
    "Firecracker",
    "Magic Archer",
    "Electro Dragon",
    "Skeleton Dragons",
    "Fire Spirit",
    "Bomb Tower",
    "Sparky",
    "Arrows",
    "Fireball",
    "The Log",
    "Zap",
    "Giant Snowball",
    "Poison",
    "Rocket",
    "Lightning",
    "Tornado",
    "Earthquake",
    "Barbarian Barrel",
];

/// Units that soak damage in front of a push
const TANKS: &[&str] = &[
    "Giant",
    "Golem",
    "Royal Giant",
    "Lava Hound",
    "Electro Giant",
    "Giant Skeleton",
    "Goblin Giant",
    "Mega Knight",
    "P.E.K.K.A",
    "Ice Golem",
    "Elixir Golem",
    "Rune Giant",
];

const LIGHT_SPELLS: &[&str] = &[
    "Zap",
    "The Log",
    "Arrows",
    "Giant Snowball",
    "Barbarian Barrel",
    "Tornado",
    "Earthquake",
    "Royal Delivery",
];

const HEAVY_SPELLS: &[&str] = &["Fireball", "Rocket", "Lightning", "Poison"];

/// Derives analysis tags for a card by name. Unknown names get no tags.
pub fn derive_tags(name: &str) -> CardTags {
    let name = name.trim();
    let listed = |table: &[&str]| table.iter().any(|entry| entry.eq_ignore_ascii_case(name));

    let spell_weight = if listed(HEAVY_SPELLS) {
        SpellWeight::Heavy
    } else if listed(LIGHT_SPELLS) {
        SpellWeight::Light
    } else {
        SpellWeight::None
    };

    CardTags {
        is_win_condition: listed(WIN_CONDITIONS),
        is_air_targeting: listed(AIR_TARGETING),
        is_splash_damage: listed(SPLASH_DAMAGE),
        is_tank: listed(TANKS),
        spell_weight,
    }
}
