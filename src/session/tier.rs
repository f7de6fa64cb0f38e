use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Difficulty tier of a practice text. Tiers are categories, not a numeric scale.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    #[serde(alias = "beginner")]
    Principiante,
    #[serde(alias = "intermediate")]
    Intermedio,
    #[serde(alias = "advanced")]
    Avanzado,
}

impl Tier {
    pub fn all() -> &'static [Tier] {
        &[Tier::Principiante, Tier::Intermedio, Tier::Avanzado]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Principiante => "principiante",
            Tier::Intermedio => "intermedio",
            Tier::Avanzado => "avanzado",
        }
    }

    /// Resolves both the Spanish key and its English alias.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "principiante" | "beginner" => Some(Tier::Principiante),
            "intermedio" | "intermediate" => Some(Tier::Intermedio),
            "avanzado" | "advanced" => Some(Tier::Avanzado),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Principiante => "Principiante",
            Tier::Intermedio => "Intermedio",
            Tier::Avanzado => "Avanzado",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tier::Principiante => "\u{1f331}",
            Tier::Intermedio => "\u{26a1}",
            Tier::Avanzado => "\u{1f525}",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::from_key(s).ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Night,
}

impl TimeOfDay {
    /// Scene a round opens with when the player has not pinned one.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Principiante => TimeOfDay::Morning,
            Tier::Intermedio => TimeOfDay::Afternoon,
            Tier::Avanzado => TimeOfDay::Night,
        }
    }

    pub fn next(self) -> Self {
        match self {
            TimeOfDay::Morning => TimeOfDay::Afternoon,
            TimeOfDay::Afternoon => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Morning,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Ma\u{f1}ana",
            TimeOfDay::Afternoon => "Tarde",
            TimeOfDay::Night => "Noche",
        }
    }
}
