//! Dice value objects
//!
//! The narrator asks for rolls through a [`DiceRollRequest`]; the client
//! resolves them locally. Randomness is injected as a closure so this crate
//! stays free of RNG dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Supported die sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Die {
    D2,
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl Die {
    pub const ALL: [Die; 8] = [
        Die::D2,
        Die::D4,
        Die::D6,
        Die::D8,
        Die::D10,
        Die::D12,
        Die::D20,
        Die::D100,
    ];

    /// Number of faces on the die.
    pub fn sides(self) -> i32 {
        match self {
            Die::D2 => 2,
            Die::D4 => 4,
            Die::D6 => 6,
            Die::D8 => 8,
            Die::D10 => 10,
            Die::D12 => 12,
            Die::D20 => 20,
            Die::D100 => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Die::D2 => "d2",
            Die::D4 => "d4",
            Die::D6 => "d6",
            Die::D8 => "d8",
            Die::D10 => "d10",
            Die::D12 => "d12",
            Die::D20 => "d20",
            Die::D100 => "d100",
        }
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Die {
    type Err = DomainError;

    /// Accepts `d20`, `D20`, `1d20` and a bare `20`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let faces = normalized
            .strip_prefix("1d")
            .or_else(|| normalized.strip_prefix('d'))
            .unwrap_or(&normalized);

        Die::ALL
            .into_iter()
            .find(|die| die.sides().to_string() == faces)
            .ok_or_else(|| DomainError::parse(format!("Unsupported die: '{}'", s)))
    }
}

/// Advantage / disadvantage selection for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl RollMode {
    /// Roll a single die honoring the mode.
    ///
    /// Advantage and disadvantage only apply to d20s; other dice are rolled once.
    pub fn roll(self, die: Die, mut roll: impl FnMut(i32, i32) -> i32) -> ModedRoll {
        let first = roll(1, die.sides());
        if die != Die::D20 || self == RollMode::Normal {
            return ModedRoll {
                die,
                mode: RollMode::Normal,
                rolls: vec![first],
                kept: first,
            };
        }

        let second = roll(1, die.sides());
        let kept = match self {
            RollMode::Advantage => first.max(second),
            _ => first.min(second),
        };
        ModedRoll {
            die,
            mode: self,
            rolls: vec![first, second],
            kept,
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RollMode::Normal => "normal",
            RollMode::Advantage => "advantage",
            RollMode::Disadvantage => "disadvantage",
        };
        f.write_str(label)
    }
}

impl FromStr for RollMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(RollMode::Normal),
            "advantage" | "adv" => Ok(RollMode::Advantage),
            "disadvantage" | "dis" => Ok(RollMode::Disadvantage),
            other => Err(DomainError::parse(format!("Unknown roll mode: '{}'", other))),
        }
    }
}

/// A single player-initiated die roll, possibly with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModedRoll {
    pub die: Die,
    /// Mode actually applied (always `Normal` for non-d20 dice).
    pub mode: RollMode,
    pub rolls: Vec<i32>,
    pub kept: i32,
}

impl ModedRoll {
    pub fn is_natural_20(&self) -> bool {
        self.die == Die::D20 && self.kept == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.die == Die::D20 && self.kept == 1
    }
}

/// Largest modifier magnitude accepted on a requested roll.
pub const MAX_MODIFIER: i32 = 1000;

/// A roll requested by the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollRequest {
    pub reason: String,
    pub die: Die,
    pub count: u8,
    pub modifier: i32,
}

impl DiceRollRequest {
    pub fn new(
        reason: impl Into<String>,
        die: Die,
        count: u8,
        modifier: i32,
    ) -> Result<Self, DomainError> {
        if count == 0 {
            return Err(DomainError::validation("Dice count must be at least 1"));
        }
        if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&modifier) {
            return Err(DomainError::validation(format!(
                "Modifier must be between -{0} and {0}",
                MAX_MODIFIER
            )));
        }
        Ok(Self {
            reason: reason.into(),
            die,
            count,
            modifier,
        })
    }

    /// Roll `count` dice, sum them and add the modifier.
    ///
    /// `roll(min, max)` must return a uniform integer in `[min, max]`.
    pub fn resolve(&self, mut roll: impl FnMut(i32, i32) -> i32) -> DiceRoll {
        let rolls: Vec<i32> = (0..self.count)
            .map(|_| roll(1, self.die.sides()))
            .collect();
        let total = rolls
            .iter()
            .fold(self.modifier, |acc, r| acc.saturating_add(*r));

        DiceRoll {
            reason: self.reason.clone(),
            die: self.die,
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

/// Outcome of resolving a [`DiceRollRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRoll {
    pub reason: String,
    pub die: Die,
    pub rolls: Vec<i32>,
    pub modifier: i32,
    pub total: i32,
}

impl DiceRoll {
    /// Format as a breakdown string (e.g., "2d6 [3, 5] + 2 = 10")
    pub fn breakdown(&self) -> String {
        let rolls = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let dice = format!("{}{} [{}]", self.rolls.len(), self.die, rolls);
        match self.modifier {
            0 => format!("{} = {}", dice, self.total),
            m if m > 0 => format!("{} + {} = {}", dice, m, self.total),
            m => format!("{} - {} = {}", dice, m.unsigned_abs(), self.total),
        }
    }
}

/// Format a modifier with an explicit sign ("+3", "-1", "+0").
pub fn signed(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{}", modifier)
    } else {
        modifier.to_string()
    }
}
