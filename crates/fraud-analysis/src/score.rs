//! Pattern kinds and the weighted suspicion scorer.
//!
//! Patterns are a typed enumeration internally; the `"kind:count"`
//! string form seen on the wire is a serialization convenience only.
//! The weight table is data, not inline constants, so a new pattern
//! kind is added by extending the enum and supplying a table whose
//! weights again sum to 100.

use std::collections::BTreeMap;
use std::fmt;

use eyre::{bail, Result};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Maximum (and weight-table total) suspicion score.
pub const MAX_SCORE: u8 = 100;

/// Behavioral pattern kinds detected by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternKind {
    /// Membership in a detected laundering cycle.
    CycleParticipation,
    /// Rapid pass-through of received funds.
    TemporalVelocity,
}

impl PatternKind {
    /// Stable wire name, as consumed by the presentation layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::CycleParticipation => "cycle_participation",
            PatternKind::TemporalVelocity => "temporal_velocity",
        }
    }

    /// Parse a wire name back into a kind.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "cycle_participation" => Some(PatternKind::CycleParticipation),
            "temporal_velocity" => Some(PatternKind::TemporalVelocity),
            _ => None,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected pattern with its occurrence count.
///
/// Serialized as the `"kind:count"` string the presentation layer splits
/// on; internally always the typed pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternCount {
    /// Which pattern was detected.
    pub kind: PatternKind,
    /// How many times it was detected for the account.
    pub count: u32,
}

impl fmt::Display for PatternCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.count)
    }
}

impl Serialize for PatternCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PatternCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (kind, count) = raw
            .split_once(':')
            .ok_or_else(|| de::Error::custom(format!("expected kind:count, got {raw:?}")))?;
        let kind = PatternKind::from_wire(kind)
            .ok_or_else(|| de::Error::custom(format!("unknown pattern kind {kind:?}")))?;
        let count = count
            .parse::<u32>()
            .map_err(|_| de::Error::custom(format!("invalid pattern count {count:?}")))?;
        Ok(PatternCount { kind, count })
    }
}

/// Data-driven weight table for the suspicion scorer.
///
/// Weights must sum to exactly [`MAX_SCORE`] across all kinds in the
/// table, so binary presence of every pattern saturates the scale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreWeights {
    weights: BTreeMap<PatternKind, u8>,
}

impl ScoreWeights {
    /// Build a weight table, rejecting tables that do not sum to 100.
    ///
    /// # Errors
    /// Returns error when the weights sum to anything but [`MAX_SCORE`].
    pub fn new(weights: BTreeMap<PatternKind, u8>) -> Result<Self> {
        let total: u32 = weights.values().map(|weight| u32::from(*weight)).sum();
        if total != u32::from(MAX_SCORE) {
            bail!("score weights must sum to {MAX_SCORE}, got {total}");
        }
        Ok(Self { weights })
    }

    /// Weight contributed by a pattern kind when present.
    pub fn weight(&self, kind: PatternKind) -> u8 {
        self.weights.get(&kind).copied().unwrap_or(0)
    }

    /// Score an account's detected patterns.
    ///
    /// A pattern contributes its full weight iff its count is nonzero —
    /// binary presence, never scaled by count — and the sum is clamped
    /// to `[0, 100]`.
    pub fn score(&self, patterns: &[PatternCount]) -> u8 {
        let total: u32 = patterns
            .iter()
            .filter(|pattern| pattern.count > 0)
            .map(|pattern| u32::from(self.weight(pattern.kind)))
            .sum();
        total.min(u32::from(MAX_SCORE)) as u8
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (PatternKind::CycleParticipation, 60),
                (PatternKind::TemporalVelocity, 40),
            ]),
        }
    }
}
