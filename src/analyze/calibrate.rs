//! Post-scoring calibration and score bands.
//!
//! Additive scoring lets a song with one slur and three praise lines land in the
//! middle. Calibration fixes that with hard bands:
//! - any strong-negative hit → total capped at 30 (Concern)
//! - otherwise any worship hit → total floored at 80 (Faith-Safe)
//!
//! The cap always wins over the floor.

use serde::{Deserialize, Serialize};

use super::scoring::{clamp_total, Hit};

/// Rule ids that pull a title into the Concern band on their own.
pub const STRONG_NEGATIVE: &[&str] = &[
    "explicit-language",
    "explicit-sexual",
    "explicit-violence",
    "substance-abuse",
    "occult-practices",
    "blasphemy",
    "self-harm",
    "false-gospel",
];

/// Affirming rule ids that lift otherwise clean content into Faith-Safe.
pub const WORSHIP: &[&str] = &["worship", "repentance-hope"];

pub const DEFAULT_CAP: u8 = 30;
pub const DEFAULT_FLOOR: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationBands {
    pub cap: u8,
    pub floor: u8,
}

impl Default for CalibrationBands {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            floor: DEFAULT_FLOOR,
        }
    }
}

/// Calibrate with the default bands (cap 30, floor 80).
pub fn calibrate(raw_total: i32, hits: &[Hit]) -> u8 {
    calibrate_with(raw_total, hits, CalibrationBands::default())
}

pub fn calibrate_with(raw_total: i32, hits: &[Hit], bands: CalibrationBands) -> u8 {
    let raw = i64::from(raw_total);
    let has = |set: &[&str]| hits.iter().any(|h| set.iter().any(|id| *id == h.rule_id));

    let adjusted = if has(STRONG_NEGATIVE) {
        raw.min(i64::from(bands.cap))
    } else if has(WORSHIP) {
        raw.max(i64::from(bands.floor))
    } else {
        raw
    };
    clamp_total(adjusted)
}

/// User-facing verdict bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Faith-Safe")]
    FaithSafe,
    Caution,
    Concern,
}

impl Band {
    pub fn from_total(total: u8) -> Self {
        if total >= 80 {
            Self::FaithSafe
        } else if total >= 50 {
            Self::Caution
        } else {
            Self::Concern
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FaithSafe => "Faith-Safe",
            Self::Caution => "Caution",
            Self::Concern => "Concern",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(ids: &[&str]) -> Vec<Hit> {
        ids.iter()
            .map(|id| Hit {
                rule_id: id.to_string(),
                refs: Vec::new(),
                reason: None,
            })
            .collect()
    }

    #[test]
    fn no_hits_is_unchanged() {
        assert_eq!(calibrate(50, &[]), 50);
        assert_eq!(calibrate(73, &hits(&["love-and-compassion"])), 73);
    }

    #[test]
    fn cap_beats_floor() {
        let h = hits(&["worship", "repentance-hope", "explicit-language"]);
        assert_eq!(calibrate(95, &h), 30);
        assert_eq!(calibrate(12, &h), 12);
    }

    #[test]
    fn worship_only_is_floored() {
        assert_eq!(calibrate(60, &hits(&["worship"])), 80);
        assert_eq!(calibrate(97, &hits(&["repentance-hope"])), 97);
    }

    #[test]
    fn non_strong_negative_does_not_cap() {
        // sexual-purity and deity-of-christ are negative but not in the strong set
        assert_eq!(calibrate(45, &hits(&["sexual-purity"])), 45);
        assert_eq!(calibrate(45, &hits(&["deity-of-christ", "worship"])), 80);
    }

    #[test]
    fn out_of_range_raw_is_clamped() {
        assert_eq!(calibrate(-40, &[]), 0);
        assert_eq!(calibrate(400, &hits(&["worship"])), 100);
        assert_eq!(calibrate(i32::MIN, &hits(&["blasphemy"])), 0);
    }

    #[test]
    fn custom_bands() {
        let bands = CalibrationBands { cap: 20, floor: 90 };
        assert_eq!(calibrate_with(50, &hits(&["self-harm"]), bands), 20);
        assert_eq!(calibrate_with(50, &hits(&["worship"]), bands), 90);
    }

    #[test]
    fn bands_from_total() {
        assert_eq!(Band::from_total(100), Band::FaithSafe);
        assert_eq!(Band::from_total(80), Band::FaithSafe);
        assert_eq!(Band::from_total(79), Band::Caution);
        assert_eq!(Band::from_total(50), Band::Caution);
        assert_eq!(Band::from_total(49), Band::Concern);
        assert_eq!(
            serde_json::to_string(&Band::FaithSafe).unwrap(),
            "\"Faith-Safe\""
        );
    }
}
