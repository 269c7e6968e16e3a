//! Rhythm modes and their subdivision counts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::MetronomeError;

/// Subdivision of each main beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RhythmMode {
    /// Main beats only
    #[default]
    Normal = 0,
    /// Two clicks per beat
    Eighth = 1,
    /// Three clicks per beat
    Triplet = 2,
    /// Four clicks per beat
    Sixteenth = 3,
}

impl RhythmMode {
    pub const ALL: [RhythmMode; 4] = [
        RhythmMode::Normal,
        RhythmMode::Eighth,
        RhythmMode::Triplet,
        RhythmMode::Sixteenth,
    ];

    /// Clicks per beat, the main beat included
    pub fn subdivisions(self) -> u32 {
        match self {
            RhythmMode::Normal => 1,
            RhythmMode::Eighth => 2,
            RhythmMode::Triplet => 3,
            RhythmMode::Sixteenth => 4,
        }
    }

    /// Mode resulting from selecting `requested` while `self` is active.
    ///
    /// Note the toggle: selecting the active mode again turns subdivisions off
    /// and yields `Normal`, it does not keep the mode. Any other request
    /// replaces the current mode.
    pub fn apply(self, requested: RhythmMode) -> RhythmMode {
        if requested == self {
            RhythmMode::Normal
        } else {
            requested
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RhythmMode::Normal => "normal",
            RhythmMode::Eighth => "eighth",
            RhythmMode::Triplet => "triplet",
            RhythmMode::Sixteenth => "sixteenth",
        }
    }

    pub(crate) fn from_u8(value: u8) -> RhythmMode {
        match value {
            1 => RhythmMode::Eighth,
            2 => RhythmMode::Triplet,
            3 => RhythmMode::Sixteenth,
            _ => RhythmMode::Normal,
        }
    }
}

impl fmt::Display for RhythmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RhythmMode {
    type Err = MetronomeError;

    /// Accepts the full mode name or its one-letter command
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "n" => Ok(RhythmMode::Normal),
            "eighth" | "e" => Ok(RhythmMode::Eighth),
            "triplet" | "t" => Ok(RhythmMode::Triplet),
            "sixteenth" | "x" => Ok(RhythmMode::Sixteenth),
            other => Err(MetronomeError::InvalidMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdivision_counts() {
        let counts: Vec<u32> = RhythmMode::ALL.iter().map(|m| m.subdivisions()).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_apply_from_normal_selects_mode() {
        assert_eq!(RhythmMode::Normal.apply(RhythmMode::Triplet), RhythmMode::Triplet);
    }

    #[test]
    fn test_apply_same_mode_toggles_off() {
        for mode in RhythmMode::ALL {
            assert_eq!(mode.apply(mode), RhythmMode::Normal);
        }
    }

    #[test]
    fn test_apply_other_mode_replaces() {
        assert_eq!(RhythmMode::Eighth.apply(RhythmMode::Sixteenth), RhythmMode::Sixteenth);
        assert_eq!(RhythmMode::Sixteenth.apply(RhythmMode::Eighth), RhythmMode::Eighth);
    }

    #[test]
    fn test_parse() {
        assert_eq!("e".parse::<RhythmMode>().unwrap(), RhythmMode::Eighth);
        assert_eq!(" Triplet ".parse::<RhythmMode>().unwrap(), RhythmMode::Triplet);
        assert_eq!("x".parse::<RhythmMode>().unwrap(), RhythmMode::Sixteenth);
        assert_eq!("normal".parse::<RhythmMode>().unwrap(), RhythmMode::Normal);

        match "quintuplet".parse::<RhythmMode>() {
            Err(MetronomeError::InvalidMode(s)) => assert_eq!(s, "quintuplet"),
            other => panic!("expected invalid mode, got {:?}", other),
        }
    }

    #[test]
    fn test_u8_roundtrip() {
        for mode in RhythmMode::ALL {
            assert_eq!(RhythmMode::from_u8(mode as u8), mode);
        }
    }
}
