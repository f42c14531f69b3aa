// Squad position categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position categories a candidate can be listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in deterministic squad order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts:
    /// - full names, singular or plural ("goalkeeper", "defenders")
    /// - FPL short codes ("GK"/"GKP"/"G", "DEF"/"D", "MID"/"M", "FWD"/"FW"/"F")
    /// - FPL `element_type` ids ("1" through "4")
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GOALKEEPER" | "GOALKEEPERS" | "GK" | "GKP" | "G" | "1" => Some(Position::Goalkeeper),
            "DEFENDER" | "DEFENDERS" | "DEF" | "D" | "2" => Some(Position::Defender),
            "MIDFIELDER" | "MIDFIELDERS" | "MID" | "M" | "3" => Some(Position::Midfielder),
            "FORWARD" | "FORWARDS" | "FWD" | "FW" | "F" | "4" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the short display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Lowercase name, used as the config key.
    pub fn key(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "goalkeeper",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
        }
    }

    /// Deterministic ordering index for squad display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.sort_order() as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}
