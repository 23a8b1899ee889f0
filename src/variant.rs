//! Game variants and the board/piece configuration they imply.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::color::Color;
use crate::constants::{SYMMETRY_MIN_PIECES_DUO, SYMMETRY_MIN_PIECES_TRIGON};

/// Game variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Classic,
    Classic2,
    Duo,
    Junior,
    Trigon,
    Trigon2,
    Trigon3,
}

/// Shape of the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoardType {
    Classic,
    Duo,
    Trigon,
    Trigon3,
}

/// The catalogue of pieces each color gets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PieceSet {
    Classic,
    Junior,
    Trigon,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game variant '{0}'")]
pub struct ParseVariantError(pub String);

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Classic,
        Variant::Classic2,
        Variant::Duo,
        Variant::Junior,
        Variant::Trigon,
        Variant::Trigon2,
        Variant::Trigon3,
    ];

    pub fn nu_colors(self) -> u8 {
        match self {
            Variant::Duo | Variant::Junior => 2,
            Variant::Trigon3 => 3,
            _ => 4,
        }
    }

    pub fn nu_players(self) -> u8 {
        match self {
            Variant::Classic | Variant::Trigon => 4,
            Variant::Trigon3 => 3,
            _ => 2,
        }
    }

    pub fn board_type(self) -> BoardType {
        match self {
            Variant::Classic | Variant::Classic2 => BoardType::Classic,
            Variant::Duo | Variant::Junior => BoardType::Duo,
            Variant::Trigon | Variant::Trigon2 => BoardType::Trigon,
            Variant::Trigon3 => BoardType::Trigon3,
        }
    }

    pub fn piece_set(self) -> PieceSet {
        match self {
            Variant::Junior => PieceSet::Junior,
            Variant::Trigon | Variant::Trigon2 | Variant::Trigon3 => PieceSet::Trigon,
            _ => PieceSet::Classic,
        }
    }

    /// True if two colors are played by the same player.
    pub fn has_paired_colors(self) -> bool {
        matches!(self, Variant::Classic2 | Variant::Trigon2)
    }

    /// The other color of the same player, or `c` itself if colors are not paired.
    pub fn second_color(self, c: Color) -> Color {
        if self.has_paired_colors() {
            Color::new((c.to_int() + 2) % 4)
        } else {
            c
        }
    }

    /// Variants where the second player can mirror the first player's moves.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Variant::Duo | Variant::Junior | Variant::Trigon2)
    }

    /// Minimum number of pieces on board before a symmetric position counts
    /// as a draw. This is the earliest move number to break the symmetry.
    pub fn symmetry_min_nu_pieces(self) -> u32 {
        debug_assert!(self.is_symmetric());
        match self {
            Variant::Trigon2 => SYMMETRY_MIN_PIECES_TRIGON,
            _ => SYMMETRY_MIN_PIECES_DUO,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Classic2 => "classic_2",
            Variant::Duo => "duo",
            Variant::Junior => "junior",
            Variant::Trigon => "trigon",
            Variant::Trigon2 => "trigon_2",
            Variant::Trigon3 => "trigon_3",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        Variant::ALL
            .into_iter()
            .find(|v| v.id() == t)
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}
