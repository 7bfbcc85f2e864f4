use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tile::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Pawn,
    // The rules engine spells it this way.
    #[serde(rename = "Rock")]
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Rook,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Single letter used for labels and identities.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Rook => 'r',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub fn can_promote_to(self) -> bool {
        !matches!(self, PieceType::Pawn | PieceType::King)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank a pawn of this color promotes on.
    pub fn far_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

/// Opaque key that lets the renderer follow one piece across snapshots.
/// It carries no game meaning and is never regenerated by a move.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(String);

impl PieceId {
    pub fn new(id: impl Into<String>) -> Self {
        PieceId(id.into())
    }

    /// Identity for a piece inserted by the editor palette.
    pub fn synthesized(counter: u32) -> Self {
        PieceId(format!("new{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    pub position: Tile,
    pub identity: PieceId,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color, position: Tile, identity: PieceId) -> Self {
        Piece {
            piece_type,
            color,
            position,
            identity,
        }
    }

    /// The same piece standing somewhere else.
    pub fn moved_to(&self, tile: Tile) -> Piece {
        Piece {
            position: tile,
            ..self.clone()
        }
    }
}
