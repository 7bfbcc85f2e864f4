//! Board snapshots and the local lift/place/promote transition.
//!
//! The transition here is speculative: it lets the board react instantly to
//! a gesture. Whether a move is actually legal is decided by the rules
//! engine, which may later replace the position wholesale.

use serde::{Deserialize, Serialize};

use crate::piece::{Color, Piece, PieceId, PieceType};
use crate::tile::Tile;

/// Atomic part of a move, in the same shape the rules engine uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Lift(Tile),
    Place(Tile),
    Promote(PieceType),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub pieces: Vec<Piece>,
    #[serde(default)]
    pub lifted_pieces: Vec<Piece>,
    pub current_player: Color,
}

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

impl Position {
    pub fn empty() -> Self {
        Position {
            pieces: Vec::new(),
            lifted_pieces: Vec::new(),
            current_player: Color::White,
        }
    }

    /// Standard 32 piece setup. Identities are derived from the starting
    /// square, e.g. `wpe2` for the white pawn on e2.
    pub fn initial() -> Self {
        let mut pieces = Vec::with_capacity(32);
        for (color, back, front) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
            for x in 0..8u8 {
                for (piece_type, y) in [(BACK_RANK[x as usize], back), (PieceType::Pawn, front)] {
                    let Some(tile) = Tile::new(x, y) else {
                        continue;
                    };
                    let prefix = match color {
                        Color::White => 'w',
                        Color::Black => 'b',
                    };
                    let id = PieceId::new(format!("{prefix}{}{}", piece_type.letter(), tile));
                    pieces.push(Piece::new(piece_type, color, tile, id));
                }
            }
        }
        Position {
            pieces,
            lifted_pieces: Vec::new(),
            current_player: Color::White,
        }
    }

    pub fn pieces_at(&self, tile: Tile) -> Vec<&Piece> {
        self.pieces.iter().filter(|p| p.position == tile).collect()
    }

    pub fn is_lifted(&self) -> bool {
        !self.lifted_pieces.is_empty()
    }

    /// At most two pieces per tile, and never two of the same color.
    pub fn is_consistent(&self) -> bool {
        let mut seen: Vec<(Tile, Color)> = Vec::with_capacity(self.pieces.len());
        for p in &self.pieces {
            if seen.contains(&(p.position, p.color)) {
                return false;
            }
            seen.push((p.position, p.color));
        }
        self.lifted_pieces.len() <= 2
    }

    /// Applies one action, returning `None` if it cannot be performed.
    /// `self` is never modified.
    pub fn do_action(&self, action: Action) -> Option<Position> {
        match action {
            Action::Lift(tile) => self.do_lift(tile),
            Action::Place(tile) => self.do_place(tile),
            Action::Promote(piece_type) => self.do_promote(piece_type),
        }
    }

    fn do_lift(&self, tile: Tile) -> Option<Position> {
        if self.is_lifted() {
            return None;
        }
        let (lifted, remaining): (Vec<Piece>, Vec<Piece>) =
            self.pieces.iter().cloned().partition(|p| p.position == tile);
        if lifted.is_empty() || lifted.len() > 2 {
            return None;
        }
        Some(Position {
            pieces: remaining,
            lifted_pieces: lifted,
            current_player: self.current_player,
        })
    }

    fn do_place(&self, tile: Tile) -> Option<Position> {
        let (occupants, mut remaining): (Vec<Piece>, Vec<Piece>) =
            self.pieces.iter().cloned().partition(|p| p.position == tile);
        let lifted: Vec<Piece> = self.lifted_pieces.iter().map(|p| p.moved_to(tile)).collect();

        let still_lifted = match (lifted.as_slice(), occupants.as_slice()) {
            ([mover], []) => {
                remaining.push(mover.clone());
                Vec::new()
            }
            ([mover], [other]) => {
                if other.color == mover.color {
                    return None;
                }
                remaining.push(other.clone());
                remaining.push(mover.clone());
                Vec::new()
            }
            ([mover], [a, b]) => {
                if a.color == b.color {
                    return None;
                }
                // The mover takes the place of its own color, which is
                // picked up and has to keep moving.
                let (displaced, partner) = if a.color == mover.color { (a, b) } else { (b, a) };
                remaining.push(partner.clone());
                remaining.push(mover.clone());
                vec![displaced.clone()]
            }
            ([a, b], []) => {
                remaining.push(a.clone());
                remaining.push(b.clone());
                Vec::new()
            }
            _ => return None,
        };

        let current_player = if still_lifted.is_empty() {
            self.current_player.other()
        } else {
            self.current_player
        };
        Some(Position {
            pieces: remaining,
            lifted_pieces: still_lifted,
            current_player,
        })
    }

    fn do_promote(&self, piece_type: PieceType) -> Option<Position> {
        if !piece_type.can_promote_to() {
            return None;
        }
        let index = self.pieces.iter().position(|p| {
            p.piece_type == PieceType::Pawn && p.position.y() == p.color.far_rank()
        })?;
        let mut next = self.clone();
        next.pieces[index].piece_type = piece_type;
        Some(next)
    }
}
