//! Projection of positions and tool state into drawable pieces.

use std::collections::BTreeMap;

use crate::piece::{Color, Piece, PieceId, PieceType};
use crate::position::Position;
use crate::smart_tool::{DraggingPieces, SmartTool};
use crate::tile::{BoardRotation, Point, coordinate_of_tile};

/// Where a lifted piece hovers relative to its tile.
pub const IN_HAND_OFFSET: Point = Point { x: 0.0, y: -30.0 };

pub const Z_DRAGGED: i32 = 3;
pub const Z_LIFTED: i32 = 2;

/// One piece as it should be drawn, in board pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualPiece {
    pub piece_type: PieceType,
    pub color: Color,
    /// Top left corner of the piece's tile-sized box.
    pub position: Point,
    pub identity: PieceId,
    pub z_order: i32,
    pub opacity: f64,
}

impl VisualPiece {
    fn of(piece: &Piece, position: Point, z_order: i32) -> Self {
        VisualPiece {
            piece_type: piece.piece_type,
            color: piece.color,
            position,
            identity: piece.identity.clone(),
            z_order,
            opacity: 1.0,
        }
    }
}

fn resting_z(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => 0,
    }
}

pub fn render(tool: &SmartTool, position: &Position) -> Vec<VisualPiece> {
    render_rotated(tool, position, BoardRotation::WhiteBottom)
}

/// Dragged pieces first, then lifted pieces, then everything at rest.
pub fn render_rotated(
    tool: &SmartTool,
    position: &Position,
    rotation: BoardRotation,
) -> Vec<VisualPiece> {
    let delta = tool.drag_delta.unwrap_or_default();
    let mut scene = Vec::with_capacity(position.pieces.len() + 2);

    let dragged_lift = match &tool.dragging_pieces {
        DraggingPieces::Normal(pieces) => {
            for p in pieces {
                let at = coordinate_of_tile(p.position, rotation).add(delta);
                scene.push(VisualPiece::of(p, at, Z_DRAGGED));
            }
            None
        }
        DraggingPieces::Lifted(p) => {
            let at = coordinate_of_tile(p.position, rotation)
                .add(IN_HAND_OFFSET)
                .add(delta);
            scene.push(VisualPiece::of(p, at, Z_DRAGGED));
            Some(&p.identity)
        }
    };

    for p in &position.lifted_pieces {
        if dragged_lift == Some(&p.identity) {
            continue;
        }
        let at = coordinate_of_tile(p.position, rotation).add(IN_HAND_OFFSET);
        scene.push(VisualPiece::of(p, at, Z_LIFTED));
    }

    for p in &position.pieces {
        let at = coordinate_of_tile(p.position, rotation);
        scene.push(VisualPiece::of(p, at, resting_z(p.color)));
    }
    scene
}

/// Zero velocity at both ends.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    -2.0 * t * t * t + 3.0 * t * t
}

/// Blends two scenes, matching pieces by identity.
pub fn render_transition(t: f64, old: &[VisualPiece], new: &[VisualPiece]) -> Vec<VisualPiece> {
    let eased = ease_in_out(t);
    let old_by_id: BTreeMap<&PieceId, &VisualPiece> =
        old.iter().map(|v| (&v.identity, v)).collect();
    let new_ids: BTreeMap<&PieceId, &VisualPiece> = new.iter().map(|v| (&v.identity, v)).collect();

    let mut scene = Vec::with_capacity(old.len().max(new.len()));
    for v in new {
        match old_by_id.get(&v.identity) {
            Some(before) => scene.push(VisualPiece {
                position: before.position.lerp(v.position, eased),
                opacity: before.opacity + (v.opacity - before.opacity) * eased,
                ..v.clone()
            }),
            None => scene.push(VisualPiece {
                opacity: v.opacity * eased,
                ..v.clone()
            }),
        }
    }
    for v in old {
        if !new_ids.contains_key(&v.identity) {
            scene.push(VisualPiece {
                opacity: v.opacity * (1.0 - eased),
                ..v.clone()
            });
        }
    }
    scene
}

/// Back to front drawing order.
pub fn paint_order(scene: &mut [VisualPiece]) {
    scene.sort_by_key(|v| v.z_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smart_tool::ToolEvent;
    use crate::tile::Tile;

    fn tile(name: &str) -> Tile {
        Tile::from_name(name).unwrap()
    }

    fn visual(id: &str, x: f64, y: f64) -> VisualPiece {
        VisualPiece {
            piece_type: PieceType::Pawn,
            color: Color::White,
            position: Point::new(x, y),
            identity: PieceId::new(id),
            z_order: 1,
            opacity: 1.0,
        }
    }

    #[test]
    fn idle_render_is_one_visual_per_piece() {
        let position = Position::initial();
        let scene = render(&SmartTool::new(), &position);
        assert_eq!(scene.len(), position.pieces.len());
        for (v, p) in scene.iter().zip(&position.pieces) {
            assert_eq!(v.identity, p.identity);
            assert_eq!(v.opacity, 1.0);
            assert_eq!(v.position, coordinate_of_tile(p.position, BoardRotation::WhiteBottom));
        }
    }

    #[test]
    fn dragged_pieces_follow_the_pointer_on_top() {
        let position = Position::initial();
        let (tool, _) = SmartTool::new().update(
            ToolEvent::MouseDown {
                tile: Some(tile("e2")),
                pixel: Point::new(450.0, 650.0),
            },
            &position,
        );
        let (tool, _) = tool.update(
            ToolEvent::MouseMove {
                tile: Some(tile("e4")),
                pixel: Point::new(450.0, 450.0),
            },
            &position,
        );
        let scene = render(&tool, &position);
        let dragged: Vec<&VisualPiece> = scene.iter().filter(|v| v.z_order == Z_DRAGGED).collect();
        assert_eq!(dragged.len(), 1);
        assert_eq!(dragged[0].identity.as_str(), "wpe2");
        assert_eq!(dragged[0].position, Point::new(400.0, 400.0));
    }

    #[test]
    fn lifted_pieces_hover_above_their_tile() {
        let mut position = Position::empty();
        position.lifted_pieces.push(Piece::new(
            PieceType::Pawn,
            Color::White,
            tile("a1"),
            PieceId::new("p"),
        ));
        let scene = render(&SmartTool::new(), &position);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene[0].z_order, Z_LIFTED);
        assert_eq!(scene[0].position, Point::new(0.0, 670.0));
    }

    #[test]
    fn unions_stack_white_over_black() {
        let mut position = Position::empty();
        let d4 = tile("d4");
        position.pieces.push(Piece::new(PieceType::Rook, Color::White, d4, PieceId::new("w")));
        position.pieces.push(Piece::new(PieceType::Rook, Color::Black, d4, PieceId::new("b")));
        let mut scene = render(&SmartTool::new(), &position);
        paint_order(&mut scene);
        assert_eq!(scene[0].identity.as_str(), "b");
        assert_eq!(scene[1].identity.as_str(), "w");
    }

    #[test]
    fn easing_has_fixed_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!(ease_in_out(0.1) < 0.1);
        assert!(ease_in_out(0.9) > 0.9);
    }

    #[test]
    fn transition_moves_fades_in_and_fades_out() {
        let old = vec![visual("moving", 0.0, 0.0), visual("captured", 100.0, 100.0)];
        let new = vec![visual("moving", 100.0, 0.0), visual("promoted", 200.0, 0.0)];
        let scene = render_transition(0.5, &old, &new);
        assert_eq!(scene.len(), 3);

        let by_id = |id: &str| scene.iter().find(|v| v.identity.as_str() == id).unwrap();
        assert_eq!(by_id("moving").position, Point::new(50.0, 0.0));
        assert_eq!(by_id("moving").opacity, 1.0);
        assert_eq!(by_id("promoted").opacity, 0.5);
        assert_eq!(by_id("captured").opacity, 0.5);

        let end = render_transition(1.0, &old, &new);
        assert_eq!(end.iter().find(|v| v.identity.as_str() == "captured").unwrap().opacity, 0.0);
    }
}
