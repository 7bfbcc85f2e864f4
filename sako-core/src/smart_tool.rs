//! The "smart tool": turns pointer and keyboard events on the board into
//! lift/place moves, piece deletion and insertion.
//!
//! [`SmartTool::update`] is a pure reducer. It never touches the position it
//! is given; instead it reports what the host should do with it through a
//! [`ToolOutput`].

use crate::piece::{Color, Piece, PieceId, PieceType};
use crate::position::{Action, Position};
use crate::tile::{Point, Tile};

/// Which pieces of a highlighted tile the next action applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightMode {
    Both,
    WhiteOnly,
    BlackOnly,
    /// The tile is marked but no piece on it is selected.
    Lingering,
}

impl HighlightMode {
    pub fn selects(self, piece: &Piece) -> bool {
        match self {
            HighlightMode::Both => true,
            HighlightMode::WhiteOnly => piece.color == Color::White,
            HighlightMode::BlackOnly => piece.color == Color::Black,
            HighlightMode::Lingering => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraggingPieces {
    Normal(Vec<Piece>),
    /// The piece left in hand by a chain.
    Lifted(Piece),
}

impl Default for DraggingPieces {
    fn default() -> Self {
        DraggingPieces::Normal(Vec::new())
    }
}

impl DraggingPieces {
    pub fn is_empty(&self) -> bool {
        matches!(self, DraggingPieces::Normal(pieces) if pieces.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmartTool {
    pub highlight: Option<(Tile, HighlightMode)>,
    pub drag_start_tile: Option<Tile>,
    pub drag_start_pixel: Option<Point>,
    pub drag_delta: Option<Point>,
    pub dragging_pieces: DraggingPieces,
    pub hover: Option<Tile>,
    pub identity_counter: u32,
    /// Engine actions of the move committed by the last update, if it can be
    /// expressed as plain lift/place actions.
    pub completed_move: Option<Vec<Action>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToolEvent {
    MouseDown { tile: Option<Tile>, pixel: Point },
    MouseMove { tile: Option<Tile>, pixel: Point },
    MouseUp { tile: Option<Tile>, pixel: Point },
    KeyDelete,
    AddPiece { piece_type: PieceType, color: Color },
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutput {
    NoOp,
    /// The new authoritative local position.
    Commit(Position),
    /// Show this position while the gesture is in progress.
    Preview(Position),
    /// Drop any preview and show the committed position again.
    Rollback,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MoveOutcome {
    SimpleMove(Position),
    /// The move displaced a piece which is now in hand.
    MoveEndsWithLift(Position, Piece),
    MoveIsIllegal,
}

impl MoveOutcome {
    fn classify(result: Option<Position>) -> MoveOutcome {
        let Some(position) = result else {
            return MoveOutcome::MoveIsIllegal;
        };
        match position.lifted_pieces.as_slice() {
            [] => MoveOutcome::SimpleMove(position),
            [lifted] => {
                let lifted = lifted.clone();
                MoveOutcome::MoveEndsWithLift(position, lifted)
            }
            _ => MoveOutcome::MoveIsIllegal,
        }
    }
}

/// Moves the pieces selected by `mode` on `source` to `target`.
///
/// While a chain is in progress the move is the placement of the piece in
/// hand, regardless of `source`.
pub fn do_move_action(
    source: Tile,
    mode: HighlightMode,
    target: Tile,
    position: &Position,
) -> MoveOutcome {
    if position.is_lifted() {
        return MoveOutcome::classify(position.do_action(Action::Place(target)));
    }
    let color = match mode {
        HighlightMode::Both => {
            return MoveOutcome::classify(
                position
                    .do_action(Action::Lift(source))
                    .and_then(|p| p.do_action(Action::Place(target))),
            );
        }
        HighlightMode::WhiteOnly => Color::White,
        HighlightMode::BlackOnly => Color::Black,
        HighlightMode::Lingering => return MoveOutcome::MoveIsIllegal,
    };

    let at_source = position.pieces_at(source);
    let partner = match at_source.as_slice() {
        [single] if single.color == color => None,
        [a, b] if a.color != b.color => {
            Some(if a.color == color { (*b).clone() } else { (*a).clone() })
        }
        _ => return MoveOutcome::MoveIsIllegal,
    };
    let Some(partner) = partner else {
        return do_move_action(source, HighlightMode::Both, target, position);
    };

    let without_partner = Position {
        pieces: position
            .pieces
            .iter()
            .filter(|p| p.identity != partner.identity)
            .cloned()
            .collect(),
        ..position.clone()
    };
    let moved = without_partner
        .do_action(Action::Lift(source))
        .and_then(|p| p.do_action(Action::Place(target)))
        .map(|mut p| {
            p.pieces.push(partner);
            p
        });
    MoveOutcome::classify(moved)
}

/// The lift/place actions the rules engine would see for a move. Moving
/// one half of a union has no engine equivalent.
fn engine_actions(
    source: Tile,
    mode: HighlightMode,
    target: Tile,
    before: &Position,
) -> Option<Vec<Action>> {
    if before.is_lifted() {
        return Some(vec![Action::Place(target)]);
    }
    let whole_tile = match mode {
        HighlightMode::Both => true,
        HighlightMode::WhiteOnly | HighlightMode::BlackOnly => before.pieces_at(source).len() == 1,
        HighlightMode::Lingering => false,
    };
    whole_tile.then(|| vec![Action::Lift(source), Action::Place(target)])
}

fn without_pieces(position: &Position, removed: &[Piece]) -> Position {
    Position {
        pieces: position
            .pieces
            .iter()
            .filter(|p| !removed.iter().any(|r| r.identity == p.identity))
            .cloned()
            .collect(),
        ..position.clone()
    }
}

fn selected_pieces(position: &Position, tile: Tile, mode: HighlightMode) -> Vec<Piece> {
    position
        .pieces_at(tile)
        .into_iter()
        .filter(|p| mode.selects(p))
        .cloned()
        .collect()
}

fn fresh_highlight(position: &Position, tile: Tile) -> (Tile, HighlightMode) {
    if position.pieces_at(tile).is_empty() {
        (tile, HighlightMode::Lingering)
    } else {
        (tile, HighlightMode::Both)
    }
}

impl SmartTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start_tile.is_some()
    }

    pub fn update(&self, event: ToolEvent, position: &Position) -> (SmartTool, ToolOutput) {
        let mut next = self.clone();
        next.completed_move = None;
        let output = match event {
            ToolEvent::MouseDown { tile, pixel } => next.mouse_down(tile, pixel, position),
            ToolEvent::MouseMove { tile, pixel } => next.mouse_move(tile, pixel),
            ToolEvent::MouseUp { tile, pixel } => next.mouse_up(tile, pixel, position),
            ToolEvent::KeyDelete => next.delete_selection(position),
            ToolEvent::AddPiece { piece_type, color } => {
                next.add_piece(piece_type, color, position)
            }
            ToolEvent::Reset => {
                next = SmartTool {
                    identity_counter: self.identity_counter,
                    completed_move: None,
                    ..SmartTool::default()
                };
                ToolOutput::NoOp
            }
        };
        (next, output)
    }

    fn clear_gesture(&mut self) -> DraggingPieces {
        self.drag_start_tile = None;
        self.drag_start_pixel = None;
        self.drag_delta = None;
        std::mem::take(&mut self.dragging_pieces)
    }

    fn mouse_down(&mut self, tile: Option<Tile>, pixel: Point, position: &Position) -> ToolOutput {
        self.clear_gesture();
        let Some(tile) = tile else {
            return ToolOutput::NoOp;
        };
        self.drag_start_tile = Some(tile);
        self.drag_start_pixel = Some(pixel);
        self.drag_delta = Some(Point::default());
        self.hover = Some(tile);

        if position.is_lifted() {
            return match position.lifted_pieces.as_slice() {
                [single] => {
                    self.dragging_pieces = DraggingPieces::Lifted(single.clone());
                    ToolOutput::Preview(position.clone())
                }
                _ => ToolOutput::NoOp,
            };
        }

        let mode = match self.highlight {
            Some((highlighted, mode)) if highlighted == tile => mode,
            _ => HighlightMode::Both,
        };
        let picked = selected_pieces(position, tile, mode);
        if picked.is_empty() {
            return ToolOutput::NoOp;
        }
        let preview = without_pieces(position, &picked);
        self.dragging_pieces = DraggingPieces::Normal(picked);
        ToolOutput::Preview(preview)
    }

    fn mouse_move(&mut self, tile: Option<Tile>, pixel: Point) -> ToolOutput {
        self.hover = tile;
        if let Some(start) = self.drag_start_pixel {
            self.drag_delta = Some(pixel.sub(start));
        }
        ToolOutput::NoOp
    }

    fn mouse_up(&mut self, tile: Option<Tile>, _pixel: Point, position: &Position) -> ToolOutput {
        let start = self.drag_start_tile;
        let dragged = self.clear_gesture();
        // Only a preview has to be undone when nothing else happens.
        let undo_preview = if dragged.is_empty() {
            ToolOutput::NoOp
        } else {
            ToolOutput::Rollback
        };
        let (Some(start), Some(tile)) = (start, tile) else {
            return undo_preview;
        };

        if tile == start {
            return self.click(tile, position, undo_preview);
        }

        if dragged.is_empty() && !position.is_lifted() {
            return ToolOutput::NoOp;
        }
        let mode = match self.highlight {
            Some((highlighted, mode)) if highlighted == start => mode,
            _ => HighlightMode::Both,
        };
        let outcome = do_move_action(start, mode, tile, position);
        self.settle(start, mode, tile, outcome, position)
    }

    fn click(&mut self, tile: Tile, position: &Position, undo_preview: ToolOutput) -> ToolOutput {
        match self.highlight {
            Some((highlighted, _)) if highlighted == tile && position.is_lifted() => undo_preview,
            Some((highlighted, mode)) if highlighted == tile => {
                let occupants = position.pieces_at(tile).len();
                self.highlight = match (mode, occupants) {
                    (HighlightMode::Both, 2) => Some((tile, HighlightMode::WhiteOnly)),
                    (HighlightMode::WhiteOnly, 2) => Some((tile, HighlightMode::BlackOnly)),
                    (HighlightMode::Lingering, n) if n > 0 => Some((tile, HighlightMode::Both)),
                    _ => None,
                };
                undo_preview
            }
            Some((_, HighlightMode::Lingering)) if !position.is_lifted() => {
                self.highlight = Some(fresh_highlight(position, tile));
                undo_preview
            }
            Some((highlighted, mode)) => {
                let outcome = do_move_action(highlighted, mode, tile, position);
                self.settle(highlighted, mode, tile, outcome, position)
            }
            None if position.is_lifted() => {
                let outcome = do_move_action(tile, HighlightMode::Both, tile, position);
                self.settle(tile, HighlightMode::Both, tile, outcome, position)
            }
            None => {
                self.highlight = Some(fresh_highlight(position, tile));
                undo_preview
            }
        }
    }

    fn settle(
        &mut self,
        source: Tile,
        mode: HighlightMode,
        target: Tile,
        outcome: MoveOutcome,
        before: &Position,
    ) -> ToolOutput {
        match outcome {
            MoveOutcome::SimpleMove(position) => {
                self.highlight = None;
                self.completed_move = engine_actions(source, mode, target, before);
                ToolOutput::Commit(position)
            }
            MoveOutcome::MoveEndsWithLift(position, lifted) => {
                self.highlight = Some((lifted.position, HighlightMode::Both));
                self.completed_move = engine_actions(source, mode, target, before);
                ToolOutput::Commit(position)
            }
            MoveOutcome::MoveIsIllegal => {
                log::debug!("move from {source} to {target} rejected");
                if !before.is_lifted() {
                    self.highlight = None;
                }
                ToolOutput::Rollback
            }
        }
    }

    fn delete_selection(&mut self, position: &Position) -> ToolOutput {
        let Some((tile, mode)) = self.highlight else {
            return ToolOutput::NoOp;
        };
        let doomed = selected_pieces(position, tile, mode);
        if doomed.is_empty() {
            return ToolOutput::NoOp;
        }
        self.highlight = Some((tile, HighlightMode::Lingering));
        ToolOutput::Commit(without_pieces(position, &doomed))
    }

    fn add_piece(
        &mut self,
        piece_type: PieceType,
        color: Color,
        position: &Position,
    ) -> ToolOutput {
        let Some((tile, _)) = self.highlight else {
            return ToolOutput::NoOp;
        };
        let identity = self.next_identity(position);
        let mut next = Position {
            pieces: position
                .pieces
                .iter()
                .filter(|p| p.position != tile || p.color != color)
                .cloned()
                .collect(),
            ..position.clone()
        };
        next.pieces.push(Piece::new(piece_type, color, tile, identity));
        self.highlight = Some((tile, HighlightMode::Both));
        ToolOutput::Commit(next)
    }

    fn next_identity(&mut self, position: &Position) -> PieceId {
        loop {
            let candidate = PieceId::synthesized(self.identity_counter);
            self.identity_counter += 1;
            let taken = position
                .pieces
                .iter()
                .chain(position.lifted_pieces.iter())
                .any(|p| p.identity == candidate);
            if !taken {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(name: &str) -> Tile {
        Tile::from_name(name).unwrap()
    }

    fn piece(piece_type: PieceType, color: Color, at: &str, id: &str) -> Piece {
        Piece::new(piece_type, color, tile(at), PieceId::new(id))
    }

    fn position(pieces: Vec<Piece>) -> Position {
        Position {
            pieces,
            lifted_pieces: Vec::new(),
            current_player: Color::White,
        }
    }

    fn down(at: &str) -> ToolEvent {
        ToolEvent::MouseDown {
            tile: Some(tile(at)),
            pixel: Point::new(10.0, 10.0),
        }
    }

    fn up(at: &str) -> ToolEvent {
        ToolEvent::MouseUp {
            tile: Some(tile(at)),
            pixel: Point::new(10.0, 10.0),
        }
    }

    fn click(tool: &SmartTool, at: &str, pos: &Position) -> (SmartTool, ToolOutput) {
        let (tool, _) = tool.update(down(at), pos);
        tool.update(up(at), pos)
    }

    fn union_position() -> Position {
        position(vec![
            piece(PieceType::Knight, Color::White, "d4", "wn"),
            piece(PieceType::Bishop, Color::Black, "d4", "bb"),
        ])
    }

    #[test]
    fn mouse_down_previews_the_lift() {
        let pos = union_position();
        let (tool, out) = SmartTool::new().update(down("d4"), &pos);
        assert_eq!(out, ToolOutput::Preview(position(vec![])));
        match &tool.dragging_pieces {
            DraggingPieces::Normal(pieces) => assert_eq!(pieces.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(tool.drag_start_tile, Some(tile("d4")));
    }

    #[test]
    fn mouse_move_tracks_the_pointer() {
        let pos = union_position();
        let (tool, _) = SmartTool::new().update(down("d4"), &pos);
        let (tool, out) = tool.update(
            ToolEvent::MouseMove {
                tile: Some(tile("e5")),
                pixel: Point::new(60.0, -20.0),
            },
            &pos,
        );
        assert_eq!(out, ToolOutput::NoOp);
        assert_eq!(tool.drag_delta, Some(Point::new(50.0, -30.0)));
        assert_eq!(tool.hover, Some(tile("e5")));
    }

    #[test]
    fn clicking_a_union_cycles_the_selection() {
        let pos = union_position();
        let (tool, out) = click(&SmartTool::new(), "d4", &pos);
        assert_eq!(out, ToolOutput::Rollback);
        assert_eq!(tool.highlight, Some((tile("d4"), HighlightMode::Both)));

        let (tool, _) = click(&tool, "d4", &pos);
        assert_eq!(tool.highlight, Some((tile("d4"), HighlightMode::WhiteOnly)));
        let (tool, _) = click(&tool, "d4", &pos);
        assert_eq!(tool.highlight, Some((tile("d4"), HighlightMode::BlackOnly)));
        let (tool, _) = click(&tool, "d4", &pos);
        assert_eq!(tool.highlight, None);
    }

    #[test]
    fn clicking_a_single_piece_twice_clears_the_highlight() {
        let pos = position(vec![piece(PieceType::Rook, Color::White, "a1", "wr")]);
        let (tool, _) = click(&SmartTool::new(), "a1", &pos);
        assert_eq!(tool.highlight, Some((tile("a1"), HighlightMode::Both)));
        let (tool, _) = click(&tool, "a1", &pos);
        assert_eq!(tool.highlight, None);
    }

    #[test]
    fn click_then_click_moves_the_piece() {
        let pos = position(vec![piece(PieceType::Rook, Color::White, "a1", "wr")]);
        let (tool, _) = click(&SmartTool::new(), "a1", &pos);
        let (tool, out) = click(&tool, "a6", &pos);
        match out {
            ToolOutput::Commit(next) => {
                assert_eq!(next.pieces, vec![piece(PieceType::Rook, Color::White, "a6", "wr")]);
            }
            other => panic!("expected a commit, got {other:?}"),
        }
        assert_eq!(tool.highlight, None);
        assert_eq!(
            tool.completed_move,
            Some(vec![Action::Lift(tile("a1")), Action::Place(tile("a6"))])
        );
    }

    #[test]
    fn moving_one_half_of_a_union_leaves_the_partner() {
        let pos = union_position();
        let (tool, _) = click(&SmartTool::new(), "d4", &pos);
        let (tool, _) = click(&tool, "d4", &pos);
        assert_eq!(tool.highlight, Some((tile("d4"), HighlightMode::WhiteOnly)));

        let (tool, _) = tool.update(down("d4"), &pos);
        let (tool, out) = tool.update(up("f5"), &pos);
        let ToolOutput::Commit(next) = out else {
            panic!("expected a commit");
        };
        assert_eq!(tool.completed_move, None);
        let d4 = next.pieces_at(tile("d4"));
        assert_eq!(d4.len(), 1);
        assert_eq!(d4[0].identity.as_str(), "bb");
        assert_eq!(next.pieces_at(tile("f5"))[0].identity.as_str(), "wn");
    }

    #[test]
    fn illegal_drag_rolls_back_and_clears() {
        let pos = position(vec![
            piece(PieceType::Rook, Color::White, "a1", "wr"),
            piece(PieceType::Pawn, Color::White, "a2", "wp"),
        ]);
        let (tool, _) = click(&SmartTool::new(), "a1", &pos);
        let (tool, _) = tool.update(down("a1"), &pos);
        let (tool, out) = tool.update(up("a2"), &pos);
        assert_eq!(out, ToolOutput::Rollback);
        assert_eq!(tool.highlight, None);
        assert!(!tool.is_dragging());
    }

    #[test]
    fn chain_keeps_the_highlight_until_resolved() {
        let pos = position(vec![
            piece(PieceType::Rook, Color::White, "a1", "wr"),
            piece(PieceType::Pawn, Color::White, "a5", "wp"),
            piece(PieceType::Pawn, Color::Black, "a5", "bp"),
            piece(PieceType::King, Color::White, "h1", "wk"),
        ]);
        let (tool, _) = SmartTool::new().update(down("a1"), &pos);
        let (tool, out) = tool.update(up("a5"), &pos);
        let ToolOutput::Commit(chain) = out else {
            panic!("expected a commit");
        };
        assert_eq!(chain.lifted_pieces.len(), 1);
        assert_eq!(tool.highlight, Some((tile("a5"), HighlightMode::Both)));

        // The white pawn in hand may not land on the white king.
        let (tool, out) = tool.update(down("a5"), &chain);
        assert!(matches!(tool.dragging_pieces, DraggingPieces::Lifted(_)));
        assert_eq!(out, ToolOutput::Preview(chain.clone()));
        let (tool, out) = tool.update(up("h1"), &chain);
        assert_eq!(out, ToolOutput::Rollback);
        assert_eq!(tool.highlight, Some((tile("a5"), HighlightMode::Both)));

        let (tool, out) = click(&tool, "a7", &chain);
        let ToolOutput::Commit(done) = out else {
            panic!("expected a commit");
        };
        assert!(!done.is_lifted());
        assert_eq!(tool.completed_move, Some(vec![Action::Place(tile("a7"))]));
        assert_eq!(done.pieces_at(tile("a7"))[0].identity.as_str(), "wp");
        assert_eq!(tool.highlight, None);
    }

    #[test]
    fn delete_removes_the_selection_and_lingers() {
        let pos = union_position();
        let (tool, _) = click(&SmartTool::new(), "d4", &pos);
        let (tool, _) = click(&tool, "d4", &pos);
        let (tool, out) = tool.update(ToolEvent::KeyDelete, &pos);
        let ToolOutput::Commit(next) = out else {
            panic!("expected a commit");
        };
        assert_eq!(next.pieces.len(), 1);
        assert_eq!(next.pieces[0].color, Color::Black);
        assert_eq!(tool.highlight, Some((tile("d4"), HighlightMode::Lingering)));

        let (_, out) = tool.update(ToolEvent::KeyDelete, &next);
        assert_eq!(out, ToolOutput::NoOp);
        let (_, out) = SmartTool::new().update(ToolEvent::KeyDelete, &pos);
        assert_eq!(out, ToolOutput::NoOp);
    }

    #[test]
    fn palette_replaces_same_color_and_mints_identities() {
        let pos = position(vec![piece(PieceType::Pawn, Color::White, "c3", "new0")]);
        let add = ToolEvent::AddPiece {
            piece_type: PieceType::Queen,
            color: Color::White,
        };
        let (_, out) = SmartTool::new().update(add, &pos);
        assert_eq!(out, ToolOutput::NoOp);

        let (tool, _) = click(&SmartTool::new(), "c3", &pos);
        let (tool, out) = tool.update(add, &pos);
        let ToolOutput::Commit(next) = out else {
            panic!("expected a commit");
        };
        assert_eq!(next.pieces.len(), 1);
        assert_eq!(next.pieces[0].piece_type, PieceType::Queen);
        assert_eq!(next.pieces[0].identity.as_str(), "new1");
        assert_eq!(tool.identity_counter, 2);
    }

    #[test]
    fn empty_tile_click_lingers_for_the_palette() {
        let pos = position(vec![]);
        let (tool, out) = click(&SmartTool::new(), "e4", &pos);
        assert_eq!(out, ToolOutput::NoOp);
        assert_eq!(tool.highlight, Some((tile("e4"), HighlightMode::Lingering)));
        let (tool, out) = tool.update(
            ToolEvent::AddPiece {
                piece_type: PieceType::King,
                color: Color::Black,
            },
            &pos,
        );
        assert!(matches!(out, ToolOutput::Commit(ref p) if p.pieces.len() == 1));
        assert_eq!(tool.highlight, Some((tile("e4"), HighlightMode::Both)));
    }

    #[test]
    fn release_off_the_board_rolls_back() {
        let pos = union_position();
        let (tool, _) = SmartTool::new().update(down("d4"), &pos);
        let (tool, out) = tool.update(
            ToolEvent::MouseUp {
                tile: None,
                pixel: Point::new(-5.0, 0.0),
            },
            &pos,
        );
        assert_eq!(out, ToolOutput::Rollback);
        assert!(!tool.is_dragging());
    }

    #[test]
    fn do_move_action_rejects_empty_and_lingering_selections() {
        let pos = union_position();
        assert_eq!(
            do_move_action(tile("a1"), HighlightMode::Both, tile("a2"), &pos),
            MoveOutcome::MoveIsIllegal
        );
        assert_eq!(
            do_move_action(tile("d4"), HighlightMode::Lingering, tile("a2"), &pos),
            MoveOutcome::MoveIsIllegal
        );
    }
}
