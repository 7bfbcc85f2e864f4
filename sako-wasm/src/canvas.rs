use std::f64::consts::TAU;

use sako_core::render::VisualPiece;
use sako_core::smart_tool::HighlightMode;
use sako_core::tile::{BoardRotation, TILE_SIZE, Tile, coordinate_of_tile};
use sako_core::{Color, PieceType};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use crate::constants::*;

// Style setters go through property assignment, the typed setters are deprecated.
fn set_style(ctx: &CanvasRenderingContext2d, property: &str, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str(property),
        &JsValue::from_str(color),
    );
}

pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    set_style(ctx, "fillStyle", color);
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    set_style(ctx, "strokeStyle", color);
}

/// Everything below the pieces: squares, selection, hover and legal targets.
pub struct BoardLayer<'a> {
    pub rotation: BoardRotation,
    pub highlight: Option<(Tile, HighlightMode)>,
    pub hover: Option<Tile>,
    pub legal_targets: &'a [Tile],
}

pub fn draw_board(ctx: &CanvasRenderingContext2d, layer: &BoardLayer<'_>) {
    for index in 0..64 {
        let Some(tile) = Tile::from_index(index) else {
            continue;
        };
        let at = coordinate_of_tile(tile, layer.rotation);
        let light = (tile.x() + tile.y()) % 2 == 1;
        set_fill_style(ctx, if light { LIGHT_TILE } else { DARK_TILE });
        ctx.fill_rect(at.x, at.y, TILE_SIZE, TILE_SIZE);
    }

    if let Some((tile, mode)) = layer.highlight {
        let at = coordinate_of_tile(tile, layer.rotation);
        let fill = match mode {
            HighlightMode::Lingering => LINGERING_FILL,
            _ => HIGHLIGHT_FILL,
        };
        set_fill_style(ctx, fill);
        ctx.fill_rect(at.x, at.y, TILE_SIZE, TILE_SIZE);
    }

    if let Some(tile) = layer.hover {
        let at = coordinate_of_tile(tile, layer.rotation);
        set_stroke_style(ctx, HOVER_STROKE);
        ctx.set_line_width(4.0);
        ctx.stroke_rect(at.x + 2.0, at.y + 2.0, TILE_SIZE - 4.0, TILE_SIZE - 4.0);
    }

    set_fill_style(ctx, LEGAL_TARGET_FILL);
    for tile in layer.legal_targets {
        let at = coordinate_of_tile(*tile, layer.rotation);
        ctx.begin_path();
        let _ = ctx.arc(
            at.x + TILE_SIZE / 2.0,
            at.y + TILE_SIZE / 2.0,
            LEGAL_TARGET_RADIUS,
            0.0,
            TAU,
        );
        ctx.fill();
    }
}

fn glyph(piece_type: PieceType) -> &'static str {
    match piece_type {
        PieceType::Pawn => "♟",
        PieceType::Rook => "♜",
        PieceType::Knight => "♞",
        PieceType::Bishop => "♝",
        PieceType::Queen => "♛",
        PieceType::King => "♚",
    }
}

/// Draws one piece as a disc with its glyph. White pieces lean right and
/// black pieces lean left so both halves of a union stay visible.
pub fn draw_piece(ctx: &CanvasRenderingContext2d, piece: &VisualPiece) {
    if piece.opacity <= 0.0 {
        return;
    }
    let (fill, ink, shift) = match piece.color {
        Color::White => (WHITE_PIECE_FILL, BLACK_PIECE_FILL, UNION_SHIFT),
        Color::Black => (BLACK_PIECE_FILL, WHITE_PIECE_FILL, -UNION_SHIFT),
    };
    let cx = piece.position.x + TILE_SIZE / 2.0 + shift;
    let cy = piece.position.y + TILE_SIZE / 2.0;

    ctx.save();
    ctx.set_global_alpha(piece.opacity.clamp(0.0, 1.0));
    ctx.begin_path();
    let _ = ctx.arc(cx, cy, PIECE_RADIUS, 0.0, TAU);
    set_fill_style(ctx, fill);
    ctx.fill();
    ctx.set_line_width(2.0);
    set_stroke_style(ctx, ink);
    ctx.stroke();

    ctx.set_font("bold 40px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    set_fill_style(ctx, ink);
    let _ = ctx.fill_text(glyph(piece.piece_type), cx, cy + 2.0);
    ctx.restore();
}
