/// Board drawing constants. Sizes are in board pixels (one tile = 100).
pub const LIGHT_TILE: &str = "#f0d9b5";
pub const DARK_TILE: &str = "#b58863";
pub const HIGHLIGHT_FILL: &str = "rgba(255, 215, 0, 0.55)";
/// Marks a tile that is selected without any piece on it.
pub const LINGERING_FILL: &str = "rgba(255, 215, 0, 0.25)";
pub const HOVER_STROKE: &str = "rgba(30, 30, 30, 0.6)";
pub const LEGAL_TARGET_FILL: &str = "rgba(20, 85, 30, 0.5)";

pub const WHITE_PIECE_FILL: &str = "#fafafa";
pub const BLACK_PIECE_FILL: &str = "#222";
pub const PIECE_RADIUS: f64 = 34.0;
pub const LEGAL_TARGET_RADIUS: f64 = 12.0;
/// Pieces of a union are drawn side by side, shifted by this much.
pub const UNION_SHIFT: f64 = 12.0;
