//! Board state, input handling and animation for a Paco Ŝako board.
//!
//! Nothing in here touches the browser. The `sako-wasm` crate feeds DOM
//! events into a [`BoardSession`] and draws the scene it returns.

pub mod config;
pub mod error;
pub mod piece;
pub mod position;
pub mod protocol;
pub mod render;
pub mod session;
pub mod smart_tool;
pub mod tile;
pub mod timeline;

pub use config::Config;
pub use error::{ConfigError, ProtocolError};
pub use piece::{Color, Piece, PieceId, PieceType};
pub use position::{Action, Position};
pub use render::{VisualPiece, render, render_rotated, render_transition};
pub use session::BoardSession;
pub use smart_tool::{HighlightMode, MoveOutcome, SmartTool, ToolEvent, ToolOutput, do_move_action};
pub use tile::{BoardRotation, Point, Tile, coordinate_of_tile, tile_of_coordinate};
pub use timeline::{AnimationState, Timeline};
