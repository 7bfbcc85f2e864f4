//! One board as the page sees it: the committed game state, what is on
//! screen right now and the gesture in progress.

use crate::config::Config;
use crate::error::ProtocolError;
use crate::piece::PieceType;
use crate::position::{Action, Position};
use crate::protocol::{
    ActionHistory, AiState, ClientMessage, EngineMessage, EngineRequest, LegalActions,
    ServerMessage,
};
use crate::render::{VisualPiece, paint_order, render_rotated, render_transition};
use crate::smart_tool::{SmartTool, ToolEvent, ToolOutput};
use crate::timeline::{AnimationState, Millis, Timeline};

pub struct BoardSession {
    config: Config,
    committed: Position,
    displayed: Position,
    tool: SmartTool,
    timeline: Timeline<Position>,
    /// Number of steps the sync server knows about.
    step_index: usize,
    /// Moves played since the initial setup. `None` once the board has been
    /// edited or replaced, as the engine could no longer replay it.
    history: Option<Vec<Action>>,
    legal_actions: Option<LegalActions>,
    ai_state: Option<AiState>,
    /// An AI move arrives one action at a time. It is held here until
    /// nothing is left in hand.
    ai_pending: Option<(Position, Vec<Action>)>,
}

impl BoardSession {
    pub fn new(config: Config) -> Self {
        let start = Position::initial();
        BoardSession {
            config,
            committed: start.clone(),
            displayed: start.clone(),
            tool: SmartTool::new(),
            timeline: Timeline::new(start),
            step_index: 0,
            history: Some(Vec::new()),
            legal_actions: None,
            ai_state: None,
            ai_pending: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn committed(&self) -> &Position {
        &self.committed
    }

    pub fn displayed(&self) -> &Position {
        &self.displayed
    }

    pub fn tool(&self) -> &SmartTool {
        &self.tool
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn legal_actions(&self) -> Option<&LegalActions> {
        self.legal_actions.as_ref()
    }

    pub fn ai_state(&self) -> Option<&AiState> {
        self.ai_state.as_ref()
    }

    /// Whether the host should keep requesting animation frames.
    pub fn is_running(&self) -> bool {
        self.timeline.is_running()
    }

    pub fn tick(&mut self, now: Millis) {
        self.timeline.tick(now);
    }

    pub fn subscribe_message(&self) -> Option<ClientMessage> {
        self.config.game_key.as_ref().map(|game_key| ClientMessage::Subscribe {
            game_key: game_key.clone(),
        })
    }

    /// Feeds one input event through the smart tool. A committed move
    /// yields the message announcing it to the sync server.
    pub fn handle_tool_event(&mut self, event: ToolEvent) -> Option<ClientMessage> {
        // A drop on another tile leaves the pieces where the pointer already
        // put them. A click is animated even if the press picked pieces up.
        let dropped = match event {
            ToolEvent::MouseUp { tile, .. } => {
                !self.tool.dragging_pieces.is_empty() && tile != self.tool.drag_start_tile
            }
            _ => false,
        };
        let (tool, output) = self.tool.update(event, &self.committed);
        let played = tool.completed_move.clone();
        self.tool = tool;
        match output {
            ToolOutput::NoOp => None,
            ToolOutput::Preview(preview) => {
                self.timeline.interrupt(preview.clone());
                self.displayed = preview;
                None
            }
            ToolOutput::Rollback => {
                self.displayed = self.committed.clone();
                self.timeline.interrupt(self.committed.clone());
                None
            }
            ToolOutput::Commit(position) => {
                self.commit(position, played, !dropped)
            }
        }
    }

    fn commit(
        &mut self,
        position: Position,
        played: Option<Vec<Action>>,
        animate: bool,
    ) -> Option<ClientMessage> {
        self.ai_pending = None;
        self.history = match (self.history.take(), played) {
            (Some(mut history), Some(actions)) => {
                history.extend(actions);
                Some(history)
            }
            _ => None,
        };
        self.legal_actions = None;
        self.show(position.clone(), animate);
        self.committed = position;

        let step = match serde_json::to_value(&self.committed) {
            Ok(step) => step,
            Err(e) => {
                log::warn!("cannot serialize position: {e}");
                return None;
            }
        };
        let index = self.step_index;
        self.step_index += 1;
        Some(ClientMessage::NextStep { index, step })
    }

    fn show(&mut self, position: Position, animate: bool) {
        if animate {
            self.timeline.queue(self.config.animation_ms, position.clone());
        } else {
            self.timeline.interrupt(position.clone());
        }
        self.displayed = position;
    }

    /// Replaces local state with what the sync server says.
    pub fn handle_server_message(&mut self, message: ServerMessage) -> Result<(), ProtocolError> {
        match message {
            ServerMessage::TechnicalError { error_message } => {
                Err(ProtocolError::Server(error_message))
            }
            ServerMessage::FullState { board } => {
                let position = match board.steps.last() {
                    Some(step) => serde_json::from_value(step.clone())?,
                    None => Position::initial(),
                };
                log::debug!("joined game {} at step {}", board.key, board.steps.len());
                self.step_index = board.steps.len();
                self.history = if board.steps.is_empty() { Some(Vec::new()) } else { None };
                self.replace(position, false);
                Ok(())
            }
            ServerMessage::NextStep { index, step } => {
                if index < self.step_index {
                    log::debug!("ignoring stale step {index}, already at {}", self.step_index);
                    return Ok(());
                }
                let position: Position = serde_json::from_value(step)?;
                self.step_index = index + 1;
                self.history = None;
                self.replace(position, true);
                Ok(())
            }
        }
    }

    fn replace(&mut self, position: Position, animate: bool) {
        self.ai_pending = None;
        let (tool, _) = self.tool.update(ToolEvent::Reset, &position);
        self.tool = tool;
        self.legal_actions = None;
        self.show(position.clone(), animate);
        self.committed = position;
    }

    /// Applies a reply from the rules engine. An AI move is played on the
    /// board like any other move.
    pub fn handle_engine_message(&mut self, message: EngineMessage) -> Option<ClientMessage> {
        match message {
            EngineMessage::LegalActionsDetermined(legal) => {
                self.legal_actions = Some(legal);
                None
            }
            EngineMessage::AiStateUpdated(state) => {
                self.ai_state = Some(state);
                None
            }
            EngineMessage::AiMoveDetermined(actions) => self.play_ai_actions(actions),
            EngineMessage::Ignored(message_type) => {
                log::debug!("engine message {message_type} ignored");
                None
            }
        }
    }

    fn play_ai_actions(&mut self, actions: Vec<Action>) -> Option<ClientMessage> {
        if actions.is_empty() {
            log::debug!("empty AI move ignored");
            return None;
        }
        let (mut position, mut played) = self
            .ai_pending
            .take()
            .unwrap_or_else(|| (self.committed.clone(), Vec::new()));
        for action in actions {
            match position.do_action(action) {
                Some(next) => position = next,
                None => {
                    log::warn!("engine action {action:?} does not fit the board, AI move dropped");
                    return None;
                }
            }
            played.push(action);
        }
        if position.is_lifted() {
            self.ai_pending = Some((position, played));
            return None;
        }
        let (tool, _) = self.tool.update(ToolEvent::Reset, &position);
        self.tool = tool;
        self.commit(position, Some(played), true)
    }

    /// Promotes the pawn standing on its far rank, if there is one.
    pub fn promote(&mut self, piece_type: PieceType) -> Option<ClientMessage> {
        let action = Action::Promote(piece_type);
        let Some(position) = self.committed.do_action(action) else {
            log::debug!("nothing to promote to {piece_type:?}");
            return None;
        };
        self.commit(position, Some(vec![action]), true)
    }

    fn history(&self) -> Option<ActionHistory> {
        self.history.as_ref().map(|h| ActionHistory::from_start(h.clone()))
    }

    /// `None` when the board no longer follows from the initial setup.
    pub fn legal_actions_request(&self) -> Option<EngineRequest> {
        self.history().map(EngineRequest::DetermineLegalActions)
    }

    pub fn ai_move_request(&self) -> Option<EngineRequest> {
        self.history().map(EngineRequest::DetermineAiMove)
    }

    /// Pieces to draw for the current frame, back to front.
    pub fn scene(&self) -> Vec<VisualPiece> {
        let rotation = self.config.rotation;
        let mut scene = match self.timeline.animate() {
            AnimationState::Resting(position) => render_rotated(&self.tool, position, rotation),
            AnimationState::Transition(tr) => {
                let old = render_rotated(&SmartTool::new(), tr.old, rotation);
                let new = render_rotated(&self.tool, tr.new, rotation);
                render_transition(tr.t, &old, &new)
            }
        };
        paint_order(&mut scene);
        scene
    }
}

impl Default for BoardSession {
    fn default() -> Self {
        BoardSession::new(Config::default())
    }
}
