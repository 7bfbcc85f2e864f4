//! Messages exchanged with the rules engine and the sync server.
//!
//! Engine messages travel as a `(message_type, json)` pair over a message
//! port, so they are decoded by matching on the discriminant string. Server
//! messages are plain externally tagged JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::piece::Color;
use crate::position::Action;

/// Starting position in the engine's notation.
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w 0 AHah - -";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalActions {
    pub legal_actions: Vec<Action>,
    pub input_action_count: usize,
    pub can_rollback: bool,
    pub controlling_player: Color,
}

/// Status string reported by the AI worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AiState {
    AiReadyForRequest,
    Other(String),
}

impl From<String> for AiState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "AiReadyForRequest" => AiState::AiReadyForRequest,
            _ => AiState::Other(s),
        }
    }
}

impl From<AiState> for String {
    fn from(state: AiState) -> Self {
        match state {
            AiState::AiReadyForRequest => "AiReadyForRequest".to_string(),
            AiState::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineMessage {
    LegalActionsDetermined(LegalActions),
    AiMoveDetermined(Vec<Action>),
    AiStateUpdated(AiState),
    /// A reply the board has no use for, such as analysis results.
    Ignored(String),
}

/// Engine replies that belong to other pages of the app.
const UNHANDLED_ENGINE_MESSAGES: [&str; 3] = [
    "randomPositionGenerated",
    "positionAnalysisCompleted",
    "replayAnalysisCompleted",
];

impl EngineMessage {
    pub fn decode(message_type: &str, data: &str) -> Result<EngineMessage, ProtocolError> {
        let message = match message_type {
            "legalActionsDetermined" => {
                EngineMessage::LegalActionsDetermined(serde_json::from_str(data)?)
            }
            "aiMoveDetermined" => EngineMessage::AiMoveDetermined(serde_json::from_str(data)?),
            "aiStateUpdated" => EngineMessage::AiStateUpdated(serde_json::from_str(data)?),
            known if UNHANDLED_ENGINE_MESSAGES.contains(&known) => {
                EngineMessage::Ignored(known.to_string())
            }
            other => return Err(ProtocolError::UnknownMessage(other.to_string())),
        };
        Ok(message)
    }
}

/// Payload of every engine request: the game replayed from its setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHistory {
    pub board_fen: String,
    pub action_history: Vec<Action>,
}

impl ActionHistory {
    pub fn from_start(action_history: Vec<Action>) -> Self {
        ActionHistory {
            board_fen: INITIAL_FEN.to_string(),
            action_history,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineRequest {
    DetermineLegalActions(ActionHistory),
    DetermineAiMove(ActionHistory),
}

impl EngineRequest {
    pub fn message_type(&self) -> &'static str {
        match self {
            EngineRequest::DetermineLegalActions(_) => "determineLegalActions",
            EngineRequest::DetermineAiMove(_) => "determineAiMove",
        }
    }

    /// The `(message_type, json)` pair to post to the engine.
    pub fn encode(&self) -> Result<(&'static str, String), ProtocolError> {
        let payload = match self {
            EngineRequest::DetermineLegalActions(h) | EngineRequest::DetermineAiMove(h) => h,
        };
        Ok((self.message_type(), serde_json::to_string(payload)?))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Subscribe { game_key: String },
    NextStep { index: usize, step: Value },
}

/// A game as stored by the server: every step since the start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncronizedBoard {
    pub key: String,
    pub steps: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    TechnicalError { error_message: String },
    FullState { board: SyncronizedBoard },
    NextStep { index: usize, step: Value },
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<ServerMessage, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;
    use crate::tile::Tile;
    use serde_json::json;

    #[test]
    fn decodes_legal_actions() {
        let data = r#"{
            "legal_actions": [{"Place": 28}, {"Promote": "Rock"}],
            "input_action_count": 1,
            "can_rollback": true,
            "controlling_player": "White"
        }"#;
        let EngineMessage::LegalActionsDetermined(legal) =
            EngineMessage::decode("legalActionsDetermined", data).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(
            legal.legal_actions,
            vec![
                Action::Place(Tile::from_name("e4").unwrap()),
                Action::Promote(PieceType::Rook)
            ]
        );
        assert_eq!(legal.input_action_count, 1);
        assert!(legal.can_rollback);
        assert_eq!(legal.controlling_player, Color::White);
    }

    #[test]
    fn decodes_ai_messages() {
        let msg =
            EngineMessage::decode("aiMoveDetermined", r#"[{"Lift":12},{"Place":28}]"#).unwrap();
        assert_eq!(
            msg,
            EngineMessage::AiMoveDetermined(vec![
                Action::Lift(Tile::from_index(12).unwrap()),
                Action::Place(Tile::from_index(28).unwrap()),
            ])
        );
        let msg = EngineMessage::decode("aiStateUpdated", r#""AiReadyForRequest""#).unwrap();
        assert_eq!(msg, EngineMessage::AiStateUpdated(AiState::AiReadyForRequest));
        let msg = EngineMessage::decode("aiStateUpdated", r#""Thinking""#).unwrap();
        assert_eq!(msg, EngineMessage::AiStateUpdated(AiState::Other("Thinking".to_string())));
    }

    #[test]
    fn unknown_discriminants_are_rejected() {
        let err = EngineMessage::decode("somethingElse", "null").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessage(t) if t == "somethingElse"));
        let err = EngineMessage::decode("aiMoveDetermined", "{").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn analysis_replies_are_ignored_quietly() {
        let msg = EngineMessage::decode("positionAnalysisCompleted", "{\"whatever\":1}").unwrap();
        assert_eq!(
            msg,
            EngineMessage::Ignored("positionAnalysisCompleted".to_string())
        );
        let msg = EngineMessage::decode("randomPositionGenerated", "not even json").unwrap();
        assert!(matches!(msg, EngineMessage::Ignored(_)));
    }

    #[test]
    fn malformed_payloads_are_json_errors() {
        let err = EngineMessage::decode("legalActionsDetermined", "[]").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn engine_requests_carry_the_history() {
        let request = EngineRequest::DetermineAiMove(ActionHistory::from_start(vec![Action::Lift(
            Tile::from_name("e2").unwrap(),
        )]));
        let (message_type, data) = request.encode().unwrap();
        assert_eq!(message_type, "determineAiMove");
        let value: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value, json!({"board_fen": INITIAL_FEN, "action_history": [{"Lift": 12}]}));
    }

    #[test]
    fn server_messages_are_externally_tagged() {
        let msg =
            ServerMessage::decode(r#"{"FullState":{"board":{"key":"abc","steps":[1,2]}}}"#)
                .unwrap();
        assert_eq!(
            msg,
            ServerMessage::FullState {
                board: SyncronizedBoard {
                    key: "abc".to_string(),
                    steps: vec![json!(1), json!(2)],
                }
            }
        );
        let msg = ServerMessage::decode(r#"{"TechnicalError":{"error_message":"nope"}}"#).unwrap();
        assert_eq!(msg, ServerMessage::TechnicalError { error_message: "nope".to_string() });

        let out = ClientMessage::Subscribe { game_key: "abc".to_string() }.encode().unwrap();
        assert_eq!(out, r#"{"Subscribe":{"game_key":"abc"}}"#);
    }
}
