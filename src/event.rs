use serde::{Deserialize, Serialize};

use crate::force::Force;


// A move as submitted by the client: algebraic squares plus the piece
// kind to promote to. Squares are kept as raw strings so that a
// malformed request is rejected by the gateway as a processing error
// rather than killing the connection during deserialization.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ServerEvent {
    PlayerRole { force: Force },
    SpectatorRole,
    // Broadcast to everybody after each accepted move, in this order.
    Move { mv: MoveRequest },
    BoardState { fen: String },
    // Private notices to the offending client.
    InvalidMove { mv: MoveRequest },
    Error { message: String },
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ClientEvent {
    Move { mv: MoveRequest },
}
