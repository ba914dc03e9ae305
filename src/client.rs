use std::sync::mpsc;

use crate::coord::Coord;
use crate::event::{ClientEvent, MoveRequest, ServerEvent};
use crate::force::Force;
use crate::game::DuelGame;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Unassigned,
    Player(Force),
    Spectator,
}

// Digest of a server event for the UI layer: what needs to happen on
// screen, with the raw protocol already stripped away.
#[derive(Clone, Debug)]
pub enum NotableEvent {
    RoleAssigned(Role),
    BoardUpdated,
    ErrorReported(String),
}

#[derive(Clone, Debug)]
pub enum EventError {
    CannotApplyEvent(String),
}

// Client-side game model. The position here is a disposable mirror of
// the server's: it exists only for rendering and is rebuilt from every
// broadcast; it is never consulted for move legality.
pub struct ClientState {
    role: Role,
    game: DuelGame,
    events_tx: mpsc::Sender<ClientEvent>,
}

impl ClientState {
    pub fn new(events_tx: mpsc::Sender<ClientEvent>) -> Self {
        ClientState {
            role: Role::Unassigned,
            game: DuelGame::new(),
            events_tx,
        }
    }

    pub fn role(&self) -> Role { self.role }

    pub fn piece_at(&self, coord: Coord) -> Option<(chess::Piece, Force)> {
        self.game.piece_at(coord)
    }

    // Drag is allowed only on own pieces; spectators drag nothing.
    pub fn can_drag(&self, coord: Coord) -> bool {
        let Role::Player(my_force) = self.role else {
            return false;
        };
        matches!(self.piece_at(coord), Some((_, force)) if force == my_force)
    }

    // Black sees the board rotated 180 degrees; spectators see white's
    // orientation.
    pub fn flip_board(&self) -> bool { self.role == Role::Player(Force::Black) }

    pub fn request_move(&self, from: Coord, to: Coord) {
        // Promotion choice is not surfaced: always ask for a queen and
        // let the server ignore it for non-promoting moves.
        let mv = MoveRequest {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            promotion: "q".to_owned(),
        };
        let _ = self.events_tx.send(ClientEvent::Move { mv });
    }

    pub fn process_server_event(&mut self, event: ServerEvent) -> Result<NotableEvent, EventError> {
        match event {
            ServerEvent::PlayerRole { force } => {
                self.role = Role::Player(force);
                Ok(NotableEvent::RoleAssigned(self.role))
            }
            ServerEvent::SpectatorRole => {
                self.role = Role::Spectator;
                Ok(NotableEvent::RoleAssigned(self.role))
            }
            ServerEvent::Move { mv } => {
                // Best effort: the `BoardState` broadcast that follows
                // every accepted move is authoritative.
                let _ = self.game.try_move(&mv);
                Ok(NotableEvent::BoardUpdated)
            }
            ServerEvent::BoardState { fen } => {
                self.game = DuelGame::from_fen(&fen).map_err(|err| {
                    EventError::CannotApplyEvent(format!("bad board state {:?}: {}", fen, err))
                })?;
                Ok(NotableEvent::BoardUpdated)
            }
            ServerEvent::InvalidMove { mv } => {
                Ok(NotableEvent::ErrorReported(format!("Invalid move: {} {}", mv.from, mv.to)))
            }
            ServerEvent::Error { message } => Ok(NotableEvent::ErrorReported(message)),
        }
    }
}
