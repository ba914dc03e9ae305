use std::fmt;
use std::str::FromStr;

use crate::coord::Coord;
use crate::event::MoveRequest;
use crate::force::Force;


// Everything below `try_move` is delegated to the `chess` crate: move
// legality, check detection and FEN encoding are not reimplemented here.
pub struct DuelGame {
    game: chess::Game,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MoveError {
    // The request could not even be handed to the rules engine.
    MalformedSquare(String),
    MalformedPromotion(String),
    // The rules engine rejected the move for the current position.
    IllegalMove,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::MalformedSquare(s) => write!(f, "malformed square: {}", s),
            MoveError::MalformedPromotion(s) => write!(f, "malformed promotion: {}", s),
            MoveError::IllegalMove => write!(f, "illegal move"),
        }
    }
}

fn parse_square(s: &str) -> Result<chess::Square, MoveError> {
    chess::Square::from_str(s).map_err(|_| MoveError::MalformedSquare(s.to_owned()))
}

fn parse_promotion(s: &str) -> Result<chess::Piece, MoveError> {
    match s {
        "q" => Ok(chess::Piece::Queen),
        "r" => Ok(chess::Piece::Rook),
        "b" => Ok(chess::Piece::Bishop),
        "n" => Ok(chess::Piece::Knight),
        _ => Err(MoveError::MalformedPromotion(s.to_owned())),
    }
}

// The client always asks for a queen, whether or not the move promotes.
// A promotion piece is attached to the candidate move only when a pawn
// actually reaches the back rank, so the over-eager default is harmless.
fn requires_promotion(board: &chess::Board, from: chess::Square, to: chess::Square) -> bool {
    if board.piece_on(from) != Some(chess::Piece::Pawn) {
        return false;
    }
    match board.color_on(from) {
        Some(chess::Color::White) => to.get_rank() == chess::Rank::Eighth,
        Some(chess::Color::Black) => to.get_rank() == chess::Rank::First,
        None => false,
    }
}

impl DuelGame {
    pub fn new() -> Self {
        DuelGame { game: chess::Game::new() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, chess::Error> {
        let board = chess::Board::from_str(fen)?;
        Ok(DuelGame { game: chess::Game::new_with_board(board) })
    }

    pub fn turn(&self) -> Force { self.game.side_to_move().into() }

    pub fn fen(&self) -> String { self.game.current_position().to_string() }

    pub fn piece_at(&self, coord: Coord) -> Option<(chess::Piece, Force)> {
        let board = self.game.current_position();
        let sq = coord.to_square();
        let piece = board.piece_on(sq)?;
        let force = board.color_on(sq)?.into();
        Some((piece, force))
    }

    pub fn try_move(&mut self, mv: &MoveRequest) -> Result<(), MoveError> {
        let from = parse_square(&mv.from)?;
        let to = parse_square(&mv.to)?;
        let board = self.game.current_position();
        let promotion = if requires_promotion(&board, from, to) {
            Some(parse_promotion(&mv.promotion)?)
        } else {
            None
        };
        let chess_move = chess::ChessMove::new(from, to, promotion);
        if self.game.make_move(chess_move) {
            Ok(())
        } else {
            Err(MoveError::IllegalMove)
        }
    }
}
