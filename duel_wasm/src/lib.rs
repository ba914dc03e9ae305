#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod web_document;
pub mod web_error_handling;

use std::sync::mpsc;

use itertools::Itertools;
use wasm_bindgen::prelude::*;

use duel_chess::client::{ClientState, NotableEvent};
use duel_chess::coord::{Coord, NUM_COLS, NUM_ROWS};
use duel_chess::event::ClientEvent;
use duel_chess::force::Force;

use crate::web_document::web_document;
use crate::web_error_handling::JsResult;


fn piece_glyph(piece: chess::Piece, force: Force) -> char {
    use chess::Piece::*;
    match (force, piece) {
        (Force::White, Pawn) => '♙',
        (Force::White, Knight) => '♘',
        (Force::White, Bishop) => '♗',
        (Force::White, Rook) => '♖',
        (Force::White, Queen) => '♕',
        (Force::White, King) => '♔',
        (Force::Black, Pawn) => '♟',
        (Force::Black, Knight) => '♞',
        (Force::Black, Bishop) => '♝',
        (Force::Black, Rook) => '♜',
        (Force::Black, Queen) => '♛',
        (Force::Black, King) => '♚',
    }
}

#[wasm_bindgen]
pub struct WebClient {
    state: ClientState,
    server_rx: mpsc::Receiver<ClientEvent>,
    drag_source: Option<Coord>,
}

#[wasm_bindgen]
impl WebClient {
    pub fn new_client() -> WebClient {
        let (events_tx, server_rx) = mpsc::channel();
        WebClient {
            state: ClientState::new(events_tx),
            server_rx,
            drag_source: None,
        }
    }

    pub fn process_server_event(&mut self, event: &str) -> JsResult<()> {
        let server_event = serde_json::from_str(event)
            .map_err(|err| rust_error!("Cannot parse server event: {}", err))?;
        let notable = self
            .state
            .process_server_event(server_event)
            .map_err(|err| rust_error!("{:?}", err))?;
        match notable {
            NotableEvent::RoleAssigned(_) | NotableEvent::BoardUpdated => self.update_board(),
            NotableEvent::ErrorReported(message) => {
                web_sys::window().unwrap().alert_with_message(&message)?;
                Ok(())
            }
        }
    }

    pub fn next_outgoing_event(&mut self) -> Option<String> {
        match self.server_rx.try_recv() {
            Ok(event) => Some(serde_json::to_string(&event).unwrap()),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => panic!("Event channel disconnected"),
        }
    }

    // Returns whether the piece may be picked up. The square stays
    // remembered until drop_piece/abort_drag.
    pub fn start_drag(&mut self, row: u8, col: u8) -> bool {
        let Some(coord) = Coord::from_grid(row, col) else {
            return false;
        };
        if self.state.can_drag(coord) {
            self.drag_source = Some(coord);
            true
        } else {
            false
        }
    }

    pub fn abort_drag(&mut self) { self.drag_source = None; }

    pub fn drop_piece(&mut self, row: u8, col: u8) {
        let source = self.drag_source.take();
        let (Some(from), Some(to)) = (source, Coord::from_grid(row, col)) else {
            return;
        };
        // The server has the authoritative position; no local legality
        // check, the board updates on its broadcast.
        self.state.request_move(from, to);
    }

    // Full re-render. The board is small enough that rebuilding all 64
    // squares on every update is not worth optimizing.
    pub fn update_board(&self) -> JsResult<()> {
        let document = web_document();
        let board = document.get_existing_element_by_id("chessboard")?;
        board.set_inner_html("");
        for (row, col) in (0..NUM_ROWS).cartesian_product(0..NUM_COLS) {
            let coord = Coord::from_grid(row, col).unwrap();
            let square = document.create_element("div")?;
            let shade = if (row + col) % 2 == 0 { "light" } else { "dark" };
            square.set_attribute("class", &format!("square {}", shade))?;
            square.set_attribute("data-row", &row.to_string())?;
            square.set_attribute("data-col", &col.to_string())?;
            if let Some((piece, force)) = self.state.piece_at(coord) {
                let piece_node = document.create_element("div")?;
                let color = match force {
                    Force::White => "white",
                    Force::Black => "black",
                };
                piece_node.set_attribute("class", &format!("piece {}", color))?;
                piece_node.set_text_content(Some(&piece_glyph(piece, force).to_string()));
                let draggable = if self.state.can_drag(coord) { "true" } else { "false" };
                piece_node.set_attribute("draggable", draggable)?;
                square.append_child(&piece_node)?;
            }
            board.append_child(&square)?;
        }
        // Black plays with the board rotated; the stylesheet rotates the
        // pieces back upright.
        if self.state.flip_board() {
            board.class_list().add_1("flipped")?;
        } else {
            board.class_list().remove_1("flipped")?;
        }
        Ok(())
    }
}
