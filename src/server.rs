use std::collections::{hash_map, HashMap};
use std::sync::{mpsc, Arc, Mutex};

use log::{info, warn};

use crate::event::{ClientEvent, MoveRequest, ServerEvent};
use crate::force::Force;
use crate::game::{DuelGame, MoveError};


#[derive(Debug)]
pub enum IncomingEvent {
    Connect(ClientId),
    Network(ClientId, ClientEvent),
    Disconnect(ClientId),
}


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClientId(usize);

pub struct Client {
    events_tx: mpsc::Sender<ServerEvent>,
    logging_id: String,
}

impl Client {
    fn send(&self, event: ServerEvent) {
        // Fire-and-forget: if the connection is gone, its network pump
        // will remove the client soon enough.
        let _ = self.events_tx.send(event);
    }
}

pub struct Clients {
    map: HashMap<ClientId, Client>,
}

impl Clients {
    pub fn new() -> Self { Self { map: HashMap::new() } }

    pub fn add_client(&mut self, events_tx: mpsc::Sender<ServerEvent>, logging_id: String) -> ClientId {
        let client = Client { events_tx, logging_id };
        loop {
            let id = ClientId(rand::random());
            match self.map.entry(id) {
                hash_map::Entry::Occupied(_) => {}
                hash_map::Entry::Vacant(e) => {
                    e.insert(client);
                    return id;
                }
            }
        }
    }

    pub fn remove_client(&mut self, id: ClientId) -> Option<String> {
        self.map.remove(&id).map(|client| client.logging_id)
    }

    fn get(&self, id: ClientId) -> Option<&Client> { self.map.get(&id) }

    fn broadcast(&self, event: &ServerEvent) {
        for client in self.map.values() {
            client.send(event.clone());
        }
    }
}

// The role registry: at most one connection per color, everybody else
// spectates. A vacated seat goes to the next connecting client, even
// mid-game.
#[derive(Default, Debug)]
struct Seats {
    white: Option<ClientId>,
    black: Option<ClientId>,
}

impl Seats {
    fn assign(&mut self, id: ClientId) -> Option<Force> {
        debug_assert!(self.force_of(id).is_none());
        if self.white.is_none() {
            self.white = Some(id);
            Some(Force::White)
        } else if self.black.is_none() {
            self.black = Some(id);
            Some(Force::Black)
        } else {
            None
        }
    }

    fn vacate(&mut self, id: ClientId) -> Option<Force> {
        if self.white == Some(id) {
            self.white = None;
            Some(Force::White)
        } else if self.black == Some(id) {
            self.black = None;
            Some(Force::Black)
        } else {
            None
        }
    }

    fn force_of(&self, id: ClientId) -> Option<Force> {
        if self.white == Some(id) {
            Some(Force::White)
        } else if self.black == Some(id) {
            Some(Force::Black)
        } else {
            None
        }
    }
}


// Owns the authoritative position and the role registry. All mutation
// happens inside `apply_event`, which the caller drives from a single
// event loop, so there is no concurrent mutation path by construction.
pub struct ServerState {
    clients: Arc<Mutex<Clients>>,
    seats: Seats,
    game: DuelGame,
}

impl ServerState {
    pub fn new(clients: Arc<Mutex<Clients>>) -> Self {
        ServerState {
            clients,
            seats: Seats::default(),
            game: DuelGame::new(),
        }
    }

    pub fn apply_event(&mut self, event: IncomingEvent) {
        // Keep a local `Arc` so that locking does not hold a borrow of
        // `self` for the rest of the function.
        let clients = Arc::clone(&self.clients);
        let clients = clients.lock().unwrap();
        match event {
            IncomingEvent::Connect(id) => {
                let role = self.seats.assign(id);
                if let Some(client) = clients.get(id) {
                    match role {
                        Some(force) => {
                            info!("Client {} plays {}", client.logging_id, force);
                            client.send(ServerEvent::PlayerRole { force });
                        }
                        None => {
                            info!("Client {} spectates", client.logging_id);
                            client.send(ServerEvent::SpectatorRole);
                        }
                    }
                }
            }
            IncomingEvent::Disconnect(id) => {
                if let Some(force) = self.seats.vacate(id) {
                    info!("Seat {} is vacant again", force);
                }
            }
            IncomingEvent::Network(id, ClientEvent::Move { mv }) => {
                self.on_move(&clients, id, mv);
            }
        }
    }

    fn on_move(&mut self, clients: &Clients, id: ClientId, mv: MoveRequest) {
        let Some(client) = clients.get(id) else {
            return;
        };
        if self.seats.force_of(id) != Some(self.game.turn()) {
            client.send(ServerEvent::Error { message: "Not your turn!".to_owned() });
            return;
        }
        match self.game.try_move(&mv) {
            Ok(()) => {
                clients.broadcast(&ServerEvent::Move { mv });
                clients.broadcast(&ServerEvent::BoardState { fen: self.game.fen() });
            }
            Err(MoveError::IllegalMove) => {
                info!("Invalid move from {}: {} {}", client.logging_id, mv.from, mv.to);
                client.send(ServerEvent::InvalidMove { mv });
            }
            Err(err) => {
                warn!("Error processing move from {}: {}", client.logging_id, err);
                client.send(ServerEvent::Error {
                    message: "An error occurred while processing the move.".to_owned(),
                });
            }
        }
    }

    pub fn position_fen(&self) -> String { self.game.fen() }

    #[allow(non_snake_case)]
    pub fn TEST_set_position(&mut self, fen: &str) {
        self.game = DuelGame::from_fen(fen).unwrap();
    }
}
