// Offline server/client tests: the real `ServerState` and `ClientState`
// wired together through channels, with the network layer cut out.

use std::sync::{mpsc, Arc, Mutex};

use duel_chess::client::{ClientState, Role};
use duel_chess::coord::Coord;
use duel_chess::event::{ClientEvent, MoveRequest, ServerEvent};
use duel_chess::force::Force;
use duel_chess::game::DuelGame;
use duel_chess::server::{ClientId, Clients, IncomingEvent, ServerState};
use pretty_assertions::assert_eq;


fn mv(from: &str, to: &str) -> MoveRequest {
    MoveRequest {
        from: from.to_owned(),
        to: to.to_owned(),
        promotion: "q".to_owned(),
    }
}

struct Server {
    clients: Arc<Mutex<Clients>>,
    state: ServerState,
}

impl Server {
    fn new() -> Self {
        let clients = Arc::new(Mutex::new(Clients::new()));
        let state = ServerState::new(Arc::clone(&clients));
        Server { clients, state }
    }

    fn add_client(&mut self, events_tx: mpsc::Sender<ServerEvent>) -> ClientId {
        let id = self.clients.lock().unwrap().add_client(events_tx, "client".to_owned());
        self.state.apply_event(IncomingEvent::Connect(id));
        id
    }

    fn disconnect(&mut self, id: ClientId) {
        self.clients.lock().unwrap().remove_client(id);
        self.state.apply_event(IncomingEvent::Disconnect(id));
    }

    fn send_network_event(&mut self, id: ClientId, event: ClientEvent) {
        self.state.apply_event(IncomingEvent::Network(id, event));
    }
}

struct Client {
    id: Option<ClientId>,
    incoming_rx: Option<mpsc::Receiver<ServerEvent>>,
    outgoing_rx: mpsc::Receiver<ClientEvent>,
    state: ClientState,
}

impl Client {
    fn new() -> Self {
        let (events_tx, outgoing_rx) = mpsc::channel();
        Client {
            id: None,
            incoming_rx: None,
            outgoing_rx,
            state: ClientState::new(events_tx),
        }
    }

    fn connect(server: &mut Server) -> Self {
        let mut client = Client::new();
        let (incoming_tx, incoming_rx) = mpsc::channel();
        client.id = Some(server.add_client(incoming_tx));
        client.incoming_rx = Some(incoming_rx);
        client
    }

    fn id(&self) -> ClientId { self.id.unwrap() }
    fn role(&self) -> Role { self.state.role() }

    fn make_move(&mut self, from: &str, to: &str) {
        self.state.request_move(
            Coord::from_algebraic(from).unwrap(),
            Coord::from_algebraic(to).unwrap(),
        );
    }

    fn process_outgoing_events(&mut self, server: &mut Server) {
        while let Ok(event) = self.outgoing_rx.try_recv() {
            server.send_network_event(self.id(), event);
        }
    }

    // Applies everything the server pushed to the local mirror and
    // returns the raw events for protocol-level assertions.
    fn process_incoming_events(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.incoming_rx.as_ref().unwrap().try_recv() {
            self.state.process_server_event(event.clone()).unwrap();
            events.push(event);
        }
        events
    }
}

fn piece_at(state: &ClientState, square: &str) -> Option<(chess::Piece, Force)> {
    state.piece_at(Coord::from_algebraic(square).unwrap())
}


#[test]
fn first_two_connections_play_the_rest_spectate() {
    let mut server = Server::new();
    let mut cl1 = Client::connect(&mut server);
    let mut cl2 = Client::connect(&mut server);
    let mut cl3 = Client::connect(&mut server);
    let mut cl4 = Client::connect(&mut server);

    assert_eq!(
        cl1.process_incoming_events(),
        vec![ServerEvent::PlayerRole { force: Force::White }]
    );
    assert_eq!(
        cl2.process_incoming_events(),
        vec![ServerEvent::PlayerRole { force: Force::Black }]
    );
    assert_eq!(cl3.process_incoming_events(), vec![ServerEvent::SpectatorRole]);
    assert_eq!(cl4.process_incoming_events(), vec![ServerEvent::SpectatorRole]);

    assert_eq!(cl1.role(), Role::Player(Force::White));
    assert_eq!(cl2.role(), Role::Player(Force::Black));
    assert_eq!(cl3.role(), Role::Spectator);

    // Orientation: only the black player sees a rotated board.
    assert!(!cl1.state.flip_board());
    assert!(cl2.state.flip_board());
    assert!(!cl3.state.flip_board());
}

#[test]
fn vacated_seat_goes_to_the_next_connection() {
    let mut server = Server::new();
    let cl_white = Client::connect(&mut server);
    let _cl_black = Client::connect(&mut server);

    server.disconnect(cl_white.id());
    let mut cl_new = Client::connect(&mut server);
    assert_eq!(
        cl_new.process_incoming_events(),
        vec![ServerEvent::PlayerRole { force: Force::White }]
    );

    // Existing connections are not reassigned retroactively.
    let mut cl_late = Client::connect(&mut server);
    assert_eq!(cl_late.process_incoming_events(), vec![ServerEvent::SpectatorRole]);
}

#[test]
fn out_of_turn_move_is_rejected_privately() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    let mut cl_black = Client::connect(&mut server);
    let mut cl_spec = Client::connect(&mut server);
    cl_white.process_incoming_events();
    cl_black.process_incoming_events();
    cl_spec.process_incoming_events();

    let fen_before = server.state.position_fen();
    cl_black.make_move("e7", "e5");
    cl_black.process_outgoing_events(&mut server);

    assert_eq!(
        cl_black.process_incoming_events(),
        vec![ServerEvent::Error { message: "Not your turn!".to_owned() }]
    );
    assert_eq!(cl_white.process_incoming_events(), vec![]);
    assert_eq!(cl_spec.process_incoming_events(), vec![]);
    assert_eq!(server.state.position_fen(), fen_before);
}

#[test]
fn spectators_cannot_move_at_all() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    let _cl_black = Client::connect(&mut server);
    let mut cl_spec = Client::connect(&mut server);
    cl_spec.process_incoming_events();

    // The spectator UI never even starts a drag.
    assert!(!cl_spec.state.can_drag(Coord::from_algebraic("e2").unwrap()));

    // A hand-crafted request is rejected like any out-of-turn move.
    server.send_network_event(cl_spec.id(), ClientEvent::Move { mv: mv("e2", "e4") });
    assert_eq!(
        cl_spec.process_incoming_events(),
        vec![ServerEvent::Error { message: "Not your turn!".to_owned() }]
    );
    assert_eq!(cl_white.process_incoming_events().len(), 1); // the role notice only
}

#[test]
fn illegal_move_is_echoed_back_to_the_sender_only() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    let mut cl_black = Client::connect(&mut server);
    cl_white.process_incoming_events();
    cl_black.process_incoming_events();

    let fen_before = server.state.position_fen();
    cl_white.make_move("e2", "e5");
    cl_white.process_outgoing_events(&mut server);

    assert_eq!(
        cl_white.process_incoming_events(),
        vec![ServerEvent::InvalidMove { mv: mv("e2", "e5") }]
    );
    assert_eq!(cl_black.process_incoming_events(), vec![]);
    assert_eq!(server.state.position_fen(), fen_before);
}

#[test]
fn accepted_move_is_broadcast_to_players_and_spectators() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    let mut cl_black = Client::connect(&mut server);
    let mut cl_spec = Client::connect(&mut server);
    cl_white.process_incoming_events();
    cl_black.process_incoming_events();
    cl_spec.process_incoming_events();

    cl_white.make_move("e2", "e4");
    cl_white.process_outgoing_events(&mut server);

    for client in [&mut cl_white, &mut cl_black, &mut cl_spec] {
        let events = client.process_incoming_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ServerEvent::Move { mv: mv("e2", "e4") });
        let ServerEvent::BoardState { fen } = &events[1] else {
            panic!("Expected BoardState, got {:?}", events[1]);
        };
        let position = DuelGame::from_fen(fen).unwrap();
        assert_eq!(position.turn(), Force::Black);

        // The local mirror converged to the broadcast position.
        assert_eq!(piece_at(&client.state, "e4"), Some((chess::Piece::Pawn, Force::White)));
        assert_eq!(piece_at(&client.state, "e2"), None);
    }
}

#[test]
fn black_cannot_open_the_game() {
    // Black tries e7e5 before white has moved at all.
    let mut server = Server::new();
    let _cl_white = Client::connect(&mut server);
    let mut cl_black = Client::connect(&mut server);
    cl_black.process_incoming_events();

    cl_black.make_move("e7", "e5");
    cl_black.process_outgoing_events(&mut server);
    assert_eq!(
        cl_black.process_incoming_events(),
        vec![ServerEvent::Error { message: "Not your turn!".to_owned() }]
    );
    assert_eq!(server.state.position_fen(), DuelGame::new().fen());
}

#[test]
fn malformed_request_reports_a_processing_error() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    cl_white.process_incoming_events();

    let fen_before = server.state.position_fen();
    server.send_network_event(
        cl_white.id(),
        ClientEvent::Move {
            mv: MoveRequest {
                from: "zz".to_owned(),
                to: "e4".to_owned(),
                promotion: "q".to_owned(),
            },
        },
    );
    assert_eq!(
        cl_white.process_incoming_events(),
        vec![ServerEvent::Error {
            message: "An error occurred while processing the move.".to_owned()
        }]
    );
    assert_eq!(server.state.position_fen(), fen_before);
}

#[test]
fn mid_game_disconnect_hands_the_seat_over() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    let mut cl_black = Client::connect(&mut server);
    cl_white.process_incoming_events();
    cl_black.process_incoming_events();

    cl_white.make_move("e2", "e4");
    cl_white.process_outgoing_events(&mut server);
    cl_white.process_incoming_events();

    // Black drops out mid-game; the next connection inherits the seat
    // and the game simply continues.
    server.disconnect(cl_black.id());
    let mut cl_new = Client::connect(&mut server);
    assert_eq!(
        cl_new.process_incoming_events(),
        vec![ServerEvent::PlayerRole { force: Force::Black }]
    );

    cl_new.make_move("e7", "e5");
    cl_new.process_outgoing_events(&mut server);
    let events = cl_new.process_incoming_events();
    assert_eq!(events[0], ServerEvent::Move { mv: mv("e7", "e5") });
    assert_eq!(server.state.position_fen().split(' ').nth(1), Some("w"));
}

#[test]
fn client_promotion_request_defaults_to_queen() {
    let mut server = Server::new();
    let mut cl_white = Client::connect(&mut server);
    cl_white.process_incoming_events();
    server.state.TEST_set_position("k7/4P3/8/8/8/8/8/K7 w - - 0 1");

    cl_white.make_move("e7", "e8");
    cl_white.process_outgoing_events(&mut server);

    let events = cl_white.process_incoming_events();
    assert_eq!(events[0], ServerEvent::Move { mv: mv("e7", "e8") });
    let ServerEvent::BoardState { fen } = &events[1] else {
        panic!("Expected BoardState, got {:?}", events[1]);
    };
    let position = DuelGame::from_fen(fen).unwrap();
    assert_eq!(
        position.piece_at(Coord::from_algebraic("e8").unwrap()),
        Some((chess::Piece::Queen, Force::White))
    );
}
