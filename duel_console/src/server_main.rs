use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use async_tungstenite::WebSocketStream;
use futures_io::{AsyncRead, AsyncWrite};
use futures_util::StreamExt;
use log::{error, info, warn};
use tungstenite::protocol;

use duel_chess::server::{ClientId, Clients, IncomingEvent, ServerState};

use crate::network::{self, CommunicationError};
use crate::server_config::ServerConfig;


// Removes the client from the registry and queues the Disconnect event.
// The registry guard must be dropped before sending: the event loop
// takes the same lock inside `apply_event`, so blocking on a full
// channel while holding it would wedge the whole server.
fn unregister_client(
    clients: &Mutex<Clients>,
    tx: &mpsc::SyncSender<IncomingEvent>,
    client_id: ClientId,
) -> Option<String> {
    let logging_id = clients.lock().unwrap().remove_client(client_id);
    if logging_id.is_some() {
        tx.send(IncomingEvent::Disconnect(client_id)).unwrap();
    }
    logging_id
}

async fn handle_connection<S: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static>(
    peer_addr: String,
    stream: WebSocketStream<S>,
    tx: mpsc::SyncSender<IncomingEvent>,
    clients: Arc<Mutex<Clients>>,
) -> tide::Result<()> {
    let (mut stream_tx, mut stream_rx) = stream.split();
    info!("Client connected: {}", peer_addr);

    let (client_tx, client_rx) = mpsc::channel();
    let client_id = clients.lock().unwrap().add_client(client_tx, peer_addr.to_string());
    tx.send(IncomingEvent::Connect(client_id)).unwrap();

    let clients_remover1 = Arc::clone(&clients);
    let clients_remover2 = Arc::clone(&clients);
    let tx_reader = tx.clone();
    let tx_writer = tx;

    // Client -> Server
    async_std::task::spawn(async move {
        loop {
            match network::read_obj_async(&mut stream_rx).await {
                Ok(ev) => {
                    tx_reader.send(IncomingEvent::Network(client_id, ev)).unwrap();
                }
                Err(err) => {
                    if let Some(logging_id) =
                        unregister_client(&clients_remover1, &tx_reader, client_id)
                    {
                        match err {
                            CommunicationError::ConnectionClosed => {
                                info!("Client {} disconnected", logging_id)
                            }
                            err => warn!(
                                "Client {} disconnected due to read error: {:?}",
                                logging_id, err
                            ),
                        }
                    }
                    break;
                }
            }
        }
    });

    // Server -> Client. Still an OS thread because client_rx is a
    // synchronous receiver: blocking recv() inside an async task would
    // starve the executor.
    let (done_tx, done_rx) = async_std::channel::bounded(1);
    thread::spawn(move || {
        loop {
            let Ok(ev) = client_rx.recv() else { break };
            match async_std::task::block_on(network::write_obj_async(&mut stream_tx, &ev)) {
                Ok(()) => {}
                Err(err) => {
                    if let Some(logging_id) =
                        unregister_client(&clients_remover2, &tx_writer, client_id)
                    {
                        warn!("Client {} disconnected due to write error: {:?}", logging_id, err);
                    }
                    break;
                }
            }
        }
        let _ = async_std::task::block_on(done_tx.send(()));
    });
    // Await the writer through a channel rather than join() for the same
    // reason of not blocking the async executor thread.
    done_rx.recv().await.unwrap();
    Ok(())
}

pub fn run(config: ServerConfig) {
    let (tx, rx) = mpsc::sync_channel(1000);
    let clients = Arc::new(Mutex::new(Clients::new()));
    let clients_copy = Arc::clone(&clients);

    thread::spawn(move || {
        let mut server_state = ServerState::new(clients_copy);
        for event in rx {
            server_state.apply_event(event);
        }
        panic!("Unexpected end of events stream");
    });

    let mut app = tide::new();

    app.with(tide::utils::After(|mut res: tide::Response| async {
        if let Some(err) = res.error() {
            let msg = format!("Error: {:#?}", err);
            res.set_status(err.status());
            res.set_body(msg);
        }
        Ok(res)
    }));

    app.at("/")
        .serve_file(format!("{}/index.html", config.static_dir))
        .expect("Cannot serve the game page");
    app.at("/static")
        .serve_dir(format!("{}/", config.static_dir))
        .expect("Cannot serve static assets");

    app.at("/ws").get(move |req: tide::Request<()>| {
        let mytx = tx.clone();
        let myclients = clients.clone();
        async move {
            let peer_addr = req.peer_addr().map_or_else(
                || {
                    Err(tide::Error::new(
                        403,
                        anyhow::Error::msg("Peer address missing"),
                    ))
                },
                |x| Ok(x.to_owned()),
            )?;
            // tide::Request -> http_types::Request -> http::Request<Body> -> http::Request<()>.
            let http_types_req: http_types::Request = req.into();
            let http_req_with_body: http::Request<http_types::Body> = http_types_req.into();
            let http_req = http_req_with_body.map(|_| ());

            let http_resp = tungstenite::handshake::server::create_response(&http_req)
                .map_err(|e| tide::Error::new(400, e))?;

            // And the reverse chain.
            let http_resp_with_body = http_resp.map(|_| http_types::Body::empty());
            let mut http_types_resp: http_types::Response = http_resp_with_body.into();

            let upgrade_receiver = http_types_resp.recv_upgrade().await;

            async_std::task::spawn(async move {
                if let Some(stream) = upgrade_receiver.await {
                    let stream =
                        WebSocketStream::from_raw_socket(stream, protocol::Role::Server, None)
                            .await;
                    if let Err(err) = handle_connection(peer_addr, stream, mytx, myclients).await {
                        error!("{}", err);
                    }
                } else {
                    warn!("Never received an upgrade for client {}", peer_addr);
                }
            });
            Ok(http_types_resp)
        }
    });
    async_std::task::block_on(async { app.listen(format!("0.0.0.0:{}", config.listen_port)).await })
        .expect("Failed to start the app");
}
