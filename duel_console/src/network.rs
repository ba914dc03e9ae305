use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{de, Serialize};
use tungstenite::Message;


pub const PORT: u16 = 3000;


#[derive(Debug)]
pub enum CommunicationError {
    ConnectionClosed,
    Socket(tungstenite::Error),
    Serde(serde_json::Error),
    Protocol(String),
}

pub async fn write_obj_async<T, S>(stream: &mut S, obj: &T) -> Result<(), CommunicationError>
where
    T: Serialize,
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let serialized = serde_json::to_string(obj).map_err(CommunicationError::Serde)?;
    stream.send(Message::text(serialized)).await.map_err(|err| match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            CommunicationError::ConnectionClosed
        }
        err => CommunicationError::Socket(err),
    })
}

pub async fn read_obj_async<T, S>(stream: &mut S) -> Result<T, CommunicationError>
where
    T: de::DeserializeOwned,
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            None => return Err(CommunicationError::ConnectionClosed),
            Some(Err(tungstenite::Error::ConnectionClosed)) => {
                return Err(CommunicationError::ConnectionClosed)
            }
            Some(Err(err)) => return Err(CommunicationError::Socket(err)),
            Some(Ok(Message::Close(_))) => return Err(CommunicationError::ConnectionClosed),
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).map_err(CommunicationError::Serde)
            }
            // Control frames are handled by tungstenite itself.
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(msg)) => {
                return Err(CommunicationError::Protocol(format!("Expected text, got {:?}", msg)))
            }
        }
    }
}
