//! Connection session: transport ownership and the room-join handshake

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::transport::{self, TransportEvent, TransportLink};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport
    Disconnected,
    /// Transport being established
    Connecting,
    /// Connected, not yet admitted to a room
    AwaitingRoom,
    /// Admitted to a room; roster and movement traffic flows
    InRoom,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingRoom => "awaiting room",
            Self::InRoom => "in room",
        };
        f.write_str(name)
    }
}

/// Cloneable sending half of a live session
///
/// Handed to the secondary context so it shares the connection instead of
/// opening its own.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<ClientMsg>,
}

impl SessionHandle {
    /// False once the connection behind it has gone away
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}

/// Owns the transport and drives the join handshake
pub struct ConnectionSession {
    state: SessionState,
    link: Option<TransportLink>,
    /// Id the server assigned to this connection
    local_id: Option<String>,
    /// Key submitted for validation, awaiting an answer
    pending_key: Option<String>,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            link: None,
            local_id: None,
            pending_key: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_in_room(&self) -> bool {
        self.state == SessionState::InRoom
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn set_local_id(&mut self, id: String) {
        debug!(player_id = %id, "Server assigned local id");
        self.local_id = Some(id);
    }

    /// Establish the transport
    pub async fn connect(&mut self, url: &str) -> Result<(), SessionError> {
        self.state = SessionState::Connecting;
        info!(url = %url, "Connecting to server");

        match transport::connect(url).await {
            Ok(link) => {
                self.attach(link);
                Ok(())
            }
            Err(e) => Err(self.fail(e.to_string())),
        }
    }

    /// Adopt an already-open link and wait for a room
    pub fn attach(&mut self, link: TransportLink) {
        self.link = Some(link);
        self.state = SessionState::AwaitingRoom;
    }

    /// Submit a room key for validation, exactly as entered
    pub fn join_room(&mut self, candidate_key: &str) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingRoom {
            return Err(SessionError::NotAwaitingRoom(self.state));
        }

        let key = candidate_key.to_string();
        self.emit(ClientMsg::IsKeyValid(key.clone()))?;
        info!(room_key = %key, "Submitted room key");
        self.pending_key = Some(key);
        Ok(())
    }

    /// Server accepted the key: ask to enter the room
    pub fn on_key_valid(&mut self, input: String) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingRoom {
            warn!(state = %self.state, "Key acknowledgment outside lobby, ignoring");
            return Ok(());
        }

        self.emit(ClientMsg::JoinRoom(input))?;
        self.pending_key = None;
        Ok(())
    }

    /// Server rejected the key; stays in the lobby
    pub fn on_key_rejected(&mut self) -> SessionError {
        let key = self.pending_key.take().unwrap_or_default();
        warn!(room_key = %key, "Invalid room key");
        SessionError::InvalidRoomKey(key)
    }

    /// Server admitted us to a room
    pub fn enter_room(&mut self) {
        if self.state != SessionState::InRoom {
            info!("Entered room");
        }
        self.state = SessionState::InRoom;
        self.pending_key = None;
    }

    /// Drain every message queued by the transport since the last call
    ///
    /// A closed transport forces `Disconnected` and discards whatever was
    /// still queued.
    pub fn drain(&mut self) -> Result<Vec<ServerMsg>, SessionError> {
        let Some(link) = self.link.as_mut() else {
            return Ok(Vec::new());
        };

        let mut messages = Vec::new();
        loop {
            match link.inbound.try_recv() {
                Ok(TransportEvent::Message(msg)) => messages.push(msg),
                Ok(TransportEvent::Closed(reason)) => return Err(self.fail(reason)),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(messages),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(self.fail("transport tasks stopped".to_string()))
                }
            }
        }
    }

    /// Fire-and-forget send
    pub fn emit(&self, msg: ClientMsg) -> Result<(), SessionError> {
        match &self.link {
            Some(link) => link
                .outbound
                .send(msg)
                .map_err(|_| SessionError::ConnectionLost("outbound queue closed".to_string())),
            None => Err(SessionError::NotConnected),
        }
    }

    /// Sending handle sharing this session's connection
    pub fn handle(&self) -> Option<SessionHandle> {
        self.link.as_ref().map(|link| SessionHandle {
            outbound: link.outbound.clone(),
        })
    }

    /// Close the transport and forget all room state
    pub fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
            info!("Disconnected from server");
        }
        self.state = SessionState::Disconnected;
        self.pending_key = None;
        self.local_id = None;
    }

    fn fail(&mut self, reason: String) -> SessionError {
        warn!(reason = %reason, "Connection lost");
        self.disconnect();
        SessionError::ConnectionLost(reason)
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Session errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid room key: {0:?}")]
    InvalidRoomKey(String),

    #[error("Cannot join a room while {0}")]
    NotAwaitingRoom(SessionState),

    #[error("Not connected")]
    NotConnected,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Server side of an in-memory link
    pub(crate) struct FakeServer {
        pub sent: mpsc::UnboundedReceiver<ClientMsg>,
        pub events: mpsc::UnboundedSender<TransportEvent>,
    }

    impl FakeServer {
        pub(crate) fn push(&self, msg: ServerMsg) {
            self.events.send(TransportEvent::Message(msg)).unwrap();
        }

        pub(crate) fn received(&mut self) -> Vec<ClientMsg> {
            let mut out = Vec::new();
            while let Ok(msg) = self.sent.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    pub(crate) fn in_memory_link() -> (TransportLink, FakeServer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        (
            TransportLink::from_channels(outbound_tx, inbound_rx),
            FakeServer {
                sent: outbound_rx,
                events: inbound_tx,
            },
        )
    }

    fn attached_session() -> (ConnectionSession, FakeServer) {
        let (link, server) = in_memory_link();
        let mut session = ConnectionSession::new();
        session.attach(link);
        (session, server)
    }

    #[test]
    fn test_session_starts_disconnected() {
        let session = ConnectionSession::new();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.handle().is_none());
        assert_eq!(
            session.emit(ClientMsg::JoinRoom("K".to_string())),
            Err(SessionError::NotConnected)
        );
    }

    #[test]
    fn test_join_handshake() {
        let (mut session, mut server) = attached_session();
        assert_eq!(session.state(), SessionState::AwaitingRoom);

        session.join_room("ROOM1").unwrap();
        assert_eq!(
            server.received(),
            vec![ClientMsg::IsKeyValid("ROOM1".to_string())]
        );

        session.on_key_valid("ROOM1".to_string()).unwrap();
        assert_eq!(server.received(), vec![ClientMsg::JoinRoom("ROOM1".to_string())]);
        assert_eq!(session.state(), SessionState::AwaitingRoom);

        session.enter_room();
        assert!(session.is_in_room());
    }

    #[test]
    fn test_key_is_sent_verbatim() {
        let (mut session, mut server) = attached_session();
        session.join_room(" AB 12 ").unwrap();
        assert_eq!(
            server.received(),
            vec![ClientMsg::IsKeyValid(" AB 12 ".to_string())]
        );

        let err = session.on_key_rejected();
        assert_eq!(err, SessionError::InvalidRoomKey(" AB 12 ".to_string()));
    }

    #[test]
    fn test_rejected_key_stays_in_lobby() {
        let (mut session, _server) = attached_session();
        session.join_room("NOPE").unwrap();

        let err = session.on_key_rejected();
        assert_eq!(err, SessionError::InvalidRoomKey("NOPE".to_string()));
        assert_eq!(session.state(), SessionState::AwaitingRoom);

        // Re-prompt works
        assert!(session.join_room("ROOM2").is_ok());
    }

    #[test]
    fn test_join_requires_lobby() {
        let mut session = ConnectionSession::new();
        assert_eq!(
            session.join_room("ROOM1"),
            Err(SessionError::NotAwaitingRoom(SessionState::Disconnected))
        );

        let (mut session, _server) = attached_session();
        session.enter_room();
        assert_eq!(
            session.join_room("ROOM1"),
            Err(SessionError::NotAwaitingRoom(SessionState::InRoom))
        );
    }

    #[test]
    fn test_drain_preserves_arrival_order() {
        let (mut session, server) = attached_session();
        server.push(ServerMsg::RoomCreated("A".to_string()));
        server.push(ServerMsg::KeyNotValid);

        let drained = session.drain().unwrap();
        assert_eq!(
            drained,
            vec![ServerMsg::RoomCreated("A".to_string()), ServerMsg::KeyNotValid]
        );
        assert!(session.drain().unwrap().is_empty());
    }

    #[test]
    fn test_transport_close_forces_disconnected() {
        let (mut session, server) = attached_session();
        session.set_local_id("p1".to_string());
        session.enter_room();
        server.push(ServerMsg::KeyNotValid);
        server
            .events
            .send(TransportEvent::Closed("reset by peer".to_string()))
            .unwrap();

        let err = session.drain().unwrap_err();
        assert_eq!(err, SessionError::ConnectionLost("reset by peer".to_string()));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.local_id().is_none());
        assert!(session.drain().unwrap().is_empty());
    }

    #[test]
    fn test_dropped_transport_is_connection_loss() {
        let (mut session, server) = attached_session();
        drop(server);

        assert!(matches!(
            session.drain(),
            Err(SessionError::ConnectionLost(_))
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_handle_shares_connection() {
        let (session, server) = attached_session();
        let handle = session.handle().unwrap();
        assert!(handle.is_open());

        drop(server);
        assert!(!handle.is_open());
        assert!(!session.handle().unwrap().is_open());
    }

    #[test]
    fn test_connect_failure_reports_connection_lost() {
        let mut session = ConnectionSession::new();
        let result = tokio_test::block_on(session.connect("ws://127.0.0.1:1"));
        assert!(matches!(result, Err(SessionError::ConnectionLost(_))));
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
