//! Session context shared by the primary and secondary contexts

use tracing::{debug, info, warn};

use crate::game::{MovementSync, ParticipantState, PlayerRegistry, Room};
use crate::ws::protocol::{Roster, ServerMsg};
use crate::ws::{ConnectionSession, SessionError};

/// Something the presentation layer should show
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Server generated a room key for us
    RoomCreated(String),
    /// Submitted key was rejected; re-prompt
    KeyRejected(SessionError),
    /// Admitted to a room
    JoinedRoom(String),
    ParticipantJoined(String),
    ParticipantLeft(String),
}

/// Explicit session state: the room, who is in it, and the connection
pub struct SessionContext {
    pub session: ConnectionSession,
    pub room: Option<Room>,
    pub registry: PlayerRegistry,
}

impl SessionContext {
    pub fn new(session: ConnectionSession) -> Self {
        Self {
            session,
            room: None,
            registry: PlayerRegistry::new(),
        }
    }

    /// Apply one inbound message
    ///
    /// Roster and movement traffic is only honoured while in a room.
    /// Messages about unknown participants are absorbed.
    pub fn apply(&mut self, msg: ServerMsg) -> Result<Option<SessionEvent>, SessionError> {
        match msg {
            ServerMsg::Welcome(welcome) => {
                self.session.set_local_id(welcome.player_id);
                Ok(None)
            }
            ServerMsg::RoomCreated(key) => {
                info!(room_key = %key, "Room created");
                Ok(Some(SessionEvent::RoomCreated(key)))
            }
            ServerMsg::KeyNotValid => Ok(Some(SessionEvent::KeyRejected(
                self.session.on_key_rejected(),
            ))),
            ServerMsg::KeyIsValid(input) => {
                self.session.on_key_valid(input)?;
                Ok(None)
            }
            ServerMsg::SetState(state) => {
                if let Some(room) = &self.room {
                    if room.key() != state.room_key {
                        warn!(
                            current = %room.key(),
                            received = %state.room_key,
                            "Room state for a different room, ignoring"
                        );
                        return Ok(None);
                    }
                }

                let joined = self.room.is_none();
                match &mut self.room {
                    Some(room) => room.num_players = state.num_players,
                    None => self.room = Some(Room::new(state.room_key.clone(), state.num_players)),
                }
                self.session.enter_room();
                self.load_roster(&state.players);

                if joined {
                    info!(
                        room_key = %state.room_key,
                        num_players = state.num_players,
                        "Joined room"
                    );
                    Ok(Some(SessionEvent::JoinedRoom(state.room_key)))
                } else {
                    Ok(None)
                }
            }
            ServerMsg::CurrentPlayers(snapshot) => {
                if !self.in_room("currentPlayers") {
                    return Ok(None);
                }
                self.set_num_players(snapshot.num_players);
                self.load_roster(&snapshot.players);
                Ok(None)
            }
            ServerMsg::NewPlayer(joined) => {
                if !self.in_room("newPlayer") {
                    return Ok(None);
                }
                self.set_num_players(joined.num_players);
                let id = joined.player_info.player_id.clone();
                self.registry
                    .upsert_remote(ParticipantState::from(&joined.player_info));
                Ok(Some(SessionEvent::ParticipantJoined(id)))
            }
            ServerMsg::PlayerMoved(moved) => {
                if self.in_room("playerMoved") {
                    MovementSync::apply_remote(&mut self.registry, &moved);
                }
                Ok(None)
            }
            ServerMsg::OtherPlayerStopped(stopped) => {
                if self.in_room("otherPlayerStopped") {
                    MovementSync::apply_stopped(&mut self.registry, &stopped.player_id);
                }
                Ok(None)
            }
            ServerMsg::Disconnected(left) => {
                if !self.in_room("disconnected") {
                    return Ok(None);
                }
                self.set_num_players(left.num_players);
                match self.registry.remove(&left.player_id) {
                    Some(_) => Ok(Some(SessionEvent::ParticipantLeft(left.player_id))),
                    None => Ok(None),
                }
            }
        }
    }

    /// Drop all room state after the connection ends
    pub fn reset(&mut self) {
        if !self.registry.is_empty() {
            debug!(participants = self.registry.len(), "Clearing room state");
        }
        self.room = None;
        self.registry.clear();
    }

    fn load_roster(&mut self, roster: &Roster) {
        self.registry.load_roster(roster, self.session.local_id());
        if self.registry.local().is_none() {
            warn!(
                local_id = ?self.session.local_id(),
                participants = self.registry.len(),
                "Roster has no local participant, movement disabled"
            );
        }
    }

    fn in_room(&self, message: &str) -> bool {
        let in_room = self.session.is_in_room();
        if !in_room {
            debug!(message = %message, state = %self.session.state(), "Dropping room message outside a room");
        }
        in_room
    }

    fn set_num_players(&mut self, num_players: usize) {
        if let Some(room) = &mut self.room {
            room.num_players = num_players;
        }
    }
}
