//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Roster keyed by participant id, as sent by the server
pub type Roster = HashMap<String, PlayerInfo>;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Local participant moved this tick
    PlayerMovement(MovementSample),

    /// Ask the server whether a room key exists
    IsKeyValid(String),

    /// Enter a room previously confirmed valid
    JoinRoom(String),
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Connection accepted, carries the id the server assigned to us
    Welcome(Welcome),

    /// Joined a room: key, roster and head count
    SetState(RoomState),

    /// Full roster snapshot
    CurrentPlayers(RosterSnapshot),

    /// Another participant joined the room
    NewPlayer(NewPlayer),

    /// A remote participant moved
    PlayerMoved(PlayerMoved),

    /// A remote participant stopped moving
    OtherPlayerStopped(PlayerRef),

    /// A participant left the room
    Disconnected(PlayerLeft),

    /// Server generated a fresh room key for us
    RoomCreated(String),

    /// Submitted room key does not exist
    KeyNotValid,

    /// Submitted room key exists; echoes the input back
    KeyIsValid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSample {
    pub x: f32,
    pub y: f32,
    pub room_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub player_id: String,
}

/// Participant info as broadcast by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub player_id: String,
    #[serde(default)]
    pub user_name: String,
    pub x: f32,
    pub y: f32,
    /// Rotation in radians
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub room_key: String,
    #[serde(default)]
    pub players: Roster,
    pub num_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    pub players: Roster,
    pub num_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub player_info: PlayerInfo,
    pub num_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoved {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeft {
    pub player_id: String,
    pub num_players: usize,
}
