//! Participant registry: who is present in the room

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use crate::ws::protocol::{PlayerInfo, Roster};

/// State of one participant, local or remote
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantState {
    pub id: String,
    pub user_name: String,
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Movement-derived animation state
    pub moving: bool,
}

impl ParticipantState {
    pub fn new(id: impl Into<String>, user_name: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            position,
            rotation: 0.0,
            moving: false,
        }
    }
}

impl From<&PlayerInfo> for ParticipantState {
    fn from(info: &PlayerInfo) -> Self {
        let mut state = Self::new(
            info.player_id.clone(),
            info.user_name.clone(),
            Vec2::new(info.x, info.y),
        );
        state.rotation = info.rotation;
        state
    }
}

/// Single source of truth for room membership
///
/// Lookups for unknown ids return `None`; removals of unknown ids do
/// nothing. Nothing here fails for absence.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    local: Option<ParticipantState>,
    remotes: HashMap<String, ParticipantState>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a remote participant, keyed by `state.id`
    ///
    /// The local participant is input-driven, so an upsert carrying the
    /// local id is ignored.
    pub fn upsert_remote(&mut self, state: ParticipantState) {
        if self.is_local(&state.id) {
            debug!(player_id = %state.id, "Ignoring remote upsert for local participant");
            return;
        }
        self.remotes.insert(state.id.clone(), state);
    }

    /// Remove a remote participant; absent ids are a no-op
    pub fn remove(&mut self, id: &str) -> Option<ParticipantState> {
        let removed = self.remotes.remove(id);
        if removed.is_none() {
            debug!(player_id = %id, "Remove for unknown participant, ignoring");
        }
        removed
    }

    pub fn set_local(&mut self, state: ParticipantState) {
        self.remotes.remove(&state.id);
        self.local = Some(state);
    }

    pub fn local(&self) -> Option<&ParticipantState> {
        self.local.as_ref()
    }

    pub fn local_mut(&mut self) -> Option<&mut ParticipantState> {
        self.local.as_mut()
    }

    pub fn get(&self, id: &str) -> Option<&ParticipantState> {
        match &self.local {
            Some(local) if local.id == id => Some(local),
            _ => self.remotes.get(id),
        }
    }

    /// Mutable access to a remote participant only
    pub fn remote_mut(&mut self, id: &str) -> Option<&mut ParticipantState> {
        self.remotes.get_mut(id)
    }

    /// Every participant, local first; remote order is unspecified
    pub fn all(&self) -> impl Iterator<Item = &ParticipantState> {
        self.local.iter().chain(self.remotes.values())
    }

    pub fn len(&self) -> usize {
        self.remotes.len() + usize::from(self.local.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a full roster snapshot; `local_id` selects the local entry
    ///
    /// An existing local entry keeps its input-driven position.
    pub fn load_roster(&mut self, roster: &Roster, local_id: Option<&str>) {
        for info in roster.values() {
            let state = ParticipantState::from(info);
            if local_id == Some(info.player_id.as_str()) {
                if !self.is_local(&info.player_id) {
                    self.set_local(state);
                }
            } else {
                self.upsert_remote(state);
            }
        }
    }

    pub fn clear(&mut self) {
        self.local = None;
        self.remotes.clear();
    }

    fn is_local(&self, id: &str) -> bool {
        self.local.as_ref().is_some_and(|l| l.id == id)
    }
}
