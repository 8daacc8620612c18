//! Room simulation modules

pub mod geometry;
pub mod movement;
pub mod proximity;
pub mod registry;

pub use geometry::Bounds;
pub use movement::MovementSync;
pub use proximity::{Activation, ActivationChange, ProximityDetector};
pub use registry::{ParticipantState, PlayerRegistry};

/// Room the session was admitted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    key: String,
    pub num_players: usize,
}

impl Room {
    pub fn new(key: impl Into<String>, num_players: usize) -> Self {
        Self {
            key: key.into(),
            num_players,
        }
    }

    /// Room key; fixed for the lifetime of the session
    pub fn key(&self) -> &str {
        &self.key
    }
}
