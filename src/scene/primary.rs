//! Primary context: local movement and proximity evaluation

use glam::Vec2;
use tracing::warn;

use crate::app::state::SessionContext;
use crate::game::{ActivationChange, Bounds, MovementSync, ProximityDetector};
use crate::input::InputFrame;
use crate::ws::protocol::ClientMsg;

use super::Tickable;

/// Room simulation for the local participant
pub struct PrimaryContext {
    pub movement: MovementSync,
    pub proximity: ProximityDetector,
    avatar_size: Vec2,
    /// Changes from the most recent proximity pass
    last_changes: Vec<ActivationChange>,
}

impl PrimaryContext {
    pub fn new(movement: MovementSync, proximity: ProximityDetector, avatar_size: Vec2) -> Self {
        Self {
            movement,
            proximity,
            avatar_size,
            last_changes: Vec::new(),
        }
    }

    /// Bounds of the local participant, if one is registered
    pub fn local_bounds(&self, world: &SessionContext) -> Option<Bounds> {
        world
            .registry
            .local()
            .map(|local| Bounds::from_center(local.position, self.avatar_size))
    }

    /// Activation changes from this tick's proximity pass
    pub fn last_changes(&self) -> &[ActivationChange] {
        &self.last_changes
    }
}

impl Tickable for PrimaryContext {
    fn tick(&mut self, world: &mut SessionContext, input: &InputFrame, dt: f32) {
        self.last_changes.clear();

        let Some(room_key) = world.room.as_ref().map(|r| r.key().to_string()) else {
            return;
        };
        let Some(local) = world.registry.local_mut() else {
            return;
        };

        if let Some(sample) = self
            .movement
            .step_local(&input.directions, dt, local, &room_key)
        {
            if let Err(e) = world.session.emit(ClientMsg::PlayerMovement(sample)) {
                warn!(error = %e, "Failed to send movement");
            }
        }

        // Movement first so proximity sees this tick's position
        if let Some(bounds) = self.local_bounds(world) {
            self.last_changes = self.proximity.evaluate(&bounds);
        }
    }
}
