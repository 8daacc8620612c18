//! Movement sync: local integration and remote position updates

use glam::Vec2;
use tracing::debug;

use crate::game::registry::{ParticipantState, PlayerRegistry};
use crate::input::DirectionalInput;
use crate::ws::protocol::{MovementSample, PlayerMoved};

/// Default movement speed in units per second
pub const DEFAULT_SPEED: f32 = 225.0;

/// Last-known local pose, used only to detect change between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalInputState {
    pub position: Vec2,
    pub rotation: f32,
}

/// Drives the local participant from input and applies remote movement
#[derive(Debug)]
pub struct MovementSync {
    speed: f32,
    previous: Option<LocalInputState>,
}

impl MovementSync {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            previous: None,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Forget the recorded pose (new room or new local entry)
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Velocity for the given keys
    ///
    /// Opposing keys cancel; the result always has magnitude `speed` or zero,
    /// so diagonals are no faster than a single axis.
    pub fn velocity(input: &DirectionalInput, speed: f32) -> Vec2 {
        let x = f32::from(u8::from(input.right)) - f32::from(u8::from(input.left));
        // Screen space: y grows downward
        let y = f32::from(u8::from(input.down)) - f32::from(u8::from(input.up));
        Vec2::new(x, y).normalize_or_zero() * speed
    }

    /// Advance the local participant by one tick
    ///
    /// Returns a movement sample only when the pose changed since the
    /// previous tick.
    pub fn step_local(
        &mut self,
        input: &DirectionalInput,
        dt: f32,
        local: &mut ParticipantState,
        room_key: &str,
    ) -> Option<MovementSample> {
        let velocity = Self::velocity(input, self.speed);
        let start = LocalInputState {
            position: local.position,
            rotation: local.rotation,
        };

        local.position += velocity * dt;
        let moving = velocity != Vec2::ZERO;
        if moving != local.moving {
            debug!(player_id = %local.id, moving, "Local animation state changed");
            local.moving = moving;
        }

        let previous = self.previous.unwrap_or(start);
        let changed =
            local.position != previous.position || local.rotation != previous.rotation;
        let sample = changed.then(|| MovementSample {
            x: local.position.x,
            y: local.position.y,
            room_key: room_key.to_string(),
        });

        self.previous = Some(LocalInputState {
            position: local.position,
            rotation: local.rotation,
        });

        sample
    }

    /// Overwrite a remote participant's position (last write wins)
    ///
    /// Returns false when the sender is unknown; the message is dropped.
    pub fn apply_remote(registry: &mut PlayerRegistry, moved: &PlayerMoved) -> bool {
        match registry.remote_mut(&moved.player_id) {
            Some(player) => {
                player.position = Vec2::new(moved.x, moved.y);
                player.moving = true;
                true
            }
            None => {
                debug!(player_id = %moved.player_id, "Movement for unknown participant, ignoring");
                false
            }
        }
    }

    /// Clear a remote participant's movement animation state
    pub fn apply_stopped(registry: &mut PlayerRegistry, player_id: &str) -> bool {
        match registry.remote_mut(player_id) {
            Some(player) => {
                player.moving = false;
                true
            }
            None => {
                debug!(player_id = %player_id, "Stop for unknown participant, ignoring");
                false
            }
        }
    }
}

impl Default for MovementSync {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}
