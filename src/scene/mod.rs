//! Execution contexts and the transition between them
//!
//! The primary context runs the room simulation every tick. The secondary
//! context is the engagement experience opened from an interactable; while
//! it is active the primary context is suspended. Only one runs at a time.

pub mod controller;
pub mod embed;
pub mod primary;

pub use controller::SceneTransitionController;
pub use embed::StreamEmbed;
pub use primary::PrimaryContext;

use crate::app::state::SessionContext;
use crate::game::{ParticipantState, Room};
use crate::input::InputFrame;
use crate::ws::SessionHandle;

/// Which context currently owns the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextKind {
    #[default]
    Primary,
    Secondary,
}

/// Something advanced once per simulation tick
pub trait Tickable {
    fn tick(&mut self, world: &mut SessionContext, input: &InputFrame, dt: f32);
}

/// Everything handed to the secondary context when it opens
#[derive(Debug, Clone)]
pub struct EngagementContext {
    pub interactable_id: String,
    pub room: Room,
    pub players: Vec<ParticipantState>,
    pub num_players: usize,
    /// Shares the live connection; the secondary context never reconnects
    pub session: SessionHandle,
}

/// The engagement experience opened from an interactable
pub trait SecondaryContext {
    fn activate(&mut self, context: EngagementContext);

    /// Tear down everything created by `activate`
    fn deactivate(&mut self);

    fn is_active(&self) -> bool;
}
