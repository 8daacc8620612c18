//! Scene transition controller: engage and exit between contexts

use tracing::{debug, info};

use crate::app::state::SessionContext;
use crate::game::{Activation, Bounds, ProximityDetector};

use super::{ContextKind, EngagementContext, SecondaryContext};

/// Switches the tick between the primary context and a secondary context
pub struct SceneTransitionController<E: SecondaryContext> {
    active: ContextKind,
    /// Interactable that opened the secondary context
    engaged: Option<String>,
    secondary: E,
}

impl<E: SecondaryContext> SceneTransitionController<E> {
    pub fn new(secondary: E) -> Self {
        Self {
            active: ContextKind::Primary,
            engaged: None,
            secondary,
        }
    }

    /// Primary simulation is suspended while the secondary context runs
    pub fn is_suspended(&self) -> bool {
        self.active == ContextKind::Secondary
    }

    /// Select action
    ///
    /// `target` names an interactable; `None` picks the first highlighted
    /// one. Nothing changes unless the target is currently highlighted.
    pub fn engage(
        &mut self,
        target: Option<&str>,
        proximity: &mut ProximityDetector,
        world: &SessionContext,
    ) -> Result<(), TransitionError> {
        if self.is_suspended() {
            return Err(TransitionError::AlreadyEngaged(
                self.engaged.clone().unwrap_or_default(),
            ));
        }

        let id = match target {
            Some(id) => id.to_string(),
            None => proximity
                .first_highlighted()
                .map(|i| i.id.clone())
                .ok_or(TransitionError::NothingHighlighted)?,
        };

        let current = proximity
            .get(&id)
            .map(|i| i.activation())
            .ok_or_else(|| TransitionError::UnknownInteractable(id.clone()))?;
        if current != Activation::Highlighted {
            return Err(TransitionError::NotHighlighted {
                id,
                activation: current,
            });
        }

        let room = world.room.clone().ok_or(TransitionError::NotInRoom)?;
        let session = world.session.handle().ok_or(TransitionError::NotInRoom)?;

        proximity.engage(&id);
        self.active = ContextKind::Secondary;
        self.engaged = Some(id.clone());

        info!(interactable = %id, room_key = %room.key(), "Engaged, primary simulation suspended");
        self.secondary.activate(EngagementContext {
            interactable_id: id,
            num_players: room.num_players,
            room,
            players: world.registry.all().cloned().collect(),
            session,
        });
        Ok(())
    }

    /// Cancel key: close the secondary context and resume the primary one
    ///
    /// Returns false when no secondary context was open.
    pub fn exit(&mut self, proximity: &mut ProximityDetector, local: Option<&Bounds>) -> bool {
        if !self.is_suspended() {
            debug!("Exit outside the secondary context, ignoring");
            return false;
        }

        if self.secondary.is_active() {
            self.secondary.deactivate();
        }
        self.active = ContextKind::Primary;

        if let Some(id) = self.engaged.take() {
            let reverted = proximity.release(&id, local);
            info!(
                interactable = %id,
                activation = %reverted.unwrap_or_default(),
                "Exited, primary simulation resumed"
            );
        }
        true
    }
}

/// Transition errors; none of them change any state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Nothing is highlighted")]
    NothingHighlighted,

    #[error("Unknown interactable: {0}")]
    UnknownInteractable(String),

    #[error("Interactable {id} is {activation}, not highlighted")]
    NotHighlighted { id: String, activation: Activation },

    #[error("Already engaged with {0}")]
    AlreadyEngaged(String),

    #[error("Not in a room")]
    NotInRoom,
}
