//! Proximity detection between the local participant and interactables

use std::fmt;

use glam::Vec2;
use tracing::debug;

use super::geometry::Bounds;

/// Default interactable: the vending machine in the main room
pub const VENDING_MACHINE_ID: &str = "vending_machine";
pub const VENDING_MACHINE_CENTER: Vec2 = Vec2::new(90.0, 160.0);
pub const VENDING_MACHINE_SIZE: Vec2 = Vec2::new(48.0, 96.0);

/// Per-interactable proximity/engagement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Inactive,
    /// Local participant overlaps it; the select action is available
    Highlighted,
    /// Selected; the secondary context is running
    Engaged,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "inactive",
            Self::Highlighted => "highlighted",
            Self::Engaged => "engaged",
        };
        f.write_str(name)
    }
}

/// A fixed object that can be engaged while the local participant is near
#[derive(Debug, Clone, PartialEq)]
pub struct Interactable {
    pub id: String,
    pub bounds: Bounds,
    activation: Activation,
}

impl Interactable {
    pub fn new(id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            bounds,
            activation: Activation::Inactive,
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

/// An activation change produced by one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationChange {
    pub id: String,
    pub from: Activation,
    pub to: Activation,
}

/// Re-evaluates every interactable against the local bounds each tick
///
/// There is no "stopped overlapping" event, so every tick polls every
/// interactable.
#[derive(Debug, Default)]
pub struct ProximityDetector {
    interactables: Vec<Interactable>,
}

impl ProximityDetector {
    pub fn new(interactables: Vec<Interactable>) -> Self {
        Self { interactables }
    }

    /// Main room layout
    pub fn main_room() -> Self {
        Self::new(vec![Interactable::new(
            VENDING_MACHINE_ID,
            Bounds::from_center(VENDING_MACHINE_CENTER, VENDING_MACHINE_SIZE),
        )])
    }

    pub fn evaluate(&mut self, local: &Bounds) -> Vec<ActivationChange> {
        let mut changes = Vec::new();

        for item in &mut self.interactables {
            let touching = item.bounds.intersects(local);
            let next = match (touching, item.activation) {
                (true, Activation::Inactive) => Activation::Highlighted,
                (false, Activation::Highlighted | Activation::Engaged) => Activation::Inactive,
                (_, current) => current,
            };

            if next != item.activation {
                debug!(interactable = %item.id, from = %item.activation, to = %next, "Activation changed");
                changes.push(ActivationChange {
                    id: item.id.clone(),
                    from: item.activation,
                    to: next,
                });
                item.activation = next;
            }
        }

        changes
    }

    pub fn get(&self, id: &str) -> Option<&Interactable> {
        self.interactables.iter().find(|i| i.id == id)
    }

    /// First highlighted interactable in layout order
    pub fn first_highlighted(&self) -> Option<&Interactable> {
        self.interactables
            .iter()
            .find(|i| i.activation == Activation::Highlighted)
    }

    pub fn engaged(&self) -> Option<&Interactable> {
        self.interactables
            .iter()
            .find(|i| i.activation == Activation::Engaged)
    }

    /// HIGHLIGHTED -> ENGAGED; anything else is refused
    ///
    /// Refused when another interactable is already engaged.
    pub(crate) fn engage(&mut self, id: &str) -> Option<Activation> {
        if self.engaged().is_some() {
            return self.get(id).map(Interactable::activation);
        }
        let item = self.interactables.iter_mut().find(|i| i.id == id)?;
        if item.activation == Activation::Highlighted {
            item.activation = Activation::Engaged;
        }
        Some(item.activation)
    }

    /// ENGAGED -> HIGHLIGHTED or INACTIVE depending on current overlap
    ///
    /// Without local bounds nothing can overlap, so it goes INACTIVE.
    pub(crate) fn release(&mut self, id: &str, local: Option<&Bounds>) -> Option<Activation> {
        let item = self.interactables.iter_mut().find(|i| i.id == id)?;
        if item.activation == Activation::Engaged {
            item.activation = if local.is_some_and(|b| item.bounds.intersects(b)) {
                Activation::Highlighted
            } else {
                Activation::Inactive
            };
        }
        Some(item.activation)
    }
}
