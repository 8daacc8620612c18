//! Stream embed: the secondary context shown at the vending machine
//!
//! The real video/chat widget is an external collaborator; this side only
//! owns its lifecycle and the opaque context it is opened with.

use tracing::info;

use super::{EngagementContext, SecondaryContext};

/// Default stream channel shown by the embed
pub const DEFAULT_CHANNEL: &str = "hotbeatstv";

pub struct StreamEmbed {
    channel: String,
    context: Option<EngagementContext>,
}

impl StreamEmbed {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            context: None,
        }
    }

    /// Context the embed was opened with, while open
    pub fn context(&self) -> Option<&EngagementContext> {
        self.context.as_ref()
    }
}

impl SecondaryContext for StreamEmbed {
    fn activate(&mut self, context: EngagementContext) {
        info!(
            channel = %self.channel,
            room_key = %context.room.key(),
            num_players = context.num_players,
            participants = context.players.len(),
            interactable = %context.interactable_id,
            connected = context.session.is_open(),
            "Stream embed opened"
        );
        self.context = Some(context);
    }

    fn deactivate(&mut self) {
        if self.context.take().is_some() {
            info!(channel = %self.channel, "Stream embed closed");
        }
    }

    fn is_active(&self) -> bool {
        self.context().is_some()
    }
}

impl Default for StreamEmbed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}
