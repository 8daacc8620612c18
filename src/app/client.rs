//! Client loop: drain the network, sample input, advance the active context

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::{Activation, MovementSync, ProximityDetector};
use crate::input::{InputFrame, InputReader};
use crate::scene::{PrimaryContext, SceneTransitionController, SecondaryContext, Tickable};
use crate::util::time::{tick_delta, tick_duration};
use crate::ws::{ConnectionSession, SessionError};

use super::state::{SessionContext, SessionEvent};

/// Control flow for the client loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}

/// The client: one session, one primary context, one secondary context
pub struct Client<I: InputReader, E: SecondaryContext> {
    config: Arc<Config>,
    pub world: SessionContext,
    pub primary: PrimaryContext,
    pub transitions: SceneTransitionController<E>,
    input: I,
    tick: u64,
}

impl<I: InputReader, E: SecondaryContext> Client<I, E> {
    pub fn new(config: Arc<Config>, session: ConnectionSession, input: I, secondary: E) -> Self {
        let primary = PrimaryContext::new(
            MovementSync::new(config.player_speed),
            ProximityDetector::main_room(),
            config.avatar_size,
        );

        Self {
            config,
            world: SessionContext::new(session),
            primary,
            transitions: SceneTransitionController::new(secondary),
            input,
            tick: 0,
        }
    }

    /// Run the tick loop until quit or connection loss
    pub async fn run(mut self) -> Result<(), SessionError> {
        info!(
            tick_rate = self.config.tick_rate,
            speed = self.primary.movement.speed(),
            "Client loop started"
        );

        let mut tick_interval = interval(tick_duration(self.config.tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(key) = self.config.room_key.clone() {
            self.submit_room_key(&key);
        }

        loop {
            tick_interval.tick().await;

            if self.step()? == TickControl::Exit {
                info!(ticks = self.tick, "Client loop exiting");
                break;
            }
        }

        self.world.session.disconnect();
        Ok(())
    }

    /// One tick: inbound messages, then input, then the active context
    pub fn step(&mut self) -> Result<TickControl, SessionError> {
        self.tick += 1;

        // Inbound traffic is fully applied before anything reads the registry
        if let Err(e) = self.process_inbound() {
            self.transitions.exit(&mut self.primary.proximity, None);
            self.world.reset();
            return Err(e);
        }

        let frame = self.input.read();
        if frame.quit {
            return Ok(TickControl::Exit);
        }
        if let Some(key) = &frame.room_key {
            self.submit_room_key(key);
        }

        if self.transitions.is_suspended() {
            if frame.exit {
                let local = self.primary.local_bounds(&self.world);
                self.transitions.exit(&mut self.primary.proximity, local.as_ref());
            }
            return Ok(TickControl::Continue);
        }

        if self.engage(&frame) {
            return Ok(TickControl::Continue);
        }

        let dt = tick_delta(self.config.tick_rate);
        self.primary.tick(&mut self.world, &frame, dt);
        self.show_affordances();
        Ok(TickControl::Continue)
    }

    fn show_affordances(&self) {
        for change in self.primary.last_changes() {
            match change.to {
                Activation::Highlighted => {
                    info!(interactable = %change.id, "In reach, type `engage` to open");
                }
                Activation::Inactive => {
                    info!(interactable = %change.id, from = %change.from, "Out of reach");
                }
                Activation::Engaged => {}
            }
        }
    }

    fn process_inbound(&mut self) -> Result<(), SessionError> {
        for msg in self.world.session.drain()? {
            match self.world.apply(msg)? {
                Some(SessionEvent::JoinedRoom(key)) => {
                    debug!(room_key = %key, "Movement baseline reset");
                    self.primary.movement.reset();
                }
                Some(SessionEvent::KeyRejected(e)) => warn!(error = %e, "Room key rejected"),
                Some(SessionEvent::RoomCreated(key)) => info!(room_key = %key, "Share this room key"),
                Some(SessionEvent::ParticipantJoined(id)) => {
                    let user_name = self
                        .world
                        .registry
                        .get(&id)
                        .map(|p| p.user_name.as_str())
                        .unwrap_or_default();
                    info!(player_id = %id, user_name = %user_name, "Participant joined");
                }
                Some(SessionEvent::ParticipantLeft(id)) => {
                    info!(
                        player_id = %id,
                        participants = self.world.registry.len(),
                        "Participant left"
                    );
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Engage against the activations computed on the previous tick
    ///
    /// Returns true when the secondary context opened.
    fn engage(&mut self, frame: &InputFrame) -> bool {
        let Some(target) = &frame.engage else {
            return false;
        };

        match self
            .transitions
            .engage(target.as_deref(), &mut self.primary.proximity, &self.world)
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Engage ignored");
                false
            }
        }
    }

    fn submit_room_key(&mut self, key: &str) {
        if let Err(e) = self.world.session.join_room(key) {
            warn!(error = %e, "Cannot submit room key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use glam::Vec2;

    use crate::game::proximity::VENDING_MACHINE_ID;
    use crate::input::DirectionalInput;
    use crate::scene::StreamEmbed;
    use crate::ws::protocol::{
        ClientMsg, MovementSample, NewPlayer, PlayerInfo, PlayerLeft, PlayerMoved, RoomState,
        Roster, ServerMsg, Welcome,
    };
    use crate::ws::session::tests::{in_memory_link, FakeServer};
    use crate::ws::transport::TransportEvent;

    /// Replays prepared frames, then idles
    #[derive(Default)]
    struct ScriptedInput {
        frames: VecDeque<InputFrame>,
    }

    impl InputReader for ScriptedInput {
        fn read(&mut self) -> InputFrame {
            self.frames.pop_front().unwrap_or_default()
        }
    }

    type TestClient = Client<ScriptedInput, StreamEmbed>;

    fn config() -> Arc<Config> {
        Arc::new(Config::from_lookup(|_| None).unwrap())
    }

    fn info(id: &str, x: f32, y: f32) -> PlayerInfo {
        PlayerInfo {
            player_id: id.to_string(),
            user_name: id.to_string(),
            x,
            y,
            rotation: 0.0,
        }
    }

    fn client() -> (TestClient, FakeServer) {
        let (link, server) = in_memory_link();
        let mut session = ConnectionSession::new();
        session.attach(link);
        (
            Client::new(config(), session, ScriptedInput::default(), StreamEmbed::default()),
            server,
        )
    }

    /// Client admitted to ROOM1, local participant "me" at (x, y)
    fn joined_client(x: f32, y: f32) -> (TestClient, FakeServer) {
        let (mut client, mut server) = client();
        server.push(ServerMsg::Welcome(Welcome {
            player_id: "me".to_string(),
        }));
        let mut players = Roster::new();
        players.insert("me".to_string(), info("me", x, y));
        server.push(ServerMsg::SetState(RoomState {
            room_key: "ROOM1".to_string(),
            players,
            num_players: 1,
        }));
        client.step().unwrap();
        server.received();
        (client, server)
    }

    fn frame(directions: DirectionalInput) -> InputFrame {
        InputFrame {
            directions,
            ..InputFrame::default()
        }
    }

    fn engage_frame() -> InputFrame {
        InputFrame {
            engage: Some(None),
            ..InputFrame::default()
        }
    }

    fn exit_frame() -> InputFrame {
        InputFrame {
            exit: true,
            ..InputFrame::default()
        }
    }

    fn vending_machine(client: &TestClient) -> Activation {
        client
            .primary
            .proximity
            .get(VENDING_MACHINE_ID)
            .unwrap()
            .activation()
    }

    #[test]
    fn test_join_flow_through_console_key() {
        let (mut client, mut server) = client();
        client.input.frames.push_back(InputFrame {
            room_key: Some("ROOM1".to_string()),
            ..InputFrame::default()
        });
        client.step().unwrap();
        assert_eq!(server.received(), vec![ClientMsg::IsKeyValid("ROOM1".to_string())]);

        server.push(ServerMsg::KeyIsValid("ROOM1".to_string()));
        client.step().unwrap();
        assert_eq!(server.received(), vec![ClientMsg::JoinRoom("ROOM1".to_string())]);
    }

    #[test]
    fn test_moving_emits_one_sample_per_changed_tick() {
        let (mut client, mut server) = joined_client(500.0, 500.0);
        let right = DirectionalInput {
            right: true,
            ..DirectionalInput::default()
        };
        client.input.frames.extend([frame(right), frame(right), InputFrame::default()]);

        client.step().unwrap();
        client.step().unwrap();
        client.step().unwrap();

        let sent = server.received();
        assert_eq!(sent.len(), 2);
        let ClientMsg::PlayerMovement(MovementSample { x, y, room_key }) = &sent[1] else {
            panic!("expected movement, got {sent:?}");
        };
        let dt = tick_delta(60);
        assert!((x - (500.0 + 2.0 * 225.0 * dt)).abs() < 1e-3);
        assert_eq!(*y, 500.0);
        assert_eq!(room_key, "ROOM1");
    }

    #[test]
    fn test_proximity_follows_local_position() {
        let (mut client, _server) = joined_client(90.0, 160.0);
        client.step().unwrap();
        assert_eq!(vending_machine(&client), Activation::Highlighted);
        assert!(client.primary.last_changes().is_empty());

        client
            .world
            .registry
            .local_mut()
            .unwrap()
            .position = Vec2::new(500.0, 500.0);
        client.step().unwrap();
        assert_eq!(vending_machine(&client), Activation::Inactive);
        assert_eq!(client.primary.last_changes().len(), 1);
        assert_eq!(client.primary.last_changes()[0].from, Activation::Highlighted);
    }

    #[test]
    fn test_engage_suspends_and_exit_resumes() {
        let (mut client, mut server) = joined_client(90.0, 160.0);
        client.step().unwrap();

        let down = DirectionalInput {
            down: true,
            ..DirectionalInput::default()
        };
        client
            .input
            .frames
            .extend([engage_frame(), frame(down), frame(down), exit_frame()]);

        client.step().unwrap();
        assert!(client.transitions.is_suspended());
        assert_eq!(vending_machine(&client), Activation::Engaged);

        // Suspended: held keys do not move the participant
        client.step().unwrap();
        client.step().unwrap();
        assert_eq!(
            client.world.registry.local().unwrap().position,
            Vec2::new(90.0, 160.0)
        );
        assert!(server.received().is_empty());

        client.step().unwrap();
        assert!(!client.transitions.is_suspended());
        assert_eq!(vending_machine(&client), Activation::Highlighted);
    }

    #[test]
    fn test_engage_while_inactive_is_ignored() {
        let (mut client, _server) = joined_client(500.0, 500.0);
        client.step().unwrap();

        client.input.frames.push_back(engage_frame());
        client.step().unwrap();

        assert!(!client.transitions.is_suspended());
        assert_eq!(vending_machine(&client), Activation::Inactive);
    }

    #[test]
    fn test_remote_traffic_applied_before_tick() {
        let (mut client, server) = joined_client(500.0, 500.0);
        server.push(ServerMsg::NewPlayer(NewPlayer {
            player_info: info("p2", 10.0, 10.0),
            num_players: 2,
        }));
        server.push(ServerMsg::PlayerMoved(PlayerMoved {
            player_id: "p2".to_string(),
            x: 20.0,
            y: 30.0,
        }));
        client.step().unwrap();
        assert_eq!(
            client.world.registry.get("p2").unwrap().position,
            Vec2::new(20.0, 30.0)
        );

        server.push(ServerMsg::Disconnected(PlayerLeft {
            player_id: "p2".to_string(),
            num_players: 1,
        }));
        server.push(ServerMsg::PlayerMoved(PlayerMoved {
            player_id: "p2".to_string(),
            x: 1.0,
            y: 1.0,
        }));
        client.step().unwrap();
        assert!(client.world.registry.get("p2").is_none());
        assert_eq!(client.world.room.as_ref().unwrap().num_players, 1);
    }

    #[test]
    fn test_connection_loss_is_fatal() {
        let (mut client, server) = joined_client(90.0, 160.0);
        client.step().unwrap();
        client.input.frames.push_back(engage_frame());
        client.step().unwrap();
        assert!(client.transitions.is_suspended());

        server
            .events
            .send(TransportEvent::Closed("server went away".to_string()))
            .unwrap();
        let err = client.step().unwrap_err();

        assert_eq!(err, SessionError::ConnectionLost("server went away".to_string()));
        assert!(!client.transitions.is_suspended());
        assert!(client.world.room.is_none());
        assert!(client.world.registry.is_empty());
    }

    #[test]
    fn test_quit_exits_loop() {
        let (mut client, _server) = client();
        client.input.frames.push_back(InputFrame {
            quit: true,
            ..InputFrame::default()
        });
        assert_eq!(client.step().unwrap(), TickControl::Exit);
        assert_eq!(client.tick, 1);
    }

    #[tokio::test]
    async fn test_run_submits_configured_key_and_stops_on_quit() {
        let (link, mut server) = in_memory_link();
        let mut session = ConnectionSession::new();
        session.attach(link);

        let config = Arc::new(
            Config::from_lookup(|name| (name == "ROOM_KEY").then(|| "AB12".to_string())).unwrap(),
        );
        let mut input = ScriptedInput::default();
        input.frames.push_back(InputFrame {
            quit: true,
            ..InputFrame::default()
        });

        let client = Client::new(config, session, input, StreamEmbed::default());
        client.run().await.unwrap();

        assert_eq!(server.received(), vec![ClientMsg::IsKeyValid("AB12".to_string())]);
    }
}
