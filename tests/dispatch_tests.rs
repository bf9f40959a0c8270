//! CommandDispatcher tests against the sandbox world

#[cfg(test)]
mod tests {
    use craft_agent::dispatch::CommandDispatcher;
    use craft_agent::event::{AgentEvent, WorldEvent};
    use craft_agent::goal::MovementGoal;
    use craft_agent::protocol::{Record, StatusLabel};
    use craft_agent::sandbox::{SandboxConnector, SandboxWorld};
    use craft_agent::types::{AgentConfig, BlockPos, ConnectionStatus, PlayerRef, Vec3};
    use tokio::sync::mpsc;

    const CONNECT: &str = r#"{"command":"connect","options":{"host":"localhost","port":25565,"username":"Yazuki"}}"#;

    struct Harness {
        world: SandboxWorld,
        dispatcher: CommandDispatcher<SandboxConnector>,
        rx: mpsc::UnboundedReceiver<AgentEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let world = SandboxWorld::new();
            let (tx, rx) = mpsc::unbounded_channel();
            let dispatcher = CommandDispatcher::new(&AgentConfig::default(), world.connector(), tx);
            Self {
                world,
                dispatcher,
                rx,
            }
        }

        /// Connected and spawned, with the spawn records drained.
        fn connected() -> Self {
            let mut h = Self::new();
            h.line(CONNECT);
            h.pump();
            h
        }

        fn line(&mut self, line: &str) -> Vec<Record> {
            self.dispatcher.handle(AgentEvent::Control(line.to_string()))
        }

        /// Handle everything queued by the world so far.
        fn pump(&mut self) -> Vec<Record> {
            let mut records = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                records.extend(self.dispatcher.handle(event));
            }
            records
        }
    }

    fn voice(username: &str, text: &str) -> String {
        serde_json::json!({"command": "voice", "username": username, "text": text}).to_string()
    }

    // -----------------------------------------------------------------------
    // Silent drop
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_lines_produce_nothing_and_change_nothing() {
        let mut h = Harness::connected();
        h.world.add_player("alice", Vec3::zero());
        h.line(r#"{"command":"follow","username":"alice"}"#);
        let goal_before = h.dispatcher.goal().clone();
        let said_before = h.world.said();

        for line in [
            "garbage",
            "{",
            r#"{"command":"teleport","username":"alice"}"#,
            r#"{"command":"come"}"#,
            r#"{"type":"status"}"#,
        ] {
            assert!(h.line(line).is_empty(), "unexpected output for {line}");
        }

        assert!(h.pump().is_empty());
        assert_eq!(h.dispatcher.goal(), &goal_before);
        assert_eq!(h.world.said(), said_before);
        assert_eq!(h.world.connects().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Session commands
    // -----------------------------------------------------------------------

    #[test]
    fn connect_reports_connecting_then_spawn() {
        let mut h = Harness::new();

        let records = h.line(CONNECT);
        assert_eq!(
            records,
            vec![Record::info("Connecting to localhost:25565 as Yazuki...")]
        );
        assert_eq!(h.dispatcher.connection_status(), Some(ConnectionStatus::Connecting));

        let records = h.pump();
        assert_eq!(
            records,
            vec![
                Record::status(StatusLabel::Spawned),
                Record::info("Bot has spawned in the world."),
            ]
        );
        assert_eq!(h.dispatcher.connection_status(), Some(ConnectionStatus::Spawned));
        assert!(h.world.profile().is_some());
    }

    #[test]
    fn refused_connection_reports_error_and_stays_controllable() {
        let mut h = Harness::new();
        h.world.refuse_connections(Some("not whitelisted"));

        let records = h.line(CONNECT);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], Record::error("connection failed: not whitelisted"));
        assert_eq!(h.dispatcher.connection_status(), None);

        h.world.refuse_connections(None);
        h.line(CONNECT);
        h.pump();
        assert_eq!(h.dispatcher.connection_status(), Some(ConnectionStatus::Spawned));
    }

    #[test]
    fn chat_is_forwarded_and_own_echo_filtered() {
        let mut h = Harness::connected();

        assert!(h.line(r#"{"command":"chat","message":"hello world"}"#).is_empty());
        assert_eq!(h.world.said(), vec!["hello world".to_string()]);
        // The sandbox echoes our own line back; it must not be reported.
        assert!(h.pump().is_empty());
    }

    #[test]
    fn chat_and_quit_without_connection_are_noops() {
        let mut h = Harness::new();
        assert!(h.line(r#"{"command":"chat","message":"hi"}"#).is_empty());
        assert!(h.line(r#"{"command":"quit"}"#).is_empty());
        assert!(h.pump().is_empty());
        assert_eq!(h.world.quits(), 0);
    }

    #[test]
    fn quit_reports_disconnect_and_goes_idle() {
        let mut h = Harness::connected();
        h.line(&voice("alice", "goto 1 2 3"));

        assert!(h.line(r#"{"command":"quit"}"#).is_empty());
        let records = h.pump();

        assert_eq!(records, vec![Record::status(StatusLabel::Disconnected)]);
        assert!(h.dispatcher.goal().is_idle());
        assert_eq!(h.dispatcher.connection_status(), None);
    }

    #[test]
    fn second_connect_replaces_first_and_hides_its_disconnect() {
        let mut h = Harness::connected();
        let first = h.dispatcher.session_id();

        let records = h.line(CONNECT);
        assert_eq!(records.len(), 1);
        let records = h.pump();

        // The replaced connection's Disconnected is stale and dropped.
        assert_eq!(
            records,
            vec![
                Record::status(StatusLabel::Spawned),
                Record::info("Bot has spawned in the world."),
            ]
        );
        assert_ne!(h.dispatcher.session_id(), first);
        assert_eq!(h.world.quits(), 1);
        assert_eq!(h.world.connects().len(), 2);
    }

    #[test]
    fn teardown_failure_is_suppressed() {
        let mut h = Harness::connected();
        h.world.fail_quits(true);

        let records = h.line(CONNECT);
        assert_eq!(
            records,
            vec![Record::info("Connecting to localhost:25565 as Yazuki...")]
        );
        h.pump();
        assert_eq!(h.dispatcher.connection_status(), Some(ConnectionStatus::Spawned));
    }

    #[test]
    fn explicit_quit_failure_is_silent() {
        let mut h = Harness::connected();
        h.world.fail_quits(true);

        assert!(h.line(r#"{"command":"quit"}"#).is_empty());
        assert!(h.pump().is_empty());
        assert_eq!(h.dispatcher.connection_status(), Some(ConnectionStatus::Spawned));
    }

    #[test]
    fn chat_on_a_closing_connection_is_silent() {
        let mut h = Harness::connected();
        h.line(r#"{"command":"quit"}"#);

        // The disconnect is still queued, so the session is live but closed.
        assert!(h.line(r#"{"command":"chat","message":"too late"}"#).is_empty());
        assert!(h.world.said().is_empty());
        assert_eq!(h.pump(), vec![Record::status(StatusLabel::Disconnected)]);
    }

    #[test]
    fn world_errors_and_kicks_are_reported_non_fatally() {
        let mut h = Harness::connected();

        h.world.emit(WorldEvent::Error("ECONNRESET".into()));
        h.world.emit(WorldEvent::Kicked("idle for too long".into()));

        assert_eq!(
            h.pump(),
            vec![
                Record::error("ECONNRESET"),
                Record::error("Kicked: idle for too long"),
            ]
        );
        assert!(h.line(r#"{"command":"chat","message":"still here"}"#).is_empty());
        assert_eq!(h.world.said(), vec!["still here".to_string()]);
    }

    #[test]
    fn disconnect_resets_goal() {
        let mut h = Harness::connected();
        h.world.add_player("alice", Vec3::zero());
        h.line(r#"{"command":"follow","username":"alice"}"#);
        assert!(matches!(h.dispatcher.goal(), MovementGoal::FollowEntity { .. }));

        h.world.emit(WorldEvent::Disconnected);
        assert_eq!(h.pump(), vec![Record::status(StatusLabel::Disconnected)]);
        assert!(h.dispatcher.goal().is_idle());
    }

    // -----------------------------------------------------------------------
    // Structured goal commands
    // -----------------------------------------------------------------------

    #[test]
    fn follow_command_sets_continuous_follow() {
        let mut h = Harness::connected();
        let pos = Vec3::new(3.0, 64.0, 3.0);
        h.world.add_player("alice", pos);

        let records = h.line(r#"{"command":"follow","username":"alice"}"#);

        assert_eq!(records, vec![Record::info("Following alice")]);
        let expected = MovementGoal::FollowEntity {
            target: PlayerRef::new("alice", pos),
            radius: 1.0,
            continuous: true,
        };
        assert_eq!(h.dispatcher.goal(), &expected);
        assert_eq!(h.world.active_goal(), Some(expected));
        assert!(h.world.goal_calls().last().is_some_and(|c| c.continuous));
    }

    #[test]
    fn come_command_for_invisible_player_logs_info() {
        let mut h = Harness::connected();

        let records = h.line(r#"{"command":"come","username":"ghost"}"#);

        assert_eq!(records, vec![Record::info("Cannot see ghost")]);
        assert!(h.dispatcher.goal().is_idle());
        assert!(h.world.said().is_empty());
    }

    #[test]
    fn player_who_left_can_no_longer_be_approached() {
        let mut h = Harness::connected();
        h.world.add_player("alice", Vec3::new(3.0, 64.0, 3.0));
        h.line(r#"{"command":"follow","username":"alice"}"#);

        h.world.remove_player("alice");
        h.world.say("alice", "bot come here");
        h.pump();

        assert_eq!(h.world.said(), vec!["I can't see you!".to_string()]);
        assert!(matches!(h.dispatcher.goal(), MovementGoal::FollowEntity { .. }));
    }

    #[test]
    fn stop_twice_acknowledges_twice() {
        let mut h = Harness::connected();

        let first = h.line(r#"{"command":"stop"}"#);
        let second = h.line(r#"{"command":"stop"}"#);

        assert_eq!(first, vec![Record::info("Stopped moving")]);
        assert_eq!(second, first);
        assert!(h.dispatcher.goal().is_idle());
    }

    // -----------------------------------------------------------------------
    // In-game chat
    // -----------------------------------------------------------------------

    #[test]
    fn directed_follow_with_visible_speaker() {
        let mut h = Harness::connected();
        let pos = Vec3::new(-7.0, 65.0, 12.0);
        h.world.add_player("alice", pos);

        h.world.say("alice", "hey bot follow me");
        let records = h.pump();

        assert_eq!(records, vec![Record::chat("alice", "hey bot follow me")]);
        assert_eq!(
            h.dispatcher.goal(),
            &MovementGoal::FollowEntity {
                target: PlayerRef::new("alice", pos),
                radius: 1.0,
                continuous: true,
            }
        );
        assert_eq!(h.world.said(), vec!["Following you!".to_string()]);
    }

    #[test]
    fn directed_follow_with_invisible_speaker() {
        let mut h = Harness::connected();
        h.line(&voice("alice", "goto 5 5 5"));
        let before = h.dispatcher.goal().clone();

        h.world.say("alice", "hey bot follow me");
        h.pump();

        assert_eq!(h.dispatcher.goal(), &before);
        assert_eq!(h.world.said().last().map(String::as_str), Some("I can't see you!"));
    }

    #[test]
    fn ambient_come_here_approaches_speaker() {
        let mut h = Harness::connected();
        let pos = Vec3::new(1.5, 70.0, 1.5);
        h.world.add_player("bob", pos);

        h.world.say("bob", "can you come here");
        h.pump();

        assert_eq!(
            h.dispatcher.goal(),
            &MovementGoal::ApproachPoint {
                position: pos,
                radius: 1.0,
            }
        );
        assert_eq!(h.world.said(), vec!["Coming!".to_string()]);
    }

    #[test]
    fn ambient_stop_in_sentence_is_ignored_but_bare_stop_is_not() {
        let mut h = Harness::connected();
        h.line(&voice("alice", "goto 1 2 3"));

        h.world.say("bob", "we should stop at the village");
        h.pump();
        assert_eq!(h.dispatcher.goal(), &MovementGoal::GotoBlock(BlockPos::new(1, 2, 3)));

        h.world.say("bob", "Stop!!");
        h.pump();
        assert!(h.dispatcher.goal().is_idle());
    }

    #[test]
    fn addressing_by_username_counts_as_directed() {
        let mut h = Harness::connected();
        h.line(&voice("alice", "goto 1 2 3"));

        h.world.say("bob", "Yazuki, wait there");
        h.pump();

        assert!(h.dispatcher.goal().is_idle());
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    #[test]
    fn voice_goto_sets_block_goal() {
        let mut h = Harness::connected();

        let records = h.line(&voice("alice", "goto 10 64 -20"));

        assert!(records.is_empty());
        assert_eq!(h.dispatcher.goal(), &MovementGoal::GotoBlock(BlockPos::new(10, 64, -20)));
        assert_eq!(h.world.said(), vec!["Going to 10 64 -20".to_string()]);
        assert_eq!(
            h.world.active_goal(),
            Some(MovementGoal::GotoBlock(BlockPos::new(10, 64, -20)))
        );
    }

    #[test]
    fn voice_goto_with_bad_arguments_is_silent() {
        let mut h = Harness::connected();

        assert!(h.line(&voice("alice", "goto 10 64")).is_empty());
        assert!(h.line(&voice("alice", "goto a b c")).is_empty());

        assert!(h.pump().is_empty());
        assert!(h.dispatcher.goal().is_idle());
        assert!(h.world.said().is_empty());
        assert!(h.world.goal_calls().is_empty());
    }

    #[test]
    fn voice_is_directed_without_addressing() {
        let mut h = Harness::connected();
        h.world.add_player("alice", Vec3::zero());

        h.line(&voice("alice", "please follow me"));

        assert!(matches!(h.dispatcher.goal(), MovementGoal::FollowEntity { .. }));
    }

    #[test]
    fn voice_without_connection_degrades_feedback_to_info() {
        let mut h = Harness::new();

        let records = h.line(&voice("alice", "come here"));

        assert_eq!(records, vec![Record::info("I can't see you!")]);
        assert!(h.dispatcher.goal().is_idle());
    }
}
