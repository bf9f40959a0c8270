//! End-to-end tests for the agent loop over in-memory control streams

#[cfg(test)]
mod tests {
    use craft_agent::agent::Agent;
    use craft_agent::protocol::{Record, StatusLabel};
    use craft_agent::sandbox::SandboxWorld;
    use craft_agent::types::AgentConfig;

    const CONNECT: &str =
        r#"{"command":"connect","options":{"host":"localhost","port":25565,"username":"Yazuki"}}"#;

    fn decode(output: &[u8]) -> Vec<Record> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    async fn run(world: &SandboxWorld, input: &str) -> Vec<Record> {
        let agent = Agent::new(&AgentConfig::default(), world.connector());
        let mut output = Vec::new();
        agent.run(input.as_bytes(), &mut output).await.unwrap();
        decode(&output)
    }

    #[tokio::test]
    async fn announces_ready_before_anything_else() {
        let world = SandboxWorld::new();
        let records = run(&world, "").await;
        assert_eq!(records, vec![Record::status(StatusLabel::Ready)]);
    }

    #[tokio::test]
    async fn world_events_precede_the_next_control_line() {
        let world = SandboxWorld::new();
        let input = format!(
            "garbage\n{}\n{{\"command\":\"chat\",\"message\":\"hi\"}}\n{{\"command\":\"quit\"}}\n",
            CONNECT
        );

        let records = run(&world, &input).await;

        assert_eq!(
            records,
            vec![
                Record::status(StatusLabel::Ready),
                Record::info("Connecting to localhost:25565 as Yazuki..."),
                Record::status(StatusLabel::Spawned),
                Record::info("Bot has spawned in the world."),
                Record::status(StatusLabel::Disconnected),
            ]
        );
        assert_eq!(world.said(), vec!["hi".to_string()]);
        assert_eq!(world.quits(), 1);
    }

    #[tokio::test]
    async fn eof_releases_the_live_connection() {
        let world = SandboxWorld::new();
        let input = format!("{}\n", CONNECT);

        let records = run(&world, &input).await;

        assert_eq!(records.last(), Some(&Record::info("Bot has spawned in the world.")));
        assert_eq!(world.quits(), 1);
    }

    #[tokio::test]
    async fn overlong_control_line_is_dropped_and_reading_continues() {
        let world = SandboxWorld::new();
        let input = format!("{}\n{}\n", "z".repeat(4096), CONNECT);
        let agent = Agent::new(&AgentConfig::default(), world.connector()).max_line_len(256);
        let mut output = Vec::new();

        agent.run(input.as_bytes(), &mut output).await.unwrap();

        let records = decode(&output);
        assert_eq!(records[0], Record::status(StatusLabel::Ready));
        assert_eq!(records[1], Record::info("Connecting to localhost:25565 as Yazuki..."));
        assert_eq!(world.connects().len(), 1);
    }

    #[tokio::test]
    async fn voice_goto_is_spoken_back_in_game() {
        let world = SandboxWorld::new();
        let input = format!(
            "{}\n{}\n",
            CONNECT, r#"{"command":"voice","username":"alice","text":"goto 1 2 3"}"#
        );

        run(&world, &input).await;

        assert_eq!(world.said(), vec!["Going to 1 2 3".to_string()]);
    }
}
