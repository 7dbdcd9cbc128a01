fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use waltz_protocol::{
        SelectionItem, ServerMessage, StartCommand, TransferEvent, TransferRequest,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    /// Decodes every frame of a fixture stream the way the channel does.
    fn decode_stream(name: &str) -> Vec<TransferEvent> {
        let frames = match load_fixture(name) {
            serde_json::Value::Array(frames) => frames,
            other => panic!("{name} should be an array, got {other}"),
        };
        frames
            .iter()
            .map(|f| TransferEvent::decode(&f.to_string()))
            .collect()
    }

    // --- Outbound ---

    #[test]
    fn fixture_start_command() {
        let cmd: StartCommand = roundtrip_test("start_command.json");
        assert_eq!(cmd, StartCommand::bare());
    }

    #[test]
    fn fixture_start_command_embedded() {
        let cmd: StartCommand = roundtrip_test("start_command_embedded.json");
        let playlists = cmd.playlists.expect("embedded selection");
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].name, "Rock Classics");
        assert_eq!(playlists[0].total_units, 150);
    }

    #[test]
    fn fixture_transfer_request() {
        let req: TransferRequest = roundtrip_test("transfer_request.json");
        assert_eq!(req.playlists[1], SelectionItem::new("0vvXsWCC9xrXsKd4FyS8kM", "Lofi Girl", 0));
    }

    #[test]
    fn start_command_matches_fixture_exactly() {
        let items = vec![
            SelectionItem::new("37i9dQZF1DWXRqgorJj26U", "Rock Classics", 150),
            SelectionItem::new("37i9dQZF1DXcBWIGoYBM5M", "Today's Top Hits", 50),
        ];
        let ours = serde_json::to_value(StartCommand::with_selection(&items)).unwrap();
        assert_eq!(ours, load_fixture("start_command_embedded.json"));
    }

    // --- Inbound ---

    #[test]
    fn fixture_server_message() {
        let msg: ServerMessage = roundtrip_test("server_message.json");
        assert_eq!(msg.kind, "item-start");
        assert_eq!(msg.body.as_deref(), Some("Rock Classics"));
    }

    #[test]
    fn fixture_event_stream_decodes_in_order() {
        let events = decode_stream("event_stream.json");
        let kinds: Vec<&str> = events.iter().map(TransferEvent::kind).collect();
        assert_eq!(
            kinds,
            [
                "item-start",
                "unit-done",
                "unit-done",
                "unit-done",
                "item-done",
                "item-start",
                "unit-done",
                "unit-done",
                "item-done",
                "done",
            ]
        );
        assert_eq!(
            events[5],
            TransferEvent::ItemStart { name: "Pop".into() }
        );
        let terminal: Vec<bool> = events.iter().map(TransferEvent::is_terminal).collect();
        assert_eq!(terminal.iter().filter(|t| **t).count(), 1);
        assert!(terminal[terminal.len() - 1]);
    }

    #[test]
    fn fixture_error_stream() {
        let events = decode_stream("error_stream.json");
        assert_eq!(
            events,
            vec![
                TransferEvent::ItemStart {
                    name: "Rock".into()
                },
                TransferEvent::Error {
                    message: "disk full".into()
                },
            ]
        );
    }
}
