//! End-to-end greeting behaviour through `GreeterPlugin` with a fake
//! connected-player directory.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use plugin_greeter::{
    ChatMessage, ConnectionEvent, DeliveryError, GreeterError, GreeterPlugin, Greeting,
    PlayerDirectory, PlayerId, CONFIG_FILE_NAME, KNOWN_PLAYERS_FILE_NAME,
};
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Records every delivery; players in `unreachable` fail.
#[derive(Default)]
struct FakeDirectory {
    online: Mutex<Vec<PlayerId>>,
    unreachable: Mutex<HashSet<PlayerId>>,
    inbox: Mutex<Vec<(PlayerId, ChatMessage)>>,
}

impl FakeDirectory {
    async fn connect(&self, player_id: PlayerId) {
        self.online.lock().await.push(player_id);
    }

    async fn received_by(&self, player_id: PlayerId) -> Vec<String> {
        self.inbox
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == player_id)
            .map(|(_, m)| m.plain_text())
            .collect()
    }

    async fn clear(&self) {
        self.inbox.lock().await.clear();
    }
}

#[async_trait]
impl PlayerDirectory for FakeDirectory {
    async fn connected_players(&self) -> Vec<PlayerId> {
        self.online.lock().await.clone()
    }

    async fn send_message(&self, player_id: PlayerId, message: &ChatMessage) -> Result<(), DeliveryError> {
        if self.unreachable.lock().await.contains(&player_id) {
            return Err(DeliveryError::PlayerUnreachable(player_id));
        }
        self.inbox.lock().await.push((player_id, message.clone()));
        Ok(())
    }
}

async fn plugin_in(dir: &TempDir) -> (GreeterPlugin, Arc<FakeDirectory>) {
    let directory = Arc::new(FakeDirectory::default());
    let plugin = GreeterPlugin::new(dir.path().join("greeter"), directory.clone());
    plugin.setup().await;
    (plugin, directory)
}

#[tokio::test]
async fn test_setup_generates_default_config() {
    let dir = TempDir::new().unwrap();
    let (plugin, _) = plugin_in(&dir).await;

    let config_path = plugin.data_dir().join(CONFIG_FILE_NAME);
    assert!(config_path.exists());
    let contents = tokio::fs::read_to_string(&config_path).await.unwrap();
    assert!(contents.contains("\"EnableFirstTimeWelcome\": true"));
}

#[tokio::test]
async fn test_first_visit_then_return() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;

    let veteran = PlayerId::new();
    let nova = PlayerId::new();
    directory.connect(veteran).await;
    directory.connect(nova).await;

    let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;

    assert_eq!(outcome.greeting, Some(Greeting::FirstVisit));
    assert!(outcome.registered);
    assert!(plugin.registry().contains(&nova).await);
    assert_eq!(
        directory.received_by(nova).await,
        vec![
            "*** WELCOME TO THE SERVER! ***",
            "This is your first time here!",
            "[NEW] Nova has joined for the first time!",
        ]
    );
    assert_eq!(
        directory.received_by(veteran).await,
        vec!["[NEW] Nova has joined for the first time!"]
    );

    // Persisted immediately, before shutdown.
    let saved = tokio::fs::read_to_string(plugin.data_dir().join(KNOWN_PLAYERS_FILE_NAME))
        .await
        .unwrap();
    assert_eq!(saved.trim(), nova.to_string());

    directory.clear().await;
    let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;

    assert_eq!(outcome.greeting, Some(Greeting::Returning));
    assert!(!outcome.registered);
    assert_eq!(
        directory.received_by(nova).await,
        vec!["Welcome back!", "[+] Nova has joined."]
    );
    assert_eq!(directory.received_by(veteran).await, vec!["[+] Nova has joined."]);
}

#[tokio::test]
async fn test_join_messages_disabled_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("greeter");
    tokio::fs::create_dir_all(&data_dir).await.unwrap();
    tokio::fs::write(data_dir.join(CONFIG_FILE_NAME), r#"{ "EnableJoinMessages": false }"#)
        .await
        .unwrap();

    let (plugin, directory) = plugin_in(&dir).await;
    let nova = PlayerId::new();
    directory.connect(nova).await;

    let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;

    assert_eq!(outcome.greeting, None);
    assert_eq!(outcome.deliveries.delivered, 0);
    assert!(directory.inbox.lock().await.is_empty());
    assert!(plugin.registry().is_empty().await);
}

#[tokio::test]
async fn test_first_time_welcome_disabled_never_records() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("greeter");
    tokio::fs::create_dir_all(&data_dir).await.unwrap();
    tokio::fs::write(data_dir.join(CONFIG_FILE_NAME), r#"{ "EnableFirstTimeWelcome": false }"#)
        .await
        .unwrap();

    let (plugin, directory) = plugin_in(&dir).await;
    let nova = PlayerId::new();
    directory.connect(nova).await;

    for _ in 0..2 {
        let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;
        assert_eq!(outcome.greeting, Some(Greeting::Returning));
    }
    assert!(!plugin.registry().contains(&nova).await);
}

#[tokio::test]
async fn test_leave_broadcast_and_registry_untouched() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;
    let watcher = PlayerId::new();
    directory.connect(watcher).await;

    let leaver = PlayerId::new();
    let outcome = plugin
        .handle_event(&ConnectionEvent::disconnect(leaver, "Nova"))
        .await;

    assert_eq!(outcome.deliveries.delivered, 1);
    assert_eq!(directory.received_by(watcher).await, vec!["[-] Nova has left."]);
    assert!(!plugin.registry().contains(&leaver).await);
}

#[tokio::test]
async fn test_added_to_world_suppression_follows_config() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;
    let nova = PlayerId::new();

    let outcome = plugin
        .handle_event(&ConnectionEvent::added_to_world(nova, "Nova"))
        .await;
    assert!(!outcome.suppress_native_join);

    tokio::fs::write(
        plugin.data_dir().join(CONFIG_FILE_NAME),
        r#"{ "SuppressNativeWelcome": true }"#,
    )
    .await
    .unwrap();
    let reply = plugin.execute_command(&["reload"]).await;
    assert_eq!(reply[0].plain_text(), "Greeter config reloaded!");

    let outcome = plugin
        .handle_event(&ConnectionEvent::added_to_world(nova, "Nova"))
        .await;
    assert!(outcome.suppress_native_join);
    assert!(directory.inbox.lock().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_recipient_does_not_stop_broadcast() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;

    let gone = PlayerId::new();
    let present = PlayerId::new();
    let nova = PlayerId::new();
    directory.connect(gone).await;
    directory.connect(present).await;
    directory.connect(nova).await;
    directory.unreachable.lock().await.insert(gone);

    let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;

    assert_eq!(outcome.deliveries.failed, 1);
    // Two direct messages plus two reachable broadcast recipients.
    assert_eq!(outcome.deliveries.delivered, 4);
    assert_eq!(
        directory.received_by(present).await,
        vec!["[NEW] Nova has joined for the first time!"]
    );
}

#[tokio::test]
async fn test_concurrent_ready_classifies_first_visit_once() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;
    let plugin = Arc::new(plugin);
    let nova = PlayerId::new();
    directory.connect(nova).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let plugin = plugin.clone();
            tokio::spawn(async move { plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await })
        })
        .collect();

    let mut first_visits = 0;
    for handle in handles {
        if handle.await.unwrap().greeting == Some(Greeting::FirstVisit) {
            first_visits += 1;
        }
    }

    assert_eq!(first_visits, 1);
    assert_eq!(plugin.registry().len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_first_visits_of_distinct_players_are_all_persisted() {
    let dir = TempDir::new().unwrap();
    let (plugin, directory) = plugin_in(&dir).await;
    let plugin = Arc::new(plugin);
    let players: Vec<PlayerId> = (0..32).map(|_| PlayerId::new()).collect();
    for player_id in &players {
        directory.connect(*player_id).await;
    }

    let handles: Vec<_> = players
        .iter()
        .enumerate()
        .map(|(i, player_id)| {
            let plugin = plugin.clone();
            let event = ConnectionEvent::ready(*player_id, format!("Player{i}"));
            tokio::spawn(async move { plugin.handle_event(&event).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().greeting, Some(Greeting::FirstVisit));
    }

    assert_eq!(plugin.registry().len().await, players.len());

    let saved = tokio::fs::read_to_string(dir.path().join("greeter").join(KNOWN_PLAYERS_FILE_NAME))
        .await
        .unwrap();
    let saved: HashSet<PlayerId> = saved.lines().map(|line| line.parse().unwrap()).collect();
    assert_eq!(saved, players.into_iter().collect::<HashSet<_>>());
}

#[tokio::test]
async fn test_registry_survives_restart() {
    let dir = TempDir::new().unwrap();
    let nova = PlayerId::new();

    {
        let (plugin, _) = plugin_in(&dir).await;
        plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;
        plugin.shutdown().await;
    }

    let (plugin, directory) = plugin_in(&dir).await;
    directory.connect(nova).await;
    let outcome = plugin.handle_event(&ConnectionEvent::ready(nova, "Nova")).await;
    assert_eq!(outcome.greeting, Some(Greeting::Returning));
}

#[tokio::test]
async fn test_malformed_config_at_setup_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("greeter");
    tokio::fs::create_dir_all(&data_dir).await.unwrap();
    tokio::fs::write(data_dir.join(CONFIG_FILE_NAME), "{ broken").await.unwrap();

    let (plugin, _) = plugin_in(&dir).await;
    assert!(plugin.config().await.enable_join_messages);

    let reply = plugin.execute_command(&["reload"]).await;
    assert!(reply[0].plain_text().starts_with("Failed to reload Greeter config:"));
    assert!(matches!(plugin.reload_config().await, Err(GreeterError::Config(_))));
}

#[tokio::test]
async fn test_status_command_through_plugin() {
    let dir = TempDir::new().unwrap();
    let (plugin, _) = plugin_in(&dir).await;

    let reply = plugin.execute_command(&["status"]).await;
    assert_eq!(reply[0].plain_text(), "=== Greeter Status ===");
    assert_eq!(reply[5].plain_text(), "Welcome Message: *** WELCOME TO THE SERVER! ***");

    let empty: [&str; 0] = [];
    let usage = plugin.execute_command(&empty).await;
    assert_eq!(usage[0].plain_text(), "Greeter Commands:");
}
