//! Integration tests for the lobby registry.

use std::time::Duration;

use scribble_lobby::{LobbyConfig, Registry, RegistryConfig, RegistryError};
use scribble_presence::Handles;
use tokio::sync::mpsc;

fn config() -> RegistryConfig {
    RegistryConfig {
        idle_timeout: Duration::from_secs(30),
        reap_interval: Duration::from_secs(1),
        lobby: LobbyConfig::default(),
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_then_join_with_password() {
    let registry = Registry::spawn(config());
    let lobby = registry.create_lobby("trivia", "pw", "alice").await.unwrap();
    assert_eq!(lobby.host().as_deref(), Some("alice"));

    let (joined, name) = registry
        .join_lobby("trivia", "pw", "bob", Handles::default())
        .await
        .unwrap();
    assert_eq!(name, "bob");
    assert_eq!(joined.name(), "trivia");
    assert_eq!(lobby.presence_names(), ["alice", "bob"]);

    assert!(matches!(
        registry.join_lobby("trivia", "nope", "carol", Handles::default()).await,
        Err(RegistryError::Unauthorized(_))
    ));
    assert!(matches!(
        registry.join_lobby("quiz", "pw", "carol", Handles::default()).await,
        Err(RegistryError::NotFound(_))
    ));
    assert_eq!(lobby.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_name_conflicts() {
    let registry = Registry::spawn(config());
    registry.create_lobby("trivia", "pw", "alice").await.unwrap();
    assert!(matches!(
        registry.create_lobby("trivia", "other", "bob").await,
        Err(RegistryError::Conflict(_))
    ));
    assert_eq!(registry.names().await, ["trivia"]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_creates_have_one_winner() {
    let registry = Registry::spawn(config());
    let (a, b) = tokio::join!(
        registry.create_lobby("trivia", "pw", "alice"),
        registry.create_lobby("trivia", "pw", "bob"),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_emptied_lobby_is_deleted() {
    let registry = Registry::spawn(config());
    let lobby = registry.create_lobby("trivia", "pw", "alice").await.unwrap();

    lobby.remove_presence("alice").await.unwrap();
    settle().await;

    assert!(lobby.is_closed());
    assert!(matches!(
        registry.get_lobby("trivia").await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(registry.is_empty().await);

    // The name is free again.
    registry.create_lobby("trivia", "pw", "bob").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_goes_through_password() {
    let registry = Registry::spawn(config());
    registry.create_lobby("trivia", "pw", "alice").await.unwrap();
    let (lobby, _) = registry
        .join_lobby("trivia", "pw", "bob", Handles::default())
        .await
        .unwrap();
    lobby.presence("bob").unwrap().award(300);
    lobby.disconnect("bob", false).unwrap();

    let (chat, _chat_rx) = mpsc::unbounded_channel();
    assert!(matches!(
        registry
            .reconnect("trivia", "wrong", "bob", Handles::chat(chat.clone()))
            .await,
        Err(RegistryError::Unauthorized(_))
    ));

    let (_, bob) = registry
        .reconnect("trivia", "pw", "bob", Handles::chat(chat))
        .await
        .unwrap();
    assert_eq!(bob.score(), 300);
    assert!(bob.has_chat());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_everything() {
    let registry = Registry::spawn(config());
    let lobby = registry.create_lobby("trivia", "pw", "alice").await.unwrap();

    registry.shutdown();
    settle().await;

    assert!(lobby.is_closed());
    assert!(registry.is_empty().await);
    assert!(matches!(
        registry.create_lobby("quiz", "pw", "bob").await,
        Err(RegistryError::Unavailable)
    ));
}
