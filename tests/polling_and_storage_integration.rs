use rinkside::config::{FantasyConfig, NewsConfig};
use rinkside::constants::storage_keys;
use rinkside::data_fetcher::{spawn_live_scoreboard_poller, spawn_news_poller};
use rinkside::{
    ApiManager, Config, FileStore, KeyValueStore, LocalSession, MemoryStore, NewsQuery,
    NewsType, RefreshMessage, SessionUser,
};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let base = server.uri();
    Config {
        nhl_api_base: base.clone(),
        http_max_retries: 0,
        fantasy: FantasyConfig {
            api_base: base.clone(),
            auth_url: format!("{base}/oauth2/request_auth"),
            token_url: format!("{base}/oauth2/get_token"),
            client_id: Some("client-123".to_string()),
            ..FantasyConfig::default()
        },
        news: NewsConfig {
            rotowire_api_base: base.clone(),
            rotowire_api_key: None,
            espn_api_base: base.clone(),
            news_api_base: base,
            news_api_key: None,
        },
        ..Config::default()
    }
}

async fn next_message(receiver: &mut tokio::sync::mpsc::Receiver<RefreshMessage>) -> RefreshMessage {
    tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("poller should publish within the timeout")
        .expect("poller channel closed early")
}

#[tokio::test]
async fn test_scoreboard_poller_publishes_until_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/score/now"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentDate": "2024-11-02",
            "games": [{
                "id": 2024020150,
                "gameState": "LIVE",
                "awayTeam": {"abbrev": "VAN", "score": 1},
                "homeTeam": {"abbrev": "EDM", "score": 2},
                "periodDescriptor": {"number": 2}
            }]
        })))
        .mount(&server)
        .await;

    let manager = ApiManager::start(config_for(&server), Arc::new(MemoryStore::new())).unwrap();
    let mut poller = spawn_live_scoreboard_poller(manager.clone(), Duration::from_millis(20));

    match next_message(&mut poller.receiver).await {
        RefreshMessage::ScoreboardUpdated(scoreboard) => {
            assert_eq!(scoreboard.games.len(), 1);
            assert_eq!(scoreboard.live_games().count(), 1);
        }
        other => panic!("unexpected message: {other:?}"),
    }

    poller.shutdown().await;
    manager.shutdown().await;
}

#[tokio::test]
async fn test_news_poller_reports_fallback_when_sources_are_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let manager = ApiManager::start(config_for(&server), Arc::new(MemoryStore::new())).unwrap();
    let query = NewsQuery {
        limit: 5,
        news_type: Some(NewsType::Injury),
        team: None,
    };
    let mut poller = spawn_news_poller(manager.clone(), query, Duration::from_millis(20));

    match next_message(&mut poller.receiver).await {
        RefreshMessage::NewsUpdated(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].team.as_deref(), Some("TOR"));
        }
        other => panic!("unexpected message: {other:?}"),
    }

    poller.shutdown().await;
    manager.shutdown().await;
}

#[tokio::test]
async fn test_scoreboard_poller_reports_errors_and_keeps_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/score/now"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let manager = ApiManager::start(config_for(&server), Arc::new(MemoryStore::new())).unwrap();
    let mut poller = spawn_live_scoreboard_poller(manager.clone(), Duration::from_millis(10));

    for _ in 0..2 {
        assert!(matches!(
            next_message(&mut poller.receiver).await,
            RefreshMessage::RefreshError(_)
        ));
    }

    poller.shutdown().await;
    manager.shutdown().await;
}

#[tokio::test]
async fn test_tokens_persist_across_restarts() {
    let dir = tempdir().unwrap();
    let storage_path = dir.path().join("storage.json");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/get_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "persisted-access",
            "refresh_token": "persisted-refresh"
        })))
        .mount(&server)
        .await;

    {
        let store = Arc::new(FileStore::open(&storage_path).unwrap());
        let manager = ApiManager::start(config_for(&server), store).unwrap();
        manager.complete_fantasy_login("code-1", None).await.unwrap();
        manager.shutdown().await;
    }

    let reopened = Arc::new(FileStore::open(&storage_path).unwrap());
    assert_eq!(
        reopened
            .get(storage_keys::FANTASY_ACCESS_TOKEN)
            .unwrap()
            .as_deref(),
        Some("persisted-access")
    );
    let manager = ApiManager::start(config_for(&server), reopened).unwrap();
    assert!(manager.is_fantasy_authenticated());

    manager.fantasy_logout().await.unwrap();
    manager.shutdown().await;

    let after_logout = FileStore::open(&storage_path).unwrap();
    assert_eq!(after_logout.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap(), None);
}

#[test]
fn test_local_session_shares_the_store() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::open(dir.path().join("storage.json")).unwrap());
    let session = LocalSession::new(store.clone());
    let user = SessionUser {
        id: "u1".to_string(),
        username: "goalie_dad".to_string(),
        email: None,
    };

    session.login("local-token", &user).unwrap();
    let restored = LocalSession::new(store).restore().unwrap();
    assert_eq!(restored, Some(user));
}

#[tokio::test]
#[serial]
async fn test_env_overrides_apply_to_file_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    tokio::fs::write(
        &config_path,
        "nhl_api_base = \"https://file.example.com/v1\"\n",
    )
    .await
    .unwrap();

    let mut config = Config::load_from_path(&config_path.to_string_lossy())
        .await
        .unwrap();
    assert_eq!(config.nhl_api_base, "https://file.example.com/v1");

    unsafe {
        std::env::set_var("RINKSIDE_NHL_API_BASE", "https://env.example.com/v1");
    }
    config.apply_env_overrides(|name| std::env::var(name).ok());
    unsafe {
        std::env::remove_var("RINKSIDE_NHL_API_BASE");
    }

    assert_eq!(config.nhl_api_base, "https://env.example.com/v1");
    assert!(config.validate().is_ok());
}
