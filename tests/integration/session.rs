//! Integration tests for session lifecycle

use super::*;
use chrono::{Duration, Utc};
use instagram_integration::{
    Credential, CredentialStore, FetchOutcome, InstagramError, MockSecureStore, SecureStore,
    TokenError,
};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::Mock;

#[tokio::test]
async fn test_expired_credential_is_purged_on_load() {
    let store = Arc::new(InMemorySecureStore::new());
    let record = serde_json::json!({
        "accessToken": "t",
        "expires": (Utc::now() - Duration::seconds(1)).to_rfc3339(),
    });
    store
        .save("svc", "creds", serde_json::to_vec(&record).unwrap())
        .await
        .unwrap();

    let credentials = CredentialStore::new(store.clone(), "svc", "creds");
    assert!(credentials.load().await.is_none());
    assert!(store.load("svc", "creds").await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_credential_does_not_authenticate() {
    let server = setup_mock_server().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, store, _) = test_client(ClientOptions::default(), MockAuthenticationSurface::new());
    CredentialStore::new(store.clone(), "svc", "creds")
        .save(&Credential::new("old", Utc::now() - Duration::minutes(5)))
        .await;

    client.configure(Some(config_for(&server))).await;

    assert!(!client.is_authenticated());
    assert!(store.load("svc", "creds").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stored_credential_restores_session() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .and(query_param("access_token", "stored"))
        .respond_with(media_page(vec![
            media_item("1", "IMAGE", Some("a")),
            media_item("2", "VIDEO", Some("b")),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store, _) = test_client(ClientOptions::default(), MockAuthenticationSurface::new());
    CredentialStore::new(store, "svc", "creds")
        .save(&Credential::new("stored", Utc::now() + Duration::hours(1)))
        .await;

    let mut media = client.subscribe_media();
    client.configure(Some(config_for(&server))).await;

    assert!(client.is_authenticated());
    assert!(media.has_changed().unwrap());
    assert_eq!(media.borrow_and_update().len(), 2);
}

#[tokio::test]
async fn test_config_replacement_clears_media() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![media_item("1", "IMAGE", None)]))
        .mount(&server)
        .await;

    let (client, store, _) = test_client(ClientOptions::default(), MockAuthenticationSurface::new());
    CredentialStore::new(store, "svc", "creds")
        .save(&Credential::new("stored", Utc::now() + Duration::hours(1)))
        .await;

    let first = config_for(&server);
    client.configure(Some(first.clone())).await;
    assert_eq!(client.media().len(), 1);

    let mut second = first;
    second.client_id = "another-app".to_string();
    second.keychain_credentials_key = "other-creds".to_string();
    client.configure(Some(second)).await;

    assert!(client.media().is_empty());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_logout_purges_session() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![media_item("1", "IMAGE", None)]))
        .mount(&server)
        .await;

    let (client, store, _) = test_client(ClientOptions::default(), MockAuthenticationSurface::new());
    CredentialStore::new(store.clone(), "svc", "creds")
        .save(&Credential::new("stored", Utc::now() + Duration::hours(1)))
        .await;
    client.configure(Some(config_for(&server))).await;

    let mut authenticated = client.subscribe_authenticated();
    client.logout().await;

    assert!(authenticated.has_changed().unwrap());
    assert!(!*authenticated.borrow_and_update());
    assert!(client.media().is_empty());
    assert!(!client.is_fetch_scheduled());
    assert!(store.load("svc", "creds").await.unwrap().is_none());
}

#[tokio::test]
async fn test_storage_failure_is_not_fatal() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/abc"))
        .respond_with(token_response("t", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![media_item("1", "IMAGE", None)]))
        .mount(&server)
        .await;

    let store = Arc::new(MockSecureStore::new());
    store.set_should_fail(true);
    let surface = Arc::new(MockAuthenticationSurface::echoing_state());
    surface.push_reply(Ok("myapp://authenticated?code=abc".to_string()));
    let client = InstagramClient::with_components(
        Arc::new(ReqwestHttpTransport::new().unwrap()),
        store.clone(),
        surface,
        ClientOptions::default(),
    );
    client.configure(Some(config_for(&server))).await;

    client.authorize().await.unwrap();
    assert!(client.is_authenticated());
    assert_eq!(client.media().len(), 1);

    client.logout().await;
    assert!(!client.is_authenticated());
    assert!(store.get_save_history().is_empty());
}

#[tokio::test]
async fn test_expired_session_credential_fails_fetch() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/abc"))
        .respond_with(token_response("short", 0))
        .mount(&server)
        .await;
    Mock::given(any())
        .and(path("/me/media"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let surface = MockAuthenticationSurface::echoing_state();
    surface.push_reply(Ok("myapp://authenticated?code=abc".to_string()));
    let (client, _, _) = test_client(ClientOptions::default(), surface);
    client.configure(Some(config_for(&server))).await;
    client.authorize().await.unwrap();

    match client.fetch(true).await {
        FetchOutcome::Failed(InstagramError::Token(TokenError::MissingCredentials)) => {}
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_preview_client_never_dials() {
    let server = setup_mock_server().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _, _) = test_client(
        ClientOptions {
            preview: true,
            ..ClientOptions::default()
        },
        MockAuthenticationSurface::new(),
    );
    client.configure(Some(config_for(&server))).await;

    let media = client.media();
    assert_eq!(media.len(), 2);
    assert!(media
        .iter()
        .all(|m| m.caption.as_deref() == Some("Preview image comment")));

    assert!(matches!(client.fetch(false).await, FetchOutcome::Preview { count: 2 }));
    assert!(matches!(client.fetch(true).await, FetchOutcome::Preview { count: 2 }));
}

#[tokio::test]
async fn test_preview_constructor() {
    init_tracing();
    let client = InstagramClient::preview().await.unwrap();

    assert!(client.is_authenticated());
    assert_eq!(client.media().len(), 2);
    assert_eq!(
        client.config().map(|c| c.keychain_service_name),
        Some("myapp".to_string())
    );
}
