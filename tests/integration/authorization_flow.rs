//! Integration tests for sign-in

use super::*;
use instagram_integration::{
    AuthorizationCodeFlow, AuthorizationCodeFlowImpl, AuthorizationError, AuthorizationPhase,
    CredentialStore, InMemoryStateManager, InstagramError, PresentationError, ProtocolError,
    SecureStore,
};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::Mock;

fn query(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn test_authorize_exchanges_code_and_persists() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/abc"))
        .respond_with(token_response("fresh-token", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let surface = MockAuthenticationSurface::echoing_state();
    surface.push_reply(Ok("myapp://authenticated?code=abc".to_string()));
    let (client, store, surface) = test_client(
        ClientOptions {
            fetch_automatically: false,
            ..ClientOptions::default()
        },
        surface,
    );
    client.configure(Some(config_for(&server))).await;

    client.authorize().await.unwrap();

    assert!(client.is_authenticated());
    assert_eq!(client.phase(), AuthorizationPhase::Authenticated);

    let presented = surface.get_presented();
    assert_eq!(presented.len(), 1);
    let (url, scheme) = &presented[0];
    assert_eq!(scheme, "myapp");
    assert_eq!(url.path(), "/oauth/authorize");
    let params = query(url);
    assert_eq!(params[0], ("client_id".to_string(), "x".to_string()));
    assert_eq!(
        params[1],
        ("redirect_uri".to_string(), format!("{}/authenticated", server.uri()))
    );
    assert_eq!(
        params[2],
        ("scope".to_string(), "user_profile,user_media".to_string())
    );
    assert_eq!(params[3], ("response_type".to_string(), "code".to_string()));
    assert_eq!(params[4].0, "state");

    let raw = store.load("svc", "creds").await.unwrap().unwrap();
    let record: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(record["accessToken"], "fresh-token");
    assert!(record["expires"].is_string());

    let persisted = CredentialStore::new(store.clone(), "svc", "creds")
        .load()
        .await
        .unwrap();
    assert_eq!(persisted.access_token(), "fresh-token");
}

#[tokio::test]
async fn test_authorization_urls_differ_only_in_state() {
    let server = setup_mock_server().await;
    let flow = AuthorizationCodeFlowImpl::new(
        config_for(&server),
        Arc::new(ReqwestHttpTransport::new().unwrap()),
        Arc::new(InMemoryStateManager::new()),
        Arc::new(MockAuthenticationSurface::new()),
    );

    let first = flow.build_authorization_url().unwrap();
    let second = flow.build_authorization_url().unwrap();

    assert_ne!(first.state, second.state);
    let without_state = |url: &Url| {
        query(url)
            .into_iter()
            .filter(|(k, _)| k != "state")
            .collect::<Vec<_>>()
    };
    assert_eq!(without_state(&first.url), without_state(&second.url));
}

#[tokio::test]
async fn test_exchange_failure_surfaces_status() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let surface = MockAuthenticationSurface::echoing_state();
    surface.push_reply(Ok("myapp://authenticated?code=abc".to_string()));
    let (client, store, _) = test_client(ClientOptions::default(), surface);
    client.configure(Some(config_for(&server))).await;

    match client.authorize().await {
        Err(InstagramError::Protocol(ProtocolError::UnexpectedStatus { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "backend down");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!client.is_authenticated());
    assert_eq!(client.phase(), AuthorizationPhase::Failed);
    assert!(store.load("svc", "creds").await.unwrap().is_none());
}

#[tokio::test]
async fn test_forged_state_is_rejected_before_exchange() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/abc"))
        .respond_with(token_response("t", 3600))
        .expect(0)
        .mount(&server)
        .await;

    let surface = MockAuthenticationSurface::new();
    surface.push_reply(Ok("myapp://authenticated?code=abc&state=forged".to_string()));
    let (client, _, _) = test_client(ClientOptions::default(), surface);
    client.configure(Some(config_for(&server))).await;

    let err = client.authorize().await.unwrap_err();
    assert!(matches!(
        err,
        InstagramError::Authorization(AuthorizationError::StateMismatch { .. })
    ));
    assert!(err.needs_reauth());
}

#[tokio::test]
async fn test_denied_authorization() {
    let server = setup_mock_server().await;
    let surface = MockAuthenticationSurface::echoing_state();
    surface.push_reply(Ok(
        "myapp://authenticated?error=access_denied&error_description=The+user+denied+your+request."
            .to_string(),
    ));
    let (client, _, _) = test_client(ClientOptions::default(), surface);
    client.configure(Some(config_for(&server))).await;

    match client.authorize().await {
        Err(InstagramError::Authorization(AuthorizationError::AccessDenied {
            error,
            error_description,
        })) => {
            assert_eq!(error, "access_denied");
            assert_eq!(
                error_description.as_deref(),
                Some("The user denied your request.")
            );
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_presentation() {
    let server = setup_mock_server().await;
    let surface = MockAuthenticationSurface::new();
    surface.push_reply(Err(PresentationError::Cancelled));
    let (client, _, _) = test_client(ClientOptions::default(), surface);
    client.configure(Some(config_for(&server))).await;

    assert!(matches!(
        client.authorize().await,
        Err(InstagramError::Authorization(AuthorizationError::Cancelled))
    ));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_channel_surface_end_to_end() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/from-host"))
        .respond_with(token_response("host-token", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .and(query_param("access_token", "host-token"))
        .respond_with(media_page(vec![media_item("1", "IMAGE", Some("hello"))]))
        .expect(1)
        .mount(&server)
        .await;

    let (client, mut requests) = InstagramClient::new(ClientOptions::default()).unwrap();
    client.configure(Some(config_for(&server))).await;

    let host = tokio::spawn(async move {
        let pending = requests.recv().await.expect("authorization request");
        assert_eq!(pending.callback_scheme, "myapp");
        let state = pending
            .url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        pending.complete(format!(
            "myapp://authenticated?code=from-host&state={}#_",
            state
        ));
    });

    client.authorize().await.unwrap();
    host.await.unwrap();

    assert!(client.is_authenticated());
    assert!(client.is_fetch_scheduled());
    let media = client.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].caption.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_channel_surface_without_host() {
    let server = setup_mock_server().await;
    let (client, requests) = InstagramClient::new(ClientOptions::default()).unwrap();
    client.configure(Some(config_for(&server))).await;
    drop(requests);

    assert!(matches!(
        client.authorize().await,
        Err(InstagramError::Authorization(AuthorizationError::ContextDied))
    ));
}
