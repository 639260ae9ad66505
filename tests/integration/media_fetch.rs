//! Integration tests for media fetching

use super::*;
use chrono::{Duration, Utc};
use instagram_integration::{
    Credential, CredentialStore, FetchOutcome, InstagramError, MediaFetchPipeline, MediaType,
    NetworkError,
};
use std::time::Duration as StdDuration;
use wiremock::matchers::{method, path, query_param};
use wiremock::Mock;

const MEDIA_FIELDS: &str = "media_url,thumbnail_url,timestamp,media_type,caption";
const CHILDREN_FIELDS: &str = "media_url,thumbnail_url,timestamp,media_type";

fn pipeline(server: &MockServer) -> MediaFetchPipeline<ReqwestHttpTransport> {
    MediaFetchPipeline::new(Arc::new(ReqwestHttpTransport::new().unwrap()), server.uri())
}

fn credential() -> Credential {
    Credential::new("tok", Utc::now() + Duration::hours(1))
}

#[tokio::test]
async fn test_album_children_inherit_caption() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .and(query_param("fields", MEDIA_FIELDS))
        .and(query_param("access_token", "tok"))
        .respond_with(media_page(vec![
            media_item("1", "IMAGE", None),
            media_item("2", "CAROUSEL_ALBUM", Some("hi")),
        ]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/children"))
        .and(query_param("fields", CHILDREN_FIELDS))
        .and(query_param("access_token", "tok"))
        .respond_with(media_page(vec![media_item("2a", "IMAGE", None)]))
        .expect(1)
        .mount(&server)
        .await;

    let media = pipeline(&server).fetch_media(&credential()).await.unwrap();

    assert_eq!(media.len(), 2);
    assert_eq!(media[0].id, "1");
    assert!(media[0].children.is_empty());

    let album = &media[1];
    assert_eq!(album.media_type, MediaType::Album);
    assert_eq!(album.children.len(), 1);
    assert_eq!(album.children[0].id, "2a");
    assert_eq!(album.children[0].caption.as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_output_follows_root_order() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![
            media_item("slow", "CAROUSEL_ALBUM", Some("first")),
            media_item("plain", "VIDEO", None),
            media_item("fast", "CAROUSEL_ALBUM", Some("second")),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow/children"))
        .respond_with(
            media_page(vec![
                media_item("slow-1", "IMAGE", None),
                media_item("slow-2", "IMAGE", None),
                media_item("slow-3", "VIDEO", None),
            ])
            .set_delay(StdDuration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast/children"))
        .respond_with(media_page(vec![media_item("fast-1", "IMAGE", None)]))
        .mount(&server)
        .await;

    let media = pipeline(&server).fetch_media(&credential()).await.unwrap();

    let ids: Vec<&str> = media.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["slow", "plain", "fast"]);

    let slow_children: Vec<&str> = media[0].children.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(slow_children, vec!["slow-1", "slow-2", "slow-3"]);
    assert!(media[0]
        .children
        .iter()
        .all(|c| c.caption.as_deref() == Some("first")));
    assert_eq!(media[2].children[0].caption.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_single_branch_failure_fails_fetch() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![
            media_item("ok", "CAROUSEL_ALBUM", None),
            media_item("broken", "CAROUSEL_ALBUM", None),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok/children"))
        .respond_with(media_page(vec![media_item("ok-1", "IMAGE", None)]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken/children"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "Unsupported get request.",
                "type": "GraphMethodException",
                "code": 100,
                "fbtrace_id": "AbC"
            }
        })))
        .mount(&server)
        .await;

    match pipeline(&server).fetch_media(&credential()).await {
        Err(InstagramError::Api(error)) => {
            assert_eq!(error.code, 100);
            assert_eq!(error.error_type, "GraphMethodException");
            assert_eq!(error.fbtrace_id, "AbC");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unstructured_error_body() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        pipeline(&server).fetch_media(&credential()).await,
        Err(InstagramError::Network(NetworkError::BadServerResponse { status: 503 }))
    ));
}

#[tokio::test]
async fn test_paging_is_not_followed() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [media_item("1", "IMAGE", None)],
            "paging": {
                "cursors": {"after": "QVFI", "before": "QVFH"},
                "next": format!("{}/me/media?after=QVFI", server.uri())
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let media = pipeline(&server).fetch_media(&credential()).await.unwrap();
    assert_eq!(media.len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_published_media() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(media_page(vec![media_item("1", "IMAGE", None)]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/media"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, store, _) = test_client(ClientOptions::default(), MockAuthenticationSurface::new());
    CredentialStore::new(store, "svc", "creds")
        .save(&credential())
        .await;
    client.configure(Some(config_for(&server))).await;
    assert_eq!(client.media().len(), 1);

    let outcome = client.fetch(true).await;
    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    assert_eq!(client.media().len(), 1);
}
