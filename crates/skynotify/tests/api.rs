mod common;

use http::StatusCode;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use skynotify::auth::PUBLIC_APPVIEW_URL;
use skynotify::error::{ApiError, AuthError, TransportError};
use skynotify::{PreferencesApi, ProfileApi, XrpcApi};
use skynotify_common::{Include, NotificationPreferences};
use url::Url;

use common::{MockClient, session};

#[tokio::test]
async fn put_preferences_posts_the_document() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    let mut doc = NotificationPreferences::default();
    doc.reply.include = Include::Follows;
    doc.verified.push = false;

    client
        .push_json(
            StatusCode::OK,
            json!({ "preferences": serde_json::to_value(&doc).unwrap() }),
        )
        .await;
    api.put_preferences(&session(), &doc).await.unwrap();

    let requests = client.requests().await;
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method(), http::Method::POST);
    assert_eq!(
        req.uri().to_string(),
        "https://pds.example/xrpc/app.bsky.notification.putPreferencesV2"
    );
    assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer acc1");
    assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert!(req.headers().get("atproto-proxy").is_none());

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
    assert_eq!(body, serde_json::to_value(&doc).unwrap());
    assert_eq!(body["reply"]["include"], "follows");
    assert_eq!(body["verified"], json!({ "list": true, "push": false }));
}

#[tokio::test]
async fn proxy_header_is_sent_when_configured() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone()).with_proxy("did:web:api.bsky.app#bsky_appview");
    client
        .push_json(StatusCode::OK, json!({ "preferences": {} }))
        .await;
    api.put_preferences(&session(), &NotificationPreferences::default())
        .await
        .unwrap();

    let requests = client.requests().await;
    assert_eq!(
        requests[0].headers().get("atproto-proxy").unwrap(),
        "did:web:api.bsky.app#bsky_appview"
    );
}

#[tokio::test]
async fn get_profile_queries_by_did() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    client
        .push_json(
            StatusCode::OK,
            json!({
                "did": "did:plc:alice",
                "handle": "alice.bsky.social",
                "displayName": "Alice",
                "avatar": "https://cdn.example/alice.jpg",
                "followersCount": 12
            }),
        )
        .await;

    let profile = api
        .get_profile(&session().pds, "did:plc:alice", Some(&session()))
        .await
        .unwrap();
    assert_eq!(profile.label(), "Alice");
    assert_eq!(profile.avatar.as_deref(), Some("https://cdn.example/alice.jpg"));

    let requests = client.requests().await;
    let req = &requests[0];
    assert_eq!(req.method(), http::Method::GET);
    assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer acc1");
    let url = Url::parse(&req.uri().to_string()).unwrap();
    assert_eq!(url.path(), "/xrpc/app.bsky.actor.getProfile");
    let actor = url
        .query_pairs()
        .find(|(k, _)| k == "actor")
        .map(|(_, v)| v.into_owned());
    assert_eq!(actor.as_deref(), Some("did:plc:alice"));
}

#[tokio::test]
async fn profile_without_display_name_falls_back_to_handle() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    client
        .push_json(
            StatusCode::OK,
            json!({ "did": "did:plc:alice", "handle": "alice.bsky.social", "displayName": "  " }),
        )
        .await;
    let profile = api
        .get_profile(&session().pds, "did:plc:alice", Some(&session()))
        .await
        .unwrap();
    assert_eq!(profile.label(), "alice.bsky.social");
}

#[tokio::test]
async fn expired_token_maps_to_auth_error() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    client
        .push_json(
            StatusCode::BAD_REQUEST,
            json!({ "error": "ExpiredToken", "message": "Token has expired" }),
        )
        .await;
    let err = api
        .put_preferences(&session(), &NotificationPreferences::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::TokenExpired)));
}

#[tokio::test]
async fn xrpc_error_body_is_kept() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    client
        .push_json(
            StatusCode::BAD_REQUEST,
            json!({ "error": "InvalidRequest", "message": "Input/like must be an object" }),
        )
        .await;
    let err = api
        .put_preferences(&session(), &NotificationPreferences::default())
        .await
        .unwrap_err();
    match err {
        ApiError::Xrpc(generic) => {
            assert_eq!(generic.error, "InvalidRequest");
            assert_eq!(generic.nsid, "app.bsky.notification.putPreferencesV2");
            assert_eq!(generic.http_status, StatusCode::BAD_REQUEST);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_http_error() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone());
    client
        .push(
            http::Response::builder()
                .status(StatusCode::BAD_GATEWAY)
                .body(b"upstream down".to_vec())
                .unwrap(),
        )
        .await;
    let err = api
        .get_profile(&session().pds, "did:plc:alice", Some(&session()))
        .await
        .unwrap_err();
    match err {
        ApiError::Http(e) => {
            assert_eq!(e.status, StatusCode::BAD_GATEWAY);
            assert_eq!(e.body.as_deref(), Some(&b"upstream down"[..]));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn anonymous_profile_read_has_no_credentials() {
    let client = MockClient::default();
    let api = XrpcApi::new(client.clone()).with_proxy("did:web:api.bsky.app#bsky_appview");
    client
        .push_json(
            StatusCode::OK,
            json!({ "did": "did:plc:bob", "handle": "bob.bsky.social" }),
        )
        .await;

    let profile = api
        .get_profile(&PUBLIC_APPVIEW_URL, "bob.bsky.social", None)
        .await
        .unwrap();
    assert_eq!(profile.handle, "bob.bsky.social");

    let requests = client.requests().await;
    let req = &requests[0];
    assert!(
        req.uri()
            .to_string()
            .starts_with("https://public.api.bsky.app/xrpc/app.bsky.actor.getProfile?")
    );
    assert!(req.headers().get(AUTHORIZATION).is_none());
    assert!(req.headers().get("atproto-proxy").is_none());
}

#[tokio::test]
async fn refused_connection_is_a_connect_error() {
    let api = XrpcApi::new(reqwest::Client::new());
    let mut unreachable = session();
    unreachable.pds = Url::parse("http://127.0.0.1:1").unwrap();

    let err = api
        .put_preferences(&unreachable, &NotificationPreferences::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ApiError::Transport(TransportError::Connect(_))),
        "unexpected error {err:?}"
    );
}
