//! End-to-end relay behaviour over real WebSocket connections.

mod common;

use common::{TestClient, TestServer, TestServerOptions};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use yapple_proto::Frame;

#[tokio::test]
async fn text_is_relayed_as_message() {
    let server = TestServer::spawn(17101).await.expect("spawn");
    let mut u1 = server.connect_as("u1").await.expect("u1");
    let mut u2 = server.connect_as("u2").await.expect("u2");

    u1.text("u1", "u2", "hey").await.unwrap();

    let raw = u2.recv_raw().await.unwrap();
    assert_eq!(raw, r#"{"type":"message","from":"u1","content":"hey"}"#);
    u1.expect_silence().await;
}

#[tokio::test]
async fn every_device_of_the_recipient_receives() {
    let server = TestServer::spawn(17102).await.expect("spawn");
    let mut phone = server.connect_as("u2").await.unwrap();
    let mut laptop = server.connect_as("u2").await.unwrap();
    let mut u1 = server.connect_as("u1").await.unwrap();

    u1.text("u1", "u2", "both of you").await.unwrap();

    let expected = Frame::message("u1", "both of you").unwrap();
    assert_eq!(phone.recv().await.unwrap(), expected);
    assert_eq!(laptop.recv().await.unwrap(), expected);
}

#[tokio::test]
async fn offline_recipient_delivers_nothing_and_sender_stays_open() {
    let server = TestServer::spawn(17103).await.expect("spawn");
    let mut u1 = server.connect_as("u1").await.unwrap();

    u1.text("u1", "u3", "anyone?").await.unwrap();
    u1.expect_silence().await;

    // The socket is still usable.
    let mut u2 = server.connect_as("u2").await.unwrap();
    u1.text("u1", "u2", "still here").await.unwrap();
    assert_eq!(
        u2.recv().await.unwrap(),
        Frame::message("u1", "still here").unwrap()
    );
}

#[tokio::test]
async fn closed_tab_is_skipped_after_reconnect() {
    let server = TestServer::spawn(17104).await.expect("spawn");
    let old_tab = server.connect_as("u2").await.unwrap();
    old_tab.close().await.unwrap();
    tokio::time::sleep(common::client::SETTLE).await;

    let mut new_tab = server.connect_as("u2").await.unwrap();
    let mut u1 = server.connect_as("u1").await.unwrap();
    u1.text("u1", "u2", "welcome back").await.unwrap();

    assert_eq!(
        new_tab.recv().await.unwrap(),
        Frame::message("u1", "welcome back").unwrap()
    );
}

#[tokio::test]
async fn malformed_frames_are_dropped_silently_by_default() {
    let server = TestServer::spawn(17105).await.expect("spawn");
    let mut u1 = server.connect_as("u1").await.unwrap();
    let mut u2 = server.connect_as("u2").await.unwrap();

    u1.send_raw("not json").await.unwrap();
    u1.send_raw(r#"{"type":"text","from":"u1"}"#).await.unwrap();
    u1.send_raw(r#"{"type":"ping"}"#).await.unwrap();
    u1.expect_silence().await;
    u2.expect_silence().await;

    u1.text("u1", "u2", "after the noise").await.unwrap();
    assert_eq!(
        u2.recv().await.unwrap(),
        Frame::message("u1", "after the noise").unwrap()
    );
}

#[tokio::test]
async fn malformed_frame_gets_error_reply_when_enabled() {
    let options = TestServerOptions {
        reply_on_invalid_frame: true,
        ..Default::default()
    };
    let server = TestServer::spawn_with(17106, options).await.expect("spawn");
    let mut u1 = server.connect_as("u1").await.unwrap();

    u1.send_raw(r#"{"type":"text","from":"u1","content":"x"}"#)
        .await
        .unwrap();

    match u1.recv().await.unwrap() {
        Frame::Error { reason } => assert!(reason.starts_with("to:"), "{reason}"),
        other => panic!("expected error frame, got {other:?}"),
    }

    u1.send_binary(b"\x00\x01").await.unwrap();
    assert_eq!(
        u1.recv().await.unwrap(),
        Frame::error("$: frames must be sent as text").unwrap()
    );
}

#[tokio::test]
async fn frames_before_connect_are_still_relayed() {
    let server = TestServer::spawn(17107).await.expect("spawn");
    let mut u2 = server.connect_as("u2").await.unwrap();
    let mut anonymous = TestClient::connect(&server.url()).await.unwrap();

    anonymous.text("u1", "u2", "unannounced").await.unwrap();
    assert_eq!(
        u2.recv().await.unwrap(),
        Frame::message("u1", "unannounced").unwrap()
    );
}

#[tokio::test]
async fn relayed_messages_are_persisted() {
    let server = TestServer::spawn(17108).await.expect("spawn");
    let mut u1 = server.connect_as("u1").await.unwrap();
    let mut u2 = server.connect_as("u2").await.unwrap();

    u1.text("u1", "u2", "keep me").await.unwrap();
    u2.recv().await.unwrap();

    let url = format!("sqlite://{}", server.database_path().display());
    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    let rows: Vec<(String, String, String)> =
        sqlx::query_as("SELECT recipient, sender, content FROM messages")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![("u2".to_string(), "u1".to_string(), "keep me".to_string())]
    );
}

#[tokio::test]
async fn disallowed_origin_is_refused() {
    let options = TestServerOptions {
        allow_origins: vec!["https://yapple.app".to_string()],
        ..Default::default()
    };
    let server = TestServer::spawn_with(17109, options).await.expect("spawn");

    let mut request = server.url().into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://elsewhere.example".parse().unwrap());
    assert!(connect_async(request).await.is_err());

    let mut request = server.url().into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://yapple.app".parse().unwrap());
    assert!(connect_async(request).await.is_ok());
}
