use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockito::{Matcher, Mock, ServerGuard};
use yt_live_chat::{
    ChatEvent, LiveChat, LiveChatConfig, PollerState, ResolutionState, YouTubeError,
};

type EventLog = Arc<Mutex<Vec<ChatEvent>>>;

fn recorder() -> (EventLog, impl Fn(ChatEvent) + Send + Sync + 'static) {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event| sink.lock().unwrap().push(event))
}

fn config(server: &ServerGuard) -> LiveChatConfig {
    LiveChatConfig::default().with_api_base(server.url())
}

async fn mock_search(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channelId".into(), "UC123".into()),
            Matcher::UrlEncoded("eventType".into(), "live".into()),
        ]))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_video(server: &mut ServerGuard, video_id: &str, chat_id: Option<&str>) -> Mock {
    let body = match chat_id {
        Some(chat_id) => format!(
            r#"{{"items":[{{"liveStreamingDetails":{{"activeLiveChatId":"{}"}}}}]}}"#,
            chat_id
        ),
        None => r#"{"items":[]}"#.to_string(),
    };
    server
        .mock("GET", "/videos")
        .match_query(Matcher::UrlEncoded("id".into(), video_id.into()))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_messages(server: &mut ServerGuard, chat_id: &str, body: &str) -> Mock {
    server
        .mock("GET", "/liveChat/messages")
        .match_query(Matcher::UrlEncoded("liveChatId".into(), chat_id.into()))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

fn count(events: &EventLog, pred: impl Fn(&ChatEvent) -> bool) -> usize {
    events.lock().unwrap().iter().filter(|e| pred(e)).count()
}

#[tokio::test]
async fn resolves_and_polls_new_messages() {
    let mut server = mockito::Server::new_async().await;
    let _search = mock_search(
        &mut server,
        r#"{"items":[{"id":{"videoId":"A"}},{"id":{"videoId":"B"}},{"id":{"videoId":"C"}}]}"#,
    )
    .await;
    let _a = mock_video(&mut server, "A", Some("chat-A")).await;
    let _b = mock_video(&mut server, "B", None).await;
    let _c = mock_video(&mut server, "C", Some("chat-C")).await;
    let _ma = mock_messages(
        &mut server,
        "chat-A",
        r#"{"items":[{"id":"a1","snippet":{"type":"textMessageEvent","publishedAt":"2024-01-01T00:00:01Z","displayMessage":"first"}}]}"#,
    )
    .await;
    let _mc = mock_messages(
        &mut server,
        "chat-C",
        r#"{"items":[{"id":"c1","snippet":{"type":"textMessageEvent","publishedAt":"2024-01-01T00:00:02Z","displayMessage":"second"}}]}"#,
    )
    .await;

    let (events, callback) = recorder();
    let chat = LiveChat::with_config("UC123", "test-key", config(&server), callback).unwrap();

    let chat_ids = chat.wait_resolved().await.unwrap();
    assert_eq!(chat_ids, vec!["chat-A".to_string(), "chat-C".to_string()]);
    assert_eq!(
        chat.live_ids(),
        Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    );
    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Ready)), 1);
    assert_eq!(
        count(&events, |e| matches!(
            e,
            ChatEvent::Error(YouTubeError::ChatNotFound(id)) if id == "B"
        )),
        1
    );

    chat.start(Duration::from_millis(20)).unwrap();
    assert!(chat.is_polling());
    tokio::time::sleep(Duration::from_millis(250)).await;
    chat.stop();
    assert_eq!(chat.poller_state(), PollerState::Idle);

    let messages: Vec<String> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            ChatEvent::Message { item, .. } => item["id"].as_str().map(str::to_string),
            _ => None,
        })
        .collect();
    assert_eq!(messages, vec!["a1".to_string(), "c1".to_string()]);
}

#[tokio::test]
async fn no_live_broadcast_never_becomes_ready() {
    let mut server = mockito::Server::new_async().await;
    let _search = mock_search(&mut server, r#"{"items":[]}"#).await;

    let (events, callback) = recorder();
    let chat = LiveChat::with_config("UC123", "test-key", config(&server), callback).unwrap();

    let err = chat.wait_resolved().await.unwrap_err();
    assert!(matches!(err, YouTubeError::LiveNotFound));
    assert!(matches!(chat.resolution_state(), ResolutionState::Failed(_)));
    assert_eq!(chat.live_ids(), None);

    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Error(_))), 1);
    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Ready)), 0);
}

#[tokio::test]
async fn stages_out_of_order_report_invalid_state() {
    let mut server = mockito::Server::new_async().await;
    let messages = server
        .mock("GET", "/liveChat/messages")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (events, callback) = recorder();
    let chat =
        LiveChat::new_deferred("UC123", "test-key", config(&server), callback).unwrap();
    assert!(matches!(chat.resolution_state(), ResolutionState::Unresolved));

    let err = chat.resolve_chat_ids().await.unwrap_err();
    assert!(matches!(err, YouTubeError::LiveIdsInvalid));

    let err = chat.fetch_all_chats().await.unwrap_err();
    assert!(matches!(err, YouTubeError::ChatIdsInvalid));

    messages.assert_async().await;
    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Ready)), 0);
    assert_eq!(
        count(&events, |e| matches!(e, ChatEvent::Json { .. } | ChatEvent::Message { .. })),
        0
    );
}

#[tokio::test]
async fn transport_error_is_reported_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let _search = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"errors":[{"reason":"keyInvalid"}]}}"#)
        .create_async()
        .await;

    let (events, callback) = recorder();
    let chat = LiveChat::new_deferred("UC123", "bad-key", config(&server), callback).unwrap();

    let err = chat.resolve().await.unwrap_err();
    match err {
        YouTubeError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("keyInvalid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Error(_))), 1);
}

#[tokio::test]
async fn restart_keeps_watermark() {
    let mut server = mockito::Server::new_async().await;
    let _search = mock_search(&mut server, r#"{"items":[{"id":{"videoId":"A"}}]}"#).await;
    let _a = mock_video(&mut server, "A", Some("chat-A")).await;
    let _m = mock_messages(
        &mut server,
        "chat-A",
        r#"{"items":[{"id":"a1","snippet":{"publishedAt":"2024-01-01T00:00:01Z"}}]}"#,
    )
    .await;

    let (events, callback) = recorder();
    let chat = LiveChat::new_deferred("UC123", "test-key", config(&server), callback).unwrap();
    chat.resolve().await.unwrap();

    chat.start(Duration::from_secs(3600)).unwrap();
    assert!(matches!(
        chat.start(Duration::from_secs(3600)),
        Err(YouTubeError::PollerAlreadyRunning)
    ));
    assert_eq!(chat.fetch_all_chats().await.unwrap(), 1);
    chat.stop();

    chat.start(Duration::from_secs(3600)).unwrap();
    assert_eq!(chat.fetch_all_chats().await.unwrap(), 0);
    chat.stop();

    assert_eq!(
        count(&events, |e| matches!(e, ChatEvent::Message { .. })),
        1
    );
    assert_eq!(count(&events, |e| matches!(e, ChatEvent::Json { .. })), 2);
}
