//! End-to-end dispatch scenarios over an in-memory store, a stub platform
//! client, and a mocked completion service.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, Ordering},
};

use {async_trait::async_trait, sqlx::SqlitePool};

use {
    weft_commands::{AiCommand, CommandRegistry},
    weft_common::Role,
    weft_dispatch::Dispatcher,
    weft_openai::OpenAiClient,
    weft_platform::{
        CommandInvocation, CommandOption, CommandSpec, FileUpload, InboundEvent, InboundMessage,
        MessageAttachment, MessageRef, OptionValue, PlatformClient, RegisteredCommand, ReplyTarget,
    },
    weft_store::ConversationStore,
};

#[derive(Default)]
struct RecordingClient {
    next_id: AtomicI64,
    deferred: Mutex<Vec<(i64, bool)>>,
    texts: Mutex<Vec<(ReplyTarget, String)>>,
    files: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingClient {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(5000),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PlatformClient for RecordingClient {
    async fn defer(&self, invocation_id: i64, ephemeral: bool) -> weft_platform::Result<()> {
        self.deferred.lock().unwrap().push((invocation_id, ephemeral));
        Ok(())
    }

    async fn send_text(&self, target: &ReplyTarget, text: &str) -> weft_platform::Result<i64> {
        self.texts
            .lock()
            .unwrap()
            .push((target.clone(), text.to_string()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_file(
        &self,
        _target: &ReplyTarget,
        file: FileUpload,
        caption: Option<&str>,
    ) -> weft_platform::Result<i64> {
        self.files
            .lock()
            .unwrap()
            .push((file.filename, caption.map(String::from)));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn register_command(&self, _: i64, _: &CommandSpec) -> weft_platform::Result<i64> {
        Ok(0)
    }

    async fn list_commands(&self, _: i64) -> weft_platform::Result<Vec<RegisteredCommand>> {
        Ok(vec![])
    }

    async fn delete_command(&self, _: i64, _: i64) -> weft_platform::Result<()> {
        Ok(())
    }
}

async fn setup(server: &mockito::ServerGuard) -> (Dispatcher, Arc<RecordingClient>, ConversationStore) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    let store = ConversationStore::new(pool);
    store.init().await.unwrap();

    let openai = OpenAiClient::new(server.url(), None);
    let mut registry = CommandRegistry::new();
    registry.register(
        "ai",
        Box::new(AiCommand::new(openai, "gpt-3.5-turbo-1106", "gpt-3.5-turbo-1106")),
    );

    let client = Arc::new(RecordingClient::new());
    let dispatcher = Dispatcher::new(registry, store.clone(), client.clone());
    (dispatcher, client, store)
}

fn chat_body(content: &str) -> String {
    format!(r#"{{"choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}]}}"#)
}

async fn mock_classifier(server: &mut mockito::ServerGuard, kind: &str) {
    server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("Determine the given message".into()))
        .with_status(200)
        .with_body(chat_body(kind))
        .create_async()
        .await;
}

async fn mock_answer(server: &mut mockito::ServerGuard, content: &str) {
    server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("helpful assistant".into()))
        .with_status(200)
        .with_body(chat_body(content))
        .create_async()
        .await;
}

fn message(id: i64, content: &str, reply_to: Option<MessageRef>) -> InboundEvent {
    InboundEvent::Message(InboundMessage {
        id,
        channel_id: 1,
        author_id: 77,
        author_is_bot: false,
        content: content.to_string(),
        reply_to,
        attachments: vec![],
    })
}

#[tokio::test]
async fn free_text_fresh_invocation_persists_then_replies() {
    let mut server = mockito::Server::new_async().await;
    mock_classifier(&mut server, "chat").await;
    mock_answer(&mut server, "hello back").await;

    let (dispatcher, client, store) = setup(&server).await;
    dispatcher.handle_event(message(100, "ai hello", None)).await;

    // Seed turn persisted under a fresh conversation.
    let seed = store.find_turn(100).await.unwrap().unwrap();
    assert_eq!(seed.role, Role::User);
    assert_eq!(seed.content.as_deref(), Some("hello"));

    let conversation = store.find_conversation(seed.conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.command, "ai");

    // One reply, persisted as the assistant turn.
    let texts = client.texts.lock().unwrap().clone();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].1, "hello back");

    let turns = store.list_turns(seed.conversation_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content.as_deref(), Some("hello back"));
}

#[tokio::test]
async fn structured_draw_request_sends_one_attachment_and_no_assistant_turn() {
    let mut server = mockito::Server::new_async().await;
    mock_classifier(&mut server, "draw").await;
    let image_url = format!("{}/generated.png", server.url());
    server
        .mock("POST", "/v1/images/generations")
        .with_status(200)
        .with_body(format!(r#"{{"data":[{{"url":"{image_url}"}}]}}"#))
        .create_async()
        .await;
    server
        .mock("GET", "/generated.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body([0x89u8, 0x50, 0x4e, 0x47])
        .create_async()
        .await;

    let (dispatcher, client, store) = setup(&server).await;
    dispatcher
        .handle_event(InboundEvent::Invocation(CommandInvocation {
            id: 200,
            channel_id: 1,
            user_id: 77,
            name: "ai".into(),
            options: vec![
                CommandOption {
                    name: "message".into(),
                    value: OptionValue::Str("draw a cat".into()),
                },
                CommandOption {
                    name: "private".into(),
                    value: OptionValue::Bool(false),
                },
            ],
        }))
        .await;

    assert_eq!(client.deferred.lock().unwrap().as_slice(), &[(200, false)]);

    let files = client.files.lock().unwrap().clone();
    assert_eq!(files.len(), 1);
    assert!(files[0].0.ends_with(".png"));
    assert_eq!(files[0].1.as_deref(), Some("draw a cat"));

    // One conversation, one user turn, no assistant turn for images.
    let seed = store.find_turn(200).await.unwrap().unwrap();
    let turns = store.list_turns(seed.conversation_id).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
}

#[tokio::test]
async fn reply_to_assistant_turn_continues_the_conversation() {
    let mut server = mockito::Server::new_async().await;
    // The classifier must never run for a continuation.
    server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("Determine the given message".into()))
        .expect(0)
        .create_async()
        .await;
    mock_answer(&mut server, "the continuation").await;

    let (dispatcher, client, store) = setup(&server).await;
    let conv = store.create_conversation("ai", None).await.unwrap();
    store.append_turn(10, conv, Role::User, Some("hi"), None).await.unwrap();
    store.append_turn(20, conv, Role::Assistant, Some("hello"), Some(10)).await.unwrap();

    dispatcher
        .handle_event(message(
            30,
            "and then what?",
            Some(MessageRef {
                id: 20,
                content: Some("hello".into()),
                attachment_url: None,
            }),
        ))
        .await;

    let texts = client.texts.lock().unwrap().clone();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].1, "the continuation");

    // New user and assistant turns land under the same conversation.
    let turns = store.list_turns(conv).await.unwrap();
    let ids: Vec<i64> = turns.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![10, 20, 30, 5000]);
    assert_eq!(turns[2].role, Role::User);
    assert_eq!(turns[2].content.as_deref(), Some("and then what?"));
    assert_eq!(turns[3].role, Role::Assistant);
    assert_eq!(turns[3].content.as_deref(), Some("the continuation"));
}

#[tokio::test]
async fn unknown_free_text_command_is_silent() {
    let server = mockito::Server::new_async().await;
    let (dispatcher, client, store) = setup(&server).await;

    dispatcher
        .handle_event(message(100, "zzz whatever this is", None))
        .await;

    assert!(client.texts.lock().unwrap().is_empty());
    assert!(client.deferred.lock().unwrap().is_empty());
    assert!(store.find_turn(100).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_structured_command_gets_a_visible_ephemeral_error() {
    let server = mockito::Server::new_async().await;
    let (dispatcher, client, _store) = setup(&server).await;

    dispatcher
        .handle_event(InboundEvent::Invocation(CommandInvocation {
            id: 300,
            channel_id: 1,
            user_id: 77,
            name: "zzz".into(),
            options: vec![],
        }))
        .await;

    let texts = client.texts.lock().unwrap().clone();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        texts[0].0,
        ReplyTarget::Invocation {
            id: 300,
            ephemeral: true
        }
    );
    assert!(texts[0].1.contains("Can't find a handler for command zzz"));
}

#[tokio::test]
async fn known_command_with_no_message_is_a_visible_error() {
    let server = mockito::Server::new_async().await;
    let (dispatcher, client, _store) = setup(&server).await;

    dispatcher.handle_event(message(100, "ai", None)).await;

    let texts = client.texts.lock().unwrap().clone();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("I can't see your message"));
}

#[tokio::test]
async fn inbound_attachments_are_persisted_with_the_seed_turn() {
    let mut server = mockito::Server::new_async().await;
    mock_classifier(&mut server, "chat").await;
    mock_answer(&mut server, "nice picture").await;

    let (dispatcher, _client, store) = setup(&server).await;
    dispatcher
        .handle_event(InboundEvent::Message(InboundMessage {
            id: 100,
            channel_id: 1,
            author_id: 77,
            author_is_bot: false,
            content: "ai look at this".to_string(),
            reply_to: None,
            attachments: vec![MessageAttachment {
                id: 9,
                url: "https://cdn.example/photo.png".into(),
            }],
        }))
        .await;

    let seed = store.find_turn(100).await.unwrap().unwrap();
    assert_eq!(seed.attachments.len(), 1);
    assert_eq!(seed.attachments[0].url, "https://cdn.example/photo.png");
}

#[tokio::test]
async fn redelivered_message_is_a_no_op_beyond_logging() {
    let mut server = mockito::Server::new_async().await;
    mock_classifier(&mut server, "chat").await;
    mock_answer(&mut server, "hello back").await;

    let (dispatcher, client, store) = setup(&server).await;
    dispatcher.handle_event(message(100, "ai hello", None)).await;
    let seed = store.find_turn(100).await.unwrap().unwrap();
    let original_conversation = seed.conversation_id;

    dispatcher.handle_event(message(100, "ai hello", None)).await;

    // Exactly one reply; the second delivery never reaches the handler.
    let texts: Vec<String> = client
        .texts
        .lock()
        .unwrap()
        .iter()
        .map(|(_, text)| text.clone())
        .collect();
    assert_eq!(texts, vec!["hello back".to_string()]);

    // Turn 100 stays in its original conversation with its original
    // content, the conversation holds no duplicate assistant turn, and no
    // orphan conversation row was left behind.
    let seed_again = store.find_turn(100).await.unwrap().unwrap();
    assert_eq!(seed_again.conversation_id, original_conversation);
    assert_eq!(seed_again.content.as_deref(), Some("hello"));
    assert_eq!(store.list_turns(original_conversation).await.unwrap().len(), 2);
    assert!(
        store
            .find_conversation(original_conversation + 1)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn redelivered_continuation_sends_no_second_reply() {
    let mut server = mockito::Server::new_async().await;
    mock_answer(&mut server, "the continuation").await;

    let (dispatcher, client, store) = setup(&server).await;
    let conv = store.create_conversation("ai", None).await.unwrap();
    store.append_turn(10, conv, Role::User, Some("hi"), None).await.unwrap();
    store.append_turn(20, conv, Role::Assistant, Some("hello"), Some(10)).await.unwrap();

    let reply = Some(MessageRef {
        id: 20,
        content: Some("hello".into()),
        attachment_url: None,
    });
    dispatcher
        .handle_event(message(30, "and then what?", reply.clone()))
        .await;
    dispatcher.handle_event(message(30, "and then what?", reply)).await;

    assert_eq!(client.texts.lock().unwrap().len(), 1);
    let ids: Vec<i64> = store
        .list_turns(conv)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![10, 20, 30, 5000]);
}

#[tokio::test]
async fn structured_invocation_without_private_flag_is_ephemeral() {
    let mut server = mockito::Server::new_async().await;
    mock_classifier(&mut server, "chat").await;
    mock_answer(&mut server, "just for you").await;

    let (dispatcher, client, store) = setup(&server).await;
    dispatcher
        .handle_event(InboundEvent::Invocation(CommandInvocation {
            id: 400,
            channel_id: 1,
            user_id: 77,
            name: "ai".into(),
            options: vec![CommandOption {
                name: "message".into(),
                value: OptionValue::Str("hello".into()),
            }],
        }))
        .await;

    // No explicit private option: the ack is ephemeral and nothing is
    // persisted for later continuation.
    assert_eq!(client.deferred.lock().unwrap().as_slice(), &[(400, true)]);
    let texts = client.texts.lock().unwrap().clone();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        texts[0].0,
        ReplyTarget::Invocation {
            id: 400,
            ephemeral: true
        }
    );
    assert!(store.find_turn(400).await.unwrap().is_none());
}
