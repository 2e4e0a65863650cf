use animalpedia::{
    Animalpedia, Catalog, ChatRole, Conversation, Error, Fragment, MockProvider, Scripted,
    StreamEvent, fallback, final_message, spawn_events,
};
use futures::StreamExt;
use std::sync::Arc;

fn setup(provider: MockProvider) -> (Animalpedia, Arc<MockProvider>) {
    let provider = Arc::new(provider);
    (Animalpedia::new(provider.clone()).unwrap(), provider)
}

#[tokio::test]
async fn global_chat_snapshots_grow_fragment_by_fragment() {
    let (app, _) = setup(MockProvider::new(Scripted::fragments(["Hel", "lo ", " world"])));
    let chat = Conversation::site_assistant(app, "explore");
    let events: Vec<_> = chat.submit("Say hello").unwrap().collect().await;
    let partials: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Partial(s) => Some(s.text.as_str()),
            StreamEvent::Completed(_) => None,
        })
        .collect();
    assert_eq!(partials, vec!["Hel", "Hello ", "Hello  world"]);
    assert_eq!(events.iter().filter(|e| e.is_completed()).count(), 1);
    match events.last() {
        Some(StreamEvent::Completed(msg)) => assert_eq!(msg.content, "Hello  world"),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn animal_chat_sends_history_and_grounding() {
    let (app, provider) = setup(
        MockProvider::default()
            .then(Scripted::text("They roar at dusk."))
            .then(Scripted::text("Mostly zebra.")),
    );
    let catalog = Catalog::bundled().unwrap();
    let chat = Conversation::about_animal(app, catalog.get("lion").unwrap());

    final_message(chat.submit("When do lions roar?").unwrap()).await;
    final_message(chat.submit("What do they eat?").unwrap()).await;

    let history = chat.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[3].content, "Mostly zebra.");
    assert_eq!(history[3].role, ChatRole::Model);

    let second = &provider.requests()[1];
    assert!(second.web_grounding);
    assert_eq!(second.contents.len(), 3);
    assert!(second.system_instruction.as_deref().unwrap().contains("Lion"));
}

#[tokio::test]
async fn interrupted_reply_discards_partial_text() {
    let (app, _) = setup(MockProvider::new(Scripted::Interrupted(vec![Fragment::text(
        "Half an ans",
    )])));
    let chat = Conversation::site_assistant(app, "quiz");
    let reply = final_message(chat.submit("Explain the quiz").unwrap())
        .await
        .unwrap();
    assert_eq!(reply.content, fallback::GLOBAL_CHAT);
    assert_eq!(chat.history().last().unwrap().content, fallback::GLOBAL_CHAT);
}

async fn gate_opens(chat: &Conversation) -> bool {
    for _ in 0..100 {
        if !chat.is_busy() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    false
}

#[tokio::test]
async fn dropping_only_the_receiver_frees_a_stalled_reply() {
    let (app, _) = setup(
        MockProvider::default().then(Scripted::Hang(vec![Fragment::text("Thinking")])),
    );
    let chat = Conversation::site_assistant(app, "explore");

    let (mut events, _task) = spawn_events(chat.submit("Slow").unwrap());
    assert!(matches!(events.next().await, Some(StreamEvent::Partial(_))));
    drop(events);

    assert!(gate_opens(&chat).await);
    assert_eq!(chat.history().len(), 1);
    let reply = final_message(chat.submit("Again").unwrap()).await.unwrap();
    assert_eq!(reply.content, "mock response");
}

#[tokio::test]
async fn cancelled_reply_appends_nothing_and_frees_the_gate() {
    let (app, _) = setup(
        MockProvider::default().then(Scripted::Hang(vec![Fragment::text("Thinking")])),
    );
    let chat = Conversation::site_assistant(app, "explore");

    let (mut events, task) = spawn_events(chat.submit("Slow question").unwrap());
    assert!(matches!(events.next().await, Some(StreamEvent::Partial(_))));
    assert!(matches!(chat.submit("Impatient"), Err(Error::Busy)));

    drop(events);
    drop(task);
    assert!(gate_opens(&chat).await);
    assert_eq!(chat.history().len(), 1);

    let reply = final_message(chat.submit("Second try").unwrap()).await.unwrap();
    assert_eq!(reply.content, "mock response");
    assert_eq!(chat.history().len(), 3);
}
