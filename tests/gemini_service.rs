use animalpedia::{
    Animalpedia, Catalog, GeminiConfig, QuizCategory, StreamEvent, fallback, final_message,
};
use futures::StreamExt;
use httpmock::prelude::*;
use serde_json::json;

fn app(server: &MockServer) -> Animalpedia {
    let config = GeminiConfig::new("test-key")
        .unwrap()
        .with_model("gemini-test")
        .with_base_url(server.url("/v1beta"))
        .unwrap();
    Animalpedia::gemini(config).unwrap()
}

fn text_reply(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn quiz_question_round_trips_through_gemini() {
    let server = MockServer::start_async().await;
    let quiz = json!({
        "question": "What do pandas mostly eat?",
        "options": ["Bamboo", "Fish", "Insects", "Fruit"],
        "correctAnswer": "Bamboo",
        "explanation": "Bamboo makes up about 99% of a giant panda's diet."
    });
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-test:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("responseSchema")
                .body_contains("the diet");
            then.status(200).json_body(text_reply(&quiz.to_string()));
        })
        .await;

    let question = app(&server).quiz_question(QuizCategory::Diet).await;
    mock.assert_async().await;
    assert_eq!(question.correct_answer, "Bamboo");
    assert_eq!(question.options.len(), 4);
}

#[tokio::test]
async fn server_error_yields_fallback_fact() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(500).body("boom");
        })
        .await;
    assert_eq!(app(&server).daily_fact().await, fallback::DAILY_FACT);
}

#[tokio::test]
async fn animal_chat_streams_snapshots_and_citations() {
    let server = MockServer::start_async().await;
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Lions \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"roar to mark territory.\"}]},",
        "\"groundingMetadata\":{\"groundingChunks\":[",
        "{\"web\":{\"uri\":\"https://zoo.example/lion\",\"title\":\"Zoo\"}},",
        "{\"web\":{\"uri\":\"https://zoo.example/lion\",\"title\":\"Zoo again\"}}]}}]}\n\n"
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-test:streamGenerateContent")
                .query_param("alt", "sse")
                .body_contains("googleSearch");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(body);
        })
        .await;

    let catalog = Catalog::bundled().unwrap();
    let lion = catalog.get("lion").unwrap();
    let mut events = app(&server)
        .animal_chat(lion, &[], "Why do lions roar?")
        .unwrap();

    let mut snapshots = Vec::new();
    let mut completed = None;
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Partial(snapshot) => snapshots.push(snapshot.text),
            StreamEvent::Completed(message) => completed = Some(message),
        }
    }
    mock.assert_async().await;
    assert_eq!(snapshots, vec!["Lions ", "Lions roar to mark territory."]);
    let message = completed.unwrap();
    assert_eq!(message.content, "Lions roar to mark territory.");
    let sources = message.sources.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].title, "Zoo");
}

#[tokio::test]
async fn broken_stream_event_completes_with_apology() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-test:streamGenerateContent");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body("data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n\ndata: not json\n\n");
        })
        .await;

    let events = app(&server).global_chat(&[], "Hello?", "about").unwrap();
    let message = final_message(events).await.unwrap();
    assert_eq!(message.content, fallback::GLOBAL_CHAT);
    assert!(message.sources.is_none());
}
