use animalpedia::{
    Animalpedia, Attachment, Confidence, FailureClass, Feature, Lookup, MockProvider,
    QuizCategory, Scripted, SpiritAnswers, fallback, final_message,
};
use std::sync::Arc;
use tracing_test::traced_test;

fn app_failing(class: FailureClass) -> Animalpedia {
    Animalpedia::new(Arc::new(MockProvider::failing(class))).unwrap()
}

fn answers() -> SpiritAnswers {
    SpiritAnswers {
        vacation: "A quiet cabin in the woods".into(),
        social: "A few close friends".into(),
        hobby: "Reading".into(),
        time: "Night".into(),
    }
}

/// Run `feature` against `app` and return a printable outcome.
async fn outcome(app: &Animalpedia, feature: Feature) -> String {
    let audio = Attachment::from_bytes("audio/webm", b"audio");
    let image = Attachment::from_bytes("image/jpeg", b"image");
    match feature {
        Feature::DailyFact => app.daily_fact().await,
        Feature::AnimalChat => {
            let events = app.chat_with("Lion", "Big cat.", &[], "Why roar?").unwrap();
            final_message(events).await.unwrap().content
        }
        Feature::GlobalChat => {
            let events = app.global_chat(&[], "Hi", "quiz").unwrap();
            final_message(events).await.unwrap().content
        }
        Feature::Quiz => app.quiz_question(QuizCategory::General).await.question,
        Feature::SoundIdentify => app.identify_sound(&audio).await.unwrap().animal_name,
        Feature::ImageIdentify => app.identify_image(&image).await.unwrap().animal_name,
        Feature::SoundDescription => app.sound_description("Wolf").await.unwrap(),
        Feature::CatalogLookup => match app.lookup_animal("Okapi").await.unwrap() {
            Lookup::NotFound { message, .. } => message,
            Lookup::Found(entry) => entry.name,
        },
        Feature::Spirit => app.spirit(&answers()).await.unwrap().description,
        Feature::Persona => app.persona("Sloth").await.unwrap().text,
    }
}

fn expected(feature: Feature) -> String {
    match feature {
        Feature::DailyFact => fallback::DAILY_FACT.to_string(),
        Feature::AnimalChat => fallback::ANIMAL_CHAT.to_string(),
        Feature::GlobalChat => fallback::GLOBAL_CHAT.to_string(),
        Feature::Quiz => fallback::quiz_question().question,
        Feature::SoundIdentify | Feature::ImageIdentify => {
            fallback::IDENTIFICATION_FAILED.to_string()
        }
        Feature::SoundDescription => fallback::sound_description("Wolf"),
        Feature::CatalogLookup => match fallback::catalog_lookup("Okapi") {
            Lookup::NotFound { message, .. } => message,
            Lookup::Found(_) => unreachable!(),
        },
        Feature::Spirit => fallback::spirit().description,
        Feature::Persona => fallback::persona("Sloth").text,
    }
}

#[tokio::test]
async fn every_feature_falls_back_for_every_failure_class() {
    for class in [FailureClass::Transport, FailureClass::Malformed] {
        let app = app_failing(class);
        for feature in Feature::ALL {
            assert_eq!(
                outcome(&app, feature).await,
                expected(feature),
                "{feature} with {class:?}"
            );
        }
    }
}

#[tokio::test]
async fn quiz_diet_transport_failure_yields_king_of_the_jungle() {
    let provider = Arc::new(MockProvider::failing(FailureClass::Transport));
    let app = Animalpedia::new(provider.clone()).unwrap();
    let question = app.quiz_question(QuizCategory::Diet).await;
    assert_eq!(
        question.options,
        vec!["Elephant", "Tiger", "Lion", "Bear"]
    );
    assert!(question.is_correct("Lion"));
    let request = &provider.requests()[0];
    assert_eq!(request.feature, Feature::Quiz);
    assert!(request.schema.is_some());
}

#[tokio::test]
async fn quiz_with_three_options_is_rejected() {
    let raw = r#"{"question":"Q?","options":["A","B","C"],"correctAnswer":"A","explanation":"E"}"#;
    let app = Animalpedia::new(Arc::new(MockProvider::new(Scripted::text(raw)))).unwrap();
    assert_eq!(app.quiz_question(QuizCategory::Habitat).await, fallback::quiz_question());
}

#[tokio::test]
async fn fenced_quiz_json_is_accepted() {
    let raw = "```json\n{\"question\":\"Which bird cannot fly?\",\"options\":[\"Emu\",\"Owl\",\"Hawk\",\"Swift\"],\"correctAnswer\":\"Emu\",\"explanation\":\"Emus are flightless.\"}\n```";
    let app = Animalpedia::new(Arc::new(MockProvider::new(Scripted::text(raw)))).unwrap();
    let question = app.quiz_question(QuizCategory::General).await;
    assert_eq!(question.correct_answer, "Emu");
}

#[tokio::test]
async fn sound_identification_without_confidence_is_uncertain() {
    let raw = r#"{"animalName":"Gray Wolf","scientificName":"Canis lupus","interestingFact":"Wolves howl to rally the pack."}"#;
    let app = Animalpedia::new(Arc::new(MockProvider::new(Scripted::text(raw)))).unwrap();
    let id = app
        .identify_sound(&Attachment::from_bytes("audio/webm", b"howl"))
        .await
        .unwrap();
    assert_eq!(id.animal_name, "Identification Failed");
    assert_eq!(id.scientific_name, "N/A");
    assert_eq!(id.confidence, Confidence::Uncertain);
}

#[traced_test]
#[tokio::test]
async fn absorbed_failures_are_logged() {
    let app = app_failing(FailureClass::Malformed);
    app.daily_fact().await;
    assert!(logs_contain("provider call failed, using fallback"));
    assert!(logs_contain("daily-fact"));
}
