//! Fixed substitute values returned when a provider call fails.
//!
//! The mapping is total and coarse: every feature has exactly one fallback,
//! whatever the failure class.

use tracing::warn;

use crate::error::Error;
use crate::model::{Confidence, Identification, Lookup, Persona, QuizQuestion, SpiritResult};
use crate::request::Feature;

pub const DAILY_FACT: &str =
    "The animal kingdom is full of surprises! Check back later for a new fact.";
pub const ANIMAL_CHAT: &str = "Sorry, something went wrong while fetching my response.";
pub const GLOBAL_CHAT: &str =
    "I'm sorry, I'm having a little trouble communicating right now. Please try again later.";
pub const GLOBAL_GREETING: &str = "Hello! I'm the Animalpedia Assistant. How can I help you explore the animal kingdom today?";
pub const IDENTIFICATION_FAILED: &str = "Identification Failed";

/// Log a failure that is about to be replaced by fallback content.
pub(crate) fn absorbed(feature: Feature, err: &Error) {
    warn!(
        %feature,
        class = ?err.failure_class(),
        error = %err,
        "provider call failed, using fallback"
    );
}

pub fn daily_fact() -> String {
    DAILY_FACT.to_string()
}

/// Reply used for chat features when the stream fails.
pub fn chat_reply(feature: Feature) -> String {
    match feature {
        Feature::GlobalChat => GLOBAL_CHAT,
        _ => ANIMAL_CHAT,
    }
    .to_string()
}

pub fn quiz_question() -> QuizQuestion {
    QuizQuestion {
        question: "Which animal is known as the 'King of the Jungle'?".into(),
        options: vec!["Elephant".into(), "Tiger".into(), "Lion".into(), "Bear".into()],
        correct_answer: "Lion".into(),
        explanation: "Lions are often called the 'King of the Jungle,' though they primarily live in grasslands and savannas, not jungles. The title refers to their position at the top of the food chain.".into(),
    }
}

fn failed_identification(hint: &str) -> Identification {
    Identification {
        animal_name: IDENTIFICATION_FAILED.into(),
        scientific_name: "N/A".into(),
        interesting_fact: hint.into(),
        confidence: Confidence::Uncertain,
    }
}

pub fn sound_identification() -> Identification {
    failed_identification(
        "Sorry, I couldn't identify the sound from the recording. Please try again with a clearer audio clip, ideally with less background noise.",
    )
}

pub fn image_identification() -> Identification {
    failed_identification(
        "Sorry, I couldn't identify the animal from the image. Please try again with a clearer picture, ideally with the animal as the main subject.",
    )
}

pub fn sound_description(animal: &str) -> String {
    format!(
        "I'm sorry, I was unable to generate a description of the {animal}'s sounds at this time. Please try again later."
    )
}

pub fn catalog_lookup(query: &str) -> Lookup {
    Lookup::NotFound {
        query: query.to_string(),
        message: format!(
            "Sorry, the AI could not find comprehensive data for \"{query}\". Please try a different name or check your spelling."
        ),
    }
}

pub fn spirit() -> SpiritResult {
    SpiritResult {
        animal_name: "Unknown Spirit".into(),
        image_url: String::new(),
        description: "Sorry, the AI couldn't determine your spirit animal. Please try again!"
            .into(),
    }
}

pub fn persona(animal: &str) -> Persona {
    Persona {
        animal_name: animal.to_string(),
        text: format!(
            "I'm sorry, I couldn't quite imagine what a {animal} would be like as a human right now. Please try another animal!"
        ),
    }
}
