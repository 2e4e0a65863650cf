//! Provider-agnostic request descriptors and the builder that composes them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::fmt;

use crate::error::Error;
use crate::model::{ChatMessage, ChatRole, QuizCategory, SpiritAnswers};
use crate::prompts::{self, PromptBook};
use crate::schema;

/// Every feature that talks to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    DailyFact,
    AnimalChat,
    GlobalChat,
    Quiz,
    SoundIdentify,
    ImageIdentify,
    SoundDescription,
    CatalogLookup,
    Spirit,
    Persona,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::DailyFact,
        Feature::AnimalChat,
        Feature::GlobalChat,
        Feature::Quiz,
        Feature::SoundIdentify,
        Feature::ImageIdentify,
        Feature::SoundDescription,
        Feature::CatalogLookup,
        Feature::Spirit,
        Feature::Persona,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::DailyFact => "daily-fact",
            Feature::AnimalChat => "animal-chat",
            Feature::GlobalChat => "global-chat",
            Feature::Quiz => "quiz",
            Feature::SoundIdentify => "sound-identify",
            Feature::ImageIdentify => "image-identify",
            Feature::SoundDescription => "sound-description",
            Feature::CatalogLookup => "catalog-lookup",
            Feature::Spirit => "spirit",
            Feature::Persona => "persona",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base64 payload produced by a capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: String,
}

impl Attachment {
    /// Wrap already encoded data.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw captured bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData(Attachment),
}

/// One turn of content sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: ChatRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// Everything the provider needs to answer one feature call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub feature: Feature,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    /// Structured-output schema; implies a JSON response.
    pub schema: Option<Value>,
    pub json_output: bool,
    pub web_grounding: bool,
}

impl ProviderRequest {
    fn new(feature: Feature, contents: Vec<Content>) -> Self {
        Self {
            feature,
            system_instruction: None,
            contents,
            schema: None,
            json_output: false,
            web_grounding: false,
        }
    }

    fn system(mut self, instruction: String) -> Self {
        self.system_instruction = Some(instruction);
        self
    }

    fn json(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self.json_output = true;
        self
    }

    fn grounded(mut self) -> Self {
        self.web_grounding = true;
        self
    }
}

/// Map a page id to the name shown to the assistant.
pub fn friendly_page_name(page: &str) -> &str {
    match page {
        "explore" => "Explore",
        "articles" => "Articles",
        "compare" => "Compare Species",
        "quiz" => "Quiz",
        "about" => "About",
        "sound-id" => "Sound Identifier",
        "privacy" => "Privacy Policy",
        "terms" => "Terms & Conditions",
        other => other,
    }
}

fn require_text(text: &str, what: &'static str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::EmptyInput(what));
    }
    Ok(())
}

fn conversation(history: &[ChatMessage], question: &str) -> Vec<Content> {
    history
        .iter()
        .map(|msg| Content {
            role: msg.role,
            parts: vec![Part::Text(msg.content.clone())],
        })
        .chain(std::iter::once(Content::user_text(question)))
        .collect()
}

/// Composes [`ProviderRequest`]s. Performs no I/O.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    prompts: PromptBook,
}

impl RequestBuilder {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            prompts: PromptBook::new()?,
        })
    }

    pub fn daily_fact(&self) -> Result<ProviderRequest, Error> {
        let prompt = self.prompts.render(prompts::DAILY_FACT, &[])?;
        Ok(ProviderRequest::new(
            Feature::DailyFact,
            vec![Content::user_text(prompt)],
        ))
    }

    /// Chat with a zoologist persona grounded on one catalog animal.
    pub fn animal_chat(
        &self,
        animal: &str,
        description: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<ProviderRequest, Error> {
        require_text(question, "question")?;
        let system = self.prompts.render(
            prompts::ANIMAL_CHAT,
            &[("animal", animal), ("description", description)],
        )?;
        Ok(
            ProviderRequest::new(Feature::AnimalChat, conversation(history, question))
                .system(system)
                .grounded(),
        )
    }

    /// Chat with the site assistant; `page` is the id of the page the user is on.
    pub fn global_chat(
        &self,
        history: &[ChatMessage],
        question: &str,
        page: &str,
    ) -> Result<ProviderRequest, Error> {
        require_text(question, "question")?;
        let system = self
            .prompts
            .render(prompts::GLOBAL_CHAT, &[("page", friendly_page_name(page))])?;
        Ok(ProviderRequest::new(Feature::GlobalChat, conversation(history, question)).system(system))
    }

    pub fn quiz(&self, category: QuizCategory) -> Result<ProviderRequest, Error> {
        let topic = category.topic();
        let prompt = self.prompts.render(prompts::QUIZ, &[("topic", topic.as_str())])?;
        Ok(ProviderRequest::new(Feature::Quiz, vec![Content::user_text(prompt)]).json(schema::quiz()))
    }

    pub fn identify_sound(&self, audio: &Attachment) -> Result<ProviderRequest, Error> {
        self.identify(
            Feature::SoundIdentify,
            audio,
            prompts::SOUND_IDENTIFY,
            "the animal or the sound it makes",
            "recording",
        )
    }

    pub fn identify_image(&self, image: &Attachment) -> Result<ProviderRequest, Error> {
        self.identify(
            Feature::ImageIdentify,
            image,
            prompts::IMAGE_IDENTIFY,
            "the animal",
            "image",
        )
    }

    fn identify(
        &self,
        feature: Feature,
        payload: &Attachment,
        template: &str,
        fact_about: &str,
        what: &'static str,
    ) -> Result<ProviderRequest, Error> {
        if payload.is_empty() {
            return Err(Error::EmptyInput(what));
        }
        let instruction = self.prompts.render(template, &[])?;
        let content = Content {
            role: ChatRole::User,
            parts: vec![Part::InlineData(payload.clone()), Part::Text(instruction)],
        };
        Ok(ProviderRequest::new(feature, vec![content]).json(schema::identification(fact_about)))
    }

    pub fn sound_description(&self, animal: &str) -> Result<ProviderRequest, Error> {
        require_text(animal, "animal name")?;
        let prompt = self
            .prompts
            .render(prompts::SOUND_DESCRIPTION, &[("animal", animal)])?;
        Ok(ProviderRequest::new(
            Feature::SoundDescription,
            vec![Content::user_text(prompt)],
        ))
    }

    /// Ask for a full catalog entry. The provider cannot combine web search
    /// with a response schema, so the expected shape travels in the prompt.
    pub fn catalog_lookup(&self, animal: &str) -> Result<ProviderRequest, Error> {
        require_text(animal, "animal name")?;
        let prompt = self
            .prompts
            .render(prompts::CATALOG_LOOKUP, &[("animal", animal)])?;
        Ok(ProviderRequest::new(Feature::CatalogLookup, vec![Content::user_text(prompt)]).grounded())
    }

    pub fn spirit(&self, answers: &SpiritAnswers) -> Result<ProviderRequest, Error> {
        if !answers.is_complete() {
            return Err(Error::EmptyInput("spirit answers"));
        }
        let prompt = self.prompts.render(
            prompts::SPIRIT,
            &[
                ("vacation", answers.vacation.as_str()),
                ("social", answers.social.as_str()),
                ("hobby", answers.hobby.as_str()),
                ("time", answers.time.as_str()),
            ],
        )?;
        Ok(ProviderRequest::new(Feature::Spirit, vec![Content::user_text(prompt)]).json(schema::spirit()))
    }

    pub fn persona(&self, animal: &str) -> Result<ProviderRequest, Error> {
        require_text(animal, "animal name")?;
        let prompt = self.prompts.render(prompts::PERSONA, &[("animal", animal)])?;
        Ok(ProviderRequest::new(Feature::Persona, vec![Content::user_text(prompt)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RequestBuilder {
        RequestBuilder::new().unwrap()
    }

    #[test]
    fn identical_inputs_build_identical_requests() {
        let b = builder();
        let history = vec![ChatMessage::user("hi"), ChatMessage::model("hello")];
        let a = b.animal_chat("Lion", "Big cat", &history, "How fast?").unwrap();
        let c = b.animal_chat("Lion", "Big cat", &history, "How fast?").unwrap();
        assert_eq!(a, c);
        assert_eq!(b.quiz(QuizCategory::Diet).unwrap(), b.quiz(QuizCategory::Diet).unwrap());
    }

    #[test]
    fn history_maps_to_contents_followed_by_question() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::model("hello")];
        let req = builder().global_chat(&history, "What now?", "sound-id").unwrap();
        assert_eq!(req.contents.len(), 3);
        assert_eq!(req.contents[1].role, ChatRole::Model);
        assert_eq!(req.contents[2], Content::user_text("What now?"));
        assert_eq!(history.len(), 2);
        let system = req.system_instruction.unwrap();
        assert!(system.contains("The user is on the \"Sound Identifier\" page."));
        assert!(!req.web_grounding);
    }

    #[test]
    fn animal_chat_is_grounded() {
        let req = builder().animal_chat("Lion", "Big cat", &[], "Diet?").unwrap();
        assert!(req.web_grounding);
        assert!(!req.json_output);
    }

    #[test]
    fn blank_question_is_rejected() {
        let err = builder().global_chat(&[], "   ", "explore").unwrap_err();
        assert!(matches!(err, Error::EmptyInput("question")));
    }

    #[test]
    fn empty_recording_is_rejected() {
        let err = builder()
            .identify_sound(&Attachment::new("audio/webm", ""))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInput("recording")));
    }

    #[test]
    fn identification_puts_payload_before_instruction() {
        let audio = Attachment::from_bytes("audio/webm", b"\x1a\x45\xdf\xa3");
        let req = builder().identify_sound(&audio).unwrap();
        assert!(req.json_output);
        let parts = &req.contents[0].parts;
        assert_eq!(parts[0], Part::InlineData(audio));
        assert!(matches!(&parts[1], Part::Text(t) if t.starts_with("Identify the animal from this sound.")));
    }

    #[test]
    fn quiz_prompt_mentions_topic() {
        let req = builder().quiz(QuizCategory::General).unwrap();
        let Part::Text(prompt) = &req.contents[0].parts[0] else {
            panic!("expected text part");
        };
        assert!(prompt.contains("focusing on a general fact."));
        assert_eq!(req.schema, Some(schema::quiz()));
    }

    #[test]
    fn incomplete_spirit_answers_are_rejected() {
        let answers = SpiritAnswers {
            vacation: "Sunny beach resort".into(),
            ..Default::default()
        };
        assert!(matches!(
            builder().spirit(&answers),
            Err(Error::EmptyInput("spirit answers"))
        ));
    }

    #[test]
    fn unknown_pages_pass_through() {
        assert_eq!(friendly_page_name("compare"), "Compare Species");
        assert_eq!(friendly_page_name("map"), "map");
    }
}
