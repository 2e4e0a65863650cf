//! The client object that wires every feature to the provider.

use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::GeminiConfig;
use crate::error::Error;
use crate::fallback;
use crate::model::{
    CatalogEntry, ChatMessage, Identification, Lookup, Persona, QuizCategory, QuizQuestion,
    SpiritAnswers, SpiritResult,
};
use crate::provider::{GeminiProvider, Provider, Reply};
use crate::request::{Attachment, Feature, ProviderRequest, RequestBuilder};
use crate::stream::{EventStream, StreamEvent, reply_events};
use crate::validate;

/// Content request layer for the encyclopedia.
///
/// Construct it once and share it; cloning is cheap. Apart from
/// [`Error::EmptyInput`], every failure is replaced by the feature's
/// fallback value, so the methods either return content or reject the
/// caller's input.
///
/// ```
/// use std::sync::Arc;
/// use animalpedia::{Animalpedia, MockProvider, QuizCategory, Scripted};
/// # tokio_test::block_on(async {
/// let provider = Arc::new(MockProvider::new(Scripted::text("not json")));
/// let app = Animalpedia::new(provider).unwrap();
/// let question = app.quiz_question(QuizCategory::Diet).await;
/// assert_eq!(question.correct_answer, "Lion");
/// # });
/// ```
#[derive(Clone)]
pub struct Animalpedia {
    provider: Arc<dyn Provider>,
    builder: RequestBuilder,
}

impl Animalpedia {
    pub fn new(provider: Arc<dyn Provider>) -> Result<Self, Error> {
        Ok(Self {
            provider,
            builder: RequestBuilder::new()?,
        })
    }

    /// Client talking to Gemini over HTTP.
    pub fn gemini(config: GeminiConfig) -> Result<Self, Error> {
        Self::new(Arc::new(GeminiProvider::new(config)))
    }

    /// Run a one-shot request, decode the reply, or fall back.
    async fn resolve<T>(
        &self,
        feature: Feature,
        request: Result<ProviderRequest, Error>,
        decode: impl FnOnce(Reply) -> Result<T, Error>,
        substitute: impl FnOnce() -> T,
    ) -> Result<T, Error> {
        let outcome = match request {
            Ok(request) => match self.provider.generate(&request).await {
                Ok(reply) => decode(reply),
                Err(err) => Err(err),
            },
            Err(err) if err.failure_class().is_none() => return Err(err),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(value) => {
                debug!(%feature, "request completed");
                Ok(value)
            }
            Err(err) => {
                fallback::absorbed(feature, &err);
                Ok(substitute())
            }
        }
    }

    fn chat_events(
        &self,
        feature: Feature,
        request: Result<ProviderRequest, Error>,
    ) -> Result<EventStream, Error> {
        let reply = fallback::chat_reply(feature);
        match request {
            Ok(request) => Ok(reply_events(self.provider.clone(), request, reply)),
            Err(err) if err.failure_class().is_none() => Err(err),
            Err(err) => {
                fallback::absorbed(feature, &err);
                let done = StreamEvent::Completed(ChatMessage::model(reply));
                Ok(stream::once(async move { done }).boxed())
            }
        }
    }

    /// A short surprising animal fact.
    pub async fn daily_fact(&self) -> String {
        self.resolve(
            Feature::DailyFact,
            self.builder.daily_fact(),
            |reply| validate::text(&reply.text),
            fallback::daily_fact,
        )
        .await
        .unwrap_or_else(|_| fallback::daily_fact())
    }

    /// Stream an answer from the zoologist persona for `entry`.
    pub fn animal_chat(
        &self,
        entry: &CatalogEntry,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<EventStream, Error> {
        self.chat_with(&entry.name, &entry.description, history, question)
    }

    /// Like [`animal_chat`](Self::animal_chat) for an animal known only by
    /// name and description.
    pub fn chat_with(
        &self,
        animal: &str,
        description: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<EventStream, Error> {
        let request = self
            .builder
            .animal_chat(animal, description, history, question);
        self.chat_events(Feature::AnimalChat, request)
    }

    /// Stream an answer from the site assistant; `page` is the current page id.
    pub fn global_chat(
        &self,
        history: &[ChatMessage],
        question: &str,
        page: &str,
    ) -> Result<EventStream, Error> {
        let request = self.builder.global_chat(history, question, page);
        self.chat_events(Feature::GlobalChat, request)
    }

    /// A multiple-choice question with exactly four options.
    pub async fn quiz_question(&self, category: QuizCategory) -> QuizQuestion {
        self.resolve(
            Feature::Quiz,
            self.builder.quiz(category),
            |reply| validate::decode(&reply.text),
            fallback::quiz_question,
        )
        .await
        .unwrap_or_else(|_| fallback::quiz_question())
    }

    pub async fn identify_sound(&self, audio: &Attachment) -> Result<Identification, Error> {
        self.resolve(
            Feature::SoundIdentify,
            self.builder.identify_sound(audio),
            |reply| validate::decode(&reply.text),
            fallback::sound_identification,
        )
        .await
    }

    pub async fn identify_image(&self, image: &Attachment) -> Result<Identification, Error> {
        self.resolve(
            Feature::ImageIdentify,
            self.builder.identify_image(image),
            |reply| validate::decode(&reply.text),
            fallback::image_identification,
        )
        .await
    }

    /// Markdown description of the sounds `animal` makes.
    pub async fn sound_description(&self, animal: &str) -> Result<String, Error> {
        self.resolve(
            Feature::SoundDescription,
            self.builder.sound_description(animal),
            |reply| validate::text(&reply.text),
            || fallback::sound_description(animal),
        )
        .await
    }

    /// Ask the provider for a full catalog entry about `name`.
    pub async fn lookup_animal(&self, name: &str) -> Result<Lookup, Error> {
        self.resolve(
            Feature::CatalogLookup,
            self.builder.catalog_lookup(name),
            |reply| validate::decode::<CatalogEntry>(&reply.text).map(|e| Lookup::Found(Box::new(e))),
            || fallback::catalog_lookup(name),
        )
        .await
    }

    /// Look `name` up and append the entry to `catalog` when its slug is new.
    pub async fn discover(&self, catalog: &mut Catalog, name: &str) -> Result<Lookup, Error> {
        let lookup = self.lookup_animal(name).await?;
        if let Lookup::Found(entry) = &lookup {
            if catalog.insert(entry.as_ref().clone()) {
                debug!(id = %entry.id, "added AI-sourced catalog entry");
            }
        }
        Ok(lookup)
    }

    pub async fn spirit(&self, answers: &SpiritAnswers) -> Result<SpiritResult, Error> {
        self.resolve(
            Feature::Spirit,
            self.builder.spirit(answers),
            |reply| validate::decode(&reply.text),
            fallback::spirit,
        )
        .await
    }

    /// `animal` imagined as a human.
    pub async fn persona(&self, animal: &str) -> Result<Persona, Error> {
        self.resolve(
            Feature::Persona,
            self.builder.persona(animal),
            |reply| {
                validate::text(&reply.text).map(|text| Persona {
                    animal_name: animal.to_string(),
                    text,
                })
            },
            || fallback::persona(animal),
        )
        .await
    }
}
