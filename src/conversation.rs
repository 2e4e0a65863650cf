use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::Error;
use crate::fallback;
use crate::model::{CatalogEntry, ChatMessage};
use crate::service::Animalpedia;
use crate::stream::{EventStream, StreamEvent};

/// What a [`Conversation`] is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Zoologist chat on an animal's page.
    Animal { name: String, description: String },
    /// Site assistant; `page` is the current page id.
    Site { page: String },
}

/// Tracks messages exchanged about one topic.
///
/// At most one reply streams at a time. A turn is committed to the history
/// only when its reply completes, so dropping a reply stream early leaves
/// the history untouched.
pub struct Conversation {
    service: Animalpedia,
    topic: Topic,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    gate: Arc<Semaphore>,
}

impl Conversation {
    fn with_history(service: Animalpedia, topic: Topic, history: Vec<ChatMessage>) -> Self {
        Self {
            service,
            topic,
            history: Arc::new(Mutex::new(history)),
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Chat about the animal described by `entry`; starts empty.
    pub fn about_animal(service: Animalpedia, entry: &CatalogEntry) -> Self {
        let topic = Topic::Animal {
            name: entry.name.clone(),
            description: entry.description.clone(),
        };
        Self::with_history(service, topic, Vec::new())
    }

    /// Site assistant chat, opened with the greeting.
    pub fn site_assistant(service: Animalpedia, page: impl Into<String>) -> Self {
        let topic = Topic::Site { page: page.into() };
        let greeting = ChatMessage::model(fallback::GLOBAL_GREETING);
        Self::with_history(service, topic, vec![greeting])
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Record navigation; ignored for animal chats.
    pub fn set_page(&mut self, page: impl Into<String>) {
        if let Topic::Site { page: current } = &mut self.topic {
            *current = page.into();
        }
    }

    /// Messages committed so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether a reply is still streaming.
    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Forget every committed message, keeping the site greeting.
    pub fn clear(&self) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.clear();
        if matches!(self.topic, Topic::Site { .. }) {
            history.push(ChatMessage::model(fallback::GLOBAL_GREETING));
        }
    }

    /// Ask `question` and stream the reply.
    ///
    /// Fails with [`Error::Busy`] while a previous reply stream is alive and
    /// with [`Error::EmptyInput`] for a blank question.
    pub fn submit(&self, question: &str) -> Result<EventStream, Error> {
        let permit = self
            .gate
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::Busy)?;
        let snapshot = self.history();
        let events = match &self.topic {
            Topic::Animal { name, description } => {
                self.service
                    .chat_with(name, description, &snapshot, question)?
            }
            Topic::Site { page } => self.service.global_chat(&snapshot, question, page)?,
        };
        debug!(turns = snapshot.len(), "conversation reply started");

        let history = self.history.clone();
        let question = question.to_string();
        let mut permit = Some(permit);
        let events = events.map(move |event| {
            if let StreamEvent::Completed(reply) = &event {
                let mut history = history.lock().unwrap_or_else(|e| e.into_inner());
                history.push(ChatMessage::user(question.clone()));
                history.push(reply.clone());
                permit.take();
            }
            event
        });
        Ok(events.boxed())
    }
}
