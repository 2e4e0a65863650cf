//! Streaming aggregation of provider fragments.
//!
//! A reply is a pull-driven [`EventStream`]: nothing is sent to the provider
//! until the consumer polls it, and dropping it releases the provider
//! subscription. Each fragment produces a [`StreamEvent::Partial`] snapshot of
//! the full text so far; the stream always ends with exactly one
//! [`StreamEvent::Completed`], which carries the fallback reply when the
//! request failed.

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace};

use crate::error::Error;
use crate::fallback;
use crate::model::{ChatMessage, GroundingSource};
use crate::provider::Provider;
use crate::request::ProviderRequest;

const UNTITLED_SOURCE: &str = "Untitled Source";

/// One incremental piece of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }
}

/// Fragments of one in-flight request, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<Fragment, Error>>;

/// Aggregated view after a fragment arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// Lifecycle of a single provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sent,
    Streaming,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Partial(Snapshot),
    Completed(ChatMessage),
}

impl StreamEvent {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamEvent::Completed(_))
    }
}

/// Caller-facing reply events.
pub type EventStream = BoxStream<'static, StreamEvent>;

/// Accumulates fragments of a single request.
#[derive(Debug)]
pub struct Aggregator {
    text: String,
    sources: Vec<GroundingSource>,
    seen: HashSet<String>,
    state: RequestState,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            sources: Vec::new(),
            seen: HashSet::new(),
            state: RequestState::Idle,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn mark_sent(&mut self) {
        self.state = RequestState::Sent;
    }

    pub fn mark_failed(&mut self) {
        self.state = RequestState::Failed;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append `fragment` and return the aggregate so far.
    ///
    /// Sources without a URI are ignored; a URI already seen is not added
    /// again.
    pub fn push(&mut self, fragment: Fragment) -> Snapshot {
        self.state = RequestState::Streaming;
        trace!(token = %fragment.text, "reply fragment");
        self.text.push_str(&fragment.text);
        for source in fragment.sources {
            if source.uri.is_empty() || !self.seen.insert(source.uri.clone()) {
                continue;
            }
            let title = if source.title.trim().is_empty() {
                UNTITLED_SOURCE.to_string()
            } else {
                source.title
            };
            self.sources.push(GroundingSource {
                title,
                uri: source.uri,
            });
        }
        Snapshot {
            text: self.text.clone(),
            sources: self.sources.clone(),
        }
    }

    /// Finish the request, producing the model message.
    ///
    /// A reply without any text is malformed.
    pub fn finish(&mut self) -> Result<ChatMessage, Error> {
        if self.text.trim().is_empty() {
            self.state = RequestState::Failed;
            return Err(Error::MalformedResponse("stream produced no text".into()));
        }
        self.state = RequestState::Completed;
        let text = std::mem::take(&mut self.text);
        let sources = std::mem::take(&mut self.sources);
        Ok(ChatMessage::model(text).with_sources(sources))
    }
}

/// Stream a reply for `request`, substituting `fallback_reply` on failure.
pub fn reply_events(
    provider: Arc<dyn Provider>,
    request: ProviderRequest,
    fallback_reply: String,
) -> EventStream {
    let feature = request.feature;
    Box::pin(stream! {
        let mut agg = Aggregator::new();
        agg.mark_sent();
        debug!(%feature, provider = provider.name(), "reply requested");
        let mut fragments = match provider.stream(&request).await {
            Ok(fragments) => fragments,
            Err(err) => {
                agg.mark_failed();
                fallback::absorbed(feature, &err);
                yield StreamEvent::Completed(ChatMessage::model(fallback_reply.clone()));
                return;
            }
        };
        while let Some(next) = fragments.next().await {
            match next {
                Ok(fragment) => {
                    yield StreamEvent::Partial(agg.push(fragment));
                }
                Err(err) => {
                    agg.mark_failed();
                    fallback::absorbed(feature, &err);
                    yield StreamEvent::Completed(ChatMessage::model(fallback_reply.clone()));
                    return;
                }
            }
        }
        match agg.finish() {
            Ok(message) => {
                debug!(%feature, response = %message.content, "reply completed");
                yield StreamEvent::Completed(message);
            }
            Err(err) => {
                fallback::absorbed(feature, &err);
                yield StreamEvent::Completed(ChatMessage::model(fallback_reply.clone()));
            }
        }
    })
}

/// Producer task behind [`spawn_events`]; aborted when dropped.
///
/// ```
/// use animalpedia::{MockProvider, Scripted, Fragment, StreamEvent, spawn_events};
/// use animalpedia::{Animalpedia, Conversation};
/// use futures::StreamExt;
/// use std::sync::Arc;
/// # tokio_test::block_on(async {
/// let provider = MockProvider::new(Scripted::Hang(vec![Fragment::text("Hmm")]));
/// let app = Animalpedia::new(Arc::new(provider)).unwrap();
/// let chat = Conversation::site_assistant(app, "explore");
/// let (mut events, task) = spawn_events(chat.submit("Still there?").unwrap());
/// assert!(matches!(events.next().await, Some(StreamEvent::Partial(_))));
/// drop(task);
/// assert!(events.next().await.is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct ReplyTask {
    handle: JoinHandle<()>,
}

impl Drop for ReplyTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Drive `events` on a separate task and deliver them through a channel.
///
/// The consumer owns cancellation: dropping either the returned stream or
/// the [`ReplyTask`] stops the producer and drops the provider subscription,
/// even while the provider is stalled.
pub fn spawn_events(mut events: EventStream) -> (EventStream, ReplyTask) {
    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => {
                    trace!("reply consumer went away");
                    break;
                }
                next = events.next() => match next {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            trace!("reply consumer went away");
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });
    (ReceiverStream::new(rx).boxed(), ReplyTask { handle })
}

/// Wait for the completed message, ignoring partial snapshots.
pub async fn final_message(mut events: EventStream) -> Option<ChatMessage> {
    while let Some(event) = events.next().await {
        if let StreamEvent::Completed(message) = event {
            return Some(message);
        }
    }
    None
}
