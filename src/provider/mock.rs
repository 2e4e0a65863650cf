use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, trace};

use super::{Provider, Reply};
use crate::error::{Error, FailureClass};
use crate::request::ProviderRequest;
use crate::stream::{Fragment, FragmentStream};

/// One scripted provider behaviour.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer with this text, streamed as a single fragment.
    Reply(Reply),
    /// Stream these fragments; `generate` joins them.
    Fragments(Vec<Fragment>),
    /// Stream these fragments, then fail with a transport error.
    Interrupted(Vec<Fragment>),
    /// Stream these fragments, then never finish.
    Hang(Vec<Fragment>),
    /// Fail before answering.
    Fail(FailureClass),
}

impl Scripted {
    pub fn text(text: impl Into<String>) -> Self {
        Scripted::Reply(Reply::text(text))
    }

    pub fn fragments<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scripted::Fragments(texts.into_iter().map(Fragment::text).collect())
    }
}

fn failure(class: FailureClass) -> Error {
    match class {
        FailureClass::Transport => Error::Transport("mock transport failure".into()),
        FailureClass::Malformed => Error::MalformedResponse("mock malformed response".into()),
    }
}

fn joined(fragments: &[Fragment]) -> Reply {
    Reply {
        text: fragments.iter().map(|f| f.text.as_str()).collect(),
        sources: fragments.iter().flat_map(|f| f.sources.clone()).collect(),
    }
}

/// In-memory [`Provider`] that plays back scripted behaviours in order and
/// records every request it receives.
///
/// Once the script runs out it keeps answering with the fallback behaviour
/// (by default the text `"mock response"`).
#[derive(Debug)]
pub struct MockProvider {
    script: Mutex<VecDeque<Scripted>>,
    otherwise: Scripted,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Scripted::text("mock response"))
    }
}

impl MockProvider {
    /// Create a provider that always behaves like `otherwise`.
    pub fn new(otherwise: Scripted) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            otherwise,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(class: FailureClass) -> Self {
        Self::new(Scripted::Fail(class))
    }

    /// Queue a behaviour for the next call.
    pub fn then(self, step: Scripted) -> Self {
        self.push(step);
        self
    }

    pub fn push(&self, step: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_step(&self, request: &ProviderRequest) -> Scripted {
        trace!(feature = %request.feature, "mock provider request");
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<Reply, Error> {
        let reply = match self.next_step(request) {
            Scripted::Reply(reply) => reply,
            Scripted::Fragments(fragments) => joined(&fragments),
            Scripted::Interrupted(_) => return Err(failure(FailureClass::Transport)),
            Scripted::Hang(_) => futures::future::pending().await,
            Scripted::Fail(class) => return Err(failure(class)),
        };
        debug!(response = %reply.text, "mock full response");
        Ok(reply)
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<FragmentStream, Error> {
        let fragments = match self.next_step(request) {
            Scripted::Reply(reply) => {
                let fragment = Fragment::text(reply.text).with_sources(reply.sources);
                stream::iter(vec![Ok(fragment)]).boxed()
            }
            Scripted::Fragments(fragments) => stream::iter(fragments.into_iter().map(Ok)).boxed(),
            Scripted::Interrupted(fragments) => stream::iter(fragments.into_iter().map(Ok))
                .chain(stream::once(async { Err(failure(FailureClass::Transport)) }))
                .boxed(),
            Scripted::Hang(fragments) => stream::iter(fragments.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
            Scripted::Fail(class) => return Err(failure(class)),
        };
        Ok(fragments)
    }
}
