//! Content request layer for the Animalpedia encyclopedia and quiz app.
//!
//! Every feature that asks a generative model for content goes through
//! [`Animalpedia`]: it builds the request, calls a [`Provider`], validates
//! the answer and substitutes a fixed fallback when anything goes wrong.
//! Chat features stream their replies as [`StreamEvent`]s; a
//! [`Conversation`] keeps the history of one chat.

mod catalog;
mod config;
mod conversation;
mod error;
pub mod fallback;
pub mod model;
pub mod prompts;
mod provider;
pub mod request;
pub mod schema;
mod service;
pub mod stream;
pub mod validate;

pub use catalog::{Catalog, CatalogFilter};
pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig};
pub use conversation::{Conversation, Topic};
pub use error::{Error, FailureClass};
pub use model::{
    CatalogEntry, ChatMessage, ChatRole, Confidence, Diet, GroundingSource, Identification,
    IucnStatus, Lookup, Persona, QuizCategory, QuizQuestion, Region, SpiritAnswers, SpiritResult,
};
pub use provider::{GeminiProvider, MockProvider, Provider, Reply, Scripted};
pub use request::{Attachment, Feature, ProviderRequest, RequestBuilder};
pub use service::Animalpedia;
pub use stream::{
    Aggregator, EventStream, Fragment, FragmentStream, ReplyTask, RequestState, Snapshot,
    StreamEvent, final_message, spawn_events,
};
