use thiserror::Error;

/// Errors produced by the content request layer.
///
/// Only [`Error::EmptyInput`], [`Error::Busy`], [`Error::Config`] and
/// [`Error::Catalog`] ever reach callers of [`Animalpedia`](crate::Animalpedia);
/// the rest are absorbed by the fallback policy.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider could not be reached or answered with a failure status.
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered but the payload did not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The caller supplied nothing to work with.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    /// A conversation already has a reply in flight.
    #[error("a reply is still streaming")]
    Busy,
    /// A prompt template failed to render.
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] tera::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("catalog unavailable: {0}")]
    Catalog(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

/// Failure classes understood by the fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transport,
    Malformed,
}

impl Error {
    /// Classify the error for the fallback policy.
    ///
    /// Returns `None` for errors that belong to the caller and must not be
    /// replaced by fallback content.
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Error::Transport(_) => Some(FailureClass::Transport),
            Error::MalformedResponse(_) | Error::Prompt(_) => Some(FailureClass::Malformed),
            Error::EmptyInput(_) | Error::Busy | Error::Config(_) | Error::Catalog(_) => None,
        }
    }
}
