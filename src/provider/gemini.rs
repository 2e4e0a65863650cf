use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, trace};

use super::{Provider, Reply};
use crate::config::GeminiConfig;
use crate::error::Error;
use crate::model::{ChatRole, GroundingSource};
use crate::request::{Content, Part, ProviderRequest};
use crate::stream::{Fragment, FragmentStream};

/// [`Provider`] backed by the Gemini REST API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post(&self, url: String, request: &ProviderRequest) -> Result<reqwest::Response, Error> {
        let body = request_body(request);
        trace!(%url, body = %body, "gemini request");
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "gemini request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            error!(%status, %detail, "gemini returned an error status");
            return Err(Error::Transport(format!("HTTP {status}: {detail}")));
        }
        Ok(resp)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<Reply, Error> {
        let resp = self
            .post(self.config.endpoint("generateContent"), request)
            .await?;
        let body = resp.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;
        let fragment = parsed.into_fragment();
        debug!(feature = %request.feature, response = %fragment.text, "gemini full response");
        Ok(Reply {
            text: fragment.text,
            sources: fragment.sources,
        })
    }

    async fn stream(&self, request: &ProviderRequest) -> Result<FragmentStream, Error> {
        let url = format!("{}?alt=sse", self.config.endpoint("streamGenerateContent"));
        let resp = self.post(url, request).await?;
        let mut bytes = resp.bytes_stream();
        let out = stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!(error = %e, "gemini stream error");
                        yield Err(Error::from(e));
                        return;
                    }
                };
                for payload in decoder.feed(&chunk) {
                    yield decode_event(&payload);
                }
            }
            if let Some(payload) = decoder.finish() {
                yield decode_event(&payload);
            }
        };
        Ok(Box::pin(out))
    }
}

fn decode_event(payload: &str) -> Result<Fragment, Error> {
    serde_json::from_str::<GenerateResponse>(payload)
        .map(GenerateResponse::into_fragment)
        .map_err(|e| Error::MalformedResponse(format!("bad stream event: {e}")))
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

fn part_json(part: &Part) -> Value {
    match part {
        Part::Text(text) => json!({ "text": text }),
        Part::InlineData(blob) => json!({
            "inlineData": { "mimeType": blob.mime_type, "data": blob.data }
        }),
    }
}

fn content_json(content: &Content) -> Value {
    json!({
        "role": role_name(content.role),
        "parts": content.parts.iter().map(part_json).collect::<Vec<_>>(),
    })
}

/// Build the JSON body for `generateContent` / `streamGenerateContent`.
pub(crate) fn request_body(request: &ProviderRequest) -> Value {
    let mut body = json!({
        "contents": request.contents.iter().map(content_json).collect::<Vec<_>>(),
    });
    if let Some(system) = &request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if request.web_grounding {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    if request.json_output {
        let mut config = json!({ "responseMimeType": "application/json" });
        if let Some(schema) = &request.schema {
            config["responseSchema"] = schema.clone();
        }
        body["generationConfig"] = config;
    }
    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    title: Option<String>,
    uri: Option<String>,
}

impl GenerateResponse {
    /// Text and citations of the first candidate.
    fn into_fragment(self) -> Fragment {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Fragment::default();
        };
        let text = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        let sources = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| {
                        let uri = web.uri.filter(|u| !u.is_empty())?;
                        Some(GroundingSource {
                            title: web.title.unwrap_or_else(|| "Untitled Source".into()),
                            uri,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Fragment { text, sources }
    }
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Network chunks may split lines anywhere, including inside a UTF-8
/// sequence, so bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning the data payload of every completed event.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(event) = self.take_event() {
                    events.push(event);
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data.push(data.trim_start().to_string());
            }
        }
        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            let rest = String::from_utf8_lossy(&rest);
            if let Some(data) = rest.trim_end().strip_prefix("data:") {
                self.data.push(data.trim_start().to_string());
            }
        }
        self.take_event()
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}
