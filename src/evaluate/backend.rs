//! Streaming generation backends.
//!
//! [`GenerationBackend`] is the seam between the orchestrator and the outside
//! world: the production [`GenAiBackend`] speaks to the provider through
//! `genai`, and a scripted mock (behind `test`/`mock`) replays canned streams.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use genai::Client;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, ContentPart, MessageContent,
};
use genai::resolver::{AuthData, AuthResolver};
use tracing::debug;

use super::error::{EvalError, classify_provider_message};

/// Static generation policy applied to every upstream call. Not
/// user-configurable.
pub const GEN_TEMPERATURE: f64 = 1.0;
pub const GEN_TOP_P: f64 = 0.95;
pub const GEN_MAX_OUTPUT_TOKENS: u32 = 8192;

/// One base64-encoded attachment plus its MIME type.
#[derive(Debug, Clone)]
pub struct EncodedFile {
    pub mime_type: &'static str,
    pub data: String,
}

/// The single request turn sent upstream: prompt text first, then the
/// criteria attachment, then every candidate in submission order.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub prompt: String,
    pub attachments: Vec<EncodedFile>,
}

/// Fragment of a streamed generation, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// A piece of generated text.
    Text(String),
    /// The stream completed; `block_reason` carries any refusal metadata the
    /// provider reported.
    Finished { block_reason: Option<String> },
}

/// Ordered stream of generation fragments terminated by a completion event.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent, EvalError>> + Send>>;

/// Streaming generation capability consumed by the orchestrator.
pub trait GenerationBackend: Send + Sync {
    /// Opens one streaming generation call for `model` authenticated with
    /// `credential`. Failures are already classified into [`EvalError`].
    fn stream_generation(
        &self,
        credential: &str,
        model: &str,
        parts: RequestParts,
    ) -> impl std::future::Future<Output = Result<GenerationStream, EvalError>> + Send;
}

/// Production backend speaking to the provider through `genai`.
#[derive(Debug, Clone, Default)]
pub struct GenAiBackend;

impl GenerationBackend for GenAiBackend {
    async fn stream_generation(
        &self,
        credential: &str,
        model: &str,
        parts: RequestParts,
    ) -> Result<GenerationStream, EvalError> {
        let client = client_for_key(credential);

        let mut content = MessageContent::default();
        content.push(ContentPart::Text(parts.prompt));
        for attachment in parts.attachments {
            content.push(ContentPart::from_binary_base64(
                attachment.mime_type,
                attachment.data,
                None,
            ));
        }
        let request = ChatRequest::new(vec![ChatMessage::user(content)]);

        let options = ChatOptions::default()
            .with_temperature(GEN_TEMPERATURE)
            .with_top_p(GEN_TOP_P)
            .with_max_tokens(GEN_MAX_OUTPUT_TOKENS);

        let response = client
            .exec_chat_stream(model, request, Some(&options))
            .await
            .map_err(|e| classify_provider_message(&e.to_string(), model))?;

        debug!(model = %model, "provider stream opened");

        let model_owned = model.to_string();
        let stream = response.stream.filter_map(move |event| {
            let mapped = match event {
                Ok(ChatStreamEvent::Start) => None,
                Ok(ChatStreamEvent::Chunk(chunk)) => {
                    Some(Ok(GenerationEvent::Text(chunk.content)))
                }
                // The genai stream end carries no refusal metadata; an empty
                // accumulation is detected downstream instead.
                Ok(ChatStreamEvent::End(_)) => Some(Ok(GenerationEvent::Finished {
                    block_reason: None,
                })),
                Ok(_) => None,
                Err(e) => Some(Err(classify_provider_message(&e.to_string(), &model_owned))),
            };
            std::future::ready(mapped)
        });

        Ok(Box::pin(stream))
    }
}

fn client_for_key(credential: &str) -> Client {
    let key = credential.to_string();
    let auth = AuthResolver::from_resolver_fn(
        move |_model_iden: genai::ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
            Ok(Some(AuthData::from_single(key.clone())))
        },
    );
    Client::builder().with_auth_resolver(auth).build()
}

/// Scripted backend for tests: replays a fixed event sequence (or fails at
/// call time) and counts invocations.
#[cfg(any(test, feature = "mock"))]
#[derive(Clone, Default)]
pub struct MockGeneration {
    events: Vec<Result<GenerationEvent, EvalError>>,
    open_error: Option<EvalError>,
    delay: Option<std::time::Duration>,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "mock"))]
impl MockGeneration {
    /// Streams `text` as a single fragment, then completes.
    pub fn with_text(text: &str) -> Self {
        Self::with_fragments(&[text])
    }

    /// Streams each fragment in order, then completes.
    pub fn with_fragments(fragments: &[&str]) -> Self {
        let mut events: Vec<Result<GenerationEvent, EvalError>> = fragments
            .iter()
            .map(|f| Ok(GenerationEvent::Text(f.to_string())))
            .collect();
        events.push(Ok(GenerationEvent::Finished { block_reason: None }));
        Self {
            events,
            ..Self::default()
        }
    }

    /// Fails when the stream is opened.
    pub fn with_error(error: EvalError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    /// Streams `partial`, then fails mid-stream.
    pub fn with_stream_error(partial: &str, error: EvalError) -> Self {
        Self {
            events: vec![Ok(GenerationEvent::Text(partial.to_string())), Err(error)],
            ..Self::default()
        }
    }

    /// Completes immediately without producing any text.
    pub fn empty() -> Self {
        Self {
            events: vec![Ok(GenerationEvent::Finished { block_reason: None })],
            ..Self::default()
        }
    }

    /// Completes without text, reporting a block reason.
    pub fn blocked(reason: &str) -> Self {
        Self {
            events: vec![Ok(GenerationEvent::Finished {
                block_reason: Some(reason.to_string()),
            })],
            ..Self::default()
        }
    }

    /// Sleeps before answering, to let tests observe in-flight state.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `stream_generation` was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "mock"))]
impl GenerationBackend for MockGeneration {
    async fn stream_generation(
        &self,
        _credential: &str,
        _model: &str,
        _parts: RequestParts,
    ) -> Result<GenerationStream, EvalError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        Ok(Box::pin(futures_util::stream::iter(self.events.clone())))
    }
}
