//! Sift library crate (used by the server binary and integration tests).
//!
//! Sift is a CV screening gateway: it stages a multipart upload (one criteria
//! PDF plus a batch of candidate CVs) into a per-request temporary directory,
//! renders a fixed evaluation prompt, issues one streaming generation call to
//! the upstream model provider, accumulates the streamed verdict, and relays
//! it to the caller. The temporary directory is removed on every exit path.
//!
//! ## Modules
//!
//! - [`config`] - Environment-backed server configuration
//! - [`sanitize`] - Client filename sanitization
//! - [`staging`] - Multipart intake and temp-directory staging
//! - [`prompt`] - Deterministic evaluation prompt rendering
//! - [`evaluate`] - Orchestration of the upstream streaming call
//! - [`gateway`] - Axum router, request lifecycle and error mapping
//!
//! ## Test/Mock Support
//!
//! A scripted generation backend is available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod evaluate;
pub mod gateway;
pub mod prompt;
pub mod sanitize;
pub mod staging;

pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use evaluate::MockGeneration;
pub use evaluate::{
    EvalError, Evaluation, EvaluationRequest, GenAiBackend, GenerationBackend, GenerationEvent,
};
pub use gateway::{GatewayError, HandlerState, create_router_with_state};
pub use sanitize::sanitize;
pub use staging::{StagedFile, StagedUpload, StagingError, UploadLimits};
