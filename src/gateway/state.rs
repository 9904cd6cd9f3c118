use std::time::Duration;

use crate::config::Config;
use crate::evaluate::GenerationBackend;
use crate::staging::UploadLimits;

/// Shared router state: the generation backend plus admission limits.
#[derive(Clone)]
pub struct HandlerState<P: GenerationBackend + Clone + Send + Sync + 'static> {
    pub backend: P,

    pub limits: UploadLimits,

    /// Upper bound on one evaluation (upstream call + stream consumption).
    pub provider_timeout: Duration,
}

impl<P> HandlerState<P>
where
    P: GenerationBackend + Clone + Send + Sync + 'static,
{
    pub fn new(backend: P, config: &Config) -> Self {
        Self {
            backend,
            limits: config.upload_limits(),
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
        }
    }
}
