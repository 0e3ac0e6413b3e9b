use crate::config::UpstreamConf;
use crate::error::PulseError;
use crate::models::{PublishPayload, PublishResult};
use crate::upstream::{send_json, PublishSink};
use async_trait::async_trait;
use tracing::{info, warn};

const SERVICE: &str = "bubble";

/// Pousse le résultat vers le workflow Bubble.
/// Sans URL ou sans jeton, renvoie un aperçu du payload au lieu d'échouer.
pub struct Publisher {
    client: reqwest::Client,
    upstream: Option<UpstreamConf>,
}

impl Publisher {
    pub fn new(client: reqwest::Client, upstream: Option<UpstreamConf>) -> Self {
        Self { client, upstream }
    }
}

#[async_trait]
impl PublishSink for Publisher {
    async fn publish(&self, payload: PublishPayload) -> Result<PublishResult, PulseError> {
        let Some(conf) = &self.upstream else {
            warn!("bubble config missing, skipping publish");
            return Ok(PublishResult::skipped(payload));
        };

        let request = self.client.post(&conf.url).bearer_auth(&conf.token).json(&payload);
        let ack = send_json(SERVICE, request).await?;
        info!(as_of = %payload.as_of, "published to bubble");
        Ok(PublishResult::Acknowledged(ack))
    }
}
