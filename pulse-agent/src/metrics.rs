use crate::config::UpstreamConf;
use crate::error::PulseError;
use crate::models::{value_text, MetricsPlaceholder, MetricsResult};
use crate::upstream::{send_json, MetricsSource};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

const SERVICE: &str = "metrics";

/// Client du fournisseur de métriques.
/// Sans URL ou sans clé, renvoie des données d'exemple au lieu d'échouer.
pub struct MetricsFetcher {
    client: reqwest::Client,
    upstream: Option<UpstreamConf>,
}

impl MetricsFetcher {
    pub fn new(client: reqwest::Client, upstream: Option<UpstreamConf>) -> Self {
        Self { client, upstream }
    }

    fn endpoint(base: &str) -> String {
        format!("{}/v1/market/metrics", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl MetricsSource for MetricsFetcher {
    async fn fetch(&self, region: &Value) -> Result<MetricsResult, PulseError> {
        let Some(conf) = &self.upstream else {
            warn!(%region, "metrics config missing, using placeholder data");
            return Ok(MetricsResult::Placeholder(MetricsPlaceholder::for_region(region)));
        };

        debug!(%region, "fetching market metrics");
        let mut request = self.client.get(Self::endpoint(&conf.url)).bearer_auth(&conf.token);
        // région null => pas de paramètre
        if !region.is_null() {
            request = request.query(&[("region", value_text(region))]);
        }
        let body = send_json(SERVICE, request).await?;
        Ok(MetricsResult::Live(body))
    }
}
