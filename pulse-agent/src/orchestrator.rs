use crate::config::PulseConfig;
use crate::error::PulseError;
use crate::metrics::MetricsFetcher;
use crate::models::{value_text, AgentRunRequest, AgentRunResponse, PublishPayload, SummaryRequest};
use crate::publish::Publisher;
use crate::summary::SummaryGenerator;
use crate::upstream::{MetricsSource, PublishSink, SummaryModel};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Étapes d'une exécution, toujours dans cet ordre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingMetrics,
    Summarizing,
    Publishing,
    Responding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchingMetrics => "fetching_metrics",
            Stage::Summarizing => "summarizing",
            Stage::Publishing => "publishing",
            Stage::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// Enchaîne métriques -> résumé -> publication (optionnelle) pour une requête.
/// Aucun état entre deux requêtes ; la première erreur interrompt tout.
pub struct RequestOrchestrator {
    metrics: Arc<dyn MetricsSource>,
    summarizer: Arc<dyn SummaryModel>,
    publisher: Arc<dyn PublishSink>,
}

impl RequestOrchestrator {
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        summarizer: Arc<dyn SummaryModel>,
        publisher: Arc<dyn PublishSink>,
    ) -> Self {
        Self { metrics, summarizer, publisher }
    }

    pub fn from_config(cfg: &PulseConfig, client: reqwest::Client) -> Self {
        Self::new(
            Arc::new(MetricsFetcher::new(client.clone(), cfg.metrics.clone())),
            Arc::new(SummaryGenerator::new(client.clone(), cfg.completion.clone())),
            Arc::new(Publisher::new(client, cfg.bubble.clone())),
        )
    }

    pub async fn run(&self, request: &AgentRunRequest) -> Result<AgentRunResponse, PulseError> {
        let region = request.region();
        let conversation_id = request.conversation_id();

        debug!(%conversation_id, stage = %Stage::FetchingMetrics);
        let metrics = self.metrics.fetch(&region).await?;

        debug!(%conversation_id, stage = %Stage::Summarizing);
        let region_text = value_text(&region);
        let user_text = request.user_text();
        let summary = self
            .summarizer
            .summarize(SummaryRequest { region: &region_text, metrics: &metrics, user_text: &user_text })
            .await?;

        let bubble_result = if request.wants_publish() {
            debug!(%conversation_id, stage = %Stage::Publishing);
            let payload = PublishPayload::from_summary(request.as_of(), &summary, metrics.to_compact_json()?);
            Some(self.publisher.publish(payload).await?)
        } else {
            None
        };

        debug!(%conversation_id, stage = %Stage::Responding);
        info!(%conversation_id, %region, published = bubble_result.is_some(), "pulse run completed");
        Ok(AgentRunResponse {
            conversation_id,
            region,
            output: summary,
            bubble_result,
        })
    }
}
