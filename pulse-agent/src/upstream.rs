/**
 * UPSTREAMS - Contrats des collaborateurs externes de l'agent
 *
 * RÔLE :
 * Définit les interfaces appelées par les handlers, une par API tierce :
 * - MetricsSource = fournisseur de métriques du marché
 * - SummaryModel  = API de complétion (résumé bilingue)
 * - PublishSink   = webhook de workflow Bubble
 * - SessionIssuer = sessions ChatKit pour le widget front (hors orchestrateur)
 *
 * FONCTIONNEMENT :
 * - Chaque implémentation HTTP reçoit sa config au constructeur (aucune lecture d'env ici)
 * - `send_json` centralise l'envoi + le contrôle du statut (non-2xx => PulseError::Upstream)
 * - Aucun retry ; seul l'appel ChatKit a un timeout (30 s)
 *
 * UTILITÉ :
 * 🎯 Tests : l'orchestrateur tourne avec des doubles sans réseau
 */

use crate::error::PulseError;
use crate::models::{
    MetricsResult, PublishPayload, PublishResult, SessionGrant, SummaryRequest, SummaryText,
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;

#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self, region: &Value) -> Result<MetricsResult, PulseError>;
}

#[async_trait]
pub trait SummaryModel: Send + Sync {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<SummaryText, PulseError>;
}

#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, payload: PublishPayload) -> Result<PublishResult, PulseError>;
}

/// Le statut upstream fait partie du résultat : un refus n'est pas une erreur.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn create_session(&self) -> Result<SessionGrant, PulseError>;
}

/// Envoie la requête et décode le corps JSON si le statut est 2xx.
pub async fn send_json(service: &'static str, request: RequestBuilder) -> Result<Value, PulseError> {
    let response = request
        .send()
        .await
        .map_err(|source| PulseError::Transport { service, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PulseError::Upstream { service, status });
    }

    response
        .json::<Value>()
        .await
        .map_err(|source| PulseError::Transport { service, source })
}
