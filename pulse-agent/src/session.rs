use crate::config::CompletionConf;
use crate::error::PulseError;
use crate::models::SessionGrant;
use crate::upstream::SessionIssuer;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "chatkit";
const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifiant fixe de l'utilisateur final côté ChatKit.
pub const WEB_USER: &str = "web-user-1";

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    user: &'a str,
    workflow: WorkflowRef<'a>,
}

#[derive(Debug, Serialize)]
struct WorkflowRef<'a> {
    id: &'a str,
}

/// Ouvre une session ChatKit pour le widget du front et relaie son secret.
pub struct ChatKitSessions {
    client: reqwest::Client,
    conf: CompletionConf,
    workflow_id: Option<String>,
}

impl ChatKitSessions {
    pub fn new(client: reqwest::Client, conf: CompletionConf, workflow_id: Option<String>) -> Self {
        Self { client, conf, workflow_id }
    }

    fn endpoint(&self) -> String {
        format!("{}/chatkit/sessions", self.conf.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SessionIssuer for ChatKitSessions {
    async fn create_session(&self) -> Result<SessionGrant, PulseError> {
        let api_key = self
            .conf
            .api_key
            .as_deref()
            .ok_or(PulseError::MissingCredential("OPENAI_API_KEY"))?;
        let workflow_id = self
            .workflow_id
            .as_deref()
            .ok_or(PulseError::MissingCredential("WORKFLOW_ID"))?;

        debug!(workflow_id, "creating chatkit session");
        let body = SessionRequest { user: WEB_USER, workflow: WorkflowRef { id: workflow_id } };
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(SESSION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|source| PulseError::Transport { service: SERVICE, source })?;

        // statut non-2xx relayé tel quel au front
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "chatkit session refused");
        }
        let reply: Value = response
            .json()
            .await
            .map_err(|source| PulseError::Transport { service: SERVICE, source })?;
        Ok(SessionGrant::from_reply(status, &reply))
    }
}
