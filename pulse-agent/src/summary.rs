use crate::config::CompletionConf;
use crate::error::PulseError;
use crate::models::{SummaryRequest, SummaryText};
use crate::upstream::{send_json, SummaryModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "completion";

pub const SYSTEM_PROMPT: &str = "You are a concise, bilingual real estate assistant for Québec.";

/// Gabarit du message utilisateur envoyé au modèle.
pub fn build_prompt(region: &str, metrics: &str, user_text: &str) -> String {
    format!(
        "\nTu es un assistant immobilier québécois.\n\
         Résume ces données du marché ({region}) en deux courts paragraphes (FR puis EN, 80–100 mots chacun).\n\
         Ajoute ensuite trois bullet points \"comment le dire aux clients aujourd'hui\".\n\
         Si des données manquent, dis \"Donnée non disponible / Data not available\".\n\
         Données : {metrics}\n\
         Texte utilisateur : {user_text}\n"
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Appel chat-completion. Pas de mode dégradé : sans clé, la requête échoue.
pub struct SummaryGenerator {
    client: reqwest::Client,
    conf: CompletionConf,
}

impl SummaryGenerator {
    pub fn new(client: reqwest::Client, conf: CompletionConf) -> Self {
        Self { client, conf }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.conf.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SummaryModel for SummaryGenerator {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<SummaryText, PulseError> {
        let api_key = self
            .conf
            .api_key
            .as_deref()
            .ok_or(PulseError::MissingCredential("OPENAI_API_KEY"))?;

        let metrics = request.metrics.to_compact_json()?;
        let prompt = build_prompt(request.region, &metrics, request.user_text);
        let body = ChatRequest {
            model: &self.conf.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
        };

        debug!(region = request.region, model = %self.conf.model, "requesting summary");
        let reply = send_json(
            SERVICE,
            self.client.post(self.endpoint()).bearer_auth(api_key).json(&body),
        )
        .await?;

        let chat: ChatResponse = serde_json::from_value(reply)?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(SummaryText::from)
            .ok_or(PulseError::EmptyCompletion)
    }
}
