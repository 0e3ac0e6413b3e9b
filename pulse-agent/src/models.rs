use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_REGION: &str = "QC";
pub const DEFAULT_CONVERSATION_ID: &str = "pulse-demo";
pub const DEFAULT_USER_TEXT: &str = "run_market_pulse_for_QC";
pub const DEFAULT_AS_OF: &str = "today";

pub const METRICS_PLACEHOLDER_WARNING: &str = "metrics config missing; using placeholder data";
pub const PUBLISH_PLACEHOLDER_WARNING: &str = "bubble config missing; skipping publish";
pub const DATA_NOT_AVAILABLE_FR: &str = "Donnée non disponible";

// Puces de démo, pas extraites du résumé.
pub const PLACEHOLDER_BULLETS: [&str; 3] = ["Point #1", "Point #2", "Point #3"];
pub const PUBLISH_SOURCES: [&str; 2] = ["Statistique Canada", "Banque du Canada"];

/// Corps de POST /agent/run. Aucune validation : chaque champ est une valeur JSON
/// quelconque. Absent => valeur par défaut, `null` explicite => `null` conservé.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentRunRequest {
    #[serde(default, deserialize_with = "present")]
    pub region: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub conversation_id: Option<Value>,
    /// Évalué en vérité (0, "", [] => false)
    #[serde(default, deserialize_with = "present")]
    pub auto_publish: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub input_as_text: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub as_of: Option<Value>,
}

// Clé présente (même à null) => Some
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn field_or(field: &Option<Value>, default: &str) -> Value {
    field.clone().unwrap_or_else(|| Value::String(default.to_string()))
}

impl AgentRunRequest {
    pub fn region(&self) -> Value {
        field_or(&self.region, DEFAULT_REGION)
    }

    pub fn conversation_id(&self) -> Value {
        field_or(&self.conversation_id, DEFAULT_CONVERSATION_ID)
    }

    pub fn user_text(&self) -> String {
        value_text(&field_or(&self.input_as_text, DEFAULT_USER_TEXT))
    }

    pub fn as_of(&self) -> Value {
        field_or(&self.as_of, DEFAULT_AS_OF)
    }

    pub fn wants_publish(&self) -> bool {
        self.auto_publish.as_ref().map(truthy).unwrap_or(false)
    }
}

/// Forme texte d'une valeur libre : une chaîne telle quelle, le reste en JSON compact.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSample {
    pub interest_rate: f64,
    pub trend: String,
    pub inventory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsPlaceholder {
    pub warning: String,
    pub region: Value,
    pub sample: MetricsSample,
}

impl MetricsPlaceholder {
    pub fn for_region(region: &Value) -> Self {
        Self {
            warning: METRICS_PLACEHOLDER_WARNING.to_string(),
            region: region.clone(),
            sample: MetricsSample {
                interest_rate: 5.25,
                trend: "stable".to_string(),
                inventory: DATA_NOT_AVAILABLE_FR.to_string(),
            },
        }
    }
}

/// Réponse du fournisseur de métriques, passée telle quelle, ou données d'exemple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricsResult {
    Live(Value),
    Placeholder(MetricsPlaceholder),
}

impl MetricsResult {
    pub fn to_compact_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub struct SummaryRequest<'a> {
    pub region: &'a str,
    pub metrics: &'a MetricsResult,
    pub user_text: &'a str,
}

/// Texte brut du modèle. Aucune structure n'en est extraite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryText(String);

impl SummaryText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SummaryText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for SummaryText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub as_of: Value,
    pub fr_text: String,
    pub en_text: String,
    pub bullets: [String; 3],
    pub metrics_json: String,
    pub sources: Vec<String>,
    pub auto_publish: bool,
}

impl PublishPayload {
    /// fr_text et en_text reçoivent le même texte : le résumé n'est pas découpé par langue.
    pub fn from_summary(as_of: Value, summary: &SummaryText, metrics_json: String) -> Self {
        Self {
            as_of,
            fr_text: summary.as_str().to_string(),
            en_text: summary.as_str().to_string(),
            bullets: PLACEHOLDER_BULLETS.map(String::from),
            metrics_json,
            sources: PUBLISH_SOURCES.iter().map(|s| s.to_string()).collect(),
            auto_publish: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PublishResult {
    Acknowledged(Value),
    Skipped {
        warning: String,
        payload_preview: PublishPayload,
    },
}

impl PublishResult {
    pub fn skipped(payload: PublishPayload) -> Self {
        PublishResult::Skipped {
            warning: PUBLISH_PLACEHOLDER_WARNING.to_string(),
            payload_preview: payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRunResponse {
    pub conversation_id: Value,
    pub region: Value,
    pub output: SummaryText,
    pub bubble_result: Option<PublishResult>,
}

/// Session ChatKit renvoyée au front : statut upstream repris tel quel,
/// champs absents de la réponse => `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionGrant {
    pub status: StatusCode,
    pub client_secret: Value,
    pub expires_at: Value,
}

impl SessionGrant {
    pub fn from_reply(status: StatusCode, reply: &Value) -> Self {
        let field = |name: &str| reply.get(name).cloned().unwrap_or(Value::Null);
        Self {
            status,
            client_secret: field("client_secret"),
            expires_at: field("expires_at"),
        }
    }

    pub fn body(&self) -> Value {
        serde_json::json!({ "client_secret": self.client_secret, "expires_at": self.expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: AgentRunRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.region(), json!("QC"));
        assert_eq!(req.conversation_id(), json!("pulse-demo"));
        assert_eq!(req.user_text(), "run_market_pulse_for_QC");
        assert_eq!(req.as_of(), json!("today"));
        assert!(!req.wants_publish());
    }

    #[test]
    fn test_fields_pass_through_untyped() {
        let req: AgentRunRequest = serde_json::from_value(json!({
            "region": 42,
            "conversation_id": {"id": 7},
            "input_as_text": ["a", "b"],
            "as_of": 20251019
        }))
        .unwrap();
        assert_eq!(req.region(), json!(42));
        assert_eq!(req.conversation_id(), json!({"id": 7}));
        assert_eq!(req.user_text(), r#"["a","b"]"#);
        assert_eq!(req.as_of(), json!(20251019));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let req: AgentRunRequest =
            serde_json::from_value(json!({"region": null, "conversation_id": null, "auto_publish": null}))
                .unwrap();
        assert_eq!(req.region(), Value::Null);
        assert_eq!(req.conversation_id(), Value::Null);
        assert!(!req.wants_publish());
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("QC")), "QC");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&Value::Null), "null");
    }

    #[test]
    fn test_auto_publish_truthiness() {
        let cases = [
            (json!(true), true),
            (json!(false), false),
            (json!(1), true),
            (json!(0), false),
            (json!(0.0), false),
            (json!("yes"), true),
            (json!(""), false),
            (json!([]), false),
            (json!([0]), true),
            (json!({}), false),
        ];
        for (value, expected) in cases {
            let req: AgentRunRequest =
                serde_json::from_value(json!({ "auto_publish": value.clone() })).unwrap();
            assert_eq!(req.wants_publish(), expected, "auto_publish = {value}");
        }
    }

    #[test]
    fn test_metrics_placeholder_shape() {
        let result = MetricsResult::Placeholder(MetricsPlaceholder::for_region(&json!("ON")));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "warning": "metrics config missing; using placeholder data",
                "region": "ON",
                "sample": {"interest_rate": 5.25, "trend": "stable", "inventory": "Donnée non disponible"}
            })
        );
    }

    #[test]
    fn test_publish_payload_duplicates_summary() {
        let payload =
            PublishPayload::from_summary(json!("2025-01-01"), &SummaryText::from("texte"), "{}".into());
        assert_eq!(payload.fr_text, "texte");
        assert_eq!(payload.en_text, "texte");
        assert_eq!(payload.bullets, ["Point #1", "Point #2", "Point #3"]);
        assert_eq!(payload.sources, vec!["Statistique Canada", "Banque du Canada"]);
        assert!(payload.auto_publish);

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["bullets"], json!(["Point #1", "Point #2", "Point #3"]));
    }

    #[test]
    fn test_response_serializes_null_bubble_result() {
        let resp = AgentRunResponse {
            conversation_id: json!("c"),
            region: json!("QC"),
            output: SummaryText::from("S"),
            bubble_result: None,
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"conversation_id":"c","region":"QC","output":"S","bubble_result":null}"#
        );
    }

    #[test]
    fn test_session_grant_missing_fields_are_null() {
        let grant = SessionGrant::from_reply(StatusCode::OK, &json!({"client_secret": "cs_1", "id": "s"}));
        assert_eq!(grant.body(), json!({"client_secret": "cs_1", "expires_at": null}));

        let grant = SessionGrant::from_reply(StatusCode::BAD_REQUEST, &json!(["not", "an", "object"]));
        assert_eq!(grant.status, StatusCode::BAD_REQUEST);
        assert_eq!(grant.body(), json!({"client_secret": null, "expires_at": null}));
    }
}
