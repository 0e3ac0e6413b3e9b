use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path};
use tokio::fs;
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-5";

/// Contenu optionnel de pulse.yaml. Jamais de secrets ici : les clés API
/// viennent uniquement de l'environnement.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct FileConf {
    pub bind: Option<String>,
    pub metrics_base_url: Option<String>,
    pub bubble_workflow_url: Option<String>,
    pub completion: Option<CompletionFileConf>,
    pub workflow_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct CompletionFileConf {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Upstream activé seulement si l'URL ET le jeton sont présents.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConf {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConf {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Configuration résolue une fois au démarrage puis injectée dans chaque collaborateur.
#[derive(Debug, Clone)]
pub struct PulseConfig {
    pub bind: SocketAddr,
    pub metrics: Option<UpstreamConf>,
    pub bubble: Option<UpstreamConf>,
    pub completion: CompletionConf,
    /// Workflow ChatKit pour POST /chatkit ; absent => la route répond 500.
    pub workflow_id: Option<String>,
}

impl PulseConfig {
    /// Fusionne le fichier et une source clé/valeur (l'env en prod). La source gagne.
    pub fn resolve<F>(file: FileConf, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // une valeur vide compte comme absente
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let bind_txt = get("PULSE_BIND")
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_txt
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{bind_txt}': {e}"))?;

        let metrics = pair(
            get("METRICS_BASE_URL").or(file.metrics_base_url),
            get("METRICS_API_KEY"),
        );
        let bubble = pair(
            get("BUBBLE_WORKFLOW_URL").or(file.bubble_workflow_url),
            get("BUBBLE_API_TOKEN"),
        );

        let file_completion = file.completion.unwrap_or_default();
        let completion = CompletionConf {
            base_url: get("OPENAI_BASE_URL")
                .or(file_completion.base_url)
                .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string()),
            model: get("OPENAI_MODEL")
                .or(file_completion.model)
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            api_key: get("OPENAI_API_KEY"),
        };

        let workflow_id = get("WORKFLOW_ID").or(file.workflow_id.filter(|w| !w.is_empty()));

        Ok(Self { bind, metrics, bubble, completion, workflow_id })
    }
}

fn pair(url: Option<String>, token: Option<String>) -> Option<UpstreamConf> {
    match (url.filter(|u| !u.is_empty()), token) {
        (Some(url), Some(token)) => Some(UpstreamConf { url, token }),
        _ => None,
    }
}

pub async fn load_file_conf(path: &Path) -> FileConf {
    if !path.exists() {
        return FileConf::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    if txt.trim().is_empty() {
        return FileConf::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!("config invalide {}: {e}, usage config par défaut", path.display());
        FileConf::default()
    })
}

pub async fn load_config() -> anyhow::Result<PulseConfig> {
    let path = std::env::var("PULSE_AGENT_CONFIG").unwrap_or_else(|_| "pulse.yaml".into());
    let file = load_file_conf(Path::new(&path)).await;
    PulseConfig::resolve(file, |key| std::env::var(key).ok())
}
