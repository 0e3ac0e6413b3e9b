use reqwest::StatusCode;

/// Erreurs d'une exécution de l'agent.
///
/// Hors `MalformedBody`, toutes sont de classe "upstream" : rien ne les rattrape,
/// elles remontent jusqu'au handler HTTP et deviennent une 500.
/// La configuration manquante des métriques et de Bubble n'est pas une erreur,
/// c'est le chemin placeholder.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    #[error("{service} upstream answered HTTP {status}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
    },
    #[error("{service} upstream call failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0} is not configured")]
    MissingCredential(&'static str),
    #[error("completion response carried no message content")]
    EmptyCompletion,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PulseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PulseError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
