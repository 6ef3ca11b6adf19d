use serde::{Deserialize, Serialize};

/// Vertex AI project, region, model, and grounding corpus.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexConfig {
    /// Google Cloud project id.
    pub project_id: String,
    /// Region hosting the model and the RAG corpus.
    pub location: String,
    /// Publisher model id, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Full corpus resource name:
    /// `projects/{project}/locations/{location}/ragCorpora/{id}`.
    pub rag_corpus: Option<String>,
    /// OAuth access token (`gcloud auth print-access-token`).
    pub access_token: Option<String>,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: "asia-east1".into(),
            model: "gemini-2.5-flash".into(),
            rag_corpus: None,
            access_token: None,
        }
    }
}

impl std::fmt::Debug for VertexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("rag_corpus", &self.rag_corpus)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
