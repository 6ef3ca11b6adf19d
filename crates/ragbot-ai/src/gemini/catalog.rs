//! Model and RAG corpus listing.

use serde::Deserialize;
use tracing::debug;

use crate::AiError;

use super::client::GeminiClient;

/// A publisher model visible in the configured region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Full resource name, e.g. `publishers/google/models/gemini-2.5-flash`.
    pub name: String,
    /// Model id after `/models/`.
    pub short_name: String,
}

/// A RAG corpus in the configured project and region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusInfo {
    /// `projects/{project}/locations/{location}/ragCorpora/{id}`.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublisherModelsPage {
    #[serde(default)]
    publisher_models: Vec<PublisherModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct PublisherModel {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RagCorporaPage {
    #[serde(default)]
    rag_corpora: Vec<CorpusInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Model id after the last `/models/` segment, or the whole name.
pub fn short_model_name(name: &str) -> &str {
    name.rsplit_once("/models/").map_or(name, |(_, short)| short)
}

/// Split models into sorted, de-duplicated Gemini ids and everything else.
pub fn partition_models(models: &[ModelInfo]) -> (Vec<String>, Vec<ModelInfo>) {
    let mut gemini = Vec::new();
    let mut other = Vec::new();
    for model in models {
        if model.short_name.to_lowercase().contains("gemini") {
            gemini.push(model.short_name.clone());
        } else {
            other.push(model.clone());
        }
    }
    gemini.sort();
    gemini.dedup();
    (gemini, other)
}

impl GeminiClient {
    /// List Google publisher models.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, AiError> {
        let url = format!("{}/v1beta1/publishers/google/models", self.config.base_url());
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: PublisherModelsPage = self.get_page(&url, page_token.as_deref()).await?;
            models.extend(page.publisher_models.into_iter().map(|m| ModelInfo {
                short_name: short_model_name(&m.name).to_string(),
                name: m.name,
            }));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "listed publisher models");
        Ok(models)
    }

    /// List RAG corpora in the configured project and region.
    pub async fn list_rag_corpora(&self) -> Result<Vec<CorpusInfo>, AiError> {
        let url = format!(
            "{}/v1/{}/ragCorpora",
            self.config.base_url(),
            self.config.parent()
        );
        let mut corpora = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: RagCorporaPage = self.get_page(&url, page_token.as_deref()).await?;
            corpora.extend(page.rag_corpora);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = corpora.len(), "listed RAG corpora");
        Ok(corpora)
    }

    /// Whether `name` is among the listed corpora.
    pub async fn corpus_exists(&self, name: &str) -> Result<bool, AiError> {
        let corpora = self.list_rag_corpora().await?;
        Ok(corpora.iter().any(|c| c.name == name))
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        page_token: Option<&str>,
    ) -> Result<T, AiError> {
        let mut request = self
            .http
            .get(url)
            .bearer_auth(&self.config.access_token)
            .header("x-goog-user-project", &self.config.project_id);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))
    }
}
