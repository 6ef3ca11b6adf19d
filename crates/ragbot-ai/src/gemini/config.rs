//! Vertex AI client configuration.

/// Vertex AI client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    /// Override for the API host, e.g. a local proxy.
    pub api_endpoint: Option<String>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("access_token", &"[REDACTED]")
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            access_token: String::new(),
            api_endpoint: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    /// Base URL for the regional endpoint (`global` has no region prefix).
    pub fn base_url(&self) -> String {
        if let Some(endpoint) = &self.api_endpoint {
            return endpoint.trim_end_matches('/').to_string();
        }
        if self.location == "global" {
            "https://aiplatform.googleapis.com".to_string()
        } else {
            format!("https://{}-aiplatform.googleapis.com", self.location)
        }
    }

    /// `projects/{project}/locations/{location}`.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// Whether enough is set to attempt a request.
    pub fn is_complete(&self) -> bool {
        !self.project_id.trim().is_empty()
            && !self.location.trim().is_empty()
            && !self.access_token.trim().is_empty()
    }
}
