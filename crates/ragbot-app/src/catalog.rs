//! `models` and `corpora` commands.

use std::io::Write;

use ragbot_ai::gemini::{partition_models, CorpusInfo, ModelInfo};
use ragbot_ai::GeminiClient;
use ragbot_common::RagbotError;

pub async fn list_models<W: Write>(client: &GeminiClient, out: &mut W) -> Result<(), RagbotError> {
    let config = client.config();
    writeln!(
        out,
        "Listing models in project={}, location={}...",
        config.project_id, config.location
    )?;
    let models = client
        .list_models()
        .await
        .map_err(|e| RagbotError::Ai(e.to_string()))?;
    out.write_all(render_models(&models).as_bytes())?;
    Ok(())
}

/// List corpora. When `configured` is set, fail unless it is among them.
pub async fn list_corpora<W: Write>(
    client: &GeminiClient,
    configured: Option<&str>,
    out: &mut W,
) -> Result<(), RagbotError> {
    let corpora = client
        .list_rag_corpora()
        .await
        .map_err(|e| RagbotError::Ai(e.to_string()))?;
    let config = client.config();
    out.write_all(render_corpora(&config.project_id, &config.location, &corpora).as_bytes())?;

    match configured {
        Some(name) if corpora.iter().any(|c| c.name == name) => {
            writeln!(out, "\n✅ Using configured corpus: {name}")?;
            Ok(())
        }
        Some(name) => Err(RagbotError::Other(format!(
            "configured RAG_CORPUS_NAME not found: {name}"
        ))),
        None => {
            if !corpora.is_empty() {
                writeln!(out, "\nSet RAG_CORPUS_NAME to the chosen corpus name to use it.")?;
            }
            Ok(())
        }
    }
}

pub fn render_models(models: &[ModelInfo]) -> String {
    if models.is_empty() {
        return "No models found.\n".to_string();
    }

    let (gemini, other) = partition_models(models);
    let mut s = format!("Found {} model(s):\n\n", models.len());
    if !gemini.is_empty() {
        s.push_str("=== Gemini Models (for text generation with RAG) ===\n");
        for name in &gemini {
            s.push_str(&format!("  {name}\n"));
        }
        s.push('\n');
    }
    if !other.is_empty() {
        s.push_str("=== Other Models ===\n");
        for model in &other {
            s.push_str(&format!("  {}\n    Full name: {}\n", model.short_name, model.name));
        }
        s.push('\n');
    }
    match gemini.first() {
        Some(first) => s.push_str(&format!("Set MODEL_NAME=\"{first}\" to use it.\n")),
        None => s.push_str(
            "No Gemini models found. Check that the Vertex AI API is enabled, \
             or try another region.\n",
        ),
    }
    s
}

pub fn render_corpora(project: &str, location: &str, corpora: &[CorpusInfo]) -> String {
    if corpora.is_empty() {
        return format!("No RAG corpora found in project={project}, location={location}\n");
    }

    let mut s = format!("RAG corpora in project={project}, location={location}:\n");
    for (i, corpus) in corpora.iter().enumerate() {
        s.push_str(&format!("{}. name={}\n", i + 1, corpus.name));
        if !corpus.display_name.is_empty() {
            s.push_str(&format!("   display_name={}\n", corpus.display_name));
        }
    }
    s
}
