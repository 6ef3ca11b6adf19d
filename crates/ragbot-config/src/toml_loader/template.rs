//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# ragbot configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Environment variables (PROJECT_ID, LOCATION, MODEL_NAME, RAG_CORPUS_NAME,
# VERTEX_ACCESS_TOKEN, SLACK_BOT_TOKEN, SLACK_SIGNING_SECRET,
# SLACK_DEFAULT_CHANNEL, PORT) take precedence over this file.

[vertex]
# project_id = "my-gcp-project"
location = "asia-east1"
model = "gemini-2.5-flash"
# rag_corpus = "projects/my-gcp-project/locations/asia-east1/ragCorpora/1234567890"
# access_token = "ya29...."   # prefer VERTEX_ACCESS_TOKEN

[generation]
# temperature = 1.0          # 0.0-2.0
# top_p = 0.95               # 0.0-1.0
# max_output_tokens = 8192   # 1-65536
# safety_off = true

[session]
# timeout_secs = 120         # 1-3600

[slack]
# bot_token = "xoxb-..."     # prefer SLACK_BOT_TOKEN
# signing_secret = "..."     # prefer SLACK_SIGNING_SECRET
# default_channel = "#general"

[server]
# host = "0.0.0.0"
# port = 3000
"##
    .to_string()
}
