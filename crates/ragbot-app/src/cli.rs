use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ragbot: questions answered from your documents via Vertex AI RAG.
#[derive(Parser, Debug)]
#[command(name = "ragbot", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. `debug`, `ragbot=trace`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat session in the terminal.
    Chat,

    /// Ask a single question and print the answer.
    Ask {
        #[arg(default_value = DEFAULT_QUESTION)]
        prompt: String,
    },

    /// Run the Slack events backend.
    Serve {
        /// Port to listen on (overrides config and `PORT`).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List publisher models available in the configured region.
    Models,

    /// List RAG corpora and check the configured one.
    Corpora,
}

pub const DEFAULT_QUESTION: &str = "What is the main topic of my document?";

impl Command {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set.
    /// Terminal commands stay quiet so logs don't interleave with output.
    pub fn default_log_directive(&self) -> &'static str {
        match self {
            Command::Serve { .. } => "ragbot=info",
            _ => "ragbot=warn",
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_defaults_prompt() {
        let args = Args::try_parse_from(["ragbot", "ask"]).unwrap();
        assert_eq!(
            args.command,
            Command::Ask {
                prompt: DEFAULT_QUESTION.to_string()
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "ragbot",
            "serve",
            "--port",
            "8080",
            "--config",
            "/tmp/r.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Serve { port: Some(8080) });
        assert_eq!(args.config, Some(PathBuf::from("/tmp/r.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["ragbot"]).is_err());
    }

    #[test]
    fn serve_logs_at_info() {
        assert_eq!(Command::Serve { port: None }.default_log_directive(), "ragbot=info");
        assert_eq!(Command::Chat.default_log_directive(), "ragbot=warn");
    }
}
