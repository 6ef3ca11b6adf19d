//! Terminal host: interactive chat and one-shot questions.

use std::io::{self, Write};
use std::sync::Arc;

use ragbot_ai::{format_history, ControlCommand, Reply, TurnError, TurnOrchestrator};
use ragbot_common::{ConversationKey, RagbotError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;

const RULE_WIDTH: usize = 80;

enum TurnOutcome {
    Answered,
    Empty,
    Failed(String),
    Interrupted,
}

/// One terminal conversation. `interrupt` (Ctrl-C in the binary) abandons
/// the turn in flight, or ends the session when idle at the prompt.
pub struct Console<W> {
    orchestrator: Arc<TurnOrchestrator>,
    key: ConversationKey,
    out: W,
    interrupt: Arc<Notify>,
}

impl<W: Write + Send> Console<W> {
    pub fn new(orchestrator: Arc<TurnOrchestrator>, out: W) -> Self {
        Self {
            orchestrator,
            key: ConversationKey::random(),
            out,
            interrupt: Arc::new(Notify::new()),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Arc<Notify>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_banner(&mut self, model: &str, corpus: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "\n🤖 Model: {model}")?;
        writeln!(self.out, "📚 RAG Corpus: {corpus}")?;
        writeln!(self.out, "\n{rule}")?;
        writeln!(self.out, "💬 Interactive Chat Session Started")?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "💡 Type your questions. Answers are grounded in your RAG corpus.")?;
        writeln!(self.out, "💡 Commands:")?;
        writeln!(self.out, "   - Type 'exit' or 'quit' to end the session")?;
        writeln!(self.out, "   - Type 'clear' to clear conversation history")?;
        writeln!(self.out, "   - Type 'history' to see conversation history")?;
        writeln!(self.out, "{rule}\n")
    }

    /// Read lines from `input` until `exit`, end of input, or an interrupt
    /// at the prompt.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(self.out, "You: ")?;
            self.out.flush()?;

            let next = tokio::select! {
                line = lines.next_line() => Some(line?),
                _ = self.interrupt.notified() => None,
            };
            let line = match next {
                None => {
                    writeln!(self.out, "\n\n👋 Interrupted. Goodbye!")?;
                    return Ok(());
                }
                Some(None) => {
                    writeln!(self.out, "\n\n👋 Goodbye!")?;
                    return Ok(());
                }
                Some(Some(line)) => line,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match ControlCommand::parse(line) {
                Some(ControlCommand::Exit) => {
                    writeln!(self.out, "\n👋 Goodbye!")?;
                    return Ok(());
                }
                Some(ControlCommand::Clear) => {
                    self.orchestrator.clear(&self.key).await;
                    writeln!(self.out, "🧹 Conversation history cleared.\n")?;
                }
                Some(ControlCommand::History) => {
                    let listing = format_history(&self.orchestrator.history(&self.key));
                    writeln!(self.out, "\n{listing}\n")?;
                }
                None => {
                    self.turn(line).await?;
                }
            }
        }
    }

    /// Ask one question and print the answer. Errors when nothing could be
    /// answered.
    pub async fn ask(&mut self, question: &str) -> Result<(), RagbotError> {
        writeln!(self.out, "❓ {question}")?;
        match self.turn(question).await? {
            TurnOutcome::Answered | TurnOutcome::Empty => Ok(()),
            TurnOutcome::Failed(reason) => Err(RagbotError::Ai(reason)),
            TurnOutcome::Interrupted => Err(RagbotError::Other("interrupted".into())),
        }
    }

    async fn turn(&mut self, text: &str) -> io::Result<TurnOutcome> {
        write!(self.out, "\n🤖 Assistant: ")?;
        self.out.flush()?;

        let out = &mut self.out;
        let mut write_error = None;
        let submit = self
            .orchestrator
            .submit_streaming(&self.key, text, |fragment: &str| {
                if write_error.is_none() {
                    if let Err(e) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
                        write_error = Some(e);
                    }
                }
            });

        // Dropping the submit rolls the pending turn back.
        let result = tokio::select! {
            result = submit => Some(result),
            _ = self.interrupt.notified() => None,
        };
        if let Some(e) = write_error {
            return Err(e);
        }

        let outcome = match result {
            None => {
                writeln!(self.out, "\n⏹ Interrupted. The question was discarded.\n")?;
                TurnOutcome::Interrupted
            }
            Some(Ok(Reply::Answer(_))) => {
                writeln!(self.out, "\n")?;
                TurnOutcome::Answered
            }
            Some(Ok(Reply::NoResponse)) => {
                writeln!(self.out, "{}\n", Reply::NO_RESPONSE_TEXT)?;
                TurnOutcome::Empty
            }
            Some(Err(TurnError::EmptyInput)) => TurnOutcome::Empty,
            Some(Err(TurnError::ServiceUnavailable(reason))) => {
                writeln!(self.out, "\n❌ {reason}\n")?;
                TurnOutcome::Failed(reason)
            }
            Some(Err(TurnError::Generation(e))) => {
                writeln!(self.out, "\n❌ Error generating response: {e}\n")?;
                TurnOutcome::Failed(e.to_string())
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use ragbot_ai::{
        AiError, AnswerCapability, Generation, GenerationOptions, SessionStore, Turn,
    };

    use super::*;

    enum Mode {
        Echo,
        Fail,
        Hang,
    }

    struct Backend(Mode);

    #[async_trait]
    impl AnswerCapability for Backend {
        async fn generate(
            &self,
            _key: &ConversationKey,
            turns: &[Turn],
            _options: &GenerationOptions,
        ) -> Result<Generation, AiError> {
            match self.0 {
                Mode::Echo => {
                    let last = turns.last().map(|t| t.text.clone()).unwrap_or_default();
                    Ok(Generation::Text(format!("echo: {last}")))
                }
                Mode::Fail => Err(AiError::ApiError("HTTP 503: unavailable".into())),
                Mode::Hang => {
                    std::future::pending::<()>().await;
                    Err(AiError::Timeout)
                }
            }
        }
    }

    fn console(mode: Mode) -> Console<Vec<u8>> {
        let orchestrator = TurnOrchestrator::new(SessionStore::new())
            .with_capability(Arc::new(Backend(mode)));
        Console::new(Arc::new(orchestrator), Vec::new())
    }

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn chat_session_with_commands() {
        let mut console = console(Mode::Echo);
        let input: &[u8] = b"hello\n\nhistory\nclear\nhistory\nexit\nnever asked\n";
        console.run(input).await.unwrap();

        let out = output(console);
        assert!(out.contains("🤖 Assistant: echo: hello"));
        assert!(out.contains("1. 👤 User: hello"));
        assert!(out.contains("2. 🤖 Assistant: echo: hello"));
        assert!(out.contains("🧹 Conversation history cleared."));
        assert!(out.contains("📜 No conversation history yet."));
        assert!(out.trim_end().ends_with("👋 Goodbye!"));
        assert!(!out.contains("never asked"));
    }

    #[tokio::test]
    async fn end_of_input_says_goodbye() {
        let mut console = console(Mode::Echo);
        console.run(&b"hi\n"[..]).await.unwrap();
        assert_eq!(console.orchestrator.history(console.key()).len(), 2);
        assert!(output(console).contains("👋 Goodbye!"));
    }

    #[tokio::test]
    async fn failures_are_reported_and_the_loop_continues() {
        let mut console = console(Mode::Fail);
        console.run(&b"first\nsecond\nquit\n"[..]).await.unwrap();

        assert!(console.orchestrator.history(console.key()).is_empty());
        let out = output(console);
        assert_eq!(out.matches("❌ Error generating response").count(), 2);
        assert!(out.contains("HTTP 503"));
    }

    #[tokio::test]
    async fn missing_backend_is_reported() {
        let orchestrator = Arc::new(TurnOrchestrator::new(SessionStore::new()));
        let mut console = Console::new(orchestrator, Vec::new());
        let err = console.ask("anything").await.unwrap_err();
        assert!(matches!(err, RagbotError::Ai(_)));
        assert!(output(console).contains("❌ no answering backend configured"));
    }

    #[tokio::test]
    async fn ask_prints_question_and_answer() {
        let mut console = console(Mode::Echo);
        console.ask("What is the main topic?").await.unwrap();
        let out = output(console);
        assert!(out.starts_with("❓ What is the main topic?"));
        assert!(out.contains("echo: What is the main topic?"));
    }

    #[tokio::test]
    async fn ask_fails_on_generation_error() {
        let mut console = console(Mode::Fail);
        let err = console.ask("q").await.unwrap_err();
        assert_eq!(err.to_string(), "ai error: API error: HTTP 503: unavailable");
    }

    #[tokio::test]
    async fn interrupt_discards_the_turn_in_flight() {
        let interrupt = Arc::new(Notify::new());
        let mut console = console(Mode::Hang).with_interrupt(interrupt.clone());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            interrupt.notify_one();
        });
        console.run(&b"long question\n"[..]).await.unwrap();

        assert!(console.orchestrator.history(console.key()).is_empty());
        let out = output(console);
        assert!(out.contains("⏹ Interrupted"));
        assert!(out.contains("👋 Goodbye!"));
    }
}
