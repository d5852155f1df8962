//! Session-resuming backend that drives the `claude` CLI in print mode.
//!
//! Only the newest user message is sent on each call. The first successful
//! call establishes the system prompt and yields a session id; later calls
//! pass `--resume <id>` and let the CLI replay earlier turns itself.
//!
//! Invocation shape (argv, never a shell string):
//!
//! ```text
//! claude -p --system-prompt <prompt> --output-format json <message>   # first call
//! claude -p --resume <session-id>    --output-format json <message>   # afterwards
//! ```

use crate::discovery;
use crate::types::{ChatBackend, Turn, latest_user_message};
use async_trait::async_trait;
use marginalia_config::Config;
use marginalia_runner::{AsyncProcessRunner, CommandSpec, RunnerError, TokioRunner};
use marginalia_utils::error::LlmError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The fields of `--output-format json` we rely on
#[derive(Debug, Deserialize)]
struct CliResponse {
    result: Option<String>,
    session_id: Option<String>,
}

pub struct ClaudeCliBackend {
    binary_path: PathBuf,
    timeout: Duration,
    runner: Arc<dyn AsyncProcessRunner>,
    // Set once by the first response that carries an id.
    session_id: OnceLock<String>,
}

impl std::fmt::Debug for ClaudeCliBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeCliBackend")
            .field("binary_path", &self.binary_path)
            .field("timeout", &self.timeout)
            .field("session_id", &self.session_id.get())
            .finish_non_exhaustive()
    }
}

impl ClaudeCliBackend {
    /// Backend for an already-resolved binary.
    pub fn new(binary_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_runner(binary_path, timeout, Arc::new(TokioRunner::new()))
    }

    /// Backend that executes through `runner`, e.g. a recording fake.
    pub fn with_runner(
        binary_path: impl Into<PathBuf>,
        timeout: Duration,
        runner: Arc<dyn AsyncProcessRunner>,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
            runner,
            session_id: OnceLock::new(),
        }
    }

    /// Resolve the binary through cached discovery, honouring
    /// `[llm.claude] binary` as the preferred candidate.
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let binary = discovery::discover(config.claude_binary()).ok_or_else(|| {
            LlmError::Misconfiguration(
                "Claude CLI binary not found. Install claude, or set [llm.claude] binary \
                 (or --claude-binary) to its path."
                    .to_string(),
            )
        })?;
        Ok(Self::new(binary, config.claude_timeout()))
    }

    #[must_use]
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Session id captured from the first response, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    fn build_command(&self, system_prompt: &str, message: &str) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.binary_path).arg("-p");
        match self.session_id() {
            Some(id) => cmd = cmd.args(["--resume", id]),
            None if !system_prompt.trim().is_empty() => {
                cmd = cmd.arg("--system-prompt").arg(system_prompt);
            }
            None => {}
        }
        cmd.args(["--output-format", "json"]).arg(message)
    }

    fn parse_response(stdout: &str) -> Result<CliResponse, LlmError> {
        serde_json::from_str(stdout.trim()).map_err(|e| {
            LlmError::Protocol(format!("Claude CLI did not return valid JSON: {e}"))
        })
    }

    fn capture_session(&self, session_id: Option<String>) {
        let Some(id) = session_id.filter(|id| !id.trim().is_empty()) else {
            return;
        };
        match self.session_id.set(id) {
            Ok(()) => debug!(session_id = ?self.session_id.get(), "captured Claude CLI session"),
            Err(rejected) => {
                if self.session_id.get() != Some(&rejected) {
                    warn!(
                        current = ?self.session_id.get(),
                        reported = %rejected,
                        "Claude CLI reported a different session id; keeping the first one"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ChatBackend for ClaudeCliBackend {
    async fn chat(&self, system_prompt: &str, history: &[Turn]) -> Result<String, LlmError> {
        let message = latest_user_message(history).ok_or_else(|| {
            LlmError::Precondition("No user message in conversation history".to_string())
        })?;

        let cmd = self.build_command(system_prompt, message);
        debug!(
            provider = "claude-cli",
            binary = %self.binary_path.display(),
            resume = self.session_id().is_some(),
            timeout_secs = self.timeout.as_secs(),
            "Invoking Claude CLI"
        );

        let output = self
            .runner
            .run(&cmd, self.timeout)
            .await
            .map_err(|err| match err {
                RunnerError::Timeout { .. } => LlmError::Timeout {
                    duration: self.timeout,
                },
                other => LlmError::Transport(format!("Failed to run Claude CLI: {other}")),
            })?;

        if !output.success() {
            return Err(LlmError::ProcessFailed {
                exit_code: output.exit_code.unwrap_or(-1),
                output: output.combined_output(),
            });
        }

        let stderr = output.stderr_string();
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim_end(), "Claude CLI wrote to stderr");
        }

        let response = Self::parse_response(&output.stdout_string())?;
        self.capture_session(response.session_id);
        response.result.ok_or_else(|| {
            LlmError::Protocol("Missing 'result' field in Claude CLI output".to_string())
        })
    }

    fn provider(&self) -> &'static str {
        "claude-cli"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_runner::ProcessOutput;
    use std::sync::Mutex;

    /// Replays canned outputs and records every command it was asked to run.
    struct ScriptedRunner {
        outputs: Mutex<Vec<Result<ProcessOutput, RunnerError>>>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<Result<ProcessOutput, RunnerError>>) -> Arc<Self> {
            Arc::new(Self {
                outputs: Mutex::new(outputs.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AsyncProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            cmd: &CommandSpec,
            _timeout: Duration,
        ) -> Result<ProcessOutput, RunnerError> {
            self.seen.lock().unwrap().push(cmd.args_lossy());
            self.outputs
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected extra invocation")
        }
    }

    fn ok_json(body: &str) -> Result<ProcessOutput, RunnerError> {
        Ok(ProcessOutput::new(body.as_bytes().to_vec(), Vec::new(), Some(0)))
    }

    fn backend(runner: Arc<ScriptedRunner>) -> ClaudeCliBackend {
        ClaudeCliBackend::with_runner("/opt/claude", DEFAULT_TIMEOUT, runner)
    }

    #[tokio::test]
    async fn first_call_sends_system_prompt_then_resumes() {
        let runner = ScriptedRunner::new(vec![
            ok_json(r#"{"result":"Who are your users?","session_id":"sess-1"}"#),
            ok_json(r#"{"result":"Got it.","session_id":"sess-1"}"#),
        ]);
        let backend = backend(runner.clone());

        let mut history = vec![Turn::user("hello")];
        let first = backend.chat("SYSTEM", &history).await.unwrap();
        history.push(Turn::assistant(first.clone()));
        history.push(Turn::user("developers"));
        let second = backend.chat("SYSTEM", &history).await.unwrap();

        assert_eq!(first, "Who are your users?");
        assert_eq!(second, "Got it.");
        assert_eq!(backend.session_id(), Some("sess-1"));
        assert_eq!(
            runner.calls(),
            vec![
                vec!["-p", "--system-prompt", "SYSTEM", "--output-format", "json", "hello"],
                vec!["-p", "--resume", "sess-1", "--output-format", "json", "developers"],
            ]
        );
    }

    #[tokio::test]
    async fn blank_system_prompt_is_not_passed() {
        let runner = ScriptedRunner::new(vec![ok_json(r#"{"result":"ok"}"#)]);
        let backend = backend(runner.clone());

        backend.chat("  \n", &[Turn::user("hi")]).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec!["-p", "--output-format", "json", "hi"]]
        );
        assert_eq!(backend.session_id(), None);
    }

    #[tokio::test]
    async fn no_user_message_fails_without_spawning() {
        let runner = ScriptedRunner::new(Vec::new());
        let backend = backend(runner.clone());

        let err = backend
            .chat("SYSTEM", &[Turn::assistant("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Precondition(_)), "{err:?}");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_result_is_a_protocol_error() {
        let runner = ScriptedRunner::new(vec![ok_json(r#"{"session_id":"s"}"#)]);
        let err = backend(runner)
            .chat("", &[Turn::user("x")])
            .await
            .unwrap_err();
        match err {
            LlmError::Protocol(msg) => assert!(msg.contains("Missing 'result' field")),
            other => panic!("expected Protocol, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_stdout_is_a_protocol_error() {
        let runner = ScriptedRunner::new(vec![ok_json("not json at all")]);
        let err = backend(runner)
            .chat("", &[Turn::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Protocol(_)), "{err:?}");
    }

    #[tokio::test]
    async fn nonzero_exit_reports_code_and_output() {
        let runner = ScriptedRunner::new(vec![Ok(ProcessOutput::new(
            b"partial".to_vec(),
            b"auth required".to_vec(),
            Some(2),
        ))]);
        let err = backend(runner)
            .chat("", &[Turn::user("x")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LlmError::ProcessFailed {
                exit_code: 2,
                output: "partial\nauth required".to_string()
            }
        );
    }

    #[tokio::test]
    async fn runner_timeout_maps_to_llm_timeout() {
        let runner = ScriptedRunner::new(vec![Err(RunnerError::Timeout {
            timeout: Duration::from_secs(7),
        })]);
        let backend = ClaudeCliBackend::with_runner("/opt/claude", Duration::from_secs(7), runner);

        let err = backend.chat("", &[Turn::user("x")]).await.unwrap_err();

        assert!(err.to_string().contains("timed out after 7s"), "{err}");
    }

    #[tokio::test]
    async fn first_session_id_wins() {
        let runner = ScriptedRunner::new(vec![
            ok_json(r#"{"result":"a","session_id":"first"}"#),
            ok_json(r#"{"result":"b","session_id":"second"}"#),
            ok_json(r#"{"result":"c"}"#),
        ]);
        let backend = backend(runner.clone());

        for text in ["1", "2", "3"] {
            backend.chat("S", &[Turn::user(text)]).await.unwrap();
        }

        assert_eq!(backend.session_id(), Some("first"));
        let calls = runner.calls();
        assert_eq!(calls[1][2], "first");
        assert_eq!(calls[2][2], "first");
    }

    #[tokio::test]
    async fn spawn_failure_is_transport() {
        let runner = ScriptedRunner::new(vec![Err(RunnerError::SpawnFailed {
            program: "/opt/claude".into(),
            reason: "No such file or directory".into(),
        })]);
        let err = backend(runner)
            .chat("", &[Turn::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)), "{err:?}");
    }
}
