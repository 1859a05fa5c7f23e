use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};

/// Configuration for a Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Chat backend that shells out to the `claude` CLI. Credentials are whatever
/// the CLI is logged in with.
pub struct ClaudeCli {
    config: ClaudeCliConfig,
}

impl ClaudeCli {
    pub fn new(config: ClaudeCliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChatModel for ClaudeCli {
    fn name(&self) -> &str {
        "claude_cli"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        invoke_claude(&request.system, &request.user, &self.config).await
    }
}

/// Invoke the `claude` CLI with a system prompt and user prompt.
/// Returns the raw stdout text.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    debug!(model = %config.model, "Invoking claude CLI");

    let result = tokio::time::timeout(config.timeout, async {
        Command::new("claude")
            .args([
                "-p",
                user_prompt,
                "--system-prompt",
                system_prompt,
                "--model",
                &config.model,
                "--output-format",
                "text",
            ])
            .kill_on_drop(true)
            .output()
            .await
    })
    .await
    .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
    .map_err(|e| AgentError::Cli(format!("Failed to spawn claude: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
        return Err(AgentError::Cli(format!(
            "claude exited {}: {}",
            result.status, stderr
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(AgentError::Cli("Claude returned empty response".to_string()));
    }

    Ok(stdout)
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
