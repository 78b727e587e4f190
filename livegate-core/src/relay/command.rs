// Relay worker backed by an external program (ffmpeg by default).
//
// The child process does the media I/O; this worker only owns its lifecycle.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::worker::{RelayError, RelayFactory, RelayWorker};
use crate::config::RelayConfig;

const SOURCE_PLACEHOLDER: &str = "{source}";
const TARGET_PLACEHOLDER: &str = "{target}";

#[derive(Debug, Clone)]
pub struct CommandRelayFactory {
    program: String,
    args: Vec<String>,
    startup_grace: Duration,
}

impl CommandRelayFactory {
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            startup_grace: config.startup_grace(),
        }
    }
}

impl RelayFactory for CommandRelayFactory {
    fn create(&self, source_url: &str, target_url: &str) -> Box<dyn RelayWorker> {
        Box::new(CommandRelay::new(
            self.program.clone(),
            render_args(&self.args, source_url, target_url),
            self.startup_grace,
        ))
    }
}

fn render_args(template: &[String], source_url: &str, target_url: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace(SOURCE_PLACEHOLDER, source_url)
                .replace(TARGET_PLACEHOLDER, target_url)
        })
        .collect()
}

pub struct CommandRelay {
    program: String,
    args: Vec<String>,
    startup_grace: Duration,
    child: Option<Child>,
}

impl CommandRelay {
    #[must_use]
    pub const fn new(program: String, args: Vec<String>, startup_grace: Duration) -> Self {
        Self {
            program,
            args,
            startup_grace,
            child: None,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

#[async_trait]
impl RelayWorker for CommandRelay {
    async fn start(&mut self) -> Result<(), RelayError> {
        if self.is_running() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RelayError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // A relay that cannot reach either endpoint exits almost immediately.
        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            Ok(Ok(status)) => Err(RelayError::ExitedEarly(status)),
            Ok(Err(e)) => Err(RelayError::Start(format!(
                "failed to wait for relay program {}: {e}",
                self.program
            ))),
            Err(_) => {
                info!(program = %self.program, pid = ?child.id(), "Relay program started");
                self.child = Some(child);
                Ok(())
            }
        }
    }

    async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(program = %self.program, %status, "Relay program already exited");
            }
            _ => {
                if let Err(e) = child.kill().await {
                    warn!(program = %self.program, error = %e, "Failed to kill relay program");
                } else {
                    debug!(program = %self.program, "Relay program stopped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, grace_ms: u64) -> CommandRelay {
        CommandRelay::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
            Duration::from_millis(grace_ms),
        )
    }

    #[test]
    fn test_render_args_substitutes_endpoints() {
        let factory = CommandRelayFactory::new(&RelayConfig::default());
        let args = render_args(&factory.args, "rtmp://src/live/a", "rtmp://dst/live/a");

        assert!(args.contains(&"rtmp://src/live/a".to_string()));
        assert!(args.contains(&"rtmp://dst/live/a".to_string()));
        assert!(!args.iter().any(|a| a.contains('{')));
        let source_pos = args.iter().position(|a| a == "rtmp://src/live/a").unwrap();
        assert_eq!(args[source_pos - 1], "-i");
        assert_eq!(args.last().unwrap(), "rtmp://dst/live/a");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let mut relay = CommandRelay::new(
            "/nonexistent/relay-program".to_string(),
            vec![],
            Duration::from_millis(50),
        );

        let err = relay.start().await.unwrap_err();
        assert!(matches!(err, RelayError::Spawn { .. }));
        assert!(!relay.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_is_a_start_failure() {
        let mut relay = sh("exit 3", 2000);

        let err = relay.start().await.unwrap_err();
        assert!(matches!(err, RelayError::ExitedEarly(status) if status.code() == Some(3)));
        assert!(!relay.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_then_stop_is_idempotent() {
        let mut relay = sh("sleep 30", 100);

        relay.start().await.unwrap();
        assert!(relay.is_running());

        relay.stop().await;
        assert!(!relay.is_running());

        // second stop is a no-op
        relay.stop().await;
        assert!(!relay.is_running());
    }
}
