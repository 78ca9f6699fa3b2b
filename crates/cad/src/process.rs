//! Real backend over a bridge process speaking JSON lines.
//!
//! The bridge is any program (typically a small script around the vendor's
//! automation API) that reads one JSON request per line on stdin and writes
//! one JSON reply per line on stdout:
//!
//! ```text
//! > {"op":"connect","project":"AntennaFlow_project","non_graphical":true}
//! < {"ok":true}
//! > {"op":"create_setup","name":"Setup1","frequencies_hz":[2.4e9]}
//! < {"ok":false,"error":"no solver license"}
//! > {"op":"export_report","report":"S11","path":"S11.csv"}
//! < {"ok":false,"unsupported":true}
//! > {"op":"close"}
//! < {"ok":true}
//! ```
//!
//! `close` asks the bridge to save the project and waits for it to exit. A
//! backend dropped without `close` kills its child.

use antennaflow_core::error::SessionError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::backend::{
    BackendConnector, BoundarySpec, CadBackend, GeometrySpec, PortSpec, ProjectOptions,
    ReportSpec, SetupSpec,
};

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    unsupported: bool,
}

/// A running bridge process.
pub struct ProcessBackend {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    closed: bool,
}

impl ProcessBackend {
    /// Spawn `command` (program then arguments) and open the project.
    pub async fn spawn(command: &[String], options: &ProjectOptions) -> Result<Self, SessionError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SessionError::Connect("bridge command is empty".into()))?;

        debug!(program = %program, ?args, "Spawning backend bridge");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Connect(format!("failed to start '{program}': {e}")))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(SessionError::Connect("bridge stdio unavailable".into()));
        };

        let mut backend = Self {
            program: program.clone(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            closed: false,
        };

        backend
            .call(
                "connect",
                json!({
                    "project": options.project_name,
                    "non_graphical": options.non_graphical,
                }),
            )
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        Ok(backend)
    }

    /// Send one request and wait for its reply.
    async fn call(&mut self, op: &str, payload: Value) -> Result<(), SessionError> {
        let mut request = json!({ "op": op });
        if let (Some(target), Value::Object(fields)) = (request.as_object_mut(), payload) {
            target.extend(fields);
        }

        let mut line = serde_json::to_string(&request).map_err(|e| SessionError::Io(e.to_string()))?;
        line.push('\n');
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SessionError::Io("bridge input already closed".into()))?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SessionError::Io(format!("write to bridge failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| SessionError::Io(format!("write to bridge failed: {e}")))?;

        let mut reply = String::new();
        let read = self
            .stdout
            .read_line(&mut reply)
            .await
            .map_err(|e| SessionError::Io(format!("read from bridge failed: {e}")))?;
        if read == 0 {
            return Err(SessionError::Backend {
                operation: op.into(),
                reason: "bridge closed its output without replying".into(),
            });
        }

        let reply: Reply = serde_json::from_str(reply.trim()).map_err(|e| SessionError::Backend {
            operation: op.into(),
            reason: format!("malformed reply: {e}"),
        })?;

        match reply {
            Reply { ok: true, .. } => Ok(()),
            Reply {
                unsupported: true, ..
            } => Err(SessionError::Unsupported(op.into())),
            Reply { error, .. } => Err(SessionError::Backend {
                operation: op.into(),
                reason: error.unwrap_or_else(|| "unspecified bridge error".into()),
            }),
        }
    }

    async fn call_with<T: serde::Serialize + Sync>(
        &mut self,
        op: &str,
        payload: &T,
    ) -> Result<(), SessionError> {
        let payload = serde_json::to_value(payload).map_err(|e| SessionError::Io(e.to_string()))?;
        self.call(op, payload).await
    }
}

#[async_trait]
impl CadBackend for ProcessBackend {
    fn name(&self) -> &str {
        &self.program
    }

    async fn build_geometry(&mut self, spec: &GeometrySpec) -> Result<(), SessionError> {
        self.call_with("build_geometry", spec).await
    }

    async fn assign_port(&mut self, spec: &PortSpec) -> Result<(), SessionError> {
        self.call_with("assign_port", spec).await
    }

    async fn assign_boundary(&mut self, spec: &BoundarySpec) -> Result<(), SessionError> {
        self.call_with("assign_boundary", spec).await
    }

    async fn create_setup(&mut self, spec: &SetupSpec) -> Result<(), SessionError> {
        self.call_with("create_setup", spec).await
    }

    async fn analyze(&mut self, setup: &str) -> Result<(), SessionError> {
        self.call("analyze", json!({ "setup": setup })).await
    }

    async fn export_report(&mut self, spec: &ReportSpec) -> Result<(), SessionError> {
        self.call_with("export_report", spec).await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.call("close", json!({})).await;
        // Dropping stdin lets a well-behaved bridge exit on its own.
        self.stdin = None;
        match self.child.wait().await {
            Ok(status) if !status.success() => {
                warn!(program = %self.program, %status, "Bridge exited with failure")
            }
            Err(e) => warn!(program = %self.program, error = %e, "Failed to wait for bridge"),
            _ => {}
        }
        result
    }
}

/// Opens a [`ProcessBackend`] per session.
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    command: Vec<String>,
}

impl ProcessConnector {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl BackendConnector for ProcessConnector {
    async fn connect(&self, options: &ProjectOptions) -> Result<Box<dyn CadBackend>, SessionError> {
        Ok(Box::new(ProcessBackend::spawn(&self.command, options).await?))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::session::{Outcome, Session, SessionMode};
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    /// Replies ok to everything except the ops named in the case arms.
    const BRIDGE: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *'"op":"analyze"'*) echo '{"ok":false,"error":"no solver license"}' ;;
    *'"op":"export_report"'*) echo '{"ok":false,"unsupported":true}' ;;
    *'"op":"close"'*) echo '{"ok":true}'; exit 0 ;;
    *) echo '{"ok":true}' ;;
  esac
done
"#;

    #[tokio::test]
    async fn empty_command_is_connect_error() {
        assert!(matches!(
            ProcessBackend::spawn(&[], &ProjectOptions::default()).await,
            Err(SessionError::Connect(_))
        ));
    }

    #[tokio::test]
    async fn missing_program_is_connect_error() {
        let command = vec!["/nonexistent/antennaflow-bridge".to_string()];
        assert!(matches!(
            ProcessBackend::spawn(&command, &ProjectOptions::default()).await,
            Err(SessionError::Connect(_))
        ));
    }

    #[tokio::test]
    async fn silent_bridge_is_connect_error() {
        assert!(matches!(
            ProcessBackend::spawn(&sh("exit 0"), &ProjectOptions::default()).await,
            Err(SessionError::Connect(_))
        ));
    }

    #[tokio::test]
    async fn replies_map_to_outcomes() {
        let connector = ProcessConnector::new(sh(BRIDGE));
        let mut session = Session::open(SessionMode::Real, &ProjectOptions::default(), Some(&connector))
            .await
            .unwrap();

        let d = session
            .create_setup(&SetupSpec {
                name: "Setup1".into(),
                frequencies_hz: vec![2.4e9],
            })
            .await;
        assert!(d.is_ok());
        assert!(d.built_in_backend);

        let d = session.analyze("Setup1").await;
        assert!(matches!(&d.outcome, Outcome::Failed { message } if message.contains("license")));

        let d = session
            .export_report(&ReportSpec {
                report: "S11".into(),
                path: "S11.csv".into(),
            })
            .await;
        assert!(matches!(d.outcome, Outcome::Unsupported { .. }));

        let log = session.close().await;
        let close = log.last().unwrap();
        assert_eq!(close.action, "close");
        assert!(close.error.is_none());
    }

    #[tokio::test]
    async fn malformed_reply_is_backend_error() {
        let mut backend = ProcessBackend::spawn(
            &sh(r#"read -r l; echo '{"ok":true}'; read -r l; echo 'not json'"#),
            &ProjectOptions::default(),
        )
        .await
        .unwrap();
        match backend.analyze("Setup1").await {
            Err(SessionError::Backend { operation, reason }) => {
                assert_eq!(operation, "analyze");
                assert!(reason.contains("malformed"));
            }
            other => panic!("Expected Backend error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_solve_yields_to_a_timeout() {
        let mut backend = ProcessBackend::spawn(
            &sh(r#"read -r l; echo '{"ok":true}'; read -r l; sleep 5; echo '{"ok":true}'"#),
            &ProjectOptions::default(),
        )
        .await
        .unwrap();

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(Duration::from_millis(200), backend.analyze("Setup1")).await;
        assert!(outcome.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
