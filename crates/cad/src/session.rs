//! Session: one request's handle on a CAD/EM backend or its mock.
//!
//! The mode is fixed when the session opens. In mock mode every capability
//! call is recorded and answered with a descriptor whose `built_in_backend`
//! is `false`. In real mode calls go to a [`CadBackend`]; backend errors are
//! caught, logged and turned into `failed` descriptors. Only opening a
//! session can fail outright.
//!
//! A session is closed once, through [`Session::close`]. A session dropped
//! while open (the request was cancelled or timed out) releases its backend
//! without the save step; process backends kill their child on drop.

use antennaflow_core::error::SessionError;
use antennaflow_core::{ActionClass, Params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{
    BackendConnector, BoundarySpec, CadBackend, GeometrySpec, PortSpec, ProjectOptions,
    ReportSpec, SetupSpec,
};

/// Where capability calls go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Mock,
    Real,
}

impl SessionMode {
    pub fn from_flag(use_real: bool) -> Self {
        if use_real { SessionMode::Real } else { SessionMode::Mock }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Mock => "mock",
            SessionMode::Real => "real",
        }
    }
}

/// How a capability call ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Unsupported { capability: String },
    Failed { message: String },
}

/// What a capability call produced. Mock and real sessions return the same
/// shape; only `built_in_backend` tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub kind: ActionClass,
    pub name: String,
    pub params: Params,
    pub built_in_backend: bool,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Descriptor {
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

/// One line of the session's own log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub action: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionLogEntry {
    fn ok(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            detail: detail.into(),
            error: None,
        }
    }

    fn failed(action: impl Into<String>, detail: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            detail: detail.into(),
            error: Some(error.into()),
        }
    }
}

pub struct Session {
    mode: SessionMode,
    project_name: String,
    backend: Option<Box<dyn CadBackend>>,
    log: Vec<SessionLogEntry>,
    open: bool,
}

impl Session {
    /// Open a mock session. Never fails.
    pub fn open_mock(options: &ProjectOptions) -> Self {
        info!(project = %options.project_name, "Opened mock session");
        let mut session = Self {
            mode: SessionMode::Mock,
            project_name: options.project_name.clone(),
            backend: None,
            log: Vec::new(),
            open: true,
        };
        session.log.push(SessionLogEntry::ok(
            "connect",
            format!("mock session for project '{}'", options.project_name),
        ));
        session
    }

    /// Open a session in `mode`. Real mode needs a connector; connecting is
    /// the one place a session error escapes.
    pub async fn open(
        mode: SessionMode,
        options: &ProjectOptions,
        connector: Option<&dyn BackendConnector>,
    ) -> Result<Self, SessionError> {
        match mode {
            SessionMode::Mock => Ok(Self::open_mock(options)),
            SessionMode::Real => {
                let connector = connector.ok_or(SessionError::NoConnector)?;
                let backend = connector.connect(options).await?;
                info!(
                    project = %options.project_name,
                    backend = backend.name(),
                    non_graphical = options.non_graphical,
                    "Opened real session"
                );
                let detail = format!(
                    "{} backend for project '{}'",
                    backend.name(),
                    options.project_name
                );
                Ok(Self {
                    mode,
                    project_name: options.project_name.clone(),
                    backend: Some(backend),
                    log: vec![SessionLogEntry::ok("connect", detail)],
                    open: true,
                })
            }
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn log(&self) -> &[SessionLogEntry] {
        &self.log
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub async fn build_geometry(&mut self, spec: &GeometrySpec) -> Descriptor {
        let params = spec
            .params
            .merged(&Params::new().with("topology", spec.topology.clone()));
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.build_geometry(spec).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Geometry, "build_geometry", &spec.name, params, reply)
    }

    pub async fn assign_port(&mut self, spec: &PortSpec) -> Descriptor {
        let params = Params::new()
            .with("target", spec.target.clone())
            .with("impedance_ohm", spec.impedance_ohm);
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.assign_port(spec).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Excitation, "assign_port", &spec.name, params, reply)
    }

    pub async fn assign_boundary(&mut self, spec: &BoundarySpec) -> Descriptor {
        let params = Params::new().with("type", spec.kind.clone());
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.assign_boundary(spec).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Boundary, "assign_boundary", &spec.target, params, reply)
    }

    pub async fn create_setup(&mut self, spec: &SetupSpec) -> Descriptor {
        let params = Params::new().with("frequencies_hz", spec.frequencies_hz.clone());
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.create_setup(spec).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Setup, "create_setup", &spec.name, params, reply)
    }

    pub async fn analyze(&mut self, setup: &str) -> Descriptor {
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.analyze(setup).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Analyze, "analyze", setup, Params::new(), reply)
    }

    pub async fn export_report(&mut self, spec: &ReportSpec) -> Descriptor {
        let params = Params::new().with("path", spec.path.clone());
        let reply = match self.route() {
            Ok(backend) => Reply::Answered(backend.export_report(spec).await),
            Err(reply) => reply,
        };
        self.record(ActionClass::Export, "export_report", &spec.report, params, reply)
    }

    /// The backend a call should go to, or the reply to use without one.
    fn route(&mut self) -> Result<&mut dyn CadBackend, Reply> {
        if !self.open {
            return Err(Reply::Closed);
        }
        match self.backend.as_deref_mut() {
            Some(backend) => Ok(backend),
            None => Err(Reply::Mock),
        }
    }

    /// Shared tail of every capability: classify, log, describe.
    fn record(
        &mut self,
        kind: ActionClass,
        action: &str,
        name: &str,
        params: Params,
        reply: Reply,
    ) -> Descriptor {
        let detail = format!("{name} {params}");

        let (outcome, built_in_backend) = match reply {
            Reply::Closed => (
                Outcome::Failed {
                    message: "session is closed".into(),
                },
                false,
            ),
            Reply::Mock => (Outcome::Ok, false),
            Reply::Answered(Ok(())) => (Outcome::Ok, true),
            Reply::Answered(Err(SessionError::Unsupported(capability))) => {
                (Outcome::Unsupported { capability }, false)
            }
            Reply::Answered(Err(e)) => (
                Outcome::Failed {
                    message: e.to_string(),
                },
                false,
            ),
        };

        match &outcome {
            Outcome::Ok => {
                debug!(action, name, built_in_backend, "Session call succeeded");
                self.log.push(SessionLogEntry::ok(action, detail));
            }
            Outcome::Unsupported { capability } => {
                warn!(action, capability = %capability, "Backend does not support capability");
                self.log
                    .push(SessionLogEntry::failed(action, detail, format!("unsupported: {capability}")));
            }
            Outcome::Failed { message } => {
                warn!(action, error = %message, "Session call failed");
                self.log.push(SessionLogEntry::failed(action, detail, message.clone()));
            }
        }

        Descriptor {
            kind,
            name: name.to_string(),
            params,
            built_in_backend,
            outcome,
        }
    }

    /// Close the session and hand back its log. Real backends persist and
    /// release their resources here; a close error is logged, not returned.
    pub async fn close(mut self) -> Vec<SessionLogEntry> {
        self.open = false;

        match self.backend.take() {
            Some(mut backend) => match backend.close().await {
                Ok(()) => self.log.push(SessionLogEntry::ok(
                    "close",
                    format!("saved and released project '{}'", self.project_name),
                )),
                Err(e) => {
                    warn!(error = %e, "Backend close failed");
                    self.log.push(SessionLogEntry::failed(
                        "close",
                        format!("project '{}'", self.project_name),
                        e.to_string(),
                    ));
                }
            },
            None => self.log.push(SessionLogEntry::ok(
                "close",
                format!("mock session for project '{}'", self.project_name),
            )),
        }
        info!(mode = self.mode.as_str(), project = %self.project_name, "Closed session");
        std::mem::take(&mut self.log)
    }
}

/// What a capability call got back before classification.
enum Reply {
    Closed,
    Mock,
    Answered(Result<(), SessionError>),
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.open && self.backend.is_some() {
            warn!(project = %self.project_name, "Session dropped while open; releasing backend unsaved");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("project_name", &self.project_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("log_len", &self.log.len())
            .field("open", &self.open)
            .finish()
    }
}
