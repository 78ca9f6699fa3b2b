//! The seam between a [`Session`](crate::Session) and a real CAD/EM tool.
//!
//! A backend implements whichever capabilities it supports. Every method has
//! a default that reports [`SessionError::Unsupported`], so a backend that
//! can only build geometry still plugs in and the session records the rest
//! as soft failures.

use antennaflow_core::Params;
use antennaflow_core::error::SessionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A solid to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    pub name: String,
    pub topology: String,
    pub params: Params,
}

/// A lumped/wave port on a named object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub target: String,
    pub impedance_ohm: f64,
}

/// A boundary condition on a named object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySpec {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A named solution setup with its frequency list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupSpec {
    pub name: String,
    pub frequencies_hz: Vec<f64>,
}

/// A report to write to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub report: String,
    pub path: String,
}

/// What a connector needs to open a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    pub project_name: String,
    pub non_graphical: bool,
}

impl ProjectOptions {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            non_graphical: true,
        }
    }

    pub fn with_non_graphical(mut self, non_graphical: bool) -> Self {
        self.non_graphical = non_graphical;
        self
    }
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self::new("AntennaFlow_project")
    }
}

/// A live connection to a CAD/EM tool.
///
/// `analyze` resolves when the solve does, which may take minutes; callers
/// bound it with a timeout around the whole request.
#[async_trait]
pub trait CadBackend: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn build_geometry(&mut self, spec: &GeometrySpec) -> Result<(), SessionError> {
        let _ = spec;
        Err(SessionError::Unsupported("geometry".into()))
    }

    async fn assign_port(&mut self, spec: &PortSpec) -> Result<(), SessionError> {
        let _ = spec;
        Err(SessionError::Unsupported("port".into()))
    }

    async fn assign_boundary(&mut self, spec: &BoundarySpec) -> Result<(), SessionError> {
        let _ = spec;
        Err(SessionError::Unsupported("boundary".into()))
    }

    async fn create_setup(&mut self, spec: &SetupSpec) -> Result<(), SessionError> {
        let _ = spec;
        Err(SessionError::Unsupported("setup".into()))
    }

    async fn analyze(&mut self, setup: &str) -> Result<(), SessionError> {
        let _ = setup;
        Err(SessionError::Unsupported("analyze".into()))
    }

    async fn export_report(&mut self, spec: &ReportSpec) -> Result<(), SessionError> {
        let _ = spec;
        Err(SessionError::Unsupported("report export".into()))
    }

    /// Persist the project and release the tool.
    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Opens backends. Held by whoever decides a request runs against a real tool.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, options: &ProjectOptions) -> Result<Box<dyn CadBackend>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GeometryOnly {
        built: Vec<String>,
    }

    #[async_trait]
    impl CadBackend for GeometryOnly {
        fn name(&self) -> &str {
            "geometry-only"
        }

        async fn build_geometry(&mut self, spec: &GeometrySpec) -> Result<(), SessionError> {
            self.built.push(spec.name.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn defaults_report_unsupported() {
        let mut backend = GeometryOnly { built: vec![] };
        backend
            .build_geometry(&GeometrySpec {
                name: "dipole_1".into(),
                topology: "dipole".into(),
                params: Params::new(),
            })
            .await
            .unwrap();
        assert_eq!(backend.built, vec!["dipole_1"]);

        match backend.analyze("Setup1").await {
            Err(SessionError::Unsupported(cap)) => assert_eq!(cap, "analyze"),
            other => panic!("Expected Unsupported, got: {other:?}"),
        }
        assert!(backend.close().await.is_ok());
    }

    #[test]
    fn boundary_serializes_type_key() {
        let json = serde_json::to_value(BoundarySpec {
            target: "dipole_1".into(),
            kind: "radiation".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "radiation");
    }

    #[test]
    fn project_options_defaults() {
        let options = ProjectOptions::default();
        assert_eq!(options.project_name, "AntennaFlow_project");
        assert!(options.non_graphical);
        assert!(!options.with_non_graphical(false).non_graphical);
    }
}
