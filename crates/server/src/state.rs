use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use saldo_extract::StatementPipeline;
use saldo_oracle::VisionOracle;
use saldo_pdf::PdfToolkit;

/// Environment-driven configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen port (`PORT`).
    pub port: u16,
    /// Base directory for uploads and scratch renders (`RUNTIME_DIR`).
    pub runtime_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 3000,
        };
        let runtime_dir = std::env::var_os("RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { port, runtime_dir })
    }

    /// Where multipart uploads land before processing.
    pub fn uploads_dir(&self) -> PathBuf {
        self.runtime_dir.join("uploads")
    }

    /// Scratch root for page renders and decrypted copies.
    pub fn scratch_dir(&self) -> PathBuf {
        self.runtime_dir.join("tmp")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.scratch_dir())
    }
}

/// Shared state for the upload endpoint.
pub struct AppState<P: PdfToolkit, O: VisionOracle> {
    pub pipeline: Arc<StatementPipeline<P, O>>,
    pub uploads_dir: PathBuf,
}

impl<P: PdfToolkit, O: VisionOracle> AppState<P, O> {
    pub fn new(pipeline: StatementPipeline<P, O>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            uploads_dir: uploads_dir.into(),
        }
    }
}

// Derived Clone would demand P: Clone and O: Clone; the Arc makes that
// unnecessary.
impl<P: PdfToolkit, O: VisionOracle> Clone for AppState<P, O> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            uploads_dir: self.uploads_dir.clone(),
        }
    }
}
